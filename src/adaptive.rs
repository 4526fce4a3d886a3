use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Error;
use crate::graph::Weight;

/// Adaptive operator-selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveKind {
    /// single operator
    None,
    /// round robin over the operators
    Iterated,
    /// uniform random choice
    Random,
    /// random choice, periodically deleting the worst operator
    Deleter,
    /// probability proportional to the normalized utilities
    RouletteWheel,
    /// probabilities pulled towards the best operator
    Pursuit,
    /// upper-confidence-bound scores, argmax selection
    Ucb,
}

impl AdaptiveKind {
    /// parses an adaptive policy name from the command line
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "none" => Ok(AdaptiveKind::None),
            "iterated" => Ok(AdaptiveKind::Iterated),
            "random" => Ok(AdaptiveKind::Random),
            "deleter" => Ok(AdaptiveKind::Deleter),
            "roulette_wheel" => Ok(AdaptiveKind::RouletteWheel),
            "pursuit" => Ok(AdaptiveKind::Pursuit),
            "ucb" => Ok(AdaptiveKind::Ucb),
            _ => Err(Error::UnknownName {
                kind: "adaptive",
                name: name.to_string(),
                valid: "none, iterated, random, deleter, roulette_wheel, pursuit, ucb",
            }),
        }
    }

    /// name used in CSV comments
    pub fn name(self) -> &'static str {
        match self {
            AdaptiveKind::None => "none",
            AdaptiveKind::Iterated => "iterated",
            AdaptiveKind::Random => "random",
            AdaptiveKind::Deleter => "deleter",
            AdaptiveKind::RouletteWheel => "roulette_wheel",
            AdaptiveKind::Pursuit => "pursuit",
            AdaptiveKind::Ucb => "ucb",
        }
    }
}

/** Selects the local-search operator of each MCTS turn. All policies share
a sliding window of the recent (operator, reached score) pairs; the scores
are min-max normalized *inverted* (lower score = higher utility, this is a
minimization problem). */
#[derive(Debug)]
pub struct AdaptiveSelector {
    kind: AdaptiveKind,
    nb_operators: usize,
    memory_size: usize,
    turn: usize,
    /// probabilities (or UCB scores for the `ucb` policy)
    proba_operator: Vec<f64>,
    /// ring buffer of the scores reached
    utility: Vec<Weight>,
    /// ring buffer of the operators used
    past_operators: Vec<Option<usize>>,
    normalized_utilities: Vec<f64>,
    nb_times_selected: Vec<usize>,
    nb_times_used_total: Vec<usize>,
    mean_score: Vec<f64>,
    /// operators still in the pool (deleter)
    possible_operators: Vec<usize>,
    /// exploration constant (ucb)
    coeff: f64,
}

impl AdaptiveSelector {
    /// builds the selector for `nb_operators` operators
    pub fn new(kind: AdaptiveKind, nb_operators: usize, window_size: usize, coeff: f64) -> Self {
        let memory_size = match kind {
            AdaptiveKind::RouletteWheel | AdaptiveKind::Pursuit | AdaptiveKind::Ucb => {
                std::cmp::max(1, window_size)
            }
            _ => 1,
        };
        Self {
            kind,
            nb_operators,
            memory_size,
            turn: 0,
            proba_operator: vec![1.0 / nb_operators as f64; nb_operators],
            utility: vec![0; memory_size],
            past_operators: vec![None; memory_size],
            normalized_utilities: vec![0.0; nb_operators],
            nb_times_selected: vec![0; nb_operators],
            nb_times_used_total: vec![0; nb_operators],
            mean_score: vec![0.0; nb_operators],
            possible_operators: (0..nb_operators).collect(),
            coeff,
        }
    }

    /// picks the operator for the current turn
    pub fn get_operator(&self, rng: &mut StdRng) -> usize {
        match self.kind {
            AdaptiveKind::None => 0,
            AdaptiveKind::Iterated => self.turn % self.nb_operators,
            AdaptiveKind::Random | AdaptiveKind::RouletteWheel | AdaptiveKind::Pursuit => {
                WeightedIndex::new(&self.proba_operator)
                    .expect("positive probabilities")
                    .sample(rng)
            }
            AdaptiveKind::Deleter => *self
                .possible_operators
                .choose(rng)
                .expect("a non-empty operator pool"),
            AdaptiveKind::Ucb => {
                let maxi = self
                    .proba_operator
                    .iter()
                    .cloned()
                    .fold(f64::MIN, f64::max);
                let bests: Vec<usize> = (0..self.nb_operators)
                    .filter(|&o| (self.proba_operator[o] - maxi).abs() < f64::EPSILON)
                    .collect();
                *bests.choose(rng).expect("at least one best operator")
            }
        }
    }

    /// records the score reached by the operator this turn
    pub fn update_obtained_solution(&mut self, operator: usize, score: Weight) {
        let index = self.turn % self.memory_size;
        self.utility[index] = score;
        self.past_operators[index] = Some(operator);
        self.mean_score[operator] = (self.mean_score[operator]
            * self.nb_times_used_total[operator] as f64
            + score as f64)
            / (self.nb_times_used_total[operator] + 1) as f64;
        self.nb_times_used_total[operator] += 1;
    }

    /// refreshes the probabilities after the turn
    pub fn update_helper(&mut self) {
        let warmup = 5 * self.nb_operators;
        match self.kind {
            AdaptiveKind::None | AdaptiveKind::Iterated | AdaptiveKind::Random => {}
            AdaptiveKind::Deleter => {
                if self.turn < warmup
                    || self.turn % 5 != 0
                    || self.possible_operators.len() == 1
                {
                    return;
                }
                let &worst_operator = self
                    .possible_operators
                    .iter()
                    .max_by(|&&a, &&b| {
                        self.mean_score[a].partial_cmp(&self.mean_score[b]).unwrap()
                    })
                    .expect("non-empty pool");
                self.possible_operators.retain(|&o| o != worst_operator);
            }
            AdaptiveKind::RouletteWheel => {
                if self.turn < warmup {
                    return;
                }
                self.compute_normalized_utilities_and_nb_selected();
                let sum_utilities: f64 = self.normalized_utilities.iter().sum();
                let p_min = 1.0 / (self.nb_operators as f64 * 5.0);
                for operator in 0..self.nb_operators {
                    self.proba_operator[operator] = p_min
                        + (1.0 - self.nb_operators as f64 * p_min)
                            * (self.normalized_utilities[operator] / sum_utilities);
                }
            }
            AdaptiveKind::Pursuit => {
                if self.turn < warmup {
                    return;
                }
                if self.turn % 20 == 0 {
                    let uniform = 1.0 / self.nb_operators as f64;
                    for proba in self.proba_operator.iter_mut() {
                        *proba = uniform;
                    }
                }
                let p_min = 1.0 / (self.nb_operators as f64 * 5.0);
                let p_max = 1.0 - (self.nb_operators as f64 - 1.0) * p_min;
                let beta = 0.7;
                self.compute_normalized_utilities_and_nb_selected();
                for operator in 0..self.nb_operators {
                    let previous = self.proba_operator[operator];
                    if (self.normalized_utilities[operator] - 1.0).abs() < f64::EPSILON {
                        self.proba_operator[operator] = previous + beta * (p_max - previous);
                    } else {
                        self.proba_operator[operator] = previous + beta * (p_min - previous);
                    }
                }
            }
            AdaptiveKind::Ucb => {
                if self.turn < warmup {
                    return;
                }
                self.compute_normalized_utilities_and_nb_selected();
                let size = std::cmp::min(self.turn + 1, self.memory_size);
                for operator in 0..self.nb_operators {
                    let exploration = (2.0 * (size as f64).ln()
                        / (self.nb_times_selected[operator] + 1) as f64)
                        .sqrt();
                    self.proba_operator[operator] =
                        self.normalized_utilities[operator] + self.coeff * exploration;
                }
            }
        }
    }

    /// advances to the next turn
    pub fn increment_turn(&mut self) {
        self.turn += 1;
    }

    /// per-operator mean of the recent utilities, min-max inverted
    /// normalized to [0, 1]; never-selected operators get the worst value
    fn compute_normalized_utilities_and_nb_selected(&mut self) {
        for value in self.normalized_utilities.iter_mut() {
            *value = 0.0;
        }
        for value in self.nb_times_selected.iter_mut() {
            *value = 0;
        }
        for index in 0..self.utility.len() {
            if let Some(operator) = self.past_operators[index] {
                self.nb_times_selected[operator] += 1;
                self.normalized_utilities[operator] += self.utility[index] as f64;
            }
        }
        for operator in 0..self.nb_operators {
            if self.nb_times_selected[operator] != 0 {
                self.normalized_utilities[operator] /= self.nb_times_selected[operator] as f64;
            }
        }
        let worst = self
            .normalized_utilities
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max);
        for operator in 0..self.nb_operators {
            if self.nb_times_selected[operator] == 0 {
                self.normalized_utilities[operator] = worst;
            }
        }
        let min_val = self
            .normalized_utilities
            .iter()
            .cloned()
            .fold(f64::MAX, f64::min);
        let max_val = worst;
        if (min_val - max_val).abs() < f64::EPSILON {
            for value in self.normalized_utilities.iter_mut() {
                *value = 1.0;
            }
        } else {
            // inverted: lower scores are better on a minimization problem
            for value in self.normalized_utilities.iter_mut() {
                *value = (*value - max_val) / (min_val - max_val);
            }
        }
    }

    /// probabilities as a `:`-separated string for the turn-by-turn CSV
    pub fn proba_str(&self) -> String {
        let formatted: Vec<String> = self
            .proba_operator
            .iter()
            .map(|p| format!("{:.2}", p))
            .collect();
        formatted.join(":")
    }

    /// current turn
    pub fn turn(&self) -> usize {
        self.turn
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn simulate(kind: AdaptiveKind, nb_operators: usize, turns: usize) -> AdaptiveSelector {
        let mut rng = StdRng::seed_from_u64(1);
        let mut selector = AdaptiveSelector::new(kind, nb_operators, 10, 1.0);
        for turn in 0..turns {
            let operator = selector.get_operator(&mut rng);
            // operator 0 consistently reaches better (lower) scores
            let score = (operator as Weight + 1) * 10 + (turn % 3) as Weight;
            selector.update_obtained_solution(operator, score);
            selector.update_helper();
            selector.increment_turn();
        }
        selector
    }

    fn assert_simplex(selector: &AdaptiveSelector) {
        let sum: f64 = selector.proba_operator.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "probabilities sum to {}", sum);
        assert!(selector
            .proba_operator
            .iter()
            .all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_iterated_cycles() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut selector = AdaptiveSelector::new(AdaptiveKind::Iterated, 3, 10, 1.0);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(selector.get_operator(&mut rng));
            selector.increment_turn();
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_none_always_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let selector = AdaptiveSelector::new(AdaptiveKind::None, 1, 10, 1.0);
        assert_eq!(selector.get_operator(&mut rng), 0);
    }

    #[test]
    fn test_random_keeps_uniform_simplex() {
        let selector = simulate(AdaptiveKind::Random, 4, 50);
        assert_simplex(&selector);
    }

    #[test]
    fn test_roulette_wheel_probabilities() {
        let selector = simulate(AdaptiveKind::RouletteWheel, 3, 100);
        assert_simplex(&selector);
        // operator 0 reaches the lowest scores: it must dominate
        assert!(selector.proba_operator[0] > selector.proba_operator[1]);
        assert!(selector.proba_operator[0] > selector.proba_operator[2]);
    }

    #[test]
    fn test_pursuit_probabilities() {
        let selector = simulate(AdaptiveKind::Pursuit, 3, 101);
        assert_simplex(&selector);
        assert!(selector.proba_operator[0] > selector.proba_operator[2]);
    }

    #[test]
    fn test_deleter_removes_worst() {
        let selector = simulate(AdaptiveKind::Deleter, 3, 40);
        // the worst operator (highest mean score) left the pool
        assert!(selector.possible_operators.len() < 3);
        assert!(selector.possible_operators.contains(&0));
    }

    #[test]
    fn test_ucb_prefers_best_operator() {
        // the ucb vector holds scores, not probabilities; the policy keeps
        // exploring but must exploit the best operator most overall
        let selector = simulate(AdaptiveKind::Ucb, 3, 200);
        assert!(selector.nb_times_used_total[0] > selector.nb_times_used_total[1]);
        assert!(selector.nb_times_used_total[0] > selector.nb_times_used_total[2]);
    }
}
