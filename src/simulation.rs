use rand::rngs::StdRng;
use rand::Rng;

use crate::error::Error;
use crate::graph::{ColorId, Weight};
use crate::solution::{distance_approximation_colors, Solution};

/** Memory of the simulation policies: the colorings already sent to local
search, the best score accepted so far, and the thresholds derived from the
instance size. */
#[derive(Debug)]
pub struct SimulationHelper {
    /// lowest score accepted so far
    pub fit_condition: Weight,
    past_solutions: Vec<Vec<ColorId>>,
    past_nb_colors: Vec<usize>,
    distance_min: usize,
    depth_min: usize,
}

impl SimulationHelper {
    /// thresholds: `distance_min = max(n/10, 3)`, `depth_min = max(n/5, 3)`
    pub fn new(nb_vertices: usize, fit_condition: Weight) -> Self {
        Self {
            fit_condition,
            past_solutions: Vec::new(),
            past_nb_colors: Vec::new(),
            distance_min: std::cmp::max(nb_vertices / 10, 3),
            depth_min: std::cmp::max(nb_vertices / 5, 3),
        }
    }

    /// records an accepted rollout
    fn accept_solution(&mut self, solution: &Solution) {
        let colors: Vec<ColorId> = solution
            .colors()
            .iter()
            .map(|c| c.expect("completed rollout"))
            .collect();
        self.past_solutions.push(colors);
        self.past_nb_colors.push(solution.nb_colors());
        self.fit_condition = std::cmp::min(solution.score_wvcp(), self.fit_condition);
    }

    /// far enough (approximation distance) from every accepted rollout
    fn distant_enough(&self, solution: &Solution) -> bool {
        let colors: Vec<ColorId> = solution
            .colors()
            .iter()
            .map(|c| c.expect("completed rollout"))
            .collect();
        let nb_colors = solution.nb_colors();
        for (past, &past_nb) in self.past_solutions.iter().zip(&self.past_nb_colors) {
            let dist = distance_approximation_colors(past, past_nb, &colors, nb_colors);
            if dist < self.distance_min {
                return false;
            }
        }
        true
    }

    /// within 1% (or one unit) of the best accepted score
    fn score_low_enough(&self, solution: &Solution) -> bool {
        let min_score = std::cmp::max(
            (self.fit_condition as f64 * 1.01) as Weight,
            self.fit_condition.saturating_add(1),
        );
        solution.score_wvcp() <= min_score
    }

    /// the rollout started a multiple of `depth_min` below the root
    fn level_ok(&self, solution: &Solution) -> bool {
        let vertex = solution.first_free_vertex();
        vertex > self.depth_min && vertex % self.depth_min == 0
    }

    /// the deeper the rollout started, the likelier it passes
    fn depth_chance_ok(&self, solution: &Solution, rng: &mut StdRng) -> bool {
        let percentage_colored =
            solution.first_free_vertex() * 100 / solution.graph().nb_vertices;
        let chance_of_passing = rng.gen_range(5..=95);
        percentage_colored >= chance_of_passing
    }
}

/// Decides, for each completed rollout, whether to run a local search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simulation {
    /// never
    NoLs,
    /// always
    AlwaysLs,
    /// score close to the best accepted, far from the accepted rollouts
    Fit,
    /// depth-biased coin, far from the accepted rollouts
    Depth,
    /// every `depth_min` levels, far from the accepted rollouts
    Level,
    /// score, depth and distance together
    DepthFit,
    /// 95% of the time
    Chance,
}

impl Simulation {
    /// parses a simulation name from the command line
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "no_ls" => Ok(Simulation::NoLs),
            "always_ls" => Ok(Simulation::AlwaysLs),
            "fit" => Ok(Simulation::Fit),
            "depth" => Ok(Simulation::Depth),
            "level" => Ok(Simulation::Level),
            "depth_fit" => Ok(Simulation::DepthFit),
            "chance" => Ok(Simulation::Chance),
            _ => Err(Error::UnknownName {
                kind: "simulation",
                name: name.to_string(),
                valid: "no_ls, always_ls, fit, depth, level, depth_fit, chance",
            }),
        }
    }

    /// name used in CSV comments
    pub fn name(self) -> &'static str {
        match self {
            Simulation::NoLs => "no_ls",
            Simulation::AlwaysLs => "always_ls",
            Simulation::Fit => "fit",
            Simulation::Depth => "depth",
            Simulation::Level => "level",
            Simulation::DepthFit => "depth_fit",
            Simulation::Chance => "chance",
        }
    }

    /// whether to run a local search on this rollout; accepted rollouts are
    /// recorded in the helper
    pub fn run_local_search(
        self,
        solution: &Solution,
        helper: &mut SimulationHelper,
        rng: &mut StdRng,
    ) -> bool {
        match self {
            Simulation::NoLs => false,
            Simulation::AlwaysLs => true,
            Simulation::Fit => {
                if !helper.score_low_enough(solution) || !helper.distant_enough(solution) {
                    return false;
                }
                helper.accept_solution(solution);
                true
            }
            Simulation::Depth => {
                if !helper.depth_chance_ok(solution, rng) || !helper.distant_enough(solution) {
                    return false;
                }
                helper.accept_solution(solution);
                true
            }
            Simulation::Level => {
                if !helper.level_ok(solution) || !helper.distant_enough(solution) {
                    return false;
                }
                helper.accept_solution(solution);
                true
            }
            Simulation::DepthFit => {
                if !helper.score_low_enough(solution)
                    || !helper.depth_chance_ok(solution, rng)
                    || !helper.distant_enough(solution)
                {
                    return false;
                }
                helper.accept_solution(solution);
                true
            }
            Simulation::Chance => {
                if rng.gen_range(0..100) < 5 {
                    return false;
                }
                helper.accept_solution(solution);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::graph::testing::isolated;
    use crate::search::greedy::greedy_deterministic;

    #[test]
    fn test_no_ls_and_always_ls() {
        let graph = isolated(5, vec![5, 4, 3, 2, 1]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sol = Solution::new(graph);
        greedy_deterministic(&mut sol);
        let mut helper = SimulationHelper::new(5, Weight::MAX);
        assert!(!Simulation::NoLs.run_local_search(&sol, &mut helper, &mut rng));
        assert!(Simulation::AlwaysLs.run_local_search(&sol, &mut helper, &mut rng));
    }

    #[test]
    fn test_fit_records_accepted_solutions() {
        let graph = isolated(5, vec![5, 4, 3, 2, 1]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sol = Solution::new(graph);
        greedy_deterministic(&mut sol);
        let mut helper = SimulationHelper::new(5, Weight::MAX);
        assert!(Simulation::Fit.run_local_search(&sol, &mut helper, &mut rng));
        assert_eq!(helper.fit_condition, sol.score_wvcp());
        // an identical rollout is no longer distant enough
        assert!(!Simulation::Fit.run_local_search(&sol, &mut helper, &mut rng));
    }

    #[test]
    fn test_level_requires_depth() {
        let graph = isolated(5, vec![5, 4, 3, 2, 1]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sol = Solution::new(graph);
        greedy_deterministic(&mut sol);
        // first_free_vertex is 0: not beyond depth_min
        let mut helper = SimulationHelper::new(5, Weight::MAX);
        assert!(!Simulation::Level.run_local_search(&sol, &mut helper, &mut rng));
    }
}
