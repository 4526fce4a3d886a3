use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::Weight;
use crate::search::{print_result_ls, Coloration, SearchContext};
use crate::solution::Solution;

/// tabu regime of an AFISA phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Perturbation {
    /// regular tabu search
    NoPerturbation,
    /// moves stay tabu for the rest of the phase
    Unlimited,
    /// tabu disabled
    NoTabu,
}

/// augmented objective: score plus the weighted infeasibility
fn augmented_score(solution: &Solution, penalty_coeff: i64) -> Weight {
    solution.score_wvcp() + penalty_coeff * solution.penalty()
}

/** AFISA: alternates a long tabu phase and a short perturbation phase on
the augmented objective `score + penalty_coeff * penalty`, raising
`penalty_coeff` while the best phase solution stays infeasible and lowering
it otherwise. This variant uses a per-vertex tabu. */
pub fn afisa(best_solution: &mut Solution, context: &mut SearchContext) {
    afisa_run(best_solution, context, false)
}

/** AFISA, original tabu shape: per-(vertex, color) tenure driven by the
augmented score. */
pub fn afisa_original(best_solution: &mut Solution, context: &mut SearchContext) {
    afisa_run(best_solution, context, true)
}

fn afisa_run(best_solution: &mut Solution, context: &mut SearchContext, original_tabu: bool) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    let max_time = params.sub_method_deadline();
    let mut best_time = 0;

    // the phase-best solution may carry conflicts
    let mut best_afisa_sol = best_solution.clone();
    let mut penalty_coeff: i64 = 1;
    let mut no_improvement = 0;
    let mut turn_afisa = 0;
    let small_perturbation = (0.05 * nb_vertices as f64) as i64;
    let large_perturbation = (0.5 * nb_vertices as f64) as i64;
    let mut perturbation_length = small_perturbation;
    let nb_turn_tabu = nb_vertices as i64 * 10;

    while !params.time_limit_reached_sub_method(max_time)
        && turn_afisa < params.nb_iter_local_search
        && !params.target_reached(best_solution.score_wvcp())
    {
        turn_afisa += 1;

        let mut solution = best_afisa_sol.clone();
        afisa_tabu_phase(
            &mut solution,
            best_solution,
            &mut best_afisa_sol,
            penalty_coeff,
            nb_turn_tabu,
            Perturbation::NoPerturbation,
            original_tabu,
            max_time,
            context,
        );

        if best_afisa_sol.score_wvcp() < best_solution.score_wvcp() && best_afisa_sol.penalty() == 0
        {
            *best_solution = best_afisa_sol.clone();
            no_improvement = 0;
            perturbation_length = small_perturbation;
            if context.verbose {
                best_time = params.elapsed_seconds();
                print_result_ls(params, best_time, best_solution, turn_afisa);
            }
        } else {
            if best_afisa_sol.score_wvcp() == best_solution.score_wvcp()
                && best_afisa_sol.penalty() == 0
            {
                *best_solution = best_afisa_sol.clone();
            }
            no_improvement += 1;
            if no_improvement == 50 {
                perturbation_length = large_perturbation;
            }
        }

        // adaptive adjustment of the infeasibility weight
        if best_afisa_sol.penalty() != 0 {
            penalty_coeff += 1;
        } else {
            penalty_coeff = std::cmp::max(1, penalty_coeff - 1);
        }

        let mode = if context.rng.gen_range(0..=100) < 50 {
            Perturbation::NoTabu
        } else {
            Perturbation::Unlimited
        };
        afisa_tabu_phase(
            &mut solution,
            best_solution,
            &mut best_afisa_sol,
            penalty_coeff,
            perturbation_length,
            mode,
            original_tabu,
            max_time,
            context,
        );
    }
    if context.verbose {
        print_result_ls(params, best_time, best_solution, turn_afisa);
    }
}

/** one tabu (or perturbation) phase on the augmented objective. With
`original_tabu` the tenure is kept per (vertex, old color) and driven by the
augmented score, otherwise per vertex with a fixed floor. A move reaching a
feasible solution better than the best known one bypasses the tabu. */
#[allow(clippy::too_many_arguments)]
fn afisa_tabu_phase(
    solution: &mut Solution,
    best_solution: &Solution,
    best_afisa_sol: &mut Solution,
    penalty_coeff: i64,
    turns: i64,
    perturbation: Perturbation,
    original_tabu: bool,
    max_time: Instant,
    context: &mut SearchContext,
) {
    let params = context.params;
    let nb_vertices = solution.graph().nb_vertices;
    let nb_max_colors = ((std::cmp::max(solution.nb_colors(), 15) as f64) * 1.15) as usize;
    let turn_tabu_min = (0.2 * nb_vertices as f64) as i64;
    let mut tabu_list: Vec<i64> = vec![0; nb_vertices];
    let mut tabu_matrix: Vec<Vec<i64>> = vec![vec![0; nb_max_colors]; nb_vertices];

    let mut turn_tabu: i64 = 0;
    while !params.time_limit_reached_sub_method(max_time) && turn_tabu < turns {
        turn_tabu += 1;
        let mut best_coloration: Vec<Coloration> = Vec::new();
        let mut best_evaluation = Weight::MAX;

        let mut possible_colors: Vec<Option<usize>> =
            solution.non_empty_colors().iter().map(|&c| Some(c)).collect();
        if !original_tabu || possible_colors.len() < nb_max_colors {
            possible_colors.push(None);
        }

        for vertex in 0..nb_vertices {
            for &color in &possible_colors {
                if color == solution.color(vertex) {
                    continue;
                }
                let delta_penalty = solution.delta_conflicts(vertex, color);
                let test_score = solution.score_wvcp()
                    + solution.delta_wvcp_score(vertex, color)
                    + penalty_coeff * (delta_penalty + solution.penalty());
                // a fresh-color move carries no tenure entry and is never tabu
                let not_tabu = if original_tabu {
                    match color {
                        None => true,
                        Some(c) => {
                            tabu_matrix[vertex].get(c).copied().unwrap_or(0) <= turn_tabu
                        }
                    }
                } else {
                    tabu_list[vertex] <= turn_tabu
                };
                let aspiration = test_score < best_solution.score_wvcp()
                    && solution.penalty() + delta_penalty == 0;
                if (test_score < best_evaluation && not_tabu) || aspiration {
                    best_coloration.clear();
                    best_coloration.push(Coloration { vertex, color });
                    best_evaluation = test_score;
                } else if test_score == best_evaluation && (not_tabu || aspiration) {
                    best_coloration.push(Coloration { vertex, color });
                }
            }
        }

        if let Some(&chosen_one) = best_coloration.choose(context.rng) {
            let old_color = solution.delete_from_color(chosen_one.vertex);
            solution.add_to_color(chosen_one.vertex, chosen_one.color);

            match perturbation {
                Perturbation::NoPerturbation => {
                    if original_tabu {
                        let row = &mut tabu_matrix[chosen_one.vertex];
                        if old_color >= row.len() {
                            row.resize(old_color + 1, 0);
                        }
                        row[old_color] = turn_tabu
                            + context.rng.gen_range(0..=10)
                            + (0.6 * augmented_score(solution, penalty_coeff) as f64) as i64;
                    } else {
                        tabu_list[chosen_one.vertex] =
                            turn_tabu + turn_tabu_min + context.rng.gen_range(0..=10);
                    }
                }
                Perturbation::Unlimited => {
                    if original_tabu {
                        let row = &mut tabu_matrix[chosen_one.vertex];
                        if old_color >= row.len() {
                            row.resize(old_color + 1, 0);
                        }
                        row[old_color] = turns + 1;
                    } else {
                        tabu_list[chosen_one.vertex] = turns + 1;
                    }
                }
                Perturbation::NoTabu => {}
            }

            if augmented_score(solution, penalty_coeff)
                < augmented_score(best_afisa_sol, penalty_coeff)
            {
                *best_afisa_sol = solution.clone();
            }
            if params.target_reached(solution.score_wvcp()) && solution.penalty() == 0 {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::graph::testing::path;
    use crate::parameters::{Method, Parameters};
    use crate::search::greedy::greedy_worst;
    use crate::solution::BestBounds;

    fn run_variant(variant: fn(&mut Solution, &mut SearchContext)) {
        let graph = path(3, vec![3, 2, 1]);
        let mut params = Parameters::silent(Method::LocalSearch, 10, 5);
        params.nb_iter_local_search = 200;
        let mut rng = StdRng::seed_from_u64(1);
        let mut bounds = BestBounds::new();
        let mut sol = Solution::new(graph);
        greedy_worst(&mut sol);
        let mut context = SearchContext {
            params: &params,
            bounds: &mut bounds,
            rng: &mut rng,
            verbose: false,
        };
        variant(&mut sol, &mut context);
        assert_eq!(sol.score_wvcp(), 5);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }

    #[test]
    fn test_afisa_on_weighted_path() {
        run_variant(afisa);
    }

    #[test]
    fn test_afisa_original_on_weighted_path() {
        run_variant(afisa_original);
    }
}
