use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::Weight;
use crate::search::{print_result_ls, Coloration, SearchContext};
use crate::solution::Solution;

/** steepest descent: applies the best conflict-free score-improving move
until none is left. */
pub fn hill_climbing(solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    let nb_vertices = solution.graph().nb_vertices;
    let mut turn: i64 = 0;
    while !params.time_limit_reached() && !params.target_reached(solution.score_wvcp()) {
        turn += 1;
        let mut best_coloration: Vec<Coloration> = Vec::new();
        let mut best_evaluation: Weight = solution.score_wvcp();
        for vertex in 0..nb_vertices {
            for &color in solution.non_empty_colors() {
                if Some(color) == solution.color(vertex)
                    || solution.conflicts_colors(color, vertex) != 0
                {
                    continue;
                }
                let test_score =
                    solution.score_wvcp() + solution.delta_wvcp_score(vertex, Some(color));
                if test_score < best_evaluation {
                    best_coloration.clear();
                    best_coloration.push(Coloration {
                        vertex,
                        color: Some(color),
                    });
                    best_evaluation = test_score;
                } else if test_score == best_evaluation && !best_coloration.is_empty() {
                    best_coloration.push(Coloration {
                        vertex,
                        color: Some(color),
                    });
                }
            }
        }
        let chosen_one = match best_coloration.choose(context.rng) {
            None => return,
            Some(&m) => m,
        };
        solution.delete_from_color(chosen_one.vertex);
        solution.add_to_color(chosen_one.vertex, chosen_one.color);
        if context.verbose {
            print_result_ls(params, params.elapsed_seconds(), solution, turn);
        }
    }
}

/** burns its time budget on a move that changes nothing (baseline for the
adaptive selection experiments). */
pub fn useless_ls(best_solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    if best_solution.graph().nb_vertices == 0 {
        return;
    }
    let max_time = params.sub_method_deadline();
    while !params.time_limit_reached_sub_method(max_time) {
        let color = best_solution.delete_from_color(0);
        best_solution.add_to_color(0, Some(color));
    }
    if context.verbose {
        print_result_ls(params, params.elapsed_seconds(), best_solution, 1);
    }
}

/** throws the coloring away: most vertices end up alone in their color
(baseline for the adaptive selection experiments). */
pub fn worst_ls(best_solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    for vertex in 0..nb_vertices {
        best_solution.delete_from_color(vertex);
    }
    for vertex in 0..nb_vertices {
        if context.rng.gen_range(0..=100) < 10 {
            let possible_colors = best_solution.available_colors(vertex);
            let &color = possible_colors.choose(context.rng).expect("non-empty candidates");
            best_solution.add_to_color(vertex, color);
        } else {
            best_solution.add_to_color(vertex, None);
        }
    }
    if context.verbose {
        print_result_ls(params, params.elapsed_seconds(), best_solution, 1);
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

    #[test]
    fn test_hill_climbing_improves() {
        let graph = path(3, vec![3, 2, 1]);
        let params = Parameters::silent(Method::LocalSearch, 5, -1);
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
        hill_climbing(&mut sol, &mut context);
        assert_eq!(sol.score_wvcp(), 5);
        assert!(sol.check());
    }

    #[test]
    fn test_worst_ls_stays_consistent() {
        let graph = path(3, vec![3, 2, 1]);
        let params = Parameters::silent(Method::LocalSearch, 5, -1);
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
        worst_ls(&mut sol, &mut context);
        assert!((0..3).all(|v| sol.color(v).is_some()));
        assert!(sol.check());
    }
}
