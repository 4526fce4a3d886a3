use rand::seq::SliceRandom;

use crate::graph::Weight;
use crate::search::{print_result_ls, Coloration, SearchContext};
use crate::solution::Solution;

/** tabu search on the WVCP score. The neighborhood moves a vertex to a
conflict-free used color or to a fresh one; the moved vertex becomes tabu
for `nb_non_empty_colors` iterations; a move beating the best known score is
always allowed. */
pub fn tabu_weight(best_solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    let max_time = params.sub_method_deadline();
    let mut best_time = 0;

    let mut tabu_list: Vec<i64> = vec![0; nb_vertices];
    let mut solution = best_solution.clone();
    let mut turn: i64 = 0;
    while !params.time_limit_reached_sub_method(max_time)
        && turn < params.nb_iter_local_search
        && !params.target_reached(best_solution.score_wvcp())
    {
        turn += 1;
        let mut best_coloration: Vec<Coloration> = Vec::new();
        let mut best_evaluation = Weight::MAX;
        let mut possible_colors: Vec<Option<usize>> =
            solution.non_empty_colors().iter().map(|&c| Some(c)).collect();
        possible_colors.push(None);
        for vertex in 0..nb_vertices {
            for &color in &possible_colors {
                if color == solution.color(vertex) {
                    continue;
                }
                if let Some(c) = color {
                    if solution.conflicts_colors(c, vertex) != 0 {
                        continue;
                    }
                }
                let test_score = solution.score_wvcp() + solution.delta_wvcp_score(vertex, color);
                let not_tabu = tabu_list[vertex] <= turn;
                let aspiration = test_score < best_solution.score_wvcp();
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
            solution.delete_from_color(chosen_one.vertex);
            solution.add_to_color(chosen_one.vertex, chosen_one.color);
            tabu_list[chosen_one.vertex] = turn + solution.nb_non_empty_colors() as i64;
            if solution.score_wvcp() < best_solution.score_wvcp() {
                *best_solution = solution.clone();
                if context.verbose {
                    best_time = params.elapsed_seconds();
                    print_result_ls(params, best_time, best_solution, turn);
                }
            } else if solution.score_wvcp() == best_solution.score_wvcp() {
                *best_solution = solution.clone();
            }
        }
    }
    if context.verbose {
        print_result_ls(params, best_time, best_solution, turn);
    }
}

/** random walk on the WVCP neighborhood: applies a uniformly random
conflict-free move each iteration (WVCP baseline). */
pub fn random_walk_wvcp(best_solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    let max_time = params.sub_method_deadline();

    let mut solution = best_solution.clone();
    let mut turn: i64 = 0;
    while !params.time_limit_reached_sub_method(max_time)
        && turn < params.nb_iter_local_search
        && !params.target_reached(best_solution.score_wvcp())
    {
        turn += 1;
        let mut moves: Vec<Coloration> = Vec::new();
        let mut possible_colors: Vec<Option<usize>> =
            solution.non_empty_colors().iter().map(|&c| Some(c)).collect();
        possible_colors.push(None);
        for vertex in 0..nb_vertices {
            for &color in &possible_colors {
                if color == solution.color(vertex) {
                    continue;
                }
                if let Some(c) = color {
                    if solution.conflicts_colors(c, vertex) != 0 {
                        continue;
                    }
                }
                moves.push(Coloration { vertex, color });
            }
        }
        if let Some(&chosen_one) = moves.choose(context.rng) {
            solution.delete_from_color(chosen_one.vertex);
            solution.add_to_color(chosen_one.vertex, chosen_one.color);
            if solution.score_wvcp() <= best_solution.score_wvcp() {
                *best_solution = solution.clone();
            }
        }
    }
    if context.verbose {
        print_result_ls(params, params.elapsed_seconds(), best_solution, turn);
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
    fn test_tabu_weight_on_weighted_path() {
        // a-b-c weights 3,2,1: optimum is {a,c},{b} scoring 3 + 2 = 5
        let graph = path(3, vec![3, 2, 1]);
        let mut params = Parameters::silent(Method::LocalSearch, 5, 5);
        params.nb_iter_local_search = 1_000;
        let mut rng = StdRng::seed_from_u64(1);
        let mut bounds = BestBounds::new();
        let mut sol = Solution::new(graph);
        greedy_worst(&mut sol);
        assert_eq!(sol.score_wvcp(), 6);
        let mut context = SearchContext {
            params: &params,
            bounds: &mut bounds,
            rng: &mut rng,
            verbose: false,
        };
        tabu_weight(&mut sol, &mut context);
        assert_eq!(sol.score_wvcp(), 5);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }

    #[test]
    fn test_random_walk_wvcp_stays_feasible() {
        let graph = path(3, vec![3, 2, 1]);
        let mut params = Parameters::silent(Method::LocalSearch, 5, -1);
        params.nb_iter_local_search = 100;
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
        random_walk_wvcp(&mut sol, &mut context);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }
}
