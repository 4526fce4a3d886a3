use rand::seq::SliceRandom;
use rand::Rng;

use crate::search::{print_result_ls, Coloration, SearchContext};
use crate::solution::Solution;

/** TABUCOL, GCP-oriented: works at a fixed number of colors, removing one
color (creating conflicts) each time the coloring becomes feasible, then
drives the number of conflicting edges back to zero with a tabu search on
the conflicting vertices. */
pub fn tabu_col(best_solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    let max_time = params.sub_method_deadline();
    let mut best_time = 0;

    if best_solution.nb_non_empty_colors() < context.bounds.nb_colors {
        context.bounds.nb_colors = best_solution.nb_non_empty_colors();
    }

    let mut solution = best_solution.clone();
    let mut turn_main = 0;
    while !params.time_limit_reached_sub_method(max_time)
        && turn_main < params.nb_iter_local_search
        && !params.target_reached(best_solution.score_wvcp())
    {
        turn_main += 1;
        if solution.nb_conflicting_vertices() == 0 {
            solution.remove_one_color_and_create_conflicts();
        }
        if solution.nb_non_empty_colors() < 2 {
            break;
        }
        let mut best_found = solution.penalty();

        let mut tabu_matrix: Vec<Vec<i64>> = vec![vec![0; solution.nb_colors()]; nb_vertices];
        let mut turn: i64 = 0;
        while !params.time_limit_reached_sub_method(max_time) && best_found != 0 {
            turn += 1;

            let mut best_current = i64::MAX;
            let mut best_colorations: Vec<Coloration> = Vec::new();
            for vertex in 0..nb_vertices {
                if !solution.has_conflicts(vertex) {
                    continue;
                }
                for &color in solution.non_empty_colors() {
                    if Some(color) == solution.color(vertex) {
                        continue;
                    }
                    let delta_conflict = solution.delta_conflicts(vertex, Some(color));
                    if delta_conflict > best_current {
                        continue;
                    }
                    let is_move_tabu = tabu_matrix[vertex][color] >= turn;
                    let is_improving = solution.penalty() + delta_conflict < best_found;
                    if is_move_tabu && !is_improving {
                        continue;
                    }
                    if delta_conflict < best_current {
                        best_current = delta_conflict;
                        best_colorations.clear();
                    }
                    best_colorations.push(Coloration {
                        vertex,
                        color: Some(color),
                    });
                }
            }
            if best_colorations.is_empty() {
                if solution.nb_non_empty_colors() < 2 {
                    break;
                }
                // whole neighborhood tabu: random vertex, random other color
                let vertex = context.rng.gen_range(0..nb_vertices);
                let own_color = solution.color(vertex);
                loop {
                    let &color = solution
                        .non_empty_colors()
                        .choose(context.rng)
                        .expect("at least two used colors");
                    if Some(color) != own_color {
                        best_colorations.push(Coloration {
                            vertex,
                            color: Some(color),
                        });
                        break;
                    }
                }
            }

            let chosen_one = *best_colorations.choose(context.rng).expect("non-empty moves");
            let old_color = solution.delete_from_color(chosen_one.vertex);
            solution.add_to_color(chosen_one.vertex, chosen_one.color);

            tabu_matrix[chosen_one.vertex][old_color] = turn
                + context.rng.gen_range(0..=10)
                + (solution.penalty() as f64 * 0.6) as i64;

            if solution.penalty() < best_found {
                best_found = solution.penalty();
            }
        }
        if solution.penalty() == 0 {
            *best_solution = solution.clone();
            if solution.nb_non_empty_colors() < context.bounds.nb_colors {
                context.bounds.nb_colors = solution.nb_non_empty_colors();
            }
            if context.verbose {
                best_time = params.elapsed_seconds();
                print_result_ls(params, best_time, &solution, turn);
            }
        }
    }
    if context.verbose {
        print_result_ls(params, best_time, best_solution, turn_main);
    }
}

/** random walk at a fixed number of colors: applies uniformly random
conflicting-vertex moves (GCP baseline). */
pub fn random_walk_gcp(best_solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    let max_time = params.sub_method_deadline();

    if best_solution.nb_non_empty_colors() < context.bounds.nb_colors {
        context.bounds.nb_colors = best_solution.nb_non_empty_colors();
    }
    let mut solution = best_solution.clone();
    if solution.nb_conflicting_vertices() == 0 {
        solution.remove_one_color_and_create_conflicts();
    }
    if solution.nb_non_empty_colors() < 2 {
        return;
    }
    let mut best_found = solution.penalty();
    let mut turn = 0;
    while !params.time_limit_reached_sub_method(max_time)
        && best_found != 0
        && turn < params.nb_iter_local_search
    {
        turn += 1;
        let mut moves: Vec<Coloration> = Vec::new();
        for vertex in 0..nb_vertices {
            if !solution.has_conflicts(vertex) {
                continue;
            }
            for &color in solution.non_empty_colors() {
                if Some(color) != solution.color(vertex) {
                    moves.push(Coloration {
                        vertex,
                        color: Some(color),
                    });
                }
            }
        }
        let chosen_one = match moves.choose(context.rng) {
            None => return,
            Some(&m) => m,
        };
        solution.delete_from_color(chosen_one.vertex);
        solution.add_to_color(chosen_one.vertex, chosen_one.color);
        if solution.penalty() < best_found {
            best_found = solution.penalty();
        }
    }
    if solution.penalty() == 0 {
        *best_solution = solution;
        if best_solution.nb_non_empty_colors() < context.bounds.nb_colors {
            context.bounds.nb_colors = best_solution.nb_non_empty_colors();
        }
        if context.verbose {
            print_result_ls(params, params.elapsed_seconds(), best_solution, turn);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::graph::testing::cycle;
    use crate::parameters::{Method, Parameters};
    use crate::search::greedy::greedy_worst;
    use crate::solution::BestBounds;

    #[test]
    fn test_tabu_col_two_colors_even_cycle() {
        // C6 is 2-colorable: tabu_col must reach score 2 and stop on target
        let graph = cycle(6);
        let mut params = Parameters::silent(Method::LocalSearch, 30, 2);
        params.nb_iter_local_search = 10_000;
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
        tabu_col(&mut sol, &mut context);
        assert_eq!(sol.score_wvcp(), 2);
        assert_eq!(sol.nb_non_empty_colors(), 2);
        assert_eq!(sol.penalty(), 0);
        assert_eq!(bounds.nb_colors, 2);
        assert!(sol.check());
    }

    #[test]
    fn test_random_walk_gcp_keeps_solution_feasible() {
        let graph = cycle(6);
        let mut params = Parameters::silent(Method::LocalSearch, 5, -1);
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
        random_walk_gcp(&mut sol, &mut context);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }
}
