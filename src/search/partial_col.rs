use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::{ColorId, VertexId};
use crate::search::{print_result_ls, Coloration, SearchContext};
use crate::solution::Solution;

/** drops the color whose vertices relocate with the fewest conflicts:
every vertex of that color moves to the chosen second color when it fits,
the others are returned as the unassigned set. */
fn remove_color_unassigned(solution: &mut Solution) -> BTreeSet<VertexId> {
    let mut unassigned = BTreeSet::new();
    if solution.nb_non_empty_colors() < 2 {
        return unassigned;
    }
    let mut best_sum_conflicts = solution.graph().nb_vertices as i64;
    let mut best_pair: Option<(ColorId, ColorId)> = None;
    for &color1 in solution.non_empty_colors() {
        for &color2 in solution.non_empty_colors() {
            if color1 == color2 {
                continue;
            }
            let sum_conflicts: i64 = solution
                .colors_vertices(color1)
                .iter()
                .map(|&vertex| solution.conflicts_colors(color2, vertex))
                .sum();
            if sum_conflicts < best_sum_conflicts || best_pair.is_none() {
                best_sum_conflicts = sum_conflicts;
                best_pair = Some((color1, color2));
            }
        }
    }
    let (color1, color2) = best_pair.expect("two used colors");
    let to_delete: Vec<VertexId> = solution.colors_vertices(color1).iter().copied().collect();
    for vertex in to_delete {
        solution.delete_from_color(vertex);
        if solution.conflicts_colors(color2, vertex) == 0 {
            solution.add_to_color(vertex, Some(color2));
        } else {
            unassigned.insert(vertex);
        }
    }
    unassigned
}

/** PARTIALCOL: keeps the partial coloring feasible and shrinks the number
of unassigned vertices. Inserting a vertex kicks its conflicting neighbors
out; the kicked color becomes tabu for them for a few iterations. */
pub fn partial_col(best_solution: &mut Solution, context: &mut SearchContext) {
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
        if solution.nb_non_empty_colors() < 2 {
            break;
        }
        let mut unassigned = remove_color_unassigned(&mut solution);
        let mut best_found = unassigned.len();

        let mut tabu_matrix: Vec<Vec<i64>> = vec![vec![0; solution.nb_colors()]; nb_vertices];
        let mut turn: i64 = 0;
        while !params.time_limit_reached_sub_method(max_time) && best_found != 0 {
            turn += 1;

            let mut best_current = i64::MAX;
            let mut best_colorations: Vec<Coloration> = Vec::new();
            for &vertex in &unassigned {
                for &color in solution.non_empty_colors() {
                    let nb_conflicts = solution.conflicts_colors(color, vertex);
                    if nb_conflicts > best_current {
                        continue;
                    }
                    let is_move_tabu = tabu_matrix[vertex][color] >= turn;
                    let is_improving = nb_conflicts == 0 && unassigned.len() <= best_found;
                    if is_move_tabu && !is_improving {
                        continue;
                    }
                    if nb_conflicts < best_current {
                        best_current = nb_conflicts;
                        best_colorations.clear();
                    }
                    best_colorations.push(Coloration {
                        vertex,
                        color: Some(color),
                    });
                }
            }

            if best_colorations.is_empty() {
                let index = context.rng.gen_range(0..unassigned.len());
                let &vertex = unassigned.iter().nth(index).expect("unassigned vertex");
                let &color = solution
                    .non_empty_colors()
                    .choose(context.rng)
                    .expect("used color");
                best_colorations.push(Coloration {
                    vertex,
                    color: Some(color),
                });
            }

            let chosen_one = *best_colorations.choose(context.rng).expect("non-empty moves");
            let chosen_color = chosen_one.color.expect("partial_col uses existing colors");
            solution.add_to_color(chosen_one.vertex, chosen_one.color);
            unassigned.remove(&chosen_one.vertex);

            // keep the neighbors out of this color for a while so the
            // inserted vertex does not drop back out immediately
            let neighbors = solution.graph().neighborhood[chosen_one.vertex].clone();
            for neighbor in neighbors {
                let tenure = (0.6 * unassigned.len() as f64) as i64 + context.rng.gen_range(0..=10);
                tabu_matrix[neighbor][chosen_color] = turn + tenure;
                if solution.color(neighbor) == Some(chosen_color) {
                    solution.delete_from_color(neighbor);
                    unassigned.insert(neighbor);
                }
            }

            if unassigned.len() < best_found {
                best_found = unassigned.len();
            }
        }

        if unassigned.is_empty() {
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
    fn test_partial_col_reduces_colors_on_even_cycle() {
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
        partial_col(&mut sol, &mut context);
        assert_eq!(sol.score_wvcp(), 2);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }
}
