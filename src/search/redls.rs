use rand::seq::SliceRandom;
use rand::rngs::StdRng;

use crate::graph::{ColorId, VertexId, Weight};
use crate::search::{print_result_ls, Coloration, SearchContext};
use crate::solution::Solution;

/** Decorator over a [`Solution`] for RedLS: every edge carries a learned
weight (starting at 1), the conflict counters and the penalty are weighted
by it, and the currently conflicting edges are kept in a list so their
weights can be bumped when the search stalls. */
#[derive(Debug, Clone)]
pub struct RedlsSolution {
    solution: Solution,
    /// weighted infeasibility: sum of the weights of the conflicting edges
    penalty: i64,
    /// conflicts_colors[c][v]: summed edge weight between v and the
    /// vertices colored with c
    conflicts_colors: Vec<Vec<i64>>,
    /// same-colored edges, lower vertex first
    conflict_edges: Vec<(VertexId, VertexId)>,
    /// learned edge weights (1 on every edge initially)
    edge_weights: Vec<Vec<i64>>,
}

impl RedlsSolution {
    /// wraps a solution, copying its conflict counters as the weighted ones
    pub fn new(solution: Solution) -> Self {
        let nb_vertices = solution.graph().nb_vertices;
        let conflicts_colors = (0..solution.nb_colors())
            .map(|color| {
                (0..nb_vertices)
                    .map(|vertex| solution.conflicts_colors(color, vertex))
                    .collect()
            })
            .collect();
        let mut edge_weights = vec![vec![0; nb_vertices]; nb_vertices];
        for &(v1, v2) in &solution.graph().edges_list {
            edge_weights[v1][v2] = 1;
            edge_weights[v2][v1] = 1;
        }
        Self {
            solution,
            penalty: 0,
            conflicts_colors,
            conflict_edges: Vec::new(),
            edge_weights,
        }
    }

    /// colors the vertex, maintaining the weighted counters and edge list
    pub fn add_to_color(&mut self, vertex: VertexId, proposed: Option<ColorId>) -> ColorId {
        let color = self.solution.add_to_color(vertex, proposed);
        let graph = self.solution.graph().clone();
        while self.conflicts_colors.len() < self.solution.nb_colors() {
            self.conflicts_colors.push(vec![0; graph.nb_vertices]);
        }

        if self.conflicts_colors[color][vertex] > 0 {
            self.penalty += self.conflicts_colors[color][vertex];
            for &neighbor in &graph.neighborhood[vertex] {
                if self.solution.color(neighbor) == Some(color) {
                    let lower = std::cmp::min(neighbor, vertex);
                    let higher = std::cmp::max(neighbor, vertex);
                    self.conflict_edges.push((lower, higher));
                }
            }
        }
        for &neighbor in &graph.neighborhood[vertex] {
            self.conflicts_colors[color][neighbor] += self.edge_weights[vertex][neighbor];
        }
        color
    }

    /// uncolors the vertex, maintaining the weighted counters and edge list
    pub fn delete_from_color(&mut self, vertex: VertexId) -> ColorId {
        let color = self.solution.color(vertex).expect("delete_from_color: unassigned");
        let graph = self.solution.graph().clone();

        if self.conflicts_colors[color][vertex] > 0 {
            self.penalty -= self.conflicts_colors[color][vertex];
            for &neighbor in &graph.neighborhood[vertex] {
                if self.solution.color(neighbor) == Some(color) {
                    let lower = std::cmp::min(neighbor, vertex);
                    let higher = std::cmp::max(neighbor, vertex);
                    if let Some(index) = self
                        .conflict_edges
                        .iter()
                        .position(|&edge| edge == (lower, higher))
                    {
                        self.conflict_edges.remove(index);
                    }
                }
            }
        }
        for &neighbor in &graph.neighborhood[vertex] {
            self.conflicts_colors[color][neighbor] -= self.edge_weights[vertex][neighbor];
        }
        self.solution.delete_from_color(vertex)
    }

    /** raises by one the weight of every currently conflicting edge; the
    penalty grows accordingly, which eventually forces the search away from
    the stuck region. */
    pub fn increment_edge_weights(&mut self) {
        let edges = self.conflict_edges.clone();
        for (v1, v2) in edges {
            self.edge_weights[v1][v2] += 1;
            self.edge_weights[v2][v1] += 1;
            let c1 = self.solution.color(v1).expect("conflicting edge endpoint");
            let c2 = self.solution.color(v2).expect("conflicting edge endpoint");
            self.conflicts_colors[c1][v2] += 1;
            self.conflicts_colors[c2][v1] += 1;
        }
        self.penalty += self.conflict_edges.len() as i64;
    }

    /// weighted conflict change if the assigned vertex moved to the color
    pub fn delta_conflicts(&self, vertex: VertexId, color: ColorId) -> i64 {
        let own = self.solution.color(vertex).expect("assigned vertex");
        self.conflicts_colors[color][vertex] - self.conflicts_colors[own][vertex]
    }

    /// weighted count of the neighbors of the vertex in the color
    pub fn conflicts_colors(&self, color: ColorId, vertex: VertexId) -> i64 {
        self.conflicts_colors[color][vertex]
    }

    /// weighted infeasibility
    pub fn penalty(&self) -> i64 {
        self.penalty
    }

    /// currently conflicting edges
    pub fn conflict_edges(&self) -> &[(VertexId, VertexId)] {
        &self.conflict_edges
    }

    /// wrapped solution
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    /// score change of the wrapped solution
    pub fn delta_wvcp_score(&self, vertex: VertexId, color: Option<ColorId>) -> Weight {
        self.solution.delta_wvcp_score(vertex, color)
    }

    /// used colors
    pub fn non_empty_colors(&self) -> &[ColorId] {
        self.solution.non_empty_colors()
    }

    /// color of the vertex
    pub fn color(&self, vertex: VertexId) -> Option<ColorId> {
        self.solution.color(vertex)
    }

    /// WVCP score of the wrapped solution
    pub fn score_wvcp(&self) -> Weight {
        self.solution.score_wvcp()
    }

    /// whether the vertex has a same-colored neighbor (unweighted)
    pub fn has_conflicts(&self, vertex: VertexId) -> bool {
        self.solution.has_conflicts(vertex)
    }

    /// heaviest weight of the class
    pub fn max_weight(&self, color: ColorId) -> Weight {
        self.solution.max_weight(color)
    }

    /// next vertex to color in the MCTS tree (frozen prefix boundary)
    pub fn first_free_vertex(&self) -> VertexId {
        self.solution.first_free_vertex()
    }

    /// consistency of the conflicting-edge list (tests and debug assertions)
    pub fn check(&self) -> bool {
        let graph = self.solution.graph();
        for &(v1, v2) in &graph.edges_list {
            let conflicting =
                self.solution.color(v1).is_some() && self.solution.color(v1) == self.solution.color(v2);
            let listed = self
                .conflict_edges
                .iter()
                .any(|&edge| edge == (v1.min(v2), v1.max(v2)));
            if conflicting != listed {
                return false;
            }
        }
        self.solution.check()
    }
}

/** RedLS: feasible phases alternate with weighted conflict repair. On a
feasible coloring the heaviest vertices of the best-ratio color pair merge;
the created conflicts are then solved by moves improving the weighted
penalty, bumping the edge weights when no move is left. */
pub fn redls(best_solution: &mut Solution, context: &mut SearchContext) {
    redls_run(best_solution, context, false)
}

/// RedLS cooperating with the MCTS: vertices below the partial-coloring
/// cursor are never moved
pub fn redls_freeze(best_solution: &mut Solution, context: &mut SearchContext) {
    redls_run(best_solution, context, true)
}

fn redls_run(best_solution: &mut Solution, context: &mut SearchContext, freeze: bool) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    let max_time = params.sub_method_deadline();
    let mut best_time = 0;

    let mut solution = RedlsSolution::new(best_solution.clone());
    let mut tabu_list: Vec<bool> = vec![false; nb_vertices];
    let mut turn: i64 = 0;
    while !params.time_limit_reached_sub_method(max_time)
        && turn < params.nb_iter_local_search
        && !params.target_reached(best_solution.score_wvcp())
    {
        turn += 1;
        if solution.penalty() == 0 {
            while improve_conflicts(&mut solution, false, &mut tabu_list, freeze, context.rng) {}

            if solution.score_wvcp() < best_solution.score_wvcp() {
                *best_solution = solution.solution().clone();
                if context.verbose {
                    best_time = params.elapsed_seconds();
                    print_result_ls(params, best_time, best_solution, turn);
                }
                if params.target_reached(solution.score_wvcp()) {
                    if context.verbose {
                        print_result_ls(params, best_time, best_solution, turn);
                    }
                    return;
                }
            } else if solution.score_wvcp() == best_solution.score_wvcp() {
                *best_solution = solution.solution().clone();
            }
            for entry in tabu_list.iter_mut() {
                *entry = false;
            }
            if !move_heaviest_vertices(&mut solution, freeze) {
                // no color pair left to merge
                return;
            }
        }

        if !improve_conflicts_and_score(
            &mut solution,
            best_solution.score_wvcp(),
            &mut tabu_list,
            freeze,
            context.rng,
        ) {
            while improve_conflicts(&mut solution, true, &mut tabu_list, freeze, context.rng) {}
            if !solve_one_conflict_preserve_score(
                &mut solution,
                best_solution.score_wvcp(),
                &mut tabu_list,
                freeze,
                context.rng,
            ) {
                solution.increment_edge_weights();
                if !solution.conflict_edges().is_empty()
                    && !solve_one_conflict(
                        &mut solution,
                        best_solution.score_wvcp(),
                        &mut tabu_list,
                        freeze,
                        context.rng,
                    )
                {
                    return;
                }
            }
        }
    }
    if context.verbose {
        print_result_ls(params, best_time, best_solution, turn);
    }
}

/** double improvement: a move strictly reducing the weighted conflicts and
strictly below the margin to the best score. The moved vertex becomes tabu,
its neighbors are released. */
fn improve_conflicts_and_score(
    solution: &mut RedlsSolution,
    best_local_score: Weight,
    tabu_list: &mut [bool],
    freeze: bool,
    rng: &mut StdRng,
) -> bool {
    let first_vertex = if freeze { solution.first_free_vertex() } else { 0 };
    let nb_vertices = solution.solution().graph().nb_vertices;
    let delta_wvcp = (best_local_score - solution.score_wvcp()).abs();
    let mut best_conflicts = 0;
    let mut best_colorations: Vec<Coloration> = Vec::new();
    for vertex in first_vertex..nb_vertices {
        if tabu_list[vertex] || !solution.has_conflicts(vertex) {
            continue;
        }
        for &color in solution.non_empty_colors() {
            if Some(color) == solution.color(vertex) {
                continue;
            }
            let delta_conflicts = solution.delta_conflicts(vertex, color);
            if delta_conflicts >= 0
                || delta_conflicts > best_conflicts
                || solution.delta_wvcp_score(vertex, Some(color)) >= delta_wvcp
            {
                continue;
            }
            if delta_conflicts < best_conflicts {
                best_conflicts = delta_conflicts;
                best_colorations.clear();
            }
            best_colorations.push(Coloration {
                vertex,
                color: Some(color),
            });
        }
    }

    let best_move = match best_colorations.choose(rng) {
        None => return false,
        Some(&m) => m,
    };
    solution.delete_from_color(best_move.vertex);
    solution.add_to_color(best_move.vertex, best_move.color);
    tabu_list[best_move.vertex] = true;
    let neighbors = solution.solution().graph().neighborhood[best_move.vertex].clone();
    for neighbor in neighbors {
        tabu_list[neighbor] = false;
    }
    true
}

/** a move that does not worsen the weighted conflicts while strictly
improving the score. With `with_tabu` the vertex must not be tabu and
becomes tabu after the move. */
fn improve_conflicts(
    solution: &mut RedlsSolution,
    with_tabu: bool,
    tabu_list: &mut [bool],
    freeze: bool,
    rng: &mut StdRng,
) -> bool {
    let first_vertex = if freeze { solution.first_free_vertex() } else { 0 };
    let nb_vertices = solution.solution().graph().nb_vertices;
    let mut candidates: Vec<Coloration> = Vec::new();
    for vertex in first_vertex..nb_vertices {
        if with_tabu && tabu_list[vertex] {
            continue;
        }
        for &color in solution.non_empty_colors() {
            if Some(color) == solution.color(vertex)
                || solution.delta_conflicts(vertex, color) > 0
                || solution.delta_wvcp_score(vertex, Some(color)) >= 0
            {
                continue;
            }
            candidates.push(Coloration {
                vertex,
                color: Some(color),
            });
        }
    }
    let chosen_one = match candidates.choose(rng) {
        None => return false,
        Some(&m) => m,
    };
    solution.delete_from_color(chosen_one.vertex);
    solution.add_to_color(chosen_one.vertex, chosen_one.color);
    if with_tabu {
        tabu_list[chosen_one.vertex] = true;
    }
    true
}

/** unassigns a non-tabu conflicting vertex whose removal keeps the score
below the best known one. */
fn solve_one_conflict_preserve_score(
    solution: &mut RedlsSolution,
    best_local_score: Weight,
    tabu_list: &mut [bool],
    freeze: bool,
    rng: &mut StdRng,
) -> bool {
    let first_vertex = if freeze { solution.first_free_vertex() } else { 0 };
    let nb_vertices = solution.solution().graph().nb_vertices;
    let delta_wvcp = best_local_score - solution.score_wvcp();
    let candidates: Vec<VertexId> = (first_vertex..nb_vertices)
        .filter(|&vertex| {
            !tabu_list[vertex]
                && solution.has_conflicts(vertex)
                && solution.delta_wvcp_score(vertex, None) < delta_wvcp
        })
        .collect();
    let &vertex = match candidates.choose(rng) {
        None => return false,
        Some(v) => v,
    };
    solution.delete_from_color(vertex);
    solution.add_to_color(vertex, None);
    tabu_list[vertex] = true;
    true
}

/** ratio move over the feasible coloring: among all color pairs, relocates
the heaviest vertices of the first color into the second, maximizing the
score gain per conflict created. */
fn move_heaviest_vertices(solution: &mut RedlsSolution, freeze: bool) -> bool {
    let first_free_vertex = solution.first_free_vertex();
    let mut best_ratio = 0.0;
    let mut best_color: Option<ColorId> = None;
    let mut best_heaviest_vertices: Vec<VertexId> = Vec::new();

    for &color1 in solution.non_empty_colors() {
        let max_weight1 = solution.max_weight(color1);
        let mut second_max = 0;
        let mut heaviest_vertices: Vec<VertexId> = Vec::new();
        for &vertex in solution.solution().colors_vertices(color1) {
            let vertex_weight = solution.solution().graph().weights[vertex];
            if vertex_weight == max_weight1 {
                heaviest_vertices.push(vertex);
            } else if vertex_weight > second_max {
                second_max = vertex_weight;
            }
        }
        if freeze && heaviest_vertices[0] < first_free_vertex {
            continue;
        }
        let delta_move = max_weight1 - second_max;
        for &color2 in solution.non_empty_colors() {
            if color1 == color2 {
                continue;
            }
            let delta_conflict: i64 = heaviest_vertices
                .iter()
                .map(|&vertex| solution.conflicts_colors(color2, vertex))
                .sum();
            let max_weight2 = solution.max_weight(color2);
            let delta_wvcp = if max_weight1 > max_weight2 {
                delta_move - max_weight1 + max_weight2
            } else {
                delta_move
            };
            let ratio = if delta_conflict != 0 {
                delta_wvcp as f64 / delta_conflict as f64
            } else {
                delta_wvcp as f64 * 2.0
            };
            if ratio > best_ratio || best_heaviest_vertices.is_empty() {
                best_ratio = ratio;
                best_heaviest_vertices = heaviest_vertices.clone();
                best_color = Some(color2);
            }
        }
    }
    let color2 = match best_color {
        None => return false,
        Some(c) => c,
    };
    for vertex in best_heaviest_vertices {
        solution.delete_from_color(vertex);
        solution.add_to_color(vertex, Some(color2));
    }
    true
}

/** forced move after an edge-weight bump: picks a random conflicting edge
and applies the best weighted-conflict move on one endpoint, or a random
move when nothing qualifies. */
fn solve_one_conflict(
    solution: &mut RedlsSolution,
    best_local_score: Weight,
    tabu_list: &mut [bool],
    freeze: bool,
    rng: &mut StdRng,
) -> bool {
    let delta_wvcp = best_local_score - solution.score_wvcp();
    let &(edge_v1, edge_v2) = solution
        .conflict_edges()
        .choose(rng)
        .expect("a conflicting edge exists");
    let first_free_vertex = solution.first_free_vertex();
    let mut v1 = edge_v1;
    let mut v2 = edge_v2;
    if freeze {
        let mut changed = false;
        if v1 < first_free_vertex {
            v1 = v2;
            changed = true;
        }
        if v2 < first_free_vertex {
            if changed {
                // two frozen vertices cannot be in conflict
                eprintln!("redls: both endpoints of a conflicting edge are frozen");
                return false;
            }
            v2 = v1;
        }
    }

    let mut best_score_conflicts = 0;
    let mut best_coloration: Option<Coloration> = None;
    for &vertex in &[v1, v2] {
        for &color in solution.non_empty_colors() {
            if Some(color) == solution.color(vertex)
                || solution.delta_wvcp_score(vertex, Some(color)) >= delta_wvcp
            {
                continue;
            }
            let delta_conflicts = solution.delta_conflicts(vertex, color);
            if delta_conflicts < best_score_conflicts || best_coloration.is_none() {
                best_score_conflicts = delta_conflicts;
                best_coloration = Some(Coloration {
                    vertex,
                    color: Some(color),
                });
            }
        }
    }

    let chosen_one = best_coloration.unwrap_or_else(|| {
        let endpoints = [v1, v2];
        let &vertex = endpoints.choose(rng).expect("two endpoints");
        let mut possible_colors: Vec<Option<ColorId>> = vec![None];
        for &color in solution.non_empty_colors() {
            if Some(color) != solution.color(vertex) {
                possible_colors.push(Some(color));
            }
        }
        let &color = possible_colors.choose(rng).expect("at least the fresh color");
        Coloration { vertex, color }
    });

    solution.delete_from_color(chosen_one.vertex);
    solution.add_to_color(chosen_one.vertex, chosen_one.color);
    tabu_list[chosen_one.vertex] = true;
    true
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::graph::testing::{complete, path};
    use crate::parameters::{Method, Parameters};
    use crate::search::greedy::{greedy_deterministic, greedy_worst};
    use crate::solution::BestBounds;

    #[test]
    fn test_wrapper_weighted_penalty() {
        let graph = complete(4, vec![4, 3, 2, 1]);
        let mut sol = Solution::new(graph);
        let c0 = sol.add_to_color(0, None);
        sol.add_to_color(2, None);
        sol.add_to_color(3, None);
        sol.add_to_color(1, None);
        let mut wrapper = RedlsSolution::new(sol);
        assert_eq!(wrapper.penalty(), 0);
        // move vertex 1 next to vertex 0
        wrapper.delete_from_color(1);
        wrapper.add_to_color(1, Some(c0));
        assert_eq!(wrapper.penalty(), 1);
        assert_eq!(wrapper.conflict_edges(), &[(0, 1)]);
        assert!(wrapper.check());
        // bumping the weights doubles the cost of the stuck edge
        wrapper.increment_edge_weights();
        assert_eq!(wrapper.penalty(), 2);
        wrapper.delete_from_color(1);
        assert_eq!(wrapper.penalty(), 0);
        assert!(wrapper.conflict_edges().is_empty());
        wrapper.add_to_color(1, None);
        assert!(wrapper.check());
    }

    #[test]
    fn test_redls_improves_worst_start() {
        let graph = path(3, vec![3, 2, 1]);
        let mut params = Parameters::silent(Method::LocalSearch, 10, 5);
        params.nb_iter_local_search = 500;
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
        redls(&mut sol, &mut context);
        assert_eq!(sol.score_wvcp(), 5);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }

    #[test]
    fn test_redls_freeze_respects_prefix() {
        let graph = path(4, vec![4, 3, 2, 1]);
        let mut params = Parameters::silent(Method::LocalSearch, 5, -1);
        params.nb_iter_local_search = 100;
        let mut rng = StdRng::seed_from_u64(1);
        let mut bounds = BestBounds::new();
        let mut sol = Solution::new(graph.clone());
        let c0 = sol.add_to_color(0, None);
        sol.increment_first_free_vertex();
        greedy_deterministic(&mut sol);
        let mut context = SearchContext {
            params: &params,
            bounds: &mut bounds,
            rng: &mut rng,
            verbose: false,
        };
        redls_freeze(&mut sol, &mut context);
        assert_eq!(sol.color(0), Some(c0));
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }
}
