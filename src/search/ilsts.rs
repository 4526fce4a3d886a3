use dogs::data_structures::sparse_set::SparseSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::{ColorId, VertexId, Weight};
use crate::search::{print_result_ls, SearchContext};
use crate::solution::Solution;

/** Decorator over a [`Solution`] for the grenade search: tracks, for every
vertex, the number of *free* colors (used colors with no neighbor of the
vertex, other than its own, whose heaviest weight would absorb it), plus the
set of currently unassigned vertices and the score of the last complete
assignment. */
#[derive(Debug)]
pub struct IlstsSolution {
    solution: Solution,
    /// nb_free_colors[v]: used colors c with no conflict for v, c not the
    /// color of v, and weights[v] <= max_weight(c)
    nb_free_colors: Vec<i64>,
    /// currently unassigned vertices
    unassigned: SparseSet,
    /// score of the solution before its heavy vertices were unassigned
    unassigned_score: Weight,
}

impl Clone for IlstsSolution {
    fn clone(&self) -> Self {
        let mut unassigned = SparseSet::new(self.solution.graph().nb_vertices);
        for i in 0..self.unassigned.len() {
            unassigned.insert(self.unassigned.nth(i));
        }
        Self {
            solution: self.solution.clone(),
            nb_free_colors: self.nb_free_colors.clone(),
            unassigned,
            unassigned_score: self.unassigned_score,
        }
    }
}

impl IlstsSolution {
    /// wraps a (conflict-free) solution, computing the free-color counts
    pub fn new(solution: Solution) -> Self {
        let nb_vertices = solution.graph().nb_vertices;
        let mut nb_free_colors = vec![0; nb_vertices];
        for (vertex, free) in nb_free_colors.iter_mut().enumerate() {
            for color in 0..solution.nb_colors() {
                if solution.conflicts_colors(color, vertex) == 0
                    && solution.color(vertex) != Some(color)
                    && !solution.is_color_empty(color)
                    && solution.graph().weights[vertex] <= solution.max_weight(color)
                {
                    *free += 1;
                }
            }
        }
        let unassigned_score = solution.score_wvcp();
        Self {
            solution,
            nb_free_colors,
            unassigned: SparseSet::new(nb_vertices),
            unassigned_score,
        }
    }

    /// colors the vertex, keeping the free-color counts current
    pub fn add_to_color(&mut self, vertex: VertexId, proposed: Option<ColorId>) -> ColorId {
        let old_max_weight = proposed.map_or(0, |c| self.solution.max_weight(c));
        let color = self.solution.add_to_color(vertex, proposed);
        let graph = self.solution.graph().clone();

        // neighbors for which this color was free see their last
        // conflict-free slot disappear
        for &neighbor in &graph.neighborhood[vertex] {
            if self.solution.conflicts_colors(color, neighbor) == 1
                && graph.weights[neighbor] <= old_max_weight
            {
                self.nb_free_colors[neighbor] -= 1;
            }
        }

        if graph.weights[vertex] > old_max_weight {
            // the class got heavier: it opens up for every outside vertex
            // whose weight now fits under the new maximum
            for vertex_out in 0..graph.nb_vertices {
                if self.solution.color(vertex_out) == Some(color) {
                    continue;
                }
                if graph.weights[vertex_out] > old_max_weight
                    && graph.weights[vertex_out] <= graph.weights[vertex]
                    && self.solution.conflicts_colors(color, vertex_out) == 0
                {
                    self.nb_free_colors[vertex_out] += 1;
                }
            }
        } else {
            // the vertex consumed one of its own free colors
            self.nb_free_colors[vertex] -= 1;
        }
        color
    }

    /// uncolors the vertex, keeping the free-color counts current
    pub fn delete_from_color(&mut self, vertex: VertexId) -> ColorId {
        let old_weight = self
            .solution
            .color(vertex)
            .map_or(0, |c| self.solution.max_weight(c));
        let color = self.solution.delete_from_color(vertex);
        let graph = self.solution.graph().clone();

        for &neighbor in &graph.neighborhood[vertex] {
            if self.solution.conflicts_colors(color, neighbor) == 0
                && graph.weights[neighbor] <= old_weight
            {
                self.nb_free_colors[neighbor] += 1;
            }
        }

        let vertex_weight = graph.weights[vertex];
        let max_weight_color = self.solution.max_weight(color);

        if vertex_weight == old_weight {
            // the class got lighter: it closes for the outside vertices
            // whose weight no longer fits under the new maximum
            for vertex_out in 0..graph.nb_vertices {
                if self.solution.color(vertex_out) == Some(color) {
                    continue;
                }
                if graph.weights[vertex_out] <= old_weight
                    && graph.weights[vertex_out] > max_weight_color
                    && self.solution.conflicts_colors(color, vertex_out) == 0
                    && vertex_out != vertex
                {
                    self.nb_free_colors[vertex_out] -= 1;
                }
            }
        }

        if old_weight == max_weight_color {
            self.nb_free_colors[vertex] += 1;
        }
        color
    }

    /** unassigns every heaviest vertex of `force` random used colors, then
    tries to reinsert them without raising the score; the leftovers form the
    unassigned set. */
    pub fn unassign_random_heavy_vertices(&mut self, force: i64, rng: &mut StdRng) {
        self.unassigned_score = self.solution.score_wvcp();
        let mut removed: Vec<VertexId> = Vec::new();
        for _ in 0..force {
            let color = match self.solution.non_empty_colors().choose(rng) {
                None => break,
                Some(&c) => c,
            };
            let old_max_weight = self.solution.max_weight(color);
            let to_unassign: Vec<VertexId> = self
                .solution
                .colors_vertices(color)
                .iter()
                .copied()
                .filter(|&v| self.solution.graph().weights[v] == old_max_weight)
                .collect();
            for vertex in to_unassign {
                self.delete_from_color(vertex);
                removed.push(vertex);
            }
        }
        removed.shuffle(rng);
        for vertex in removed {
            if !self.random_assignment_constrained(vertex, rng) {
                self.unassigned.insert(vertex);
            }
        }
    }

    /** one random grenade per unit of `force`: a random vertex is thrown
    into a random other color, the displaced neighbors are reinserted,
    score increases allowed as a last resort. */
    pub fn perturb_vertices(&mut self, force: i64, rng: &mut StdRng) {
        debug_assert!(!self.has_unassigned_vertices());
        let graph = self.solution.graph().clone();
        for _ in 0..force {
            let mut vertex = 0;
            let mut color = self.solution.color(vertex);
            while self.solution.color(vertex) == color {
                vertex = rng.gen_range(0..graph.nb_vertices);
                color = self.solution.non_empty_colors().choose(rng).copied();
            }
            let color = color.expect("a used color was drawn");

            self.delete_from_color(vertex);
            let mut displaced: Vec<VertexId> = Vec::new();
            for &neighbor in &graph.neighborhood[vertex] {
                if self.solution.color(neighbor) == Some(color) {
                    displaced.push(neighbor);
                    self.delete_from_color(neighbor);
                }
            }
            let target = if self.solution.is_color_empty(color) {
                None
            } else {
                Some(color)
            };
            self.add_to_color(vertex, target);

            displaced.shuffle(rng);
            let mut to_random: Vec<VertexId> = Vec::new();
            for v in displaced {
                if !self.random_assignment_constrained(v, rng) {
                    to_random.push(v);
                }
            }
            for v in to_random {
                let available = self.solution.available_colors(v);
                let &choice = available.choose(rng).expect("available colors");
                self.add_to_color(v, choice);
            }
        }
    }

    /** recolors the vertex with a random used color that absorbs its weight
    (no score increase). Returns false when no such color exists; the vertex
    is then left unassigned if it was assigned to begin with. */
    pub fn random_assignment_constrained(&mut self, vertex: VertexId, rng: &mut StdRng) -> bool {
        let available = self.solution.available_colors(vertex);
        if available[0].is_none() {
            return false;
        }
        let vertex_weight = self.solution.graph().weights[vertex];
        let vertex_color = self.solution.color(vertex);
        let possible: Vec<ColorId> = available
            .iter()
            .filter_map(|&c| c)
            .filter(|&c| Some(c) != vertex_color && vertex_weight <= self.solution.max_weight(c))
            .collect();

        if vertex_color.is_some() {
            self.delete_from_color(vertex);
        }
        match possible.choose(rng) {
            None => false,
            Some(&color) => {
                self.add_to_color(vertex, Some(color));
                true
            }
        }
    }

    /// batch reinsertion; the vertices that cannot be placed join the
    /// unassigned set
    pub fn random_assignment_constrained_batch(
        &mut self,
        vertices: Vec<VertexId>,
        rng: &mut StdRng,
    ) {
        for vertex in vertices {
            if !self.random_assignment_constrained(vertex, rng) {
                self.unassigned.insert(vertex);
            }
        }
    }

    /// score of the last complete assignment
    pub fn unassigned_score(&self) -> Weight {
        self.unassigned_score
    }

    /// current score when complete, the pre-grenade score otherwise
    pub fn get_score(&self) -> Weight {
        if self.has_unassigned_vertices() {
            self.unassigned_score
        } else {
            self.solution.score_wvcp()
        }
    }

    /// whether some vertices still miss a color
    pub fn has_unassigned_vertices(&self) -> bool {
        self.unassigned.len() > 0
    }

    /// snapshot of the unassigned vertices
    pub fn unassigned_vertices(&self) -> Vec<VertexId> {
        (0..self.unassigned.len()).map(|i| self.unassigned.nth(i)).collect()
    }

    /// uniformly random unassigned vertex
    pub fn random_unassigned(&self, rng: &mut StdRng) -> VertexId {
        self.unassigned.nth(rng.gen_range(0..self.unassigned.len()))
    }

    /// registers an unassigned vertex
    pub fn add_unassigned_vertex(&mut self, vertex: VertexId) {
        self.unassigned.insert(vertex);
    }

    /// unregisters a vertex that got a color back
    pub fn remove_unassigned_vertex(&mut self, vertex: VertexId) {
        self.unassigned.remove(vertex);
    }

    /// free-color count of the vertex
    pub fn nb_free_colors(&self, vertex: VertexId) -> i64 {
        self.nb_free_colors[vertex]
    }

    /// wrapped solution
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    /// color of the vertex
    pub fn color(&self, vertex: VertexId) -> Option<ColorId> {
        self.solution.color(vertex)
    }

    /// WVCP score of the wrapped solution
    pub fn score_wvcp(&self) -> Weight {
        self.solution.score_wvcp()
    }

    /// used colors
    pub fn non_empty_colors(&self) -> &[ColorId] {
        self.solution.non_empty_colors()
    }

    /// number of used colors
    pub fn nb_non_empty_colors(&self) -> usize {
        self.solution.nb_non_empty_colors()
    }

    /// number of opened colors
    pub fn nb_colors(&self) -> usize {
        self.solution.nb_colors()
    }

    /// heaviest weight of the class
    pub fn max_weight(&self, color: ColorId) -> Weight {
        self.solution.max_weight(color)
    }

    /// whether the color holds no vertex
    pub fn is_color_empty(&self, color: ColorId) -> bool {
        self.solution.is_color_empty(color)
    }

    /// number of neighbors of the vertex in the color
    pub fn conflicts_colors(&self, color: ColorId, vertex: VertexId) -> i64 {
        self.solution.conflicts_colors(color, vertex)
    }

    /// consistency of the wrapper bookkeeping (tests and debug assertions)
    pub fn check(&self) -> bool {
        let nb_vertices = self.solution.graph().nb_vertices;
        for vertex in 0..nb_vertices {
            let mut free = 0;
            for color in 0..self.solution.nb_colors() {
                if self.solution.conflicts_colors(color, vertex) == 0
                    && self.solution.color(vertex) != Some(color)
                    && !self.solution.is_color_empty(color)
                    && self.solution.graph().weights[vertex] <= self.solution.max_weight(color)
                {
                    free += 1;
                }
            }
            if self.nb_free_colors[vertex] != free {
                return false;
            }
        }
        let nb_unassigned = (0..nb_vertices)
            .filter(|&v| self.solution.color(v).is_none())
            .count();
        if nb_unassigned != self.unassigned.len() {
            return false;
        }
        for vertex in self.unassigned_vertices() {
            if self.solution.color(vertex).is_some() {
                return false;
            }
        }
        self.solution.check()
    }
}

/** ILSTS: each outer iteration throws a grenade at the heaviest vertices of
a few random colors and repairs the coloring with the movement operators
M1..M6, adopting the candidate when it strictly improves. The perturbation
strength escalates on stagnation. */
pub fn ilsts(best_solution: &mut Solution, context: &mut SearchContext) {
    let params = context.params;
    let nb_vertices = best_solution.graph().nb_vertices;
    let max_time = params.sub_method_deadline();
    let mut best_time = 0;

    let mut working_solution = IlstsSolution::new(best_solution.clone());
    let mut tabu: Vec<i64> = vec![0; nb_vertices];

    let mut no_improve: i64 = 1;
    let mut turn: i64 = 0;
    let mut force: i64 = 1;
    let mut vertices: Vec<VertexId> = (0..nb_vertices).collect();

    while turn < params.nb_iter_local_search
        && !params.time_limit_reached_sub_method(max_time)
        && !params.target_reached(best_solution.score_wvcp())
    {
        turn += 1;
        let mut next_s = working_solution.clone();
        next_s.unassign_random_heavy_vertices(force, context.rng);

        let mut iter: i64 = 0;
        while next_s.has_unassigned_vertices()
            && iter < nb_vertices as i64 * 10
            && !params.time_limit_reached_sub_method(max_time)
        {
            iter += 1;
            if next_s.has_unassigned_vertices() && move_1_2_3(&mut next_s, iter, &mut tabu, context.rng)
            {
                debug_assert!(next_s.check());
                continue;
            }
            vertices.shuffle(context.rng);
            if next_s.has_unassigned_vertices()
                && move_4(&mut next_s, iter, &vertices, &mut tabu, context.rng)
            {
                debug_assert!(next_s.check());
                continue;
            }
            if next_s.has_unassigned_vertices()
                && move_5(&mut next_s, iter, &vertices, &mut tabu, context.rng)
            {
                debug_assert!(next_s.check());
                continue;
            }
            if next_s.has_unassigned_vertices() && move_6(&mut next_s, iter, &mut tabu, context.rng)
            {
                debug_assert!(next_s.check());
                continue;
            }
            break;
        }

        if next_s.get_score() < working_solution.get_score() {
            no_improve = 1;
            working_solution = next_s;
            force = 1;
        } else if no_improve <= nb_vertices as i64 {
            no_improve += 1;
            force = if force == 3 { 1 } else { force + 1 };
        } else if !working_solution.has_unassigned_vertices() {
            working_solution.perturb_vertices(1, context.rng);
            no_improve = 1;
        } else {
            no_improve = 1;
        }

        if !working_solution.has_unassigned_vertices()
            && best_solution.score_wvcp() > working_solution.score_wvcp()
        {
            *best_solution = working_solution.solution().clone();
            if context.verbose {
                best_time = params.elapsed_seconds();
                print_result_ls(params, best_time, best_solution, turn);
            }
        } else if !working_solution.has_unassigned_vertices()
            && best_solution.score_wvcp() == working_solution.score_wvcp()
        {
            *best_solution = working_solution.solution().clone();
        }
    }
    if context.verbose {
        print_result_ls(params, best_time, best_solution, turn);
    }
}

/** M1: place an unassigned vertex in a conflict-free color that does not
raise the score. M2: perfect grenade, every same-colored neighbor of the
target color relocates to a free color. M3 (fallback, collected during the
scan): grenade losing exactly one neighbor to the unassigned set. */
fn move_1_2_3(
    solution: &mut IlstsSolution,
    iter: i64,
    tabu: &mut [i64],
    rng: &mut StdRng,
) -> bool {
    let graph = solution.solution().graph().clone();
    let delta = solution.unassigned_score() - solution.score_wvcp();

    let mut grenade_one_lost: Vec<(VertexId, ColorId)> = Vec::new();
    let mut non_empty_colors: Vec<ColorId> = solution.non_empty_colors().to_vec();
    non_empty_colors.shuffle(rng);

    for vertex in solution.unassigned_vertices() {
        let vertex_weight = graph.weights[vertex];

        // M1
        for &color in &non_empty_colors {
            if solution.conflicts_colors(color, vertex) == 0
                && delta > std::cmp::max(0, vertex_weight - solution.max_weight(color))
            {
                solution.add_to_color(vertex, Some(color));
                solution.remove_unassigned_vertex(vertex);
                return true;
            }
        }

        // M2: count, per color, the neighbors that can relocate; costs
        // counts the ones only movable by unassigning them
        let mut costs: Vec<i64> = vec![0; solution.nb_colors()];
        let mut relocated: Vec<i64> = vec![0; solution.nb_colors()];
        for &neighbor in &graph.neighborhood[vertex] {
            let neighbor_color = match solution.color(neighbor) {
                None => continue,
                Some(c) => c,
            };
            if delta <= std::cmp::max(0, vertex_weight - solution.max_weight(neighbor_color)) {
                continue;
            }
            if solution.nb_free_colors(neighbor) > 0 {
                relocated[neighbor_color] += 1;
            } else if tabu[neighbor] < iter {
                relocated[neighbor_color] += 1;
                costs[neighbor_color] += 1;
            }
            if relocated[neighbor_color] != solution.conflicts_colors(neighbor_color, vertex) {
                continue;
            }
            if costs[neighbor_color] == 0 {
                // perfect grenade
                let mut displaced: Vec<VertexId> = Vec::new();
                for &y in &graph.neighborhood[vertex] {
                    if solution.color(y) == Some(neighbor_color) {
                        debug_assert!(solution.nb_free_colors(y) > 0);
                        solution.delete_from_color(y);
                        displaced.push(y);
                    }
                }
                let target = if solution.is_color_empty(neighbor_color) {
                    None
                } else {
                    Some(neighbor_color)
                };
                solution.add_to_color(vertex, target);
                solution.random_assignment_constrained_batch(displaced, rng);
                solution.remove_unassigned_vertex(vertex);
                return true;
            }
            if costs[neighbor_color] == 1 {
                grenade_one_lost.push((vertex, neighbor_color));
            }
        }
    }
    move_3(solution, iter, &grenade_one_lost, tabu, rng)
}

/// applies one of the collected one-lost grenades
fn move_3(
    solution: &mut IlstsSolution,
    iter: i64,
    grenade_one_lost: &[(VertexId, ColorId)],
    tabu: &mut [i64],
    rng: &mut StdRng,
) -> bool {
    let &(vertex, min_color) = match grenade_one_lost.choose(rng) {
        None => return false,
        Some(candidate) => candidate,
    };
    let graph = solution.solution().graph().clone();
    let mut displaced: Vec<VertexId> = Vec::new();
    for &y in &graph.neighborhood[vertex] {
        if solution.color(y) == Some(min_color) {
            if solution.nb_free_colors(y) > 0 {
                displaced.push(y);
            } else {
                solution.add_unassigned_vertex(y);
            }
            solution.delete_from_color(y);
        }
    }
    let target = if solution.is_color_empty(min_color) {
        None
    } else {
        Some(min_color)
    };
    solution.add_to_color(vertex, target);
    tabu[vertex] = iter + solution.nb_non_empty_colors() as i64;
    solution.random_assignment_constrained_batch(displaced, rng);
    solution.remove_unassigned_vertex(vertex);
    true
}

/// M4: moves up to `nb_non_empty_colors` non-tabu colored vertices with a
/// free color to another free color
fn move_4(
    solution: &mut IlstsSolution,
    iter: i64,
    vertices: &[VertexId],
    tabu: &mut [i64],
    rng: &mut StdRng,
) -> bool {
    let max_counter = solution.nb_non_empty_colors() as i64;
    let mut counter = 0;
    for &vertex in vertices {
        if solution.nb_free_colors(vertex) > 0 && tabu[vertex] < iter && solution.color(vertex).is_some()
        {
            tabu[vertex] = iter + solution.nb_non_empty_colors() as i64;
            if !solution.random_assignment_constrained(vertex, rng) {
                solution.add_unassigned_vertex(vertex);
            }
            counter += 1;
            if counter == max_counter {
                return true;
            }
        }
    }
    counter > 0
}

/// M5: vacates a target color around a stuck vertex (no free color, not
/// tabu) by relocating the neighbors that can move, then recolors it
fn move_5(
    solution: &mut IlstsSolution,
    iter: i64,
    vertices: &[VertexId],
    tabu: &mut [i64],
    rng: &mut StdRng,
) -> bool {
    let graph = solution.solution().graph().clone();
    let delta = solution.unassigned_score() - solution.score_wvcp();

    for &vertex in vertices {
        if solution.nb_free_colors(vertex) != 0
            || tabu[vertex] >= iter
            || solution.color(vertex).is_none()
        {
            continue;
        }
        let mut relocated: Vec<i64> = vec![0; solution.nb_colors()];
        for &neighbor in &graph.neighborhood[vertex] {
            let neighbor_color = match solution.color(neighbor) {
                None => continue,
                Some(c) => c,
            };
            if delta > std::cmp::max(0, graph.weights[vertex] - solution.max_weight(neighbor_color))
                && solution.nb_free_colors(neighbor) > 0
            {
                relocated[neighbor_color] += 1;
            }
            if relocated[neighbor_color] == solution.conflicts_colors(neighbor_color, vertex) {
                let mut displaced: Vec<VertexId> = Vec::new();
                for &y in &graph.neighborhood[vertex] {
                    if solution.color(y) == Some(neighbor_color) && solution.nb_free_colors(y) > 0 {
                        solution.delete_from_color(y);
                        displaced.push(y);
                    }
                }
                solution.delete_from_color(vertex);
                tabu[vertex] = iter + solution.nb_non_empty_colors() as i64;
                let target = if solution.is_color_empty(neighbor_color) {
                    None
                } else {
                    Some(neighbor_color)
                };
                solution.add_to_color(vertex, target);
                solution.random_assignment_constrained_batch(displaced, rng);
                return true;
            }
        }
    }
    false
}

/// M6: grenade on a random unassigned vertex, into the color losing the
/// fewest neighbors; resets the tabu list
fn move_6(solution: &mut IlstsSolution, iter: i64, tabu: &mut [i64], rng: &mut StdRng) -> bool {
    let graph = solution.solution().graph().clone();
    let delta = solution.unassigned_score() - solution.score_wvcp();
    let vertex = solution.random_unassigned(rng);

    let mut relocated: Vec<i64> = vec![0; solution.nb_colors()];
    let mut costs: Vec<i64> = vec![0; solution.nb_colors()];
    let mut min_cost = graph.nb_vertices as i64;
    let mut min_cost_color: Option<ColorId> = None;

    for &neighbor in &graph.neighborhood[vertex] {
        let neighbor_color = match solution.color(neighbor) {
            None => continue,
            Some(c) => c,
        };
        if delta > std::cmp::max(0, graph.weights[vertex] - solution.max_weight(neighbor_color)) {
            relocated[neighbor_color] += 1;
            if solution.nb_free_colors(neighbor) == 0 {
                costs[neighbor_color] += 1;
            }
            if relocated[neighbor_color] == solution.conflicts_colors(neighbor_color, vertex)
                && min_cost > costs[neighbor_color]
            {
                min_cost_color = Some(neighbor_color);
                min_cost = costs[neighbor_color];
            }
        }
    }

    let min_color = match min_cost_color {
        None => return false,
        Some(c) => c,
    };
    for entry in tabu.iter_mut() {
        *entry = 0;
    }
    let mut displaced: Vec<VertexId> = Vec::new();
    for &y in &graph.neighborhood[vertex] {
        if solution.color(y) == Some(min_color) {
            if solution.nb_free_colors(y) > 0 {
                displaced.push(y);
            } else {
                solution.add_unassigned_vertex(y);
            }
            solution.delete_from_color(y);
        }
    }
    tabu[vertex] = iter + solution.nb_non_empty_colors() as i64;
    let target = if solution.is_color_empty(min_color) {
        None
    } else {
        Some(min_color)
    };
    solution.add_to_color(vertex, target);
    solution.random_assignment_constrained_batch(displaced, rng);
    solution.remove_unassigned_vertex(vertex);
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
    fn test_wrapper_free_colors() {
        let graph = path(4, vec![4, 3, 2, 1]);
        let mut sol = Solution::new(graph);
        greedy_deterministic(&mut sol);
        let wrapper = IlstsSolution::new(sol);
        assert!(wrapper.check());
    }

    #[test]
    fn test_wrapper_tracks_moves() {
        let graph = complete(4, vec![4, 3, 2, 1]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sol = Solution::new(graph);
        greedy_deterministic(&mut sol);
        let mut wrapper = IlstsSolution::new(sol);
        assert!(wrapper.check());
        wrapper.unassign_random_heavy_vertices(2, &mut rng);
        assert!(wrapper.check());
    }

    #[test]
    fn test_ilsts_improves_worst_start() {
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
        ilsts(&mut sol, &mut context);
        assert_eq!(sol.score_wvcp(), 5);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }
}
