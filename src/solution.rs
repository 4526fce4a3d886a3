use std::collections::BTreeSet;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::graph::{ColorId, Graph, VertexId, Weight};

/// Process-wide best bounds, threaded through the search.
/// Read by the MCTS pruning and by the color-budget operators.
#[derive(Debug, Clone, Copy)]
pub struct BestBounds {
    /// best WVCP score found (or the target when pruning against it)
    pub score_wvcp: Weight,
    /// smallest number of colors of a feasible solution seen so far
    pub nb_colors: usize,
}

impl BestBounds {
    /// starts with no known bound
    pub fn new() -> Self {
        Self {
            score_wvcp: Weight::MAX,
            nb_colors: usize::MAX,
        }
    }
}

impl Default for BestBounds {
    fn default() -> Self {
        Self::new()
    }
}

/** Coloring of the instance, partial or complete, possibly with conflicts.

Every mutation goes through [`Solution::add_to_color`] and
[`Solution::delete_from_color`], which maintain incrementally:
the per-color conflict counts, the WVCP score, the penalty (number of
conflicting edges, each counted once), the number of conflicting vertices
and the used/recycled color lists.
*/
#[derive(Debug, Clone)]
pub struct Solution {
    /// shared instance
    graph: Rc<Graph>,
    /// colors[v]: color of vertex v, None when unassigned
    colors: Vec<Option<ColorId>>,
    /// colors_vertices[c]: vertices colored with c, keyed by vertex index.
    /// Under the (weight desc, degree desc) vertex presort the first element
    /// of a class is its heaviest vertex.
    colors_vertices: Vec<BTreeSet<VertexId>>,
    /// heaviest_weight[c]: max weight in class c, 0 when empty
    heaviest_weight: Vec<Weight>,
    /// conflicts_colors[c][v]: number of neighbors of v colored with c
    conflicts_colors: Vec<Vec<i64>>,
    /// number of opened colors (not automatically all used)
    nb_colors: usize,
    /// list of used colors
    non_empty_colors: Vec<ColorId>,
    /// list of opened but currently unused colors
    empty_colors: Vec<ColorId>,
    /// next vertex to color in the MCTS tree
    first_free_vertex: VertexId,
    /// WVCP score: sum of the heaviest weight of each used color
    score_wvcp: Weight,
    /// number of conflicting edges
    penalty: i64,
    /// number of assigned vertices with at least one same-colored neighbor
    nb_conflicting_vertices: usize,
}

impl Solution {
    /// csv columns of [`Solution::line_csv`]
    pub const HEADER_CSV: &'static str = "nb_colors,penalty,score,solution";

    /// creates an empty coloring of the instance
    pub fn new(graph: Rc<Graph>) -> Self {
        let nb_vertices = graph.nb_vertices;
        Self {
            graph,
            colors: vec![None; nb_vertices],
            colors_vertices: Vec::new(),
            heaviest_weight: Vec::new(),
            conflicts_colors: Vec::new(),
            nb_colors: 0,
            non_empty_colors: Vec::new(),
            empty_colors: Vec::new(),
            first_free_vertex: 0,
            score_wvcp: 0,
            penalty: 0,
            nb_conflicting_vertices: 0,
        }
    }

    /// opens a color: reuse a recycled index if possible, else allocate one
    fn open_color(&mut self) -> ColorId {
        match self.empty_colors.pop() {
            Some(color) => {
                self.non_empty_colors.push(color);
                color
            }
            None => {
                let color = self.nb_colors;
                self.nb_colors += 1;
                self.conflicts_colors.push(vec![0; self.graph.nb_vertices]);
                self.colors_vertices.push(BTreeSet::new());
                self.heaviest_weight.push(0);
                self.non_empty_colors.push(color);
                color
            }
        }
    }

    /** Colors the vertex with the color (`None` asks for a fresh color).
    The vertex must be unassigned. An explicitly given color may be a
    currently empty recycled index; it is then marked used again.
    Returns the color actually used. */
    pub fn add_to_color(&mut self, vertex: VertexId, color: Option<ColorId>) -> ColorId {
        debug_assert!(self.colors[vertex].is_none());
        let graph = self.graph.clone();
        let color = match color {
            Some(color) => {
                if self.colors_vertices[color].is_empty() {
                    self.empty_colors.retain(|&c| c != color);
                    self.non_empty_colors.push(color);
                }
                color
            }
            None => self.open_color(),
        };

        // penalty counts each conflicting edge once: the edges towards
        // neighbors already in the class appear now
        let nb_conflicts = self.conflicts_colors[color][vertex];
        self.penalty += nb_conflicts;
        if nb_conflicts > 0 {
            self.nb_conflicting_vertices += 1;
        }

        for &neighbor in &graph.neighborhood[vertex] {
            self.conflicts_colors[color][neighbor] += 1;
            if self.colors[neighbor] == Some(color) && self.conflicts_colors[color][neighbor] == 1 {
                self.nb_conflicting_vertices += 1;
            }
        }

        let old_max_weight = self.heaviest_weight[color];
        let vertex_weight = graph.weights[vertex];
        self.colors_vertices[color].insert(vertex);
        self.colors[vertex] = Some(color);
        if vertex_weight > old_max_weight {
            self.score_wvcp += vertex_weight - old_max_weight;
            self.heaviest_weight[color] = vertex_weight;
        }
        color
    }

    /** Removes the color of the vertex, returns the color it had.
    The color index is recycled when its class becomes empty. */
    pub fn delete_from_color(&mut self, vertex: VertexId) -> ColorId {
        let color = self.colors[vertex].expect("delete_from_color: vertex is unassigned");
        let graph = self.graph.clone();

        let nb_conflicts = self.conflicts_colors[color][vertex];
        self.penalty -= nb_conflicts;
        if nb_conflicts > 0 {
            self.nb_conflicting_vertices -= 1;
        }

        for &neighbor in &graph.neighborhood[vertex] {
            if self.colors[neighbor] == Some(color) && self.conflicts_colors[color][neighbor] == 1 {
                self.nb_conflicting_vertices -= 1;
            }
            self.conflicts_colors[color][neighbor] -= 1;
        }

        let delta_score = self.delta_wvcp_score_old_color(vertex);
        self.score_wvcp += delta_score;
        if delta_score != 0 {
            // the class set still contains the vertex: its second element
            // carries the new heaviest weight (vertex presort)
            self.heaviest_weight[color] = self.second_max_weight(color);
        }

        self.colors_vertices[color].remove(&vertex);
        self.colors[vertex] = None;

        if self.colors_vertices[color].is_empty() {
            let position = self
                .non_empty_colors
                .iter()
                .position(|&c| c == color)
                .expect("delete_from_color: color not listed as used");
            self.non_empty_colors.swap_remove(position);
            self.empty_colors.push(color);
        }
        color
    }

    /** score change if the vertex lost its color (0 unless it is the
    strictly heaviest of its class). */
    pub fn delta_wvcp_score_old_color(&self, vertex: VertexId) -> Weight {
        let color = self.colors[vertex].expect("delta_wvcp_score_old_color: unassigned vertex");
        let vertex_weight = self.graph.weights[vertex];
        if self.colors_vertices[color].len() == 1 {
            return -vertex_weight;
        }
        let second_max = self.second_max_weight(color);
        if vertex_weight == self.heaviest_weight[color] && second_max < vertex_weight {
            return second_max - vertex_weight;
        }
        0
    }

    /** hypothetical score change if the vertex were moved to the color
    (`None` = a fresh class), including the effect of vacating its current
    color. Never performs the move; also defined for an unassigned vertex. */
    pub fn delta_wvcp_score(&self, vertex: VertexId, color: Option<ColorId>) -> Weight {
        let vertex_weight = self.graph.weights[vertex];
        let diff = if self.colors[vertex].is_some() {
            self.delta_wvcp_score_old_color(vertex)
        } else {
            0
        };
        match color {
            None => vertex_weight + diff,
            Some(c) if self.is_color_empty(c) => vertex_weight + diff,
            Some(c) => {
                let old_max_weight = self.heaviest_weight[c];
                if vertex_weight > old_max_weight {
                    vertex_weight - old_max_weight + diff
                } else {
                    diff
                }
            }
        }
    }

    /** conflict-count change if the assigned vertex moved to the color
    (`None` = a fresh class, which cannot conflict). */
    pub fn delta_conflicts(&self, vertex: VertexId, color: Option<ColorId>) -> i64 {
        let own = self.conflicts_colors[self.colors[vertex].expect("delta_conflicts: unassigned")]
            [vertex];
        match color {
            None => -own,
            Some(c) => self.conflicts_colors[c][vertex] - own,
        }
    }

    /** used colors where the vertex has no neighbor; the singleton `[None]`
    when every used color conflicts. */
    pub fn available_colors(&self, vertex: VertexId) -> Vec<Option<ColorId>> {
        let mut available: Vec<Option<ColorId>> = self
            .non_empty_colors
            .iter()
            .filter(|&&color| self.conflicts_colors[color][vertex] == 0)
            .map(|&color| Some(color))
            .collect();
        if available.is_empty() {
            available.push(None);
        }
        available
    }

    /// first used color without conflict for the vertex, None otherwise
    pub fn first_available_color(&self, vertex: VertexId) -> Option<ColorId> {
        self.non_empty_colors
            .iter()
            .find(|&&color| self.conflicts_colors[color][vertex] == 0)
            .copied()
    }

    /** repeatedly unassigns a vertex chosen uniformly among the assigned
    vertices with the most same-color neighbors, until no conflict remains. */
    pub fn clean_conflicts(&mut self, rng: &mut StdRng) {
        while self.nb_conflicting_vertices != 0 {
            let mut nb_max_conflicts = 0;
            let mut max_vertices: Vec<VertexId> = Vec::new();
            for vertex in 0..self.graph.nb_vertices {
                let color = match self.colors[vertex] {
                    None => continue,
                    Some(color) => color,
                };
                let nb_conflicts = self.conflicts_colors[color][vertex];
                if nb_conflicts == 0 || nb_conflicts < nb_max_conflicts {
                    continue;
                }
                if nb_conflicts > nb_max_conflicts {
                    nb_max_conflicts = nb_conflicts;
                    max_vertices.clear();
                }
                max_vertices.push(vertex);
            }
            let &vertex = max_vertices.choose(rng).expect("conflicting vertex expected");
            self.delete_from_color(vertex);
        }
    }

    /** finds the ordered pair (c1, c2) of distinct used colors minimizing
    the conflicts created by sending every vertex of c1 into c2, then does
    exactly that. No-op when fewer than two colors are used. */
    pub fn remove_one_color_and_create_conflicts(&mut self) {
        if self.non_empty_colors.len() < 2 {
            return;
        }
        let mut best_sum_conflicts = self.graph.nb_vertices as i64;
        let mut best_pair: Option<(ColorId, ColorId)> = None;
        for &color1 in &self.non_empty_colors {
            for &color2 in &self.non_empty_colors {
                if color1 == color2 {
                    continue;
                }
                let sum_conflicts: i64 = self.colors_vertices[color1]
                    .iter()
                    .map(|&vertex| self.conflicts_colors[color2][vertex])
                    .sum();
                if sum_conflicts < best_sum_conflicts || best_pair.is_none() {
                    best_sum_conflicts = sum_conflicts;
                    best_pair = Some((color1, color2));
                }
            }
        }
        let (color1, color2) = best_pair.expect("two used colors expected");
        let to_move: Vec<VertexId> = self.colors_vertices[color1].iter().copied().collect();
        for vertex in to_move {
            self.delete_from_color(vertex);
            self.add_to_color(vertex, Some(color2));
        }
    }

    /** compacts the color indices so that the lowest indices are the used
    ones (called before exporting a solution). */
    pub fn reorganize_colors(&mut self) {
        loop {
            let min_empty = match self.empty_colors.iter().min() {
                None => return,
                Some(&c) => c,
            };
            let max_used = match self.non_empty_colors.iter().max() {
                None => return,
                Some(&c) => c,
            };
            if min_empty > max_used {
                return;
            }
            let vertices: Vec<VertexId> = self.colors_vertices[max_used].iter().copied().collect();
            for &vertex in &vertices {
                self.delete_from_color(vertex);
            }
            for &vertex in &vertices {
                self.add_to_color(vertex, Some(min_empty));
            }
        }
    }

    /// advances the next-vertex-to-color cursor of the MCTS tree
    pub fn increment_first_free_vertex(&mut self) {
        self.first_free_vertex += 1;
    }

    /// heaviest weight of the class, 0 when empty or out of range
    pub fn max_weight(&self, color: ColorId) -> Weight {
        if color >= self.nb_colors {
            return 0;
        }
        self.heaviest_weight[color]
    }

    /** weight of the second element of the class set. Valid as the second
    maximum only because classes are keyed by vertex index and vertices are
    presorted by weight desc. */
    pub fn second_max_weight(&self, color: ColorId) -> Weight {
        if color >= self.nb_colors || self.colors_vertices[color].len() <= 1 {
            return 0;
        }
        let second = self.colors_vertices[color]
            .iter()
            .nth(1)
            .expect("class has at least two vertices");
        self.graph.weights[*second]
    }

    /// whether the assigned vertex has a same-colored neighbor
    pub fn has_conflicts(&self, vertex: VertexId) -> bool {
        match self.colors[vertex] {
            None => false,
            Some(color) => self.conflicts_colors[color][vertex] != 0,
        }
    }

    /// whether the color holds no vertex
    pub fn is_color_empty(&self, color: ColorId) -> bool {
        color >= self.nb_colors || self.colors_vertices[color].is_empty()
    }

    /// `nb_colors,penalty,score,solution` with the coloring `:`-separated
    pub fn line_csv(&self) -> String {
        let coloring: Vec<String> = self
            .colors
            .iter()
            .map(|color| match color {
                Some(c) => c.to_string(),
                None => "-1".to_string(),
            })
            .collect();
        format!(
            "{},{},{},{}",
            self.non_empty_colors.len(),
            self.penalty,
            self.score_wvcp,
            coloring.join(":")
        )
    }

    /// shared instance
    pub fn graph(&self) -> &Rc<Graph> {
        &self.graph
    }

    /// color of every vertex
    pub fn colors(&self) -> &[Option<ColorId>] {
        &self.colors
    }

    /// color of the vertex
    pub fn color(&self, vertex: VertexId) -> Option<ColorId> {
        self.colors[vertex]
    }

    /// number of opened colors (used or recycled)
    pub fn nb_colors(&self) -> usize {
        self.nb_colors
    }

    /// WVCP score
    pub fn score_wvcp(&self) -> Weight {
        self.score_wvcp
    }

    /// number of conflicting edges
    pub fn penalty(&self) -> i64 {
        self.penalty
    }

    /// number of neighbors of the vertex colored with the color
    pub fn conflicts_colors(&self, color: ColorId, vertex: VertexId) -> i64 {
        self.conflicts_colors[color][vertex]
    }

    /// vertices of the class, keyed by vertex index
    pub fn colors_vertices(&self, color: ColorId) -> &BTreeSet<VertexId> {
        &self.colors_vertices[color]
    }

    /// used colors, in no particular order
    pub fn non_empty_colors(&self) -> &[ColorId] {
        &self.non_empty_colors
    }

    /// number of used colors
    pub fn nb_non_empty_colors(&self) -> usize {
        self.non_empty_colors.len()
    }

    /// next vertex to color in the MCTS tree
    pub fn first_free_vertex(&self) -> VertexId {
        self.first_free_vertex
    }

    /// number of assigned vertices with a same-colored neighbor
    pub fn nb_conflicting_vertices(&self) -> usize {
        self.nb_conflicting_vertices
    }

    /** full consistency check of the incremental bookkeeping, used by tests
    and debug assertions. Returns false on the first mismatch. */
    pub fn check(&self) -> bool {
        let graph = &self.graph;
        // conflict counters
        for color in 0..self.nb_colors {
            for vertex in 0..graph.nb_vertices {
                let expected = graph.neighborhood[vertex]
                    .iter()
                    .filter(|&&u| self.colors[u] == Some(color))
                    .count() as i64;
                if self.conflicts_colors[color][vertex] != expected {
                    return false;
                }
            }
        }
        // class membership and heaviest weights
        for color in 0..self.nb_colors {
            for &vertex in &self.colors_vertices[color] {
                if self.colors[vertex] != Some(color) {
                    return false;
                }
            }
            let expected_max = self.colors_vertices[color]
                .iter()
                .map(|&v| graph.weights[v])
                .max()
                .unwrap_or(0);
            if self.heaviest_weight[color] != expected_max {
                return false;
            }
        }
        for (vertex, color) in self.colors.iter().enumerate() {
            if let Some(c) = color {
                if !self.colors_vertices[*c].contains(&vertex) {
                    return false;
                }
            }
        }
        // score
        let expected_score: Weight = self
            .non_empty_colors
            .iter()
            .map(|&c| self.heaviest_weight[c])
            .sum();
        if self.score_wvcp != expected_score {
            return false;
        }
        // penalty = number of conflicting edges
        let expected_penalty = graph
            .edges_list
            .iter()
            .filter(|(a, b)| self.colors[*a].is_some() && self.colors[*a] == self.colors[*b])
            .count() as i64;
        if self.penalty != expected_penalty {
            return false;
        }
        // conflicting vertices
        let expected_conflicting = (0..graph.nb_vertices)
            .filter(|&v| self.has_conflicts(v))
            .count();
        if self.nb_conflicting_vertices != expected_conflicting {
            return false;
        }
        // used/recycled color lists partition the opened colors
        if self.non_empty_colors.len() + self.empty_colors.len() != self.nb_colors {
            return false;
        }
        let mut seen = vec![false; self.nb_colors];
        for &c in self.non_empty_colors.iter().chain(self.empty_colors.iter()) {
            if c >= self.nb_colors || seen[c] {
                return false;
            }
            seen[c] = true;
        }
        for &c in &self.non_empty_colors {
            if self.colors_vertices[c].is_empty() {
                return false;
            }
        }
        for &c in &self.empty_colors {
            if !self.colors_vertices[c].is_empty() {
                return false;
            }
        }
        true
    }
}

/** Approximation of the partition distance between two complete colorings:
for each color of the first, keep the best-overlapping color of the second;
distance = `nb_vertices` minus the kept overlaps. */
pub fn distance_approximation(sol1: &Solution, sol2: &Solution) -> usize {
    let col1: Vec<ColorId> = sol1.colors().iter().map(|c| c.expect("complete coloring")).collect();
    let col2: Vec<ColorId> = sol2.colors().iter().map(|c| c.expect("complete coloring")).collect();
    distance_approximation_colors(&col1, sol1.nb_colors(), &col2, sol2.nb_colors())
}

/// see [`distance_approximation`], on raw color vectors
pub fn distance_approximation_colors(
    col1: &[ColorId],
    max_col1: usize,
    col2: &[ColorId],
    max_col2: usize,
) -> usize {
    let nb_vertices = col1.len();
    let max_k = max_col1.max(max_col2) + 1;
    let mut same_color = vec![vec![0usize; max_k]; max_k];
    let mut maxi = vec![0usize; max_k];
    let mut sigma = vec![0usize; max_k];
    for vertex in 0..nb_vertices {
        let (c1, c2) = (col1[vertex], col2[vertex]);
        same_color[c1][c2] += 1;
        if same_color[c1][c2] > maxi[c1] {
            maxi[c1] = same_color[c1][c2];
            sigma[c1] = c2;
        }
    }
    let sum: usize = (0..max_k).map(|c| same_color[c][sigma[c]]).sum();
    nb_vertices - sum
}

/** Exact partition distance through a greedy matching of color classes
(analysis only, not on the hot path). */
pub fn distance(sol1: &Solution, sol2: &Solution) -> usize {
    let nb_vertices = sol1.colors().len();
    let max_k = sol1.nb_colors().max(sol2.nb_colors()) + 1;
    let mut same_color = vec![vec![0i64; max_k]; max_k];
    for vertex in 0..nb_vertices {
        let c1 = sol1.color(vertex).expect("complete coloring");
        let c2 = sol2.color(vertex).expect("complete coloring");
        same_color[c1][c2] += 1;
    }
    let mut proxi: i64 = 0;
    for _ in 0..max_k {
        // highest remaining overlap
        let mut max_val = -1;
        let mut max_c1 = 0;
        let mut max_c2 = 0;
        for (c1, row) in same_color.iter().enumerate() {
            for (c2, &val) in row.iter().enumerate() {
                if val > max_val {
                    max_val = val;
                    max_c1 = c1;
                    max_c2 = c2;
                }
            }
        }
        proxi += max_val;
        // blank the matched row and column
        for val in same_color[max_c1].iter_mut() {
            *val = -1;
        }
        for row in same_color.iter_mut() {
            row[max_c2] = -1;
        }
    }
    nb_vertices - proxi as usize
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::graph::testing::{complete, isolated, path};

    #[test]
    fn test_add_delete_scores() {
        let graph = path(3, vec![3, 2, 1]);
        let mut sol = Solution::new(graph);
        // {0,2} and {1}: score 3 + 2
        let c0 = sol.add_to_color(0, None);
        let c1 = sol.add_to_color(1, None);
        sol.add_to_color(2, Some(c0));
        assert_ne!(c0, c1);
        assert_eq!(sol.score_wvcp(), 5);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
        // removing the heaviest of {0,2} drops the class weight to 1
        sol.delete_from_color(0);
        assert_eq!(sol.score_wvcp(), 3);
        assert!(sol.check());
    }

    #[test]
    fn test_conflict_bookkeeping() {
        let graph = complete(4, vec![4, 3, 2, 1]);
        let mut sol = Solution::new(graph);
        let c0 = sol.add_to_color(0, None);
        sol.add_to_color(1, Some(c0));
        assert_eq!(sol.penalty(), 1);
        assert_eq!(sol.nb_conflicting_vertices(), 2);
        sol.add_to_color(2, Some(c0));
        assert_eq!(sol.penalty(), 3);
        assert_eq!(sol.nb_conflicting_vertices(), 3);
        assert!(sol.check());
        sol.delete_from_color(1);
        assert_eq!(sol.penalty(), 1);
        assert_eq!(sol.nb_conflicting_vertices(), 2);
        assert!(sol.check());
    }

    #[test]
    fn test_empty_color_recycled() {
        let graph = path(3, vec![3, 2, 1]);
        let mut sol = Solution::new(graph);
        let c0 = sol.add_to_color(0, None);
        let c1 = sol.add_to_color(1, None);
        sol.delete_from_color(0);
        // c0 is recycled and reused by the next fresh-color request
        let c2 = sol.add_to_color(2, None);
        assert_eq!(c2, c0);
        assert_eq!(sol.nb_colors(), 2);
        assert!(sol.non_empty_colors().contains(&c1));
        assert!(sol.check());
    }

    #[test]
    fn test_delta_score_and_conflicts_match_moves() {
        let graph = complete(5, vec![8, 5, 5, 2, 1]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sol = Solution::new(graph.clone());
        for vertex in 0..graph.nb_vertices {
            let color = if vertex % 2 == 0 { None } else { sol.non_empty_colors().first().copied() };
            sol.add_to_color(vertex, color);
        }
        assert!(sol.check());
        for _ in 0..200 {
            let vertex = rng.gen_range(0..graph.nb_vertices);
            let candidates: Vec<Option<ColorId>> = sol
                .non_empty_colors()
                .iter()
                .filter(|&&c| Some(c) != sol.color(vertex))
                .map(|&c| Some(c))
                .chain(std::iter::once(None))
                .collect();
            let color = candidates[rng.gen_range(0..candidates.len())];
            let delta_score = sol.delta_wvcp_score(vertex, color);
            let delta_conf = sol.delta_conflicts(vertex, color);
            let (old_score, old_penalty) = (sol.score_wvcp(), sol.penalty());
            sol.delete_from_color(vertex);
            sol.add_to_color(vertex, color);
            assert_eq!(sol.score_wvcp(), old_score + delta_score);
            assert_eq!(sol.penalty(), old_penalty + delta_conf);
            assert!(sol.check());
        }
    }

    #[test]
    fn test_round_trip_restores_state() {
        let graph = complete(4, vec![4, 3, 2, 1]);
        let mut sol = Solution::new(graph);
        let c0 = sol.add_to_color(0, None);
        let c1 = sol.add_to_color(1, None);
        sol.add_to_color(2, Some(c1));
        let snapshot = (
            sol.colors().to_vec(),
            sol.score_wvcp(),
            sol.penalty(),
            sol.nb_conflicting_vertices(),
        );
        sol.add_to_color(3, Some(c0));
        sol.delete_from_color(3);
        assert_eq!(
            snapshot,
            (
                sol.colors().to_vec(),
                sol.score_wvcp(),
                sol.penalty(),
                sol.nb_conflicting_vertices(),
            )
        );
        assert!(sol.check());
    }

    #[test]
    fn test_fuzz_random_moves() {
        // random 10-vertex instance, weights sorted desc
        let mut rng = StdRng::seed_from_u64(1);
        let mut edges = Vec::new();
        for i in 0..10 {
            for j in (i + 1)..10 {
                if rng.gen_range(0..100) < 40 {
                    edges.push((i, j));
                }
            }
        }
        let weights: Vec<Weight> = (0..10).map(|v| 10 - v as Weight).collect();
        let graph = Rc::new(Graph::new("fuzz", 10, &edges, weights));
        let mut sol = Solution::new(graph.clone());
        for step in 0..10_000 {
            let vertex = rng.gen_range(0..graph.nb_vertices);
            if sol.color(vertex).is_some() {
                sol.delete_from_color(vertex);
            } else {
                let color = if sol.nb_non_empty_colors() > 0 && rng.gen_range(0..100) < 70 {
                    let used = sol.non_empty_colors();
                    Some(used[rng.gen_range(0..used.len())])
                } else {
                    None
                };
                sol.add_to_color(vertex, color);
            }
            if step % 100 == 0 {
                assert!(sol.check(), "invariants broken at step {}", step);
            }
        }
        assert!(sol.check());
    }

    #[test]
    fn test_clean_conflicts() {
        let graph = complete(4, vec![4, 3, 2, 1]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sol = Solution::new(graph);
        let c0 = sol.add_to_color(0, None);
        for vertex in 1..4 {
            sol.add_to_color(vertex, Some(c0));
        }
        sol.clean_conflicts(&mut rng);
        assert_eq!(sol.nb_conflicting_vertices(), 0);
        assert_eq!(sol.penalty(), 0);
        assert!(sol.check());
    }

    #[test]
    fn test_remove_one_color_and_create_conflicts() {
        let graph = path(3, vec![3, 2, 1]);
        let mut sol = Solution::new(graph);
        let c0 = sol.add_to_color(0, None);
        sol.add_to_color(2, Some(c0));
        sol.add_to_color(1, None);
        assert_eq!(sol.nb_non_empty_colors(), 2);
        sol.remove_one_color_and_create_conflicts();
        assert_eq!(sol.nb_non_empty_colors(), 1);
        assert!(sol.penalty() > 0);
        assert!(sol.check());
    }

    #[test]
    fn test_reorganize_colors_compacts() {
        let graph = isolated(4, vec![4, 3, 2, 1]);
        let mut sol = Solution::new(graph);
        for vertex in 0..4 {
            sol.add_to_color(vertex, None);
        }
        // empty colors 0 and 2, leaving high indices in use
        sol.delete_from_color(0);
        sol.delete_from_color(2);
        sol.reorganize_colors();
        let mut used: Vec<ColorId> = sol.non_empty_colors().to_vec();
        used.sort_unstable();
        assert_eq!(used, vec![0, 1]);
        assert!(sol.check());
    }

    #[test]
    fn test_distances() {
        let graph = isolated(4, vec![4, 3, 2, 1]);
        let mut sol1 = Solution::new(graph.clone());
        let mut sol2 = Solution::new(graph);
        let c = sol1.add_to_color(0, None);
        for vertex in 1..4 {
            sol1.add_to_color(vertex, Some(c));
        }
        // same partition with different labels
        sol2.add_to_color(0, None);
        for vertex in 1..4 {
            let c0 = sol2.color(0).unwrap();
            sol2.add_to_color(vertex, Some(c0));
        }
        assert_eq!(distance_approximation(&sol1, &sol2), 0);
        assert_eq!(distance(&sol1, &sol2), 0);

        let mut sol3 = Solution::new(sol1.graph().clone());
        for vertex in 0..4 {
            sol3.add_to_color(vertex, None);
        }
        let d_approx = distance_approximation(&sol1, &sol3);
        let d_exact = distance(&sol1, &sol3);
        assert!(d_approx <= 4);
        assert!(d_approx <= d_exact);
        assert_eq!(d_exact, 3);
    }

    #[test]
    fn test_available_colors_singleton_none() {
        let graph = complete(3, vec![3, 2, 1]);
        let mut sol = Solution::new(graph);
        sol.add_to_color(0, None);
        sol.add_to_color(1, None);
        assert_eq!(sol.available_colors(2), vec![None]);
        assert_eq!(sol.first_available_color(2), None);
    }
}
