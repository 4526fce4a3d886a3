use std::cmp::Ordering;
use std::collections::BTreeSet;

use priority_queue::PriorityQueue;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Error;
use crate::graph::{ColorId, VertexId, Weight};
use crate::solution::Solution;
use crate::util::{contains_sorted, erase_sorted, insert_sorted};

/// Greedy constructions. Each one completes a partial coloring: only the
/// unassigned vertices are touched, so the MCTS can use them on the
/// partial solutions of its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initializer {
    /// random vertex order, random available color
    TotalRandom,
    /// vertex order, random among available colors and a fresh one
    Random,
    /// vertex order, random available color (fresh only when forced)
    Constrained,
    /// vertex order, first available color
    Deterministic,
    /// one color per vertex
    Worst,
    /// saturation-driven construction
    Dsatur,
    /// recursive largest first
    Rlf,
}

impl Initializer {
    /// parses an initialization name from the command line
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "total_random" => Ok(Initializer::TotalRandom),
            "random" => Ok(Initializer::Random),
            "constrained" => Ok(Initializer::Constrained),
            "deterministic" => Ok(Initializer::Deterministic),
            "worst" => Ok(Initializer::Worst),
            "dsatur" => Ok(Initializer::Dsatur),
            "rlf" => Ok(Initializer::Rlf),
            _ => Err(Error::UnknownName {
                kind: "initialization",
                name: name.to_string(),
                valid: "total_random, random, constrained, deterministic, worst, dsatur, rlf",
            }),
        }
    }

    /// name used in CSV comments
    pub fn name(self) -> &'static str {
        match self {
            Initializer::TotalRandom => "total_random",
            Initializer::Random => "random",
            Initializer::Constrained => "constrained",
            Initializer::Deterministic => "deterministic",
            Initializer::Worst => "worst",
            Initializer::Dsatur => "dsatur",
            Initializer::Rlf => "rlf",
        }
    }

    /// completes the coloring
    pub fn run(self, solution: &mut Solution, rng: &mut StdRng) {
        match self {
            Initializer::TotalRandom => total_random(solution, rng),
            Initializer::Random => greedy_random(solution, rng),
            Initializer::Constrained => greedy_constrained(solution, rng),
            Initializer::Deterministic => greedy_deterministic(solution),
            Initializer::Worst => greedy_worst(solution),
            Initializer::Dsatur => greedy_dsatur(solution),
            Initializer::Rlf => greedy_rlf(solution),
        }
    }
}

/// shuffles the unassigned vertices, colors each with a random available color
pub fn total_random(solution: &mut Solution, rng: &mut StdRng) {
    let mut vertices: Vec<VertexId> = (0..solution.graph().nb_vertices)
        .filter(|&vertex| solution.color(vertex).is_none())
        .collect();
    vertices.shuffle(rng);
    for vertex in vertices {
        let possible_colors = solution.available_colors(vertex);
        let &color = possible_colors.choose(rng).expect("available_colors is never empty");
        solution.add_to_color(vertex, color);
    }
}

/// colors the vertices in index order, sampling among the available colors
/// plus a fresh one (a new color can open even when not needed)
pub fn greedy_random(solution: &mut Solution, rng: &mut StdRng) {
    for vertex in solution.first_free_vertex()..solution.graph().nb_vertices {
        if solution.color(vertex).is_some() {
            continue;
        }
        let mut possible_colors = solution.available_colors(vertex);
        possible_colors.push(None);
        let &color = possible_colors.choose(rng).expect("non-empty candidates");
        solution.add_to_color(vertex, color);
    }
}

/// colors the vertices in index order, sampling among the available colors
/// (a new color opens only when every used color conflicts)
pub fn greedy_constrained(solution: &mut Solution, rng: &mut StdRng) {
    for vertex in solution.first_free_vertex()..solution.graph().nb_vertices {
        if solution.color(vertex).is_some() {
            continue;
        }
        let possible_colors = solution.available_colors(vertex);
        let &color = possible_colors.choose(rng).expect("available_colors is never empty");
        solution.add_to_color(vertex, color);
    }
}

/// colors the vertices in index order with the first available color
pub fn greedy_deterministic(solution: &mut Solution) {
    for vertex in solution.first_free_vertex()..solution.graph().nb_vertices {
        if solution.color(vertex).is_some() {
            continue;
        }
        let color = solution.first_available_color(vertex);
        solution.add_to_color(vertex, color);
    }
}

/// puts every unassigned vertex in its own color
pub fn greedy_worst(solution: &mut Solution) {
    for vertex in solution.first_free_vertex()..solution.graph().nb_vertices {
        if solution.color(vertex).is_some() {
            continue;
        }
        solution.add_to_color(vertex, None);
    }
}

/// key of the DSATUR queue: saturation desc, weight desc, degree desc,
/// vertex asc
#[derive(Debug, PartialEq, Eq)]
struct SatKey {
    sat: usize,
    weight: Weight,
    degree: i64,
    vertex: VertexId,
}

impl Ord for SatKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sat
            .cmp(&other.sat)
            .then_with(|| self.weight.cmp(&other.weight))
            .then_with(|| self.degree.cmp(&other.degree))
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for SatKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/** DSATUR: repeatedly colors the most saturated uncolored vertex with its
first feasible color. Degrees are counted in the graph induced by the
uncolored vertices, so an already-partial coloring is taken into account. */
pub fn greedy_dsatur(solution: &mut Solution) {
    let graph = solution.graph().clone();
    let nb_vertices = graph.nb_vertices;
    let mut degrees: Vec<i64> = graph.degrees.iter().map(|&d| d as i64).collect();
    let mut adjacent_colors: Vec<BTreeSet<ColorId>> = vec![BTreeSet::new(); nb_vertices];

    // account for the vertices already colored
    for vertex in 0..nb_vertices {
        if let Some(color) = solution.color(vertex) {
            for &neighbor in &graph.neighborhood[vertex] {
                if solution.color(neighbor).is_none() {
                    adjacent_colors[neighbor].insert(color);
                    degrees[neighbor] -= 1;
                }
            }
        }
    }

    let mut queue: PriorityQueue<VertexId, SatKey> = PriorityQueue::new();
    for vertex in 0..nb_vertices {
        if solution.color(vertex).is_none() {
            queue.push(
                vertex,
                SatKey {
                    sat: adjacent_colors[vertex].len(),
                    weight: graph.weights[vertex],
                    degree: degrees[vertex],
                    vertex,
                },
            );
        }
    }

    while let Some((vertex, _)) = queue.pop() {
        let color = solution.first_available_color(vertex);
        let used_color = solution.add_to_color(vertex, color);
        for &neighbor in &graph.neighborhood[vertex] {
            if solution.color(neighbor).is_none() {
                adjacent_colors[neighbor].insert(used_color);
                degrees[neighbor] -= 1;
                let new_sat = adjacent_colors[neighbor].len();
                let new_degree = degrees[neighbor];
                queue.change_priority_by(&neighbor, |key| {
                    key.sat = new_sat;
                    key.degree = new_degree;
                });
            }
        }
    }
}

/// updates the RLF bookkeeping after coloring `current_vertex` in the class
/// under construction
fn rlf_update_neighborhood(
    solution: &Solution,
    legal_uncolored: &mut Vec<VertexId>,
    illegal_uncolored: &mut Vec<VertexId>,
    nb_uncolored_neighbors: &mut [i64],
    nb_illegal_neighbors: &mut [i64],
    current_vertex: VertexId,
) {
    let graph = solution.graph();
    erase_sorted(legal_uncolored, &current_vertex);

    // uncolored neighbors of the chosen vertex become illegal for the class;
    // they and their neighbors need their counters recomputed
    let mut impacted_vertices: Vec<VertexId> = Vec::new();
    for &neighbor in &graph.neighborhood[current_vertex] {
        if solution.color(neighbor).is_none() {
            erase_sorted(legal_uncolored, &neighbor);
            if !contains_sorted(illegal_uncolored, &neighbor) {
                insert_sorted(illegal_uncolored, neighbor);
            }
            if !contains_sorted(&impacted_vertices, &neighbor) {
                insert_sorted(&mut impacted_vertices, neighbor);
            }
            for &next_neighbor in &graph.neighborhood[neighbor] {
                if solution.color(next_neighbor).is_none()
                    && !contains_sorted(&impacted_vertices, &next_neighbor)
                {
                    insert_sorted(&mut impacted_vertices, next_neighbor);
                }
            }
        }
    }

    for &vertex in &impacted_vertices {
        nb_uncolored_neighbors[vertex] = 0;
        nb_illegal_neighbors[vertex] = 0;
        for &neighbor in &graph.neighborhood[vertex] {
            if solution.color(neighbor).is_none() {
                if contains_sorted(legal_uncolored, &neighbor) {
                    nb_uncolored_neighbors[vertex] += 1;
                } else if contains_sorted(illegal_uncolored, &neighbor) {
                    nb_illegal_neighbors[vertex] += 1;
                }
            }
        }
    }
}

/** RLF: builds one color class at a time. The class opens on the uncolored
vertex with the most uncolored neighbors; it then grows with the vertex
seeing the most vertices already forbidden for the class (ties broken by the
fewest eligible neighbors), heaviest first. */
pub fn greedy_rlf(solution: &mut Solution) {
    let graph = solution.graph().clone();
    let nb_vertices = graph.nb_vertices;

    let mut legal_uncolored: Vec<VertexId> = Vec::new();
    for vertex in 0..nb_vertices {
        if solution.color(vertex).is_none() {
            insert_sorted(&mut legal_uncolored, vertex);
        }
    }
    let mut illegal_uncolored: Vec<VertexId> = Vec::new();

    let mut color = 0;
    while !legal_uncolored.is_empty() {
        // nb neighbors uncolored / uncolored but forbidden for this class
        let mut nb_uncolored_neighbors: Vec<i64> = vec![0; nb_vertices];
        let mut nb_illegal_neighbors: Vec<i64> = vec![0; nb_vertices];

        for vertex in 0..nb_vertices {
            if solution.color(vertex) == Some(color) {
                for &neighbor in &graph.neighborhood[vertex] {
                    if solution.color(neighbor).is_none() {
                        if contains_sorted(&legal_uncolored, &neighbor) {
                            erase_sorted(&mut legal_uncolored, &neighbor);
                        }
                        if !contains_sorted(&illegal_uncolored, &neighbor) {
                            insert_sorted(&mut illegal_uncolored, neighbor);
                            for &next_neighbor in &graph.neighborhood[neighbor] {
                                nb_illegal_neighbors[next_neighbor] += 1;
                            }
                        }
                    }
                }
            } else if solution.color(vertex).is_none() {
                for &neighbor in &graph.neighborhood[vertex] {
                    if contains_sorted(&legal_uncolored, &neighbor) {
                        nb_uncolored_neighbors[vertex] += 1;
                    }
                }
            }
        }

        if solution.nb_colors() <= color {
            // open the class on the vertex with the most uncolored neighbors
            let mut first_vertex = None;
            let mut nb_max_uncolored = -1;
            for &vertex in &legal_uncolored {
                if nb_uncolored_neighbors[vertex] > nb_max_uncolored {
                    nb_max_uncolored = nb_uncolored_neighbors[vertex];
                    first_vertex = Some(vertex);
                }
            }
            let first_vertex = first_vertex.expect("legal_uncolored is non-empty");
            let used_color = solution.add_to_color(first_vertex, None);
            debug_assert_eq!(used_color, color);
            rlf_update_neighborhood(
                solution,
                &mut legal_uncolored,
                &mut illegal_uncolored,
                &mut nb_uncolored_neighbors,
                &mut nb_illegal_neighbors,
                first_vertex,
            );
        }

        while !legal_uncolored.is_empty() {
            // next vertex: most neighbors forbidden for the class, heaviest
            // first, ties by fewest eligible neighbors
            let mut nb_max_illegal = -1;
            let mut weight_next: Weight = -1;
            let mut nb_min_legal = nb_vertices as i64;
            let mut next_vertex = None;
            for &vertex in &legal_uncolored {
                if (nb_illegal_neighbors[vertex] > nb_max_illegal
                    && graph.weights[vertex] >= weight_next)
                    || (nb_illegal_neighbors[vertex] == nb_max_illegal
                        && nb_uncolored_neighbors[vertex] < nb_min_legal
                        && graph.weights[vertex] == weight_next)
                {
                    nb_max_illegal = nb_illegal_neighbors[vertex];
                    nb_min_legal = nb_uncolored_neighbors[vertex];
                    weight_next = graph.weights[vertex];
                    next_vertex = Some(vertex);
                }
            }
            let next_vertex = next_vertex.expect("legal_uncolored is non-empty");
            solution.add_to_color(next_vertex, Some(color));
            rlf_update_neighborhood(
                solution,
                &mut legal_uncolored,
                &mut illegal_uncolored,
                &mut nb_uncolored_neighbors,
                &mut nb_illegal_neighbors,
                next_vertex,
            );
        }
        legal_uncolored = illegal_uncolored;
        illegal_uncolored = Vec::new();
        color += 1;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::graph::testing::{complete, cycle, isolated, path};

    const ALL: [Initializer; 7] = [
        Initializer::TotalRandom,
        Initializer::Random,
        Initializer::Constrained,
        Initializer::Deterministic,
        Initializer::Worst,
        Initializer::Dsatur,
        Initializer::Rlf,
    ];

    #[test]
    fn test_every_initializer_is_total_and_feasible() {
        let graphs = vec![
            complete(5, vec![1; 5]),
            cycle(6),
            path(3, vec![3, 2, 1]),
            isolated(5, vec![5, 4, 3, 2, 1]),
        ];
        for graph in graphs {
            for &init in ALL.iter() {
                let mut rng = StdRng::seed_from_u64(1);
                let mut sol = Solution::new(graph.clone());
                init.run(&mut sol, &mut rng);
                assert!(
                    (0..graph.nb_vertices).all(|v| sol.color(v).is_some()),
                    "{} left vertices uncolored on {}",
                    init.name(),
                    graph.name
                );
                assert_eq!(sol.penalty(), 0, "{} created conflicts", init.name());
                assert!(sol.check());
            }
        }
    }

    #[test]
    fn test_deterministic_on_k5() {
        let graph = complete(5, vec![1; 5]);
        let mut sol = Solution::new(graph);
        greedy_deterministic(&mut sol);
        assert_eq!(sol.score_wvcp(), 5);
        assert_eq!(sol.nb_non_empty_colors(), 5);
    }

    #[test]
    fn test_deterministic_on_path() {
        // a-b-c weights 3,2,1: {a,c} and {b}, score 5
        let graph = path(3, vec![3, 2, 1]);
        let mut sol = Solution::new(graph);
        greedy_deterministic(&mut sol);
        assert_eq!(sol.score_wvcp(), 5);
        assert_eq!(sol.nb_non_empty_colors(), 2);
    }

    #[test]
    fn test_worst_opens_one_color_per_vertex() {
        let graph = isolated(5, vec![5, 4, 3, 2, 1]);
        let mut sol = Solution::new(graph);
        greedy_worst(&mut sol);
        assert_eq!(sol.nb_non_empty_colors(), 5);
        assert_eq!(sol.score_wvcp(), 15);
    }

    #[test]
    fn test_dsatur_on_even_cycle() {
        let graph = cycle(6);
        let mut sol = Solution::new(graph);
        greedy_dsatur(&mut sol);
        assert_eq!(sol.nb_non_empty_colors(), 2);
        assert_eq!(sol.score_wvcp(), 2);
    }

    #[test]
    fn test_rlf_on_even_cycle() {
        let graph = cycle(6);
        let mut sol = Solution::new(graph);
        greedy_rlf(&mut sol);
        assert_eq!(sol.nb_non_empty_colors(), 2);
    }

    #[test]
    fn test_initializers_respect_partial_coloring() {
        let graph = path(3, vec![3, 2, 1]);
        for &init in ALL.iter() {
            let mut rng = StdRng::seed_from_u64(1);
            let mut sol = Solution::new(graph.clone());
            let c0 = sol.add_to_color(0, None);
            sol.increment_first_free_vertex();
            init.run(&mut sol, &mut rng);
            assert_eq!(sol.color(0), Some(c0), "{} recolored vertex 0", init.name());
            assert!(sol.check());
        }
    }
}
