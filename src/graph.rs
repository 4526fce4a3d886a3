use std::rc::Rc;

use bit_set::BitSet;

use crate::dimacs::{read_col_file, read_weight_file};
use crate::error::Error;

/** Vertex Id */
pub type VertexId = usize;

/** Color Id (an unassigned vertex has no color) */
pub type ColorId = usize;

/** Vertex weight / score value */
pub type Weight = i64;

/** Problem solved on the instance: weighted or unweighted coloring. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    /// Weighted Vertex Coloring Problem (`.col` + `.col.w`)
    Wvcp,
    /// Graph Coloring Problem (unit weights)
    Gcp,
}

impl Problem {
    /// parses the problem name from the command line
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "wvcp" => Ok(Problem::Wvcp),
            "gcp" => Ok(Problem::Gcp),
            _ => Err(Error::UnknownName {
                kind: "problem",
                name: name.to_string(),
                valid: "wvcp, gcp",
            }),
        }
    }

    /// name used in file paths and CSV comments
    pub fn name(self) -> &'static str {
        match self {
            Problem::Wvcp => "wvcp",
            Problem::Gcp => "gcp",
        }
    }
}

/** Models a weighted graph coloring instance.
Read-only after construction, shared as `Rc<Graph>` by every search state.
*/
#[derive(Debug)]
pub struct Graph {
    /// instance name
    pub name: String,
    /// nb vertices
    pub nb_vertices: usize,
    /// nb edges (duplicates in the input are counted once)
    pub nb_edges: usize,
    /// edges of the graph
    pub edges_list: Vec<(VertexId, VertexId)>,
    /// adjacency_matrix[i]: bitset of the neighbors of i
    pub adjacency_matrix: Vec<BitSet>,
    /// neighborhood[i]: list of vertices adjacent to i
    pub neighborhood: Vec<Vec<VertexId>>,
    /// degrees[i]: number of neighbors of i
    pub degrees: Vec<usize>,
    /// weights[i]: weight of vertex i (all 1 for GCP)
    pub weights: Vec<Weight>,
}

impl Graph {
    /** constructor from an edge list and per-vertex weights.
    Duplicate edges are ignored and `nb_edges` recounted. */
    pub fn new(
        name: &str,
        nb_vertices: usize,
        edges: &[(VertexId, VertexId)],
        weights: Vec<Weight>,
    ) -> Self {
        assert_eq!(weights.len(), nb_vertices);
        let mut adjacency_matrix = vec![BitSet::with_capacity(nb_vertices); nb_vertices];
        let mut neighborhood = vec![Vec::new(); nb_vertices];
        let mut edges_list = Vec::with_capacity(edges.len());
        let mut nb_edges = 0;
        for &(a, b) in edges {
            if a != b && !adjacency_matrix[a].contains(b) {
                adjacency_matrix[a].insert(b);
                adjacency_matrix[b].insert(a);
                neighborhood[a].push(b);
                neighborhood[b].push(a);
                edges_list.push((a, b));
                nb_edges += 1;
            }
        }
        let degrees: Vec<usize> = neighborhood.iter().map(Vec::len).collect();
        Self {
            name: name.to_string(),
            nb_vertices,
            nb_edges,
            edges_list,
            adjacency_matrix,
            neighborhood,
            degrees,
            weights,
        }
    }

    /** loads an instance from `<instances_dir>/reduced_<problem>/<name>.col`
    (and the sibling `.col.w` for WVCP). */
    pub fn load(instances_dir: &str, name: &str, problem: Problem) -> Result<Rc<Self>, Error> {
        let col_path = format!("{}/reduced_{}/{}.col", instances_dir, problem.name(), name);
        let (nb_vertices, edges) = read_col_file(&col_path)?;
        let weights = match problem {
            Problem::Wvcp => {
                let w_path = format!("{}.w", col_path);
                let mut weights = read_weight_file(&w_path)?;
                weights.resize(nb_vertices, 1);
                weights
            }
            Problem::Gcp => vec![1; nb_vertices],
        };
        let graph = Rc::new(Self::new(name, nb_vertices, &edges, weights));
        if !graph.is_vertex_sorted() {
            eprintln!(
                "warning: vertices of {} are not sorted by (weight desc, degree desc)",
                name
            );
        }
        Ok(graph)
    }

    /// returns whether a and b are adjacent, O(1)
    pub fn are_adjacent(&self, a: VertexId, b: VertexId) -> bool {
        self.adjacency_matrix[a].contains(b)
    }

    /// largest degree of the graph, 0 on the empty graph
    pub fn max_degree(&self) -> usize {
        self.degrees.iter().copied().max().unwrap_or(0)
    }

    /** checks the vertex presort the search relies on:
    `weights[v] >= weights[v+1]`, ties broken by `degrees[v] >= degrees[v+1]`. */
    pub fn is_vertex_sorted(&self) -> bool {
        (1..self.nb_vertices).all(|v| {
            self.weights[v - 1] > self.weights[v]
                || (self.weights[v - 1] == self.weights[v]
                    && self.degrees[v - 1] >= self.degrees[v])
        })
    }

    /// print statistics of the instance on stderr
    pub fn display_statistics(&self) {
        eprintln!("\t{} \t vertices", self.nb_vertices);
        eprintln!("\t{} \t edges", self.nb_edges);
        if self.nb_vertices > 0 {
            eprintln!("\t{} \t min degree", self.degrees.iter().min().unwrap());
            eprintln!("\t{} \t max degree", self.max_degree());
        }
    }
}

/// small instances used by the test suites of several modules
#[cfg(test)]
pub mod testing {
    use super::*;

    /// complete graph on n vertices with the given weights
    pub fn complete(n: usize, weights: Vec<Weight>) -> Rc<Graph> {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Rc::new(Graph::new("complete", n, &edges, weights))
    }

    /// cycle v0-v1-...-v(n-1)-v0 with unit weights
    pub fn cycle(n: usize) -> Rc<Graph> {
        let edges: Vec<(VertexId, VertexId)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        Rc::new(Graph::new("cycle", n, &edges, vec![1; n]))
    }

    /// path v0-v1-...-v(n-1) with the given weights
    pub fn path(n: usize, weights: Vec<Weight>) -> Rc<Graph> {
        let edges: Vec<(VertexId, VertexId)> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        Rc::new(Graph::new("path", n, &edges, weights))
    }

    /// n isolated vertices with the given weights
    pub fn isolated(n: usize, weights: Vec<Weight>) -> Rc<Graph> {
        Rc::new(Graph::new("isolated", n, &[], weights))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::complete;
    use super::*;

    #[test]
    fn test_build_k4() {
        let g = complete(4, vec![4, 3, 2, 1]);
        assert_eq!(g.nb_vertices, 4);
        assert_eq!(g.nb_edges, 6);
        assert!(g.are_adjacent(0, 3));
        assert!(!g.are_adjacent(2, 2));
        assert_eq!(g.max_degree(), 3);
        assert!(g.is_vertex_sorted());
    }

    #[test]
    fn test_duplicate_edges_counted_once() {
        let g = Graph::new("dup", 3, &[(0, 1), (1, 0), (0, 1), (1, 2)], vec![1, 1, 1]);
        assert_eq!(g.nb_edges, 2);
        assert_eq!(g.degrees, vec![1, 2, 1]);
    }

    #[test]
    fn test_unsorted_vertices_detected() {
        let g = Graph::new("unsorted", 2, &[(0, 1)], vec![1, 2]);
        assert!(!g.is_vertex_sorted());
    }
}
