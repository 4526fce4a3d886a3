//! Solver for the Weighted Vertex Coloring Problem (WVCP) and its
//! unweighted variant (GCP): greedy constructions, a family of local-search
//! operators, and a Monte-Carlo Tree Search over partial colorings with
//! adaptive operator selection.

// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

// not sure if already by default in clippy
#![warn(clippy::similar_names)]
#![warn(clippy::shadow_unrelated)]
#![warn(clippy::shadow_same)]
#![warn(clippy::shadow_reuse)]


/// configuration and I/O errors
pub mod error;

/// weighted coloring instance
pub mod graph;

/// read DIMACS `.col` instances and `.col.w` weight files
pub mod dimacs;

/// helper methods on sorted vectors
pub mod util;

/// coloring state with incremental score/conflict bookkeeping
pub mod solution;

/// run parameters, cooperative stop token and CSV outputs
pub mod parameters;

/// greedy constructions and local-search operators
pub mod search;

/// decides, per MCTS rollout, whether to run a local search
pub mod simulation;

/// adaptive selection of local-search operators
pub mod adaptive;

/// Monte-Carlo Tree Search over partial colorings
pub mod mcts;

/// local-search run controller
pub mod local_search;
