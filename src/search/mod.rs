//! Greedy constructions and local-search operators for the weighted
//! coloring. An operator mutates a [`Solution`] in place and returns when
//! the time budget, the iteration budget or the target score is hit.

use rand::rngs::StdRng;

use crate::error::Error;
use crate::graph::{ColorId, VertexId};
use crate::parameters::Parameters;
use crate::solution::{BestBounds, Solution};

/// greedy constructions completing a partial coloring
pub mod greedy;

/// TABUCOL at a shrinking color budget, and the GCP random walk
pub mod tabu_col;

/// tabu search on the WVCP score, and the WVCP random walk
pub mod tabu_weight;

/// PARTIALCOL: tabu reinsertion of unassigned vertices
pub mod partial_col;

/// AFISA: tabu search on the penalty-augmented score
pub mod afisa;

/// ILSTS: iterated grenade moves through the free-color wrapper
pub mod ilsts;

/// RedLS: conflict local search with learned edge weights
pub mod redls;

/// trivial operators: identity, hill-climbing, time-waster, destroyer
pub mod baselines;

/// Move of a vertex to a color (`None` = open a new color).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coloration {
    /// vertex to move
    pub vertex: VertexId,
    /// color to use
    pub color: Option<ColorId>,
}

/// Everything an operator needs besides the solution: the run parameters,
/// the process-wide best bounds and the seeded RNG.
#[derive(Debug)]
pub struct SearchContext<'a> {
    /// run parameters (budgets, target, outputs)
    pub params: &'a Parameters,
    /// best score / best color count seen by the process
    pub bounds: &'a mut BestBounds,
    /// process-wide RNG
    pub rng: &'a mut StdRng,
    /// print a CSV row on each new best solution
    pub verbose: bool,
}

/// writes a `turn,time,nb_colors,penalty,score,solution` CSV row
pub fn print_result_ls(params: &Parameters, best_time: i64, solution: &Solution, turn: i64) {
    params.write_output(&format!("{},{},{}\n", turn, best_time, solution.line_csv()));
}

/// Local-search operators, dispatched by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSearch {
    /// explicit no-op, identity operator of the MCTS
    None,
    /// steepest-descent on the score, conflict-free moves
    HillClimbing,
    /// TABUCOL at a shrinking color budget
    TabuCol,
    /// random conflicting moves (GCP baseline)
    RandomWalkGcp,
    /// PARTIALCOL
    PartialCol,
    /// tabu search on the WVCP score
    TabuWeight,
    /// random score-preserving moves (WVCP baseline)
    RandomWalkWvcp,
    /// AFISA with a per-vertex tabu
    Afisa,
    /// AFISA with a per-(vertex, color) tabu
    AfisaOriginal,
    /// RedLS
    Redls,
    /// RedLS that never moves vertices below the MCTS cursor
    RedlsFreeze,
    /// ILSTS grenade search
    Ilsts,
    /// waits out its time budget (adaptive-selection baseline)
    UselessLs,
    /// destroys the solution (adaptive-selection baseline)
    WorstLs,
}

impl LocalSearch {
    /// parses an operator name from the command line
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "none" => Ok(LocalSearch::None),
            "hill_climbing" => Ok(LocalSearch::HillClimbing),
            "tabu_col" => Ok(LocalSearch::TabuCol),
            "random_walk_gcp" => Ok(LocalSearch::RandomWalkGcp),
            "partial_col" => Ok(LocalSearch::PartialCol),
            "tabu_weight" => Ok(LocalSearch::TabuWeight),
            "random_walk_wvcp" => Ok(LocalSearch::RandomWalkWvcp),
            "afisa" => Ok(LocalSearch::Afisa),
            "afisa_original" => Ok(LocalSearch::AfisaOriginal),
            "redls" => Ok(LocalSearch::Redls),
            "redls_freeze" => Ok(LocalSearch::RedlsFreeze),
            "ilsts" => Ok(LocalSearch::Ilsts),
            "useless_ls" => Ok(LocalSearch::UselessLs),
            "worst_ls" => Ok(LocalSearch::WorstLs),
            _ => Err(Error::UnknownName {
                kind: "local_search",
                name: name.to_string(),
                valid: "none, hill_climbing, tabu_col, random_walk_gcp, partial_col, \
                        tabu_weight, random_walk_wvcp, afisa, afisa_original, redls, \
                        redls_freeze, ilsts, useless_ls, worst_ls",
            }),
        }
    }

    /// name used in CSV comments and the turn-by-turn output
    pub fn name(self) -> &'static str {
        match self {
            LocalSearch::None => "none",
            LocalSearch::HillClimbing => "hill_climbing",
            LocalSearch::TabuCol => "tabu_col",
            LocalSearch::RandomWalkGcp => "random_walk_gcp",
            LocalSearch::PartialCol => "partial_col",
            LocalSearch::TabuWeight => "tabu_weight",
            LocalSearch::RandomWalkWvcp => "random_walk_wvcp",
            LocalSearch::Afisa => "afisa",
            LocalSearch::AfisaOriginal => "afisa_original",
            LocalSearch::Redls => "redls",
            LocalSearch::RedlsFreeze => "redls_freeze",
            LocalSearch::Ilsts => "ilsts",
            LocalSearch::UselessLs => "useless_ls",
            LocalSearch::WorstLs => "worst_ls",
        }
    }

    /// runs the operator on the solution
    pub fn run(self, solution: &mut Solution, context: &mut SearchContext) {
        match self {
            LocalSearch::None => {}
            LocalSearch::HillClimbing => baselines::hill_climbing(solution, context),
            LocalSearch::TabuCol => tabu_col::tabu_col(solution, context),
            LocalSearch::RandomWalkGcp => tabu_col::random_walk_gcp(solution, context),
            LocalSearch::PartialCol => partial_col::partial_col(solution, context),
            LocalSearch::TabuWeight => tabu_weight::tabu_weight(solution, context),
            LocalSearch::RandomWalkWvcp => tabu_weight::random_walk_wvcp(solution, context),
            LocalSearch::Afisa => afisa::afisa(solution, context),
            LocalSearch::AfisaOriginal => afisa::afisa_original(solution, context),
            LocalSearch::Redls => redls::redls(solution, context),
            LocalSearch::RedlsFreeze => redls::redls_freeze(solution, context),
            LocalSearch::Ilsts => ilsts::ilsts(solution, context),
            LocalSearch::UselessLs => baselines::useless_ls(solution, context),
            LocalSearch::WorstLs => baselines::worst_ls(solution, context),
        }
    }
}
