use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::adaptive::AdaptiveKind;
use crate::error::Error;
use crate::graph::{Problem, Weight};
use crate::search::greedy::Initializer;
use crate::search::LocalSearch;
use crate::simulation::Simulation;

/// Method driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// one local-search operator on a greedy solution
    LocalSearch,
    /// Monte-Carlo Tree Search
    Mcts,
}

impl Method {
    /// parses the method name from the command line
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "local_search" => Ok(Method::LocalSearch),
            "mcts" => Ok(Method::Mcts),
            _ => Err(Error::UnknownName {
                kind: "method",
                name: name.to_string(),
                valid: "local_search, mcts",
            }),
        }
    }

    /// name used in CSV comments
    pub fn name(self) -> &'static str {
        match self {
            Method::LocalSearch => "local_search",
            Method::Mcts => "mcts",
        }
    }
}

/// When the MCTS stops: on reaching the target, or only on full exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// stop as soon as the target score is reached
    Reached,
    /// explore until the tree is exhausted (or time runs out)
    Optimality,
}

impl Objective {
    /// parses the objective name from the command line
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "reached" => Ok(Objective::Reached),
            "optimality" => Ok(Objective::Optimality),
            _ => Err(Error::UnknownName {
                kind: "objective",
                name: name.to_string(),
                valid: "reached, optimality",
            }),
        }
    }

    /// name used in CSV comments
    pub fn name(self) -> &'static str {
        match self {
            Objective::Reached => "reached",
            Objective::Optimality => "optimality",
        }
    }
}

/// Summary of a finished run, exported as JSON next to the CSV.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// method that produced the solution
    pub method: String,
    /// best WVCP score
    pub score: Weight,
    /// number of colors of the best solution
    pub nb_colors: usize,
    /// penalty of the best solution (0 when feasible)
    pub penalty: i64,
    /// turns played
    pub turn: i64,
    /// seconds elapsed when the best solution was found
    pub time: i64,
}

/** Parameters of a run, the cooperative stop token and the output streams.

The stop token is an atomic deadline in milliseconds since `time_start`;
[`Parameters::request_stop`] moves it to "now" and every long-running loop
re-reads it through [`Parameters::time_limit_reached`]. Nothing else may be
touched from a signal context.
*/
pub struct Parameters {
    /// wvcp or gcp
    pub problem: Problem,
    /// instance base name
    pub instance: String,
    /// local_search or mcts
    pub method: Method,
    /// seed of the process-wide RNG
    pub rand_seed: u64,
    /// stop once the score is `<= target` (-1 disables)
    pub target: Weight,
    /// MCTS prunes against `target` instead of the running best
    pub use_target: bool,
    /// stopping objective of the MCTS
    pub objective: Objective,
    /// global time limit in seconds
    pub time_limit: u64,
    /// MCTS turn cap
    pub nb_max_iterations: i64,
    /// greedy used to complete solutions
    pub initialization: Initializer,
    /// iteration cap of one local-search call
    pub nb_iter_local_search: i64,
    /// time cap in seconds of one local-search call
    pub max_time_local_search: u64,
    /// bound on the number of colors (max degree + 1 by default)
    pub bound_nb_colors: usize,
    /// local-search operators, first one used in local_search mode
    pub local_search: Vec<LocalSearch>,
    /// `:`-separated operator names, echoed in the outputs
    pub local_search_names: String,
    /// adaptive operator-selection policy
    pub adaptive: AdaptiveKind,
    /// sliding-window length of the adaptive policies
    pub window_size: usize,
    /// UCB constant (MCTS selection and ucb adaptive policy)
    pub coeff_exploi_explo: f64,
    /// simulation policy of the MCTS
    pub simulation: Simulation,
    /// O constant of the derived local-search time `O + P * nb_vertices`
    pub o_time: i64,
    /// P constant of the derived local-search time `O + P * nb_vertices`
    pub p_time: f64,
    /// empty for stdout, else directory of the CSV outputs
    pub output_directory: String,
    time_start: Instant,
    stop_at_ms: AtomicU64,
    output: RefCell<Box<dyn Write>>,
    output_path: Option<String>,
    output_tbt: RefCell<Box<dyn Write>>,
    output_tbt_path: Option<String>,
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameters")
            .field("problem", &self.problem)
            .field("instance", &self.instance)
            .field("method", &self.method)
            .field("rand_seed", &self.rand_seed)
            .field("target", &self.target)
            .field("time_limit", &self.time_limit)
            .field("local_search", &self.local_search_names)
            .finish()
    }
}

impl Parameters {
    /** builds the parameters, resolving the derived values
    (`max_time_local_search == -1` becomes `O + P * nb_vertices`,
    `bound_nb_colors == -1` becomes `max_degree + 1`) and opening the output
    streams (`<outdir>/<instance>_<seed>.csv.running`, renamed on clean
    exit). */
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        problem: Problem,
        instance: &str,
        method: Method,
        rand_seed: u64,
        target: Weight,
        use_target: bool,
        objective: Objective,
        time_limit: u64,
        nb_max_iterations: i64,
        initialization: Initializer,
        nb_iter_local_search: i64,
        max_time_local_search: i64,
        bound_nb_colors: i64,
        local_search_names: &str,
        adaptive: AdaptiveKind,
        window_size: usize,
        coeff_exploi_explo: f64,
        simulation: Simulation,
        o_time: i64,
        p_time: f64,
        output_directory: &str,
        nb_vertices: usize,
        max_degree: usize,
    ) -> Result<Self, Error> {
        let local_search = local_search_names
            .split(':')
            .filter(|name| !name.is_empty())
            .map(LocalSearch::from_name)
            .collect::<Result<Vec<_>, _>>()?;
        if local_search.is_empty() && simulation != Simulation::NoLs {
            return Err(Error::UnknownName {
                kind: "local_search",
                name: local_search_names.to_string(),
                valid: "at least one operator when a simulation policy is active",
            });
        }

        let resolved_ls_time = if max_time_local_search == -1 {
            std::cmp::max(1, o_time + (p_time * nb_vertices as f64) as i64) as u64
        } else {
            max_time_local_search as u64
        };
        let resolved_bound = if bound_nb_colors == -1 {
            max_degree + 1
        } else {
            bound_nb_colors as usize
        };

        let (output, output_path): (Box<dyn Write>, Option<String>) = if output_directory.is_empty()
        {
            (Box::new(std::io::stdout()), None)
        } else {
            let path = format!("{}/{}_{}.csv", output_directory, instance, rand_seed);
            let file = fs::File::create(format!("{}.running", path)).map_err(|source| {
                Error::OutputFile {
                    path: path.clone(),
                    source,
                }
            })?;
            (Box::new(file), Some(path))
        };
        let (output_tbt, output_tbt_path): (Box<dyn Write>, Option<String>) =
            if output_directory.is_empty() {
                (Box::new(std::io::stdout()), None)
            } else {
                let path = format!("{}/tbt/{}_{}.csv", output_directory, instance, rand_seed);
                let file = fs::File::create(format!("{}.running", path)).map_err(|source| {
                    Error::OutputFile {
                        path: path.clone(),
                        source,
                    }
                })?;
                (Box::new(file), Some(path))
            };

        let parameters = Self {
            problem,
            instance: instance.to_string(),
            method,
            rand_seed,
            target,
            use_target,
            objective,
            time_limit,
            nb_max_iterations,
            initialization,
            nb_iter_local_search,
            max_time_local_search: resolved_ls_time,
            bound_nb_colors: resolved_bound,
            local_search,
            local_search_names: local_search_names.to_string(),
            adaptive,
            window_size,
            coeff_exploi_explo,
            simulation,
            o_time,
            p_time,
            output_directory: output_directory.to_string(),
            time_start: Instant::now(),
            stop_at_ms: AtomicU64::new(time_limit.saturating_mul(1000)),
            output: RefCell::new(output),
            output_path,
            output_tbt: RefCell::new(output_tbt),
            output_tbt_path,
        };
        parameters.write_output(&parameters.comment_lines());
        Ok(parameters)
    }

    /** convenience constructor used by tests: silent outputs, generous
    budgets, deterministic initialization. Adjust the public fields
    afterwards. */
    pub fn silent(method: Method, time_limit: u64, target: Weight) -> Self {
        Self {
            problem: Problem::Wvcp,
            instance: "test".to_string(),
            method,
            rand_seed: 1,
            target,
            use_target: false,
            objective: Objective::Reached,
            time_limit,
            nb_max_iterations: i64::MAX,
            initialization: Initializer::Deterministic,
            nb_iter_local_search: i64::MAX,
            max_time_local_search: time_limit,
            bound_nb_colors: usize::MAX,
            local_search: vec![LocalSearch::None],
            local_search_names: "none".to_string(),
            adaptive: AdaptiveKind::None,
            window_size: 50,
            coeff_exploi_explo: 1.0,
            simulation: Simulation::NoLs,
            o_time: 0,
            p_time: 0.02,
            output_directory: String::new(),
            time_start: Instant::now(),
            stop_at_ms: AtomicU64::new(time_limit.saturating_mul(1000)),
            output: RefCell::new(Box::new(std::io::sink())),
            output_path: None,
            output_tbt: RefCell::new(Box::new(std::io::sink())),
            output_tbt_path: None,
        }
    }

    fn comment_lines(&self) -> String {
        format!(
            "#date,problem,instance,method,rand_seed,target,use_target,objective,\
             time_limit,nb_max_iterations,initialization,nb_iter_local_search,\
             max_time_local_search,bound_nb_colors,local_search,adaptive,window_size,\
             coeff_exploi_explo,simulation,O_time,P_time\n\
             #{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            unix_time(),
            self.problem.name(),
            self.instance,
            self.method.name(),
            self.rand_seed,
            self.target,
            self.use_target,
            self.objective.name(),
            self.time_limit,
            self.nb_max_iterations,
            self.initialization.name(),
            self.nb_iter_local_search,
            self.max_time_local_search,
            self.bound_nb_colors,
            self.local_search_names,
            self.adaptive.name(),
            self.window_size,
            self.coeff_exploi_explo,
            self.simulation.name(),
            self.o_time,
            self.p_time,
        )
    }

    /// milliseconds elapsed since the start of the search
    fn elapsed_ms(&self) -> u64 {
        self.time_start.elapsed().as_millis() as u64
    }

    /// seconds elapsed since the start of the search
    pub fn elapsed_seconds(&self) -> i64 {
        self.time_start.elapsed().as_secs() as i64
    }

    /// whether the global deadline (or a stop request) has passed
    pub fn time_limit_reached(&self) -> bool {
        self.elapsed_ms() >= self.stop_at_ms.load(Ordering::Relaxed)
    }

    /** moves the stop token to "now"; the search exits cleanly at the next
    loop head. The only operation allowed from a termination handler. */
    pub fn request_stop(&self) {
        self.stop_at_ms.store(self.elapsed_ms(), Ordering::Relaxed);
    }

    /// deadline of one local-search call, capped by the global limit
    pub fn sub_method_deadline(&self) -> Instant {
        Instant::now() + Duration::from_secs(self.max_time_local_search)
    }

    /// whether the local deadline or the global limit has passed
    pub fn time_limit_reached_sub_method(&self, deadline: Instant) -> bool {
        Instant::now() >= deadline || self.time_limit_reached()
    }

    /// whether the score matches the user target (`-1` disables)
    pub fn target_reached(&self, score: Weight) -> bool {
        self.target >= 0 && score <= self.target
    }

    /// writes to the main CSV output, aborts on I/O error
    pub fn write_output(&self, text: &str) {
        if let Err(error) = self.output.borrow_mut().write_all(text.as_bytes()) {
            eprintln!("error while writing output: {}", error);
            std::process::exit(1);
        }
    }

    /// writes to the turn-by-turn CSV output, aborts on I/O error
    pub fn write_output_tbt(&self, text: &str) {
        if let Err(error) = self.output_tbt.borrow_mut().write_all(text.as_bytes()) {
            eprintln!("error while writing turn-by-turn output: {}", error);
            std::process::exit(1);
        }
    }

    /// exports the run summary as JSON next to the CSV (file output only)
    pub fn export_summary(&self, summary: &RunSummary) {
        if self.output_directory.is_empty() {
            return;
        }
        let path = format!(
            "{}/{}_{}.json",
            self.output_directory, self.instance, self.rand_seed
        );
        let text = serde_json::to_string(summary).expect("serializable summary");
        if let Err(error) = fs::write(&path, text) {
            eprintln!("error while writing {}: {}", path, error);
            std::process::exit(1);
        }
    }

    /** closes the outputs: writes the final date stamp, flushes, and renames
    the `.running` files to their final names. */
    pub fn end_search(&self) {
        self.write_output(&format!("#{}\n", unix_time()));
        let _ = self.output.borrow_mut().flush();
        let _ = self.output_tbt.borrow_mut().flush();
        for path in [&self.output_path, &self.output_tbt_path].iter().filter_map(|p| p.as_ref()) {
            if let Err(error) = fs::rename(format!("{}.running", path), path) {
                eprintln!("error while changing name of output file {}: {}", path, error);
                std::process::exit(1);
            }
        }
    }
}

/// seconds since the unix epoch, used as the date stamp of the CSV comments
fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_token() {
        let params = Parameters::silent(Method::LocalSearch, 3600, -1);
        assert!(!params.time_limit_reached());
        params.request_stop();
        assert!(params.time_limit_reached());
    }

    #[test]
    fn test_target_reached() {
        let mut params = Parameters::silent(Method::LocalSearch, 10, -1);
        assert!(!params.target_reached(0));
        params.target = 5;
        assert!(params.target_reached(5));
        assert!(params.target_reached(3));
        assert!(!params.target_reached(6));
    }

    #[test]
    fn test_sub_method_deadline() {
        let mut params = Parameters::silent(Method::LocalSearch, 3600, -1);
        params.max_time_local_search = 0;
        let deadline = params.sub_method_deadline();
        assert!(params.time_limit_reached_sub_method(deadline));
    }
}
