// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

// not sure if already by default in clippy
#![warn(clippy::similar_names)]
#![warn(clippy::shadow_unrelated)]
#![warn(clippy::shadow_same)]
#![warn(clippy::shadow_reuse)]

use std::time::{SystemTime, UNIX_EPOCH};

use clap::{load_yaml, App, ArgMatches};
use rand::rngs::StdRng;
use rand::SeedableRng;

use wvcp_color::adaptive::AdaptiveKind;
use wvcp_color::error::Error;
use wvcp_color::graph::{Graph, Problem, Weight};
use wvcp_color::local_search::LocalSearchRunner;
use wvcp_color::mcts::Mcts;
use wvcp_color::parameters::{Method, Objective, Parameters, RunSummary};
use wvcp_color::search::greedy::Initializer;
use wvcp_color::simulation::Simulation;
use wvcp_color::solution::BestBounds;

/** reads the command line, loads the instance and runs the configured
method; configuration and I/O errors exit with code 1. */
pub fn main() {
    let yaml = load_yaml!("main_args.yml");
    let matches = App::from_yaml(yaml).get_matches();
    if let Err(error) = run(&matches) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

/// parses a numeric flag
fn parse_flag<T: std::str::FromStr>(matches: &ArgMatches, flag: &'static str) -> Result<T, Error> {
    let value = matches.value_of(flag).expect("flag has a default value");
    value.parse::<T>().map_err(|_| Error::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let problem = Problem::from_name(matches.value_of("problem").expect("default"))?;
    let instance = matches.value_of("instance").expect("required argument");
    let method = Method::from_name(matches.value_of("method").expect("default"))?;
    let rand_seed: u64 = match matches.value_of("rand_seed") {
        Some(value) => value.parse().map_err(|_| Error::InvalidValue {
            flag: "rand_seed",
            value: value.to_string(),
        })?,
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    };
    let target: Weight = parse_flag(matches, "target")?;
    let use_target = matches.is_present("use_target");
    let objective = Objective::from_name(matches.value_of("objective").expect("default"))?;
    let time_limit: u64 = parse_flag(matches, "time_limit")?;
    let nb_max_iterations: i64 = parse_flag(matches, "nb_max_iterations")?;
    let initialization =
        Initializer::from_name(matches.value_of("initialization").expect("default"))?;
    let nb_iter_local_search: i64 = parse_flag(matches, "nb_iter_local_search")?;
    let max_time_local_search: i64 = parse_flag(matches, "max_time_local_search")?;
    let bound_nb_colors: i64 = parse_flag(matches, "bound_nb_colors")?;
    let local_search_names = matches.value_of("local_search").expect("default");
    let adaptive = AdaptiveKind::from_name(matches.value_of("adaptive").expect("default"))?;
    let window_size: usize = parse_flag(matches, "window_size")?;
    let coeff_exploi_explo: f64 = parse_flag(matches, "coeff_exploi_explo")?;
    let simulation = Simulation::from_name(matches.value_of("simulation").expect("default"))?;
    let o_time: i64 = parse_flag(matches, "O_time")?;
    let p_time: f64 = parse_flag(matches, "P_time")?;
    let output_directory = matches.value_of("output_directory").expect("default");

    let graph = Graph::load("../instances", instance, problem)?;
    graph.display_statistics();

    let params = Parameters::new(
        problem,
        instance,
        method,
        rand_seed,
        target,
        use_target,
        objective,
        time_limit,
        nb_max_iterations,
        initialization,
        nb_iter_local_search,
        max_time_local_search,
        bound_nb_colors,
        local_search_names,
        adaptive,
        window_size,
        coeff_exploi_explo,
        simulation,
        o_time,
        p_time,
        output_directory,
        graph.nb_vertices,
        graph.max_degree(),
    )?;

    let mut rng = StdRng::seed_from_u64(rand_seed);
    let mut bounds = BestBounds::new();

    let summary = match method {
        Method::LocalSearch => {
            let mut runner = LocalSearchRunner::new(graph, &params, &mut rng);
            runner.run(&params, &mut bounds, &mut rng);
            let solution = runner.best_solution();
            RunSummary {
                method: method.name().to_string(),
                score: solution.score_wvcp(),
                nb_colors: solution.nb_non_empty_colors(),
                penalty: solution.penalty(),
                turn: 0,
                time: params.elapsed_seconds(),
            }
        }
        Method::Mcts => {
            let mut mcts = Mcts::new(graph, &params, &mut bounds, &mut rng);
            mcts.run(&params, &mut bounds, &mut rng);
            let solution = mcts.best_solution();
            RunSummary {
                method: method.name().to_string(),
                score: solution.score_wvcp(),
                nb_colors: solution.nb_non_empty_colors(),
                penalty: solution.penalty(),
                turn: mcts.turn(),
                time: mcts.t_best(),
            }
        }
    };
    params.export_summary(&summary);
    params.end_search();
    Ok(())
}
