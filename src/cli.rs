use serde::Serialize;

use crate::balance::{balance, check_balance_input, mean_delta, resolve, BalanceAlgorithm};
use crate::config::AppConfig;
use crate::data::player::{load_roster, PlayerId, RatedPlayer};
use crate::data::validate::validate_roster_file;
use crate::logging::init_logging;
use crate::server;

const USAGE: &str = "usage: calciotto <serve|balance|validate>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Balance,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("balance") => Some(Command::Balance),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Balance) => handle_balance(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_serve() -> i32 {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    init_logging(&config.logging);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return 1;
        }
    };
    match runtime.block_on(server::run_server(&config)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

#[derive(Debug, Serialize)]
struct BalanceReport<'a> {
    algorithm: BalanceAlgorithm,
    per_team: usize,
    seed: u64,
    score: f64,
    mean_delta: f64,
    light: &'a [PlayerId],
    dark: &'a [PlayerId],
}

fn handle_balance(args: &[String]) -> i32 {
    let positional: Vec<&String> = args
        .iter()
        .skip(2)
        .filter(|arg| !arg.starts_with("--"))
        .collect();
    let Some(path) = positional.first() else {
        eprintln!("usage: calciotto balance <roster.json> [per_team] [seed] [--random] [--table]");
        return 2;
    };
    let as_table = args.iter().any(|arg| arg == "--table");
    let algorithm = if args.iter().any(|arg| arg == "--random") {
        BalanceAlgorithm::RandomSeeded
    } else {
        BalanceAlgorithm::GreedyLocal
    };

    let players = match load_roster(path.as_str()) {
        Ok(players) => players,
        Err(err) => {
            eprintln!("balance failed: {err}");
            return 1;
        }
    };
    let default_per_team = (players.len() / 2).max(1);
    let per_team = parse_usize_arg(positional.get(1).copied(), "per_team", default_per_team);
    let seed = parse_u64_arg(positional.get(2).copied(), "seed", 0);

    let problems = check_balance_input(players.iter().map(|p| p.id.as_str()), per_team);
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("balance failed: {problem}");
        }
        return 1;
    }

    let outcome = balance(&players, per_team, seed, algorithm);
    let light = resolve(&players, &outcome.partition.light);
    let dark = resolve(&players, &outcome.partition.dark);
    let delta = mean_delta(light.iter().copied(), dark.iter().copied());

    if as_table {
        println!("side\tcount\tmean\tplayers");
        print_side("light", &light);
        print_side("dark", &dark);
        println!("score\t{:.6}\tmean_delta\t{:.6}", outcome.score, delta);
        return 0;
    }

    let report = BalanceReport {
        algorithm,
        per_team,
        seed,
        score: outcome.score,
        mean_delta: delta,
        light: &outcome.partition.light,
        dark: &outcome.partition.dark,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize balance result: {err}");
            1
        }
    }
}

fn print_side(name: &str, players: &[&RatedPlayer]) {
    let mean = if players.is_empty() {
        0.0
    } else {
        players.iter().map(|p| p.mean).sum::<f64>() / players.len() as f64
    };
    let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
    println!("{name}\t{}\t{mean:.3}\t{}", players.len(), ids.join(","));
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: calciotto validate <roster.json>");
        return 2;
    };

    match validate_roster_file(path) {
        Ok(report) => {
            for diagnostic in &report.diagnostics {
                eprintln!("- {diagnostic}");
            }
            if report.has_errors() {
                eprintln!("validation failed: {} error(s)", report.error_count());
                1
            } else {
                println!("validation passed: {path}");
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn parse_usize_arg(raw: Option<&String>, name: &str, default: usize) -> usize {
    raw.and_then(|value| value.parse::<usize>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
