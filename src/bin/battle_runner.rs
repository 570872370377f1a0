//! Headless Battle Runner
//!
//! Auto-resolves a battle between two sides and prints the result. With
//! `--trials N` it runs N battles on consecutive seeds in parallel and
//! prints how often each side won.

use std::collections::BTreeMap;
use std::path::PathBuf;

use autoresolve::battle::{BattleLog, KillLedger, Reporter, TracingReporter};
use autoresolve::core::{Result, SimulationConfig};
use autoresolve::simulation::{BasicCommander, BattleOutcome, Scenario, SimulationManager};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

/// Headless Battle Runner - auto-resolve formation battles
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Auto-resolve a formation battle and print the outcome")]
struct Args {
    /// Simulation config (TOML). Defaults are used when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenario file (TOML). A two-sided skirmish is used when absent.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Override the config's round limit
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Number of battles to run on consecutive seeds
    #[arg(long, default_value_t = 1)]
    trials: u32,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every battle report to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output for a single battle
#[derive(Serialize)]
struct BattleResult {
    outcome: BattleOutcome,
    rounds: u32,
    seed: u64,
    survivors: Vec<String>,
    destroyed: Vec<String>,
    retreated_elements: usize,
    kills: usize,
}

/// JSON output for a batch of battles
#[derive(Serialize)]
struct TrialSummary {
    trials: u32,
    first_seed: u64,
    outcomes: BTreeMap<String, u32>,
    mean_rounds: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("battle_runner: {}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    config.validate()?;

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::skirmish(&config),
    };

    if args.trials <= 1 {
        let (result, log) = run_battle(&config, &scenario, BattleLog::new())?;
        if args.verbose {
            for entry in &log.entries {
                eprintln!("  [{} {:?}] {:?}", entry.round, entry.phase, entry.record);
            }
        }
        print_result(&args.format, &result)?;
        return Ok(());
    }

    let results: Vec<BattleResult> = (0..args.trials)
        .into_par_iter()
        .map(|trial| {
            let mut config = config.clone();
            config.seed = config.seed.wrapping_add(trial as u64);
            // Batch runs keep no log; reports go to tracing at debug level
            run_battle(&config, &scenario, TracingReporter).map(|(result, _)| result)
        })
        .collect::<Result<_>>()?;

    let mut outcomes = BTreeMap::new();
    for result in &results {
        *outcomes.entry(outcome_label(result.outcome)).or_insert(0) += 1;
    }
    let total_rounds: u64 = results.iter().map(|r| r.rounds as u64).sum();
    let summary = TrialSummary {
        trials: args.trials,
        first_seed: config.seed,
        outcomes,
        mean_rounds: total_rounds as f64 / results.len().max(1) as f64,
    };
    print_summary(&args.format, &summary)
}

fn run_battle<R: Reporter>(
    config: &SimulationConfig,
    scenario: &Scenario,
    reporter: R,
) -> Result<(BattleResult, R)> {
    let mut manager = SimulationManager::with_parts(config.clone(), reporter, KillLedger::new())?;
    for formation in scenario.build() {
        manager.add_formation(formation);
    }

    let mut commander = BasicCommander::new();
    let outcome = manager.run(&mut commander);

    let result = BattleResult {
        outcome,
        rounds: manager.round(),
        seed: config.seed,
        survivors: manager.formations().iter().map(|f| f.name.clone()).collect(),
        destroyed: manager
            .graveyard()
            .iter()
            .filter(|f| f.is_destroyed())
            .map(|f| f.name.clone())
            .collect(),
        retreated_elements: manager.retreated().len(),
        kills: manager.ledger().kills().len(),
    };
    Ok((result, manager.into_reporter()))
}

fn outcome_label(outcome: BattleOutcome) -> String {
    match outcome {
        BattleOutcome::Victory(side) => format!("victory_side_{}", side.0),
        other => format!("{:?}", other),
    }
}

fn print_result(format: &str, result: &BattleResult) -> Result<()> {
    match format {
        "text" => {
            println!("Battle Result");
            println!("=============");
            println!("Outcome: {}", outcome_label(result.outcome));
            println!("Rounds: {}", result.rounds);
            println!("Survivors: {}", result.survivors.join(", "));
            println!("Destroyed: {}", result.destroyed.join(", "));
            println!("Elements retreated: {}", result.retreated_elements);
            println!("Kills: {}", result.kills);
            println!();
            println!("Seed: {}", result.seed);
        }
        "json" => println!("{}", serde_json::to_string_pretty(result)?),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }
    Ok(())
}

fn print_summary(format: &str, summary: &TrialSummary) -> Result<()> {
    match format {
        "text" => {
            println!("Trials: {} (seeds from {})", summary.trials, summary.first_seed);
            for (outcome, count) in &summary.outcomes {
                println!(
                    "  {:<20} {:>5}  ({:.1}%)",
                    outcome,
                    count,
                    *count as f64 * 100.0 / summary.trials as f64
                );
            }
            println!("Mean rounds: {:.2}", summary.mean_rounds);
        }
        _ => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}
