use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tri_duel::ingest::ActivityRecord;
use tri_duel::pipeline::Competition;

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 4;
const EXIT_DATA: i32 = 5;
const EXIT_LEDGER: i32 = 6;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show standings, projection and stakes (default if no subcommand)
    Standings,
    /// Show the per-block grid
    Blocks,
    /// Show cumulative totals per sport
    Sports,
    /// Freeze the scores of every block whose window has closed
    Lock {
        /// Treat this instant as now (RFC 3339, e.g. 2026-03-09T08:00:00Z)
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },
    /// Validate the competition file and print the schedule
    Check,
}

#[derive(Parser, Debug)]
#[command(name = "tri-duel")]
#[command(about = "Two-athlete triathlon duel scoreboard", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/tri-duel/competition.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors even on a terminal
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 instant '{}': {}", value, e))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            EXIT_DATA
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Explicit RUST_LOG always wins over --verbose
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", if cli.verbose { "debug" } else { "warn" });
    }
    sensible_env_logger::init!();

    let command = cli.command.unwrap_or(Commands::Standings);
    let start_time = Instant::now();

    // Load config
    let (config_path, config) = match tri_duel::config::load_config(cli.config.map(PathBuf::from)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    log::debug!("Loaded competition from {}", config_path.display());

    // Validate the whole definition at startup
    if let Err(errors) = tri_duel::scoring::validate_competition(&config) {
        eprintln!("Competition config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let mut competition = match Competition::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let ledger_path = match &config.ledger {
        Some(file) => tri_duel::config::resolve_relative(&config_path, file),
        None => match tri_duel::ledger::get_ledger_path() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Ledger error: {:#}", e);
                std::process::exit(EXIT_LEDGER);
            }
        },
    };
    let ledger = match tri_duel::ledger::load_ledger(&ledger_path) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Ledger error: {:#}", e);
            std::process::exit(EXIT_LEDGER);
        }
    };
    competition.schedule.apply_locks(&ledger);

    let use_colors = !cli.no_color && !cli.json && tri_duel::output::should_use_colors();

    if let Commands::Check = command {
        let code = if cli.json {
            print_json(&competition.schedule)
        } else {
            println!(
                "Config OK: {} athletes, {} blocks, {} locked",
                competition.athletes.len(),
                competition.schedule.len(),
                ledger.len()
            );
            println!("{}", tri_duel::output::format_schedule(&competition.schedule));
            EXIT_SUCCESS
        };
        std::process::exit(code);
    }

    // Activities from the sync side
    let activities = match &config.activities {
        Some(file) => {
            let path = tri_duel::config::resolve_relative(&config_path, file);
            match tri_duel::ingest::load_activities(&path) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("Data error: {:#}", e);
                    std::process::exit(EXIT_DATA);
                }
            }
        }
        None => {
            log::warn!("No activities file configured, scoring without data");
            Vec::new()
        }
    };
    let code = match command {
        Commands::Lock { now } => run_lock(
            &competition,
            &activities,
            &ledger_path,
            now.unwrap_or_else(Utc::now),
            cli.json,
        ),
        view => {
            let (metrics, summary) = tri_duel::ingest::ingest_activities(
                &activities,
                &competition.schedule,
                &competition.athletes,
            );
            if cli.verbose {
                eprintln!(
                    "Activities: {} new, {} skipped, {} ignored sport",
                    summary.new, summary.skipped, summary.ignored_sport
                );
            }

            let outcomes = tri_duel::pipeline::score_blocks(
                &competition.schedule,
                &competition.athletes,
                &metrics,
                &ledger,
            );
            let scoreboard = match tri_duel::pipeline::build_scoreboard(&competition, outcomes) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Data error: {}", e);
                    std::process::exit(EXIT_DATA);
                }
            };

            match (view, cli.json) {
                (Commands::Blocks, true) => print_json(&scoreboard.blocks),
                (Commands::Blocks, false) => {
                    println!(
                        "{}",
                        tri_duel::output::format_block_grid(&scoreboard, use_colors)
                    );
                    EXIT_SUCCESS
                }
                (Commands::Sports, true) => print_json(&scoreboard.breakdown),
                (Commands::Sports, false) => {
                    println!(
                        "{}",
                        tri_duel::output::format_breakdown(&scoreboard.breakdown, &scoreboard.athletes)
                    );
                    EXIT_SUCCESS
                }
                (_, true) => print_json(&scoreboard),
                (_, false) => {
                    println!(
                        "{}",
                        tri_duel::output::format_scoreboard(&scoreboard, use_colors)
                    );
                    EXIT_SUCCESS
                }
            }
        }
    };

    if cli.verbose {
        eprintln!("Done in {:?}", start_time.elapsed());
    }

    std::process::exit(code);
}

/// Lock closed blocks. The ledger is re-read under the refresh guard, so the
/// copy loaded at startup never decides what gets locked.
fn run_lock(
    competition: &Competition,
    activities: &[ActivityRecord],
    ledger_path: &Path,
    now: DateTime<Utc>,
    json: bool,
) -> i32 {
    let report = match tri_duel::pipeline::refresh_locks(competition, activities, ledger_path, now) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Ledger error: {:#}", e);
            return EXIT_LEDGER;
        }
    };

    let code = if json {
        print_json(&report)
    } else {
        println!("{}", tri_duel::output::format_lock_report(&report));
        EXIT_SUCCESS
    };

    if report.failed.is_empty() {
        code
    } else {
        EXIT_DATA
    }
}
