//! feegrantctl - inspect and advance fee grant expirations
//!
//! Reads a grant config and runs one command against it:
//! - validate: check the config and summarize its grants
//! - check: report which grants are expired at a time and height
//! - step: advance a grant by its reset period
//! - export / fast-forward: rewrite expirations across a chain restart

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use feegrant_config::{default_config_path, parse_instant, GrantId};
use feegrantctl::{
    check_grants, clock, describe_config_error, export_grants, fast_forward_grants, load_book,
    step_grant, GrantRecord,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// feegrantctl - Inspect and advance fee grant expirations
#[derive(Parser, Debug)]
#[command(name = "feegrantctl")]
#[command(about = "Inspect and advance fee grant expirations", long_about = None)]
struct Args {
    /// Grant config path (default: ~/.config/feegrant/grants.toml)
    #[arg(short, long, env = "FEEGRANT_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the config and list its grants
    Validate,

    /// Report whether each grant is expired
    Check {
        /// Block time, RFC 3339 (default: now)
        #[arg(long, value_parser = parse_instant)]
        time: Option<DateTime<Utc>>,

        /// Block height
        #[arg(long)]
        height: u64,
    },

    /// Advance a grant's expiration by its reset period
    Step {
        /// Grant ID
        #[arg(long)]
        grant: String,

        /// Number of periods to advance
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Print every grant prepared for export at a dump time and height
    Export {
        /// Block time of the dump, RFC 3339
        #[arg(long, value_parser = parse_instant)]
        time: DateTime<Utc>,

        /// Block height of the dump
        #[arg(long)]
        height: u64,
    },

    /// Print every grant re-anchored at a time or height, keeping its unit
    FastForward {
        /// Block time to anchor time-based grants at, RFC 3339
        #[arg(long, value_parser = parse_instant)]
        time: DateTime<Utc>,

        /// Block height to anchor height-based grants at
        #[arg(long)]
        height: u64,
    },
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Validate => validate(&args.config),
        Command::Check { time, height } => {
            let book = load_book(&args.config)?;
            let now = time.unwrap_or_else(clock::now);
            info!(time = %now, height, "Checking grants");
            for status in check_grants(&book, now, height) {
                println!("{}", status);
            }
            Ok(())
        }
        Command::Step { grant, times } => {
            let book = load_book(&args.config)?;
            let record = step_grant(&book, &GrantId::new(grant), times)?;
            print_json(&record)
        }
        Command::Export { time, height } => {
            let book = load_book(&args.config)?;
            let records: Vec<GrantRecord> = export_grants(&book, time, height)?;
            print_json(&records)
        }
        Command::FastForward { time, height } => {
            let book = load_book(&args.config)?;
            print_json(&fast_forward_grants(&book, time, height))
        }
    }
}

fn validate(path: &Path) -> Result<()> {
    let book = feegrant_config::load_config(path).map_err(|e| {
        anyhow::anyhow!(
            "Configuration validation failed\n{}",
            describe_config_error(&e)
        )
    })?;

    println!("Configuration is valid");
    println!();
    println!("Summary:");
    println!("  Config version: {}", feegrant_config::CURRENT_CONFIG_VERSION);
    println!("  Grants: {}", book.grants.len());

    if !book.grants.is_empty() {
        println!();
        println!("Grants:");
        for grant in &book.grants {
            let period = grant
                .period
                .map(|p| format!("every {}", p))
                .unwrap_or_else(|| "no reset".into());
            println!("  - {}: expires {} ({})", grant.id, grant.expires_at, period);
            if let Some(note) = &grant.note {
                println!("      {}", note);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so JSON output stays clean
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "feegrantctl starting");

    if clock::is_mock_time_active() {
        warn!(
            mock_time_env = clock::MOCK_TIME_ENV_VAR,
            now = %clock::now(),
            "Mock time is active, defaulted times are not the real clock"
        );
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
