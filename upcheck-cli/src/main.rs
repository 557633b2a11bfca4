// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! upcheck CLI - version checks from the command line.
//!
//! # Examples
//!
//! ```bash
//! # One-shot check
//! upcheck check --url https://example.com/version --app-version 42
//!
//! # Show the persisted outcome of the last check
//! upcheck last
//!
//! # Keep checking hourly until interrupted
//! upcheck watch --url https://example.com/version --app-version 42 --period hourly
//!
//! # JSON output
//! upcheck check --url https://example.com/version --app-version 42 --format json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use upcheck::{
    CheckError, CheckPeriod, CheckerConfig, FileStateStore, StateStore, VersionChecker,
    VersionResponse,
};
use upcheck_store::default_state_path;

// ============================================================================
// CLI Definition
// ============================================================================

/// upcheck CLI - poll a version endpoint and report the verdict.
#[derive(Parser)]
#[command(name = "upcheck")]
#[command(about = "Version-check client CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// State file path (defaults to the platform config dir).
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run one version check and print the verdict.
    Check(CheckArgs),

    /// Show the persisted outcome of the last successful check.
    Last,

    /// Check periodically until interrupted.
    Watch(WatchArgs),
}

/// Arguments for the check command.
#[derive(clap::Args)]
pub struct CheckArgs {
    /// Callback URL to poll.
    #[arg(long)]
    pub url: String,

    /// Query parameter name carrying the version.
    #[arg(long, default_value = "v")]
    pub key: String,

    /// Current application version number.
    #[arg(long)]
    pub app_version: u64,
}

/// Arguments for the watch command.
#[derive(clap::Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub check: CheckArgs,

    /// How often to check.
    #[arg(long, default_value = "hourly")]
    pub period: Period,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Scheduling period options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    /// Every hour.
    Hourly,
    /// Every 24 hours.
    Daily,
    /// Every 7 days.
    Weekly,
    /// Every 30 days.
    Monthly,
}

impl From<Period> for CheckPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Hourly => CheckPeriod::Hourly,
            Period::Daily => CheckPeriod::Daily,
            Period::Weekly => CheckPeriod::Weekly,
            Period::Monthly => CheckPeriod::Monthly,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("upcheck=debug,info")
    } else {
        EnvFilter::new("upcheck=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Check(args) => run_check(args, &cli).await,
        Commands::Last => run_last(&cli).await,
        Commands::Watch(args) => run_watch(args, &cli).await,
    }
}

fn state_path(cli: &Cli) -> PathBuf {
    cli.state_file.clone().unwrap_or_else(default_state_path)
}

async fn build_checker(
    args: &CheckArgs,
    cli: &Cli,
    period: CheckPeriod,
) -> Result<(
    VersionChecker,
    tokio::sync::mpsc::UnboundedReceiver<Result<VersionResponse, CheckError>>,
)> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let success_tx = tx.clone();
    let failure_tx = tx;

    let store = Arc::new(FileStateStore::load(state_path(cli)).await);

    let checker = VersionChecker::builder(CheckerConfig::new(
        args.url.clone(),
        args.key.clone(),
        args.app_version,
    ))
    .store(store)
    .period(period)
    .on_success(move |response| {
        let _ = success_tx.send(Ok(response));
    })
    .on_failure(move |error| {
        let _ = failure_tx.send(Err(error));
    })
    .build()
    .await
    .context("failed to build version checker")?;

    Ok((checker, rx))
}

/// Runs one check and prints the verdict.
async fn run_check(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let (checker, mut rx) = build_checker(args, cli, CheckPeriod::Manual).await?;

    checker.check_version();
    let outcome = rx.recv().await.context("checker went away mid-check")?;

    match outcome {
        Ok(response) => {
            print_response(&response, cli.format)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Prints the persisted state without touching the network.
async fn run_last(cli: &Cli) -> Result<()> {
    let store = FileStateStore::load(state_path(cli)).await;
    let state = store.state().await;

    match state.last_response {
        Some(response) => {
            if cli.format == OutputFormat::Text {
                if let Some(date) = state.last_check_date {
                    println!("last checked: {date}");
                }
            }
            print_response(&response, cli.format)
        }
        None => {
            if cli.format == OutputFormat::Json {
                println!("null");
            } else {
                println!("no version check recorded yet");
            }
            Ok(())
        }
    }
}

/// Checks periodically until interrupted, printing each outcome.
async fn run_watch(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let (_checker, mut rx) = build_checker(&args.check, cli, args.period.into()).await?;

    loop {
        tokio::select! {
            outcome = rx.recv() => {
                match outcome {
                    Some(Ok(response)) => print_response(&response, cli.format)?,
                    Some(Err(e)) => eprintln!("check failed: {e}"),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_response(response: &VersionResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Text => {
            println!(
                "update available: {}",
                if response.update_available { "yes" } else { "no" }
            );
            println!(
                "update required:  {}",
                if response.update_required { "yes" } else { "no" }
            );
            if let Some(latest) = response.latest_version {
                println!("latest version:   {latest}");
            }
            if let Some(ref key) = response.latest_version_key {
                println!("latest key:       {key}");
            }
            if let Some(minimum) = response.minimum_supported_version {
                println!("minimum version:  {minimum}");
            }
            if let Some(since) = response.update_available_since {
                println!("available since:  {since}");
            }
        }
    }
    Ok(())
}
