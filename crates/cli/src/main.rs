//! Recommendation consistency CLI
//!
//! Reconciles a freshly computed set of cost-optimization recommendations
//! against the previous completed analysis and reports how stable the
//! results are between runs.

mod commands;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::reconcile::ReconcileArgs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Recommendation consistency CLI
#[derive(Parser)]
#[command(name = "consistency")]
#[command(author, version, about = "Recommendation consistency reconciler", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.config/consistency/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a run against the previous snapshot
    Reconcile {
        /// Current run candidates (JSON)
        #[arg(long)]
        current: PathBuf,

        /// Previous completed snapshot (JSON); a missing file means first run
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Account the run belongs to, used in logs
        #[arg(long, env = "CONSISTENCY_ACCOUNT", default_value = "default")]
        account: String,

        /// Run id stored in the written snapshot
        #[arg(long)]
        run_id: Option<String>,

        /// Write the reconciled set as the next snapshot
        #[arg(long)]
        write_snapshot: Option<PathBuf>,

        /// Print Prometheus metrics to stderr after reconciling
        #[arg(long)]
        metrics: bool,
    },

    /// Inspect stored snapshots
    #[command(subcommand)]
    Snapshot(SnapshotCommands),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Show a summary of a snapshot
    Show {
        /// Snapshot file
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Reconcile {
            current,
            previous,
            account,
            run_id,
            write_snapshot,
            metrics,
        } => {
            let args = ReconcileArgs {
                current,
                previous,
                account,
                run_id,
                write_snapshot,
                metrics,
            };
            commands::reconcile::reconcile(config, args, cli.format)?;
        }
        Commands::Snapshot(snapshot_cmd) => match snapshot_cmd {
            SnapshotCommands::Show { path } => {
                commands::snapshot::show_snapshot(&path, cli.format)?;
            }
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => {
                commands::settings::show_config(&config, cli.format)?;
            }
        },
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
