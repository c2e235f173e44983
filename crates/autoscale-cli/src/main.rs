//! Autoscale CLI - Train a Q-learning scaling policy and compare it with
//! the CPU threshold baseline.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]
#![allow(clippy::cast_precision_loss)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod settings;

use commands::{config, run};

#[derive(Parser)]
#[command(name = "autoscale")]
#[command(author, version, about = "Autoscale - learn VM scaling policies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./autoscale.toml or ~/.config/autoscale/autoscale.toml)
    #[arg(short, long, global = true, env = "AUTOSCALE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a Q-learning agent
    Train(run::RunArgs),

    /// Run the CPU threshold baseline
    Baseline(run::RunArgs),

    /// Train an agent, then evaluate it against the baseline
    Compare(run::CompareArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("autoscale={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Train(args) => run::train(args, settings::load(config_path)?).await,
        Commands::Baseline(args) => run::baseline(args, settings::load(config_path)?).await,
        Commands::Compare(args) => run::compare(args, settings::load(config_path)?).await,
        Commands::Config(cmd) => config::run(cmd, config_path).await,
    }
}
