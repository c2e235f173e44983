//! Configuration management commands

use std::path::Path;

use anyhow::{Context, Result};
use autoscale_core::SimulationConfig;
use clap::Subcommand;

use crate::settings;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a configuration file with default values
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config_path).await,
        ConfigCommands::Init { force } => init(config_path, force).await,
    }
}

async fn show(config_path: Option<&Path>) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    match config_path
        .map(Path::to_path_buf)
        .or_else(settings::find_config_file)
    {
        Some(path) => println!("Config file: {}\n", path.display()),
        None => println!("No configuration file found. Using defaults.\n"),
    }

    let config = settings::load(config_path)?;
    println!("{}", render(&config)?);
    Ok(())
}

async fn init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path.unwrap_or_else(|| Path::new(settings::CONFIG_FILE_NAME));

    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, render(&SimulationConfig::default())?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn render(config: &SimulationConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render configuration")
}
