//! Configuration loading for the CLI

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use autoscale_core::SimulationConfig;
use config::{ConfigBuilder, Environment, File};

/// Default file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "autoscale.toml";

/// Load configuration from file and environment.
///
/// An explicit path must exist; otherwise the first of `./autoscale.toml`
/// and `~/.config/autoscale/autoscale.toml` is used if present. Variables
/// such as `AUTOSCALE__ENVIRONMENT__MAX_VMS` override file values.
pub fn load(explicit: Option<&Path>) -> Result<SimulationConfig> {
    load_with_env(explicit, env_source())
}

fn env_source() -> Environment {
    Environment::with_prefix("AUTOSCALE")
        .separator("__")
        .try_parsing(true)
}

fn load_with_env(explicit: Option<&Path>, environment: Environment) -> Result<SimulationConfig> {
    let config_path = match explicit {
        Some(path) if !path.exists() => bail!("Config file not found: {}", path.display()),
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

    if let Some(path) = &config_path {
        tracing::info!("Loading config from: {:?}", path);
        builder = builder.add_source(File::from(path.clone()).required(true));
    } else {
        tracing::debug!("No config file found, using defaults");
    }

    builder = builder.add_source(environment);

    let config: SimulationConfig = builder
        .build()?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    config.validate()?;
    Ok(config)
}

/// Path of the config file in effect, if any
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("autoscale").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}
