//! Autoscale Core - Core types, configuration, and errors
//!
//! This crate provides the foundational types shared by the simulation,
//! the learning agent, and the command line driver.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{AgentConfig, EnvironmentConfig, SimulationConfig, TrainingConfig};
pub use error::{AutoscaleError, Result};
pub use types::*;
