//! Autoscale RL - Workload simulation and tabular Q-learning
//!
//! This crate provides the cloud workload environment a scaling policy is
//! learned against, the Q-learning agent, the threshold baseline, and the
//! training engine that drives episodes between them.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod agent;
pub mod engine;
pub mod environment;
pub mod experience;
pub mod policy;
pub mod state;

pub use agent::QAgent;
pub use engine::{
    ComparisonReport, EpisodeStats, Experiment, RunReport, RunSummary, TrainingEngine,
};
pub use environment::{CloudEnvironment, StepOutcome};
pub use experience::Experience;
pub use policy::{baseline_policy, GreedyPolicy, Policy, ThresholdPolicy};
pub use state::{QTable, StateKey};
