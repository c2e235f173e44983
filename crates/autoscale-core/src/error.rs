//! Error types for autoscale

use thiserror::Error;

/// Main error type for autoscale
#[derive(Error, Debug)]
pub enum AutoscaleError {
    #[error("Invalid action index: {0}")]
    InvalidAction(usize),

    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Infeasible scaling: cannot {action} with {vm_count} VMs ({min_vms}..={max_vms})")]
    InfeasibleScaling {
        action: String,
        vm_count: usize,
        min_vms: usize,
        max_vms: usize,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

/// Result type alias for autoscale operations
pub type Result<T> = std::result::Result<T, AutoscaleError>;
