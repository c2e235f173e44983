//! Common types used throughout autoscale

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AutoscaleError, Result};

/// Reward value emitted by the environment
pub type Reward = f64;

/// Training run identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scaling decision applied to the VM pool at each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAction {
    /// Leave the pool unchanged
    NoOp = 0,
    /// Add one VM
    ScaleUp = 1,
    /// Remove the most recently added VM
    ScaleDown = 2,
}

impl ScalingAction {
    /// All actions in ordinal order
    pub const ALL: [ScalingAction; 3] = [Self::NoOp, Self::ScaleUp, Self::ScaleDown];

    /// Convert action to index for discrete action spaces
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Create action from index
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::NoOp),
            1 => Some(Self::ScaleUp),
            2 => Some(Self::ScaleDown),
            _ => None,
        }
    }

    /// Number of discrete actions
    pub const fn action_space_size() -> usize {
        3
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoOp => "no_op",
            Self::ScaleUp => "scale_up",
            Self::ScaleDown => "scale_down",
        }
    }
}

impl TryFrom<usize> for ScalingAction {
    type Error = AutoscaleError;

    fn try_from(index: usize) -> Result<Self> {
        Self::from_index(index).ok_or(AutoscaleError::InvalidAction(index))
    }
}

impl From<ScalingAction> for usize {
    fn from(action: ScalingAction) -> Self {
        action.to_index()
    }
}

impl std::fmt::Display for ScalingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the agent sees after every reset and step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Number of active VMs
    pub vm_count: usize,
    /// Mean per-VM CPU load in [0, 1]
    pub avg_cpu: f64,
    /// Pending tasks
    pub queue_length: usize,
}

impl Observation {
    /// Length of the feature vector
    pub const DIMENSION: usize = 3;

    pub fn new(vm_count: usize, avg_cpu: f64, queue_length: usize) -> Self {
        Self {
            vm_count,
            avg_cpu,
            queue_length,
        }
    }

    /// Feature vector `[vm_count, avg_cpu, queue_length]`
    pub fn to_features(&self) -> [f64; Self::DIMENSION] {
        [
            self.vm_count as f64,
            self.avg_cpu,
            self.queue_length as f64,
        ]
    }

    /// Rebuild an observation from a feature vector.
    ///
    /// Counts are rounded to the nearest integer and clamped at zero.
    pub fn from_features(features: &[f64]) -> Result<Self> {
        if features.len() != Self::DIMENSION {
            return Err(AutoscaleError::DimensionMismatch {
                expected: Self::DIMENSION,
                actual: features.len(),
            });
        }

        Ok(Self {
            vm_count: to_count(features[0]),
            avg_cpu: features[1],
            queue_length: to_count(features[2]),
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> usize {
    value.round().max(0.0) as usize
}

/// A unit of work waiting to be scheduled on a VM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// CPU load added to the VM that runs the task
    pub cpu_demand: f64,
    /// Ticks of delay charged when the task is scheduled
    pub duration: u32,
}

impl Task {
    pub fn new(cpu_demand: f64, duration: u32) -> Self {
        Self {
            cpu_demand,
            duration,
        }
    }
}
