//! Transitions observed while interacting with the environment

use autoscale_core::{Observation, Reward, ScalingAction};
use serde::{Deserialize, Serialize};

/// A single experience tuple (s, a, r, s', done)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: Observation,
    pub action: ScalingAction,
    pub reward: Reward,
    pub next_state: Observation,
    pub done: bool,
}

impl Experience {
    pub fn new(
        state: Observation,
        action: ScalingAction,
        reward: Reward,
        next_state: Observation,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}
