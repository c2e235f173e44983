//! Simulation, agent, and training configuration
//!
//! Every field has a default, so a partial config file (or none at all)
//! yields the reference experiment: a 1..=10 VM pool, 500 tick episodes,
//! and an epsilon-greedy agent with alpha 0.1, gamma 0.9, epsilon 0.2.

use serde::{Deserialize, Serialize};

use crate::error::{AutoscaleError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub environment: EnvironmentConfig,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;
        self.agent.validate()?;
        self.training.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub min_vms: usize,
    pub max_vms: usize,
    /// VM count after reset
    pub initial_vms: usize,
    /// The episode ends once the tick counter exceeds this value
    pub max_ticks: u64,
    /// Load removed from every VM per tick
    pub cpu_decay: f64,
    /// Holding cost per VM per tick
    pub vm_cost: f64,
    /// Upper bound (inclusive) on tasks arriving per tick
    pub max_arrivals: usize,
    pub cpu_demand_min: f64,
    pub cpu_demand_max: f64,
    pub duration_min: u32,
    pub duration_max: u32,
    /// Reject scaling past the pool bounds instead of ignoring it
    pub strict_bounds: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            min_vms: 1,
            max_vms: 10,
            initial_vms: 2,
            max_ticks: 500,
            cpu_decay: 0.1,
            vm_cost: 0.5,
            max_arrivals: 2,
            cpu_demand_min: 0.1,
            cpu_demand_max: 0.5,
            duration_min: 2,
            duration_max: 5,
            strict_bounds: false,
        }
    }
}

impl EnvironmentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_vms == 0 {
            return Err(invalid("environment.min_vms must be at least 1"));
        }
        if self.min_vms > self.max_vms {
            return Err(invalid(format!(
                "environment.min_vms ({}) exceeds max_vms ({})",
                self.min_vms, self.max_vms
            )));
        }
        if !(self.min_vms..=self.max_vms).contains(&self.initial_vms) {
            return Err(invalid(format!(
                "environment.initial_vms ({}) outside {}..={}",
                self.initial_vms, self.min_vms, self.max_vms
            )));
        }
        if !self.cpu_decay.is_finite() || self.cpu_decay < 0.0 {
            return Err(invalid("environment.cpu_decay must be a non-negative number"));
        }
        if !self.vm_cost.is_finite() || self.vm_cost < 0.0 {
            return Err(invalid("environment.vm_cost must be a non-negative number"));
        }
        if !(self.cpu_demand_min.is_finite()
            && self.cpu_demand_max.is_finite()
            && self.cpu_demand_min >= 0.0
            && self.cpu_demand_min < self.cpu_demand_max)
        {
            return Err(invalid(
                "environment.cpu_demand_min/max must be finite with 0 <= min < max",
            ));
        }
        if self.duration_min > self.duration_max {
            return Err(invalid("environment.duration_min exceeds duration_max"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Exploration probability
    pub epsilon: f64,
    /// Multiplier applied to epsilon after each episode; 1.0 keeps it fixed
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.2,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(invalid("agent.alpha must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(invalid("agent.gamma must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(invalid("agent.epsilon must be in [0, 1]"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(invalid("agent.epsilon_decay must be in (0, 1]"));
        }
        if !(0.0..=self.epsilon).contains(&self.min_epsilon) {
            return Err(invalid("agent.min_epsilon must be in [0, epsilon]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub baseline_episodes: usize,
    /// Fixed seed for reproducible runs; random when absent
    pub seed: Option<u64>,
    /// Log every n-th episode
    pub log_interval: usize,
    /// Baseline scales up above this average CPU
    pub cpu_high: f64,
    /// Baseline scales down below this average CPU
    pub cpu_low: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 300,
            baseline_episodes: 100,
            seed: None,
            log_interval: 1,
            cpu_high: 0.8,
            cpu_low: 0.3,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.log_interval == 0 {
            return Err(invalid("training.log_interval must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.cpu_low)
            || !(0.0..=1.0).contains(&self.cpu_high)
            || self.cpu_low > self.cpu_high
        {
            return Err(invalid(
                "training.cpu_low and cpu_high must satisfy 0 <= cpu_low <= cpu_high <= 1",
            ));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AutoscaleError {
    AutoscaleError::InvalidConfig(message.into())
}
