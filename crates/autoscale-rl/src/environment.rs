//! Synthetic cloud workload environment
//!
//! One call to [`CloudEnvironment::step`] advances the simulation by one
//! tick: apply the scaling action, schedule at most one queued task, let
//! every VM burn off some load, enqueue new arrivals, then charge the tick's
//! cost as a negative reward.

use std::collections::VecDeque;

use autoscale_core::{
    AutoscaleError, EnvironmentConfig, Observation, Result, Reward, ScalingAction, Task,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: Reward,
    pub done: bool,
    /// Duration of the task scheduled this tick, 0 if none was
    pub delay: u32,
    /// VM holding cost charged this tick
    pub cost: f64,
    /// Whether the scaling action changed the pool
    pub scaled: bool,
}

/// VM pool, per-VM load, and pending task queue
pub struct CloudEnvironment<R = StdRng> {
    config: EnvironmentConfig,
    /// One entry per active VM, so its length is the VM count
    cpu_load: Vec<f64>,
    task_queue: VecDeque<Task>,
    tick: u64,
    rng: R,
}

impl CloudEnvironment<StdRng> {
    /// Environment with a reproducible workload
    pub fn with_seed(config: EnvironmentConfig, seed: u64) -> Result<Self> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> CloudEnvironment<R> {
    pub fn new(config: EnvironmentConfig, rng: R) -> Result<Self> {
        config.validate()?;

        let mut env = Self {
            cpu_load: Vec::with_capacity(config.max_vms),
            task_queue: VecDeque::new(),
            tick: 0,
            config,
            rng,
        };
        env.reset();
        Ok(env)
    }

    /// Start a new episode
    pub fn reset(&mut self) -> Observation {
        self.cpu_load.clear();
        self.cpu_load.resize(self.config.initial_vms, 0.0);
        self.task_queue.clear();
        self.tick = 0;
        self.observation()
    }

    /// Apply an action given as an index into `{NoOp, ScaleUp, ScaleDown}`
    pub fn step_index(&mut self, action: usize) -> Result<StepOutcome> {
        self.step(ScalingAction::try_from(action)?)
    }

    /// Advance the simulation by one tick
    pub fn step(&mut self, action: ScalingAction) -> Result<StepOutcome> {
        let scaled = self.apply_scaling(action)?;

        let delay = self.schedule_next_task();

        for load in &mut self.cpu_load {
            *load = (*load - self.config.cpu_decay).clamp(0.0, 1.0);
        }

        self.enqueue_arrivals();

        let cost = self.vm_count() as f64 * self.config.vm_cost;
        let reward = -(cost + f64::from(delay) + self.task_queue.len() as f64);

        self.tick += 1;
        let done = self.tick > self.config.max_ticks;

        trace!(
            tick = self.tick,
            action = %action,
            vm_count = self.vm_count(),
            queue_length = self.task_queue.len(),
            reward,
            "step"
        );

        Ok(StepOutcome {
            observation: self.observation(),
            reward,
            done,
            delay,
            cost,
            scaled,
        })
    }

    /// Current observation without advancing time
    pub fn observation(&self) -> Observation {
        let avg_cpu = if self.cpu_load.is_empty() {
            0.0
        } else {
            self.cpu_load.iter().sum::<f64>() / self.cpu_load.len() as f64
        };
        Observation::new(self.vm_count(), avg_cpu, self.task_queue.len())
    }

    pub fn vm_count(&self) -> usize {
        self.cpu_load.len()
    }

    pub fn cpu_load(&self) -> &[f64] {
        &self.cpu_load
    }

    pub fn queue_len(&self) -> usize {
        self.task_queue.len()
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.task_queue.iter()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Number of discrete actions accepted by `step_index`
    pub fn action_size(&self) -> usize {
        ScalingAction::action_space_size()
    }

    /// Length of the observation feature vector
    pub fn observation_size(&self) -> usize {
        Observation::DIMENSION
    }

    fn apply_scaling(&mut self, action: ScalingAction) -> Result<bool> {
        let vm_count = self.vm_count();
        let feasible = match action {
            ScalingAction::NoOp => return Ok(false),
            ScalingAction::ScaleUp => vm_count < self.config.max_vms,
            ScalingAction::ScaleDown => vm_count > self.config.min_vms,
        };

        if !feasible {
            if self.config.strict_bounds {
                return Err(AutoscaleError::InfeasibleScaling {
                    action: action.to_string(),
                    vm_count,
                    min_vms: self.config.min_vms,
                    max_vms: self.config.max_vms,
                });
            }
            debug!(action = %action, vm_count, "scaling skipped at pool bound");
            return Ok(false);
        }

        match action {
            ScalingAction::ScaleUp => self.cpu_load.push(0.0),
            ScalingAction::ScaleDown => {
                self.cpu_load.pop();
            }
            ScalingAction::NoOp => {}
        }
        Ok(true)
    }

    /// Place the oldest task on a random VM and return its duration.
    /// Load is left unclamped until execution.
    fn schedule_next_task(&mut self) -> u32 {
        let Some(task) = self.task_queue.pop_front() else {
            return 0;
        };

        let vm = self.rng.gen_range(0..self.cpu_load.len());
        self.cpu_load[vm] += task.cpu_demand;
        task.duration
    }

    fn enqueue_arrivals(&mut self) {
        let arrivals = self.rng.gen_range(0..=self.config.max_arrivals);
        for _ in 0..arrivals {
            let task = self.generate_task();
            self.task_queue.push_back(task);
        }
    }

    fn generate_task(&mut self) -> Task {
        let cpu_demand = self
            .rng
            .gen_range(self.config.cpu_demand_min..self.config.cpu_demand_max);
        let duration = self
            .rng
            .gen_range(self.config.duration_min..=self.config.duration_max);
        Task::new(cpu_demand, duration)
    }
}
