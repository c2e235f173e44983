//! Training engine - drives policies through episodes and reports results

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use autoscale_core::{Observation, RunId, SimulationConfig};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::QAgent;
use crate::environment::CloudEnvironment;
use crate::experience::Experience;
use crate::policy::{GreedyPolicy, Policy, ThresholdPolicy};

/// Per-episode bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episode: usize,
    pub total_reward: f64,
    pub steps: u64,
    pub mean_vm_count: f64,
    pub max_queue_length: usize,
    pub final_vm_count: usize,
}

/// Aggregate over a run's episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub episodes: usize,
    pub mean_reward: f64,
    pub best_reward: f64,
    pub worst_reward: f64,
}

impl RunSummary {
    pub fn from_episodes(episodes: &[EpisodeStats]) -> Self {
        if episodes.is_empty() {
            return Self {
                episodes: 0,
                mean_reward: 0.0,
                best_reward: 0.0,
                worst_reward: 0.0,
            };
        }

        let rewards = episodes.iter().map(|e| e.total_reward);
        Self {
            episodes: episodes.len(),
            mean_reward: rewards.clone().sum::<f64>() / episodes.len() as f64,
            best_reward: rewards.clone().fold(f64::NEG_INFINITY, f64::max),
            worst_reward: rewards.fold(f64::INFINITY, f64::min),
        }
    }
}

/// Everything recorded about one run of a policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub policy: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Set when the run was abandoned before all episodes finished
    pub cancelled: bool,
    pub episodes: Vec<EpisodeStats>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Episode reward curve, in episode order
    pub fn rewards(&self) -> Vec<f64> {
        self.episodes.iter().map(|e| e.total_reward).collect()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(self, path)
    }
}

/// Trained agent versus baseline on identically seeded environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub seed: u64,
    pub training: RunReport,
    pub agent: RunReport,
    pub baseline: RunReport,
    /// Set when any of the three runs was cut short
    pub cancelled: bool,
    /// Agent mean reward minus baseline mean reward; positive favours the agent.
    /// Absent when the comparison was cancelled.
    pub reward_gap: Option<f64>,
}

impl ComparisonReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(self, path)
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush report to {}", path.display()))
}

/// Engine statistics across every run it has driven
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_steps: u64,
    pub total_episodes: u64,
    pub total_rewards: f64,
    pub average_episode_reward: f64,
}

/// Runs the reset / select / step / observe loop
pub struct TrainingEngine {
    log_interval: usize,
    cancel: Option<Arc<AtomicBool>>,
    total_steps: u64,
    total_episodes: u64,
    total_rewards: f64,
}

impl TrainingEngine {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
            cancel: None,
            total_steps: 0,
            total_episodes: 0,
            total_rewards: 0.0,
        }
    }

    /// Stop between episodes once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Play one episode to completion
    pub fn run_episode<R, P>(
        &mut self,
        env: &mut CloudEnvironment<R>,
        policy: &mut P,
        episode: usize,
    ) -> Result<EpisodeStats>
    where
        R: Rng,
        P: Policy + ?Sized,
    {
        let mut state: Observation = env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0u64;
        let mut vm_sum = 0usize;
        let mut max_queue_length = 0usize;

        loop {
            let action = policy
                .select(&state)
                .with_context(|| format!("{} failed to select an action", policy.name()))?;
            let outcome = env
                .step(action)
                .with_context(|| format!("Environment rejected {action} at tick {}", env.tick()))?;

            let experience = Experience::new(
                state,
                action,
                outcome.reward,
                outcome.observation,
                outcome.done,
            );
            policy
                .observe(&experience)
                .with_context(|| format!("{} failed to learn from a transition", policy.name()))?;

            state = outcome.observation;
            total_reward += outcome.reward;
            steps += 1;
            vm_sum += state.vm_count;
            max_queue_length = max_queue_length.max(state.queue_length);

            if outcome.done {
                break;
            }
        }

        policy.end_episode();

        self.total_steps += steps;
        self.total_episodes += 1;
        self.total_rewards += total_reward;

        Ok(EpisodeStats {
            episode,
            total_reward,
            steps,
            mean_vm_count: vm_sum as f64 / steps as f64,
            max_queue_length,
            final_vm_count: state.vm_count,
        })
    }

    /// Play `episodes` episodes and collect a report
    pub fn run<R, P>(
        &mut self,
        env: &mut CloudEnvironment<R>,
        policy: &mut P,
        episodes: usize,
    ) -> Result<RunReport>
    where
        R: Rng,
        P: Policy + ?Sized,
    {
        let started_at = Utc::now();
        let run_id = RunId::new();
        let mut results = Vec::with_capacity(episodes);
        let mut cancelled = false;

        info!(%run_id, policy = policy.name(), episodes, "Starting run");

        for episode in 0..episodes {
            if self.is_cancelled() {
                warn!(%run_id, completed = results.len(), "Run cancelled");
                cancelled = true;
                break;
            }

            let stats = self.run_episode(env, policy, episode)?;

            if episode % self.log_interval == 0 {
                info!(
                    episode,
                    reward = stats.total_reward,
                    policy = policy.name(),
                    "Episode complete"
                );
            } else {
                debug!(episode, reward = stats.total_reward, "Episode complete");
            }

            results.push(stats);
        }

        let summary = RunSummary::from_episodes(&results);
        info!(
            %run_id,
            policy = policy.name(),
            episodes = summary.episodes,
            mean_reward = summary.mean_reward,
            "Run finished"
        );

        Ok(RunReport {
            run_id,
            policy: policy.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            cancelled,
            episodes: results,
            summary,
        })
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_steps: self.total_steps,
            total_episodes: self.total_episodes,
            total_rewards: self.total_rewards,
            average_episode_reward: if self.total_episodes > 0 {
                self.total_rewards / self.total_episodes as f64
            } else {
                0.0
            },
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Default for TrainingEngine {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Builds environments and agents from configuration and runs the
/// train / baseline / compare workflows.
///
/// Seeds are derived from one base seed: the training environment uses
/// `seed`, the agent `seed + 1`, and every evaluation environment
/// `seed + 2`, so the agent and the baseline face the same workload stream.
pub struct Experiment {
    config: SimulationConfig,
    seed: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Experiment {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate().context("Invalid simulation configuration")?;
        let seed = config.training.seed.unwrap_or_else(rand::random);

        Ok(Self {
            config,
            seed,
            cancel: None,
        })
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Train a fresh agent for `episodes` episodes
    pub fn train(&self, episodes: usize) -> Result<(QAgent, RunReport)> {
        let mut env = CloudEnvironment::with_seed(self.config.environment.clone(), self.seed)?;
        let mut agent = QAgent::with_seed(
            env.observation_size(),
            env.action_size(),
            &self.config.agent,
            self.seed.wrapping_add(1),
        )?;

        let report = self.engine().run(&mut env, &mut agent, episodes)?;
        debug!(params = %agent.params(), "Training finished");
        Ok((agent, report))
    }

    /// Run the threshold baseline on the evaluation workload
    pub fn baseline(&self, episodes: usize) -> Result<RunReport> {
        let mut env = self.evaluation_env()?;
        let mut policy =
            ThresholdPolicy::new(self.config.training.cpu_high, self.config.training.cpu_low);
        self.engine().run(&mut env, &mut policy, episodes)
    }

    /// Run a trained agent greedily on the evaluation workload
    pub fn evaluate<R: Rng>(&self, agent: &QAgent<R>, episodes: usize) -> Result<RunReport> {
        let mut env = self.evaluation_env()?;
        let mut policy = GreedyPolicy::new(agent);
        self.engine().run(&mut env, &mut policy, episodes)
    }

    /// Train, then evaluate the agent and the baseline side by side
    ///
    /// A cancelled run leaves the flag set, so the remaining runs stop before
    /// their first episode and the report carries no reward gap.
    pub fn compare(
        &self,
        train_episodes: usize,
        eval_episodes: usize,
    ) -> Result<ComparisonReport> {
        let (agent, training) = self.train(train_episodes)?;
        let agent_report = self.evaluate(&agent, eval_episodes)?;
        let baseline = self.baseline(eval_episodes)?;

        let cancelled = training.cancelled || agent_report.cancelled || baseline.cancelled;
        let reward_gap = if cancelled {
            warn!(seed = self.seed, "Comparison cancelled");
            None
        } else {
            let gap = agent_report.summary.mean_reward - baseline.summary.mean_reward;
            info!(
                agent_mean = agent_report.summary.mean_reward,
                baseline_mean = baseline.summary.mean_reward,
                reward_gap = gap,
                "Comparison finished"
            );
            Some(gap)
        };

        Ok(ComparisonReport {
            seed: self.seed,
            training,
            agent: agent_report,
            baseline,
            cancelled,
            reward_gap,
        })
    }

    fn evaluation_env(&self) -> Result<CloudEnvironment> {
        Ok(CloudEnvironment::with_seed(
            self.config.environment.clone(),
            self.seed.wrapping_add(2),
        )?)
    }

    fn engine(&self) -> TrainingEngine {
        let engine = TrainingEngine::new(self.config.training.log_interval);
        match &self.cancel {
            Some(flag) => engine.with_cancel_flag(Arc::clone(flag)),
            None => engine,
        }
    }
}
