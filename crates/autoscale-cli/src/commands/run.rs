//! Training, baseline, and comparison commands

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use autoscale_core::SimulationConfig;
use autoscale_rl::{Experiment, RunReport};
use clap::Args;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of episodes (defaults to the configured value)
    #[arg(short, long)]
    pub episodes: Option<usize>,

    /// Seed for a reproducible run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Training episodes (defaults to the configured value)
    #[arg(short, long)]
    pub episodes: Option<usize>,

    /// Evaluation episodes for both policies
    #[arg(short, long)]
    pub baseline_episodes: Option<usize>,

    /// Seed for a reproducible run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn train(args: RunArgs, mut config: SimulationConfig) -> Result<()> {
    apply_seed(&mut config, args.seed);
    let episodes = args.episodes.unwrap_or(config.training.episodes);

    let (experiment, cancel) = build_experiment(config)?;
    let report = run_interruptible(cancel, move || {
        experiment.train(episodes).map(|(agent, report)| {
            info!(q_table_size = agent.table_len(), "Agent trained");
            report
        })
    })
    .await?;

    print_run("Training", &report);
    write_output(args.output, &report)
}

pub async fn baseline(args: RunArgs, mut config: SimulationConfig) -> Result<()> {
    apply_seed(&mut config, args.seed);
    let episodes = args.episodes.unwrap_or(config.training.baseline_episodes);

    let (experiment, cancel) = build_experiment(config)?;
    let report = run_interruptible(cancel, move || experiment.baseline(episodes)).await?;

    print_run("Baseline", &report);
    write_output(args.output, &report)
}

pub async fn compare(args: CompareArgs, mut config: SimulationConfig) -> Result<()> {
    apply_seed(&mut config, args.seed);
    let train_episodes = args.episodes.unwrap_or(config.training.episodes);
    let eval_episodes = args
        .baseline_episodes
        .unwrap_or(config.training.baseline_episodes);

    let (experiment, cancel) = build_experiment(config)?;
    let report =
        run_interruptible(cancel, move || experiment.compare(train_episodes, eval_episodes))
            .await?;

    println!("Comparison (seed {})", report.seed);
    println!("==========\n");
    print_run("Training", &report.training);
    print_run("Agent (greedy)", &report.agent);
    print_run("Baseline", &report.baseline);
    match report.reward_gap {
        Some(gap) => {
            println!("Reward gap (agent - baseline): {gap:.2}");
            if gap > 0.0 {
                println!("The learned policy outperformed the baseline.");
            } else {
                println!("The learned policy did not outperform the baseline.");
            }
        }
        None => println!("Comparison cancelled; no verdict."),
    }

    if let Some(path) = args.output {
        report.write_json(&path)?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

fn apply_seed(config: &mut SimulationConfig, seed: Option<u64>) {
    if seed.is_some() {
        config.training.seed = seed;
    }
}

fn build_experiment(config: SimulationConfig) -> Result<(Experiment, Arc<AtomicBool>)> {
    let cancel = Arc::new(AtomicBool::new(false));
    let experiment = Experiment::new(config)?.with_cancel_flag(Arc::clone(&cancel));
    info!(seed = experiment.seed(), "Experiment configured");
    Ok((experiment, cancel))
}

/// Run a blocking job; Ctrl-C stops it after the current episode
async fn run_interruptible<T, F>(cancel: Arc<AtomicBool>, job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::task::spawn_blocking(job);

    tokio::select! {
        joined = &mut handle => joined.context("Run task panicked")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupt received, stopping after the current episode");
            cancel.store(true, Ordering::Relaxed);
            handle.await.context("Run task panicked")?
        }
    }
}

fn print_run(label: &str, report: &RunReport) {
    let summary = &report.summary;
    println!("{label}: {} ({})", report.policy, report.run_id);
    if report.cancelled {
        println!("  cancelled after {} episodes", summary.episodes);
    }
    println!("  episodes:     {}", summary.episodes);
    println!("  mean reward:  {:.2}", summary.mean_reward);
    println!("  best reward:  {:.2}", summary.best_reward);
    println!("  worst reward: {:.2}", summary.worst_reward);
    println!();
}

fn write_output(path: Option<PathBuf>, report: &RunReport) -> Result<()> {
    if let Some(path) = path {
        report.write_json(&path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
