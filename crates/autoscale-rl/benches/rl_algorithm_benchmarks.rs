//! RL Algorithm Benchmarks
//!
//! Benchmarks for the per-tick hot paths of a training run:
//! - CloudEnvironment::step() - one simulation tick
//! - QAgent::choose() - epsilon-greedy action selection
//! - QAgent::learn() - one temporal-difference update
//! - StateKey::from_features() - observation discretization
//! - TrainingEngine::run_episode() - a full 501 tick episode

use autoscale_core::{AgentConfig, EnvironmentConfig, ScalingAction};
use autoscale_rl::{CloudEnvironment, QAgent, StateKey, ThresholdPolicy, TrainingEngine};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_environment_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("environment");
    group.throughput(Throughput::Elements(1));

    for action in ScalingAction::ALL {
        group.bench_with_input(BenchmarkId::new("step", action), &action, |b, &action| {
            let mut env = CloudEnvironment::with_seed(EnvironmentConfig::default(), 1).unwrap();
            b.iter(|| {
                let outcome = env.step(black_box(action)).unwrap();
                if outcome.done {
                    env.reset();
                }
                outcome.reward
            });
        });
    }

    group.finish();
}

fn bench_state_key(c: &mut Criterion) {
    c.bench_function("state_key/from_features", |b| {
        b.iter(|| StateKey::from_features(black_box(&[4.0, 0.437, 12.0])));
    });
}

fn bench_agent(c: &mut Criterion) {
    let mut group = c.benchmark_group("agent");

    for epsilon in [0.0, 0.2, 1.0] {
        let config = AgentConfig {
            epsilon,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("choose", epsilon), &config, |b, config| {
            let mut agent = QAgent::with_seed(3, 3, config, 1).unwrap();
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                let state = [(i % 10) as f64, (i % 11) as f64 / 10.0, (i % 30) as f64];
                agent.choose(black_box(&state)).unwrap()
            });
        });
    }

    group.bench_function("learn", |b| {
        let mut agent = QAgent::with_seed(3, 3, &AgentConfig::default(), 1).unwrap();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let state = [(i % 10) as f64, (i % 11) as f64 / 10.0, (i % 30) as f64];
            let next = [(i % 10) as f64, ((i + 1) % 11) as f64 / 10.0, ((i + 1) % 30) as f64];
            agent
                .learn(black_box(&state), (i % 3) as usize, -3.5, black_box(&next))
                .unwrap();
        });
    });

    group.finish();
}

fn bench_episode(c: &mut Criterion) {
    let mut group = c.benchmark_group("episode");
    group.sample_size(20);

    group.bench_function("q_learning", |b| {
        let mut env = CloudEnvironment::with_seed(EnvironmentConfig::default(), 1).unwrap();
        let mut agent = QAgent::with_seed(3, 3, &AgentConfig::default(), 2).unwrap();
        let mut engine = TrainingEngine::new(usize::MAX);
        let mut episode = 0;
        b.iter(|| {
            episode += 1;
            engine.run_episode(&mut env, &mut agent, episode).unwrap()
        });
    });

    group.bench_function("baseline", |b| {
        let mut env = CloudEnvironment::with_seed(EnvironmentConfig::default(), 1).unwrap();
        let mut policy = ThresholdPolicy::default();
        let mut engine = TrainingEngine::new(usize::MAX);
        let mut episode = 0;
        b.iter(|| {
            episode += 1;
            engine.run_episode(&mut env, &mut policy, episode).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_environment_step,
    bench_state_key,
    bench_agent,
    bench_episode
);
criterion_main!(benches);
