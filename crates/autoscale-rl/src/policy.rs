//! Policies the training engine can drive through an episode

use autoscale_core::{AutoscaleError, Observation, Result, ScalingAction};
use rand::Rng;

use crate::agent::QAgent;
use crate::experience::Experience;

/// Trait for anything that picks scaling actions
pub trait Policy {
    /// Policy name for logs and reports
    fn name(&self) -> &str;

    /// Pick an action for the observed state
    fn select(&mut self, observation: &Observation) -> Result<ScalingAction>;

    /// Learn from the transition that followed `select`
    fn observe(&mut self, _experience: &Experience) -> Result<()> {
        Ok(())
    }

    /// Called once per finished episode
    fn end_episode(&mut self) {}
}

/// Threshold baseline: scale up above 0.8 average CPU, down below 0.3
pub fn baseline_policy(observation: &Observation) -> ScalingAction {
    ThresholdPolicy::default().decide(observation)
}

/// Stateless average-CPU threshold rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub cpu_high: f64,
    pub cpu_low: f64,
}

impl ThresholdPolicy {
    pub fn new(cpu_high: f64, cpu_low: f64) -> Self {
        Self { cpu_high, cpu_low }
    }

    pub fn decide(&self, observation: &Observation) -> ScalingAction {
        if observation.avg_cpu > self.cpu_high {
            ScalingAction::ScaleUp
        } else if observation.avg_cpu < self.cpu_low {
            ScalingAction::ScaleDown
        } else {
            ScalingAction::NoOp
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(0.8, 0.3)
    }
}

impl Policy for ThresholdPolicy {
    fn name(&self) -> &str {
        "baseline"
    }

    fn select(&mut self, observation: &Observation) -> Result<ScalingAction> {
        Ok(self.decide(observation))
    }
}

impl<R: Rng> Policy for QAgent<R> {
    fn name(&self) -> &str {
        "q_learning"
    }

    fn select(&mut self, observation: &Observation) -> Result<ScalingAction> {
        let index = self.choose(&observation.to_features())?;
        ScalingAction::try_from(index)
    }

    fn observe(&mut self, experience: &Experience) -> Result<()> {
        self.learn(
            &experience.state.to_features(),
            experience.action.to_index(),
            experience.reward,
            &experience.next_state.to_features(),
        )
    }

    fn end_episode(&mut self) {
        QAgent::<R>::end_episode(self);
    }
}

/// Pure exploitation of a trained agent, used for evaluation
pub struct GreedyPolicy<'a, R = rand::rngs::StdRng> {
    agent: &'a QAgent<R>,
}

impl<'a, R: Rng> GreedyPolicy<'a, R> {
    pub fn new(agent: &'a QAgent<R>) -> Self {
        Self { agent }
    }
}

impl<R: Rng> Policy for GreedyPolicy<'_, R> {
    fn name(&self) -> &str {
        "q_learning_greedy"
    }

    fn select(&mut self, observation: &Observation) -> Result<ScalingAction> {
        let index = self.agent.greedy_action(&observation.to_features())?;
        ScalingAction::from_index(index).ok_or(AutoscaleError::InvalidAction(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoscale_core::AgentConfig;

    #[test]
    fn test_baseline_thresholds() {
        assert_eq!(
            baseline_policy(&Observation::new(2, 0.81, 0)),
            ScalingAction::ScaleUp
        );
        assert_eq!(
            baseline_policy(&Observation::new(2, 0.29, 9)),
            ScalingAction::ScaleDown
        );
        assert_eq!(
            baseline_policy(&Observation::new(2, 0.5, 0)),
            ScalingAction::NoOp
        );
    }

    #[test]
    fn test_baseline_boundaries_are_exclusive() {
        assert_eq!(
            baseline_policy(&Observation::new(2, 0.8, 0)),
            ScalingAction::NoOp
        );
        assert_eq!(
            baseline_policy(&Observation::new(2, 0.3, 0)),
            ScalingAction::NoOp
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let mut policy = ThresholdPolicy::new(0.6, 0.1);
        assert_eq!(
            policy.select(&Observation::new(3, 0.7, 0)).unwrap(),
            ScalingAction::ScaleUp
        );
        assert_eq!(policy.name(), "baseline");
    }

    #[test]
    fn test_agent_policy_learns_from_experience() {
        let mut agent = QAgent::with_seed(3, 3, &AgentConfig::default(), 5).unwrap();
        let exp = Experience::new(
            Observation::new(2, 0.0, 0),
            ScalingAction::ScaleDown,
            -1.5,
            Observation::new(1, 0.0, 1),
            false,
        );

        Policy::observe(&mut agent, &exp).unwrap();

        let q = agent.q_values(&exp.state.to_features()).unwrap().unwrap();
        assert!((q[2] - -0.15).abs() < 1e-12);
    }

    #[test]
    fn test_agent_with_oversized_action_space_is_rejected_as_policy() {
        let config = AgentConfig {
            epsilon: 0.0,
            ..Default::default()
        };
        let mut agent = QAgent::with_seed(3, 5, &config, 5).unwrap();
        let state = [2.0, 0.0, 0.0];
        for action in 0..4 {
            agent.learn(&state, action, -1.0, &state).unwrap();
        }

        let err = agent.select(&Observation::new(2, 0.0, 0)).unwrap_err();
        assert!(matches!(err, AutoscaleError::InvalidAction(4)));
    }

    #[test]
    fn test_greedy_policy_follows_table() {
        let mut agent = QAgent::with_seed(3, 3, &AgentConfig::default(), 5).unwrap();
        let state = [1.0, 0.2, 3.0];
        agent.learn(&state, 0, -4.0, &state).unwrap();
        agent.learn(&state, 2, -4.0, &state).unwrap();

        let mut greedy = GreedyPolicy::new(&agent);
        assert_eq!(
            greedy.select(&Observation::new(1, 0.2, 3)).unwrap(),
            ScalingAction::ScaleUp
        );
        assert_eq!(greedy.name(), "q_learning_greedy");
    }
}
