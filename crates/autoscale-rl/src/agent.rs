//! Tabular Q-learning agent

use autoscale_core::{AgentConfig, AutoscaleError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::state::{argmax, max_value, QTable, StateKey};

/// Epsilon-greedy Q-learning over discretized observations.
///
/// The agent only knows the length of the observation vector and the size of
/// the action space; it never looks inside the environment.
pub struct QAgent<R = StdRng> {
    q_table: QTable,
    state_size: usize,
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    rng: R,
}

impl QAgent<StdRng> {
    /// Agent with a reproducible exploration sequence
    pub fn with_seed(
        state_size: usize,
        action_size: usize,
        config: &AgentConfig,
        seed: u64,
    ) -> Result<Self> {
        Self::new(state_size, action_size, config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QAgent<R> {
    pub fn new(
        state_size: usize,
        action_size: usize,
        config: &AgentConfig,
        rng: R,
    ) -> Result<Self> {
        if state_size == 0 || action_size == 0 {
            return Err(AutoscaleError::InvalidConfig(format!(
                "agent needs a non-empty state and action space \
                 (state_size={state_size}, action_size={action_size})"
            )));
        }
        config.validate()?;

        Ok(Self {
            q_table: QTable::new(action_size),
            state_size,
            learning_rate: config.alpha,
            discount_factor: config.gamma,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            min_epsilon: config.min_epsilon,
            rng,
        })
    }

    /// Discretize an observation into a table key
    pub fn get_key(&self, state: &[f64]) -> Result<StateKey> {
        self.check_dimension(state)?;
        Ok(StateKey::from_features(state))
    }

    /// Epsilon-greedy action selection.
    ///
    /// Exploration returns a uniform random action and leaves the table
    /// untouched; exploitation creates the state's entry if needed.
    pub fn choose(&mut self, state: &[f64]) -> Result<usize> {
        let key = self.get_key(state)?;

        if self.rng.gen::<f64>() < self.epsilon {
            let action_size = self.action_size();
            let action = self.rng.gen_range(0..action_size);
            trace!(action, "exploring");
            return Ok(action);
        }

        let action = argmax(self.q_table.entry(key));
        trace!(action, "exploiting");
        Ok(action)
    }

    /// One-step temporal-difference update of `Q[s][a]`
    pub fn learn(
        &mut self,
        state: &[f64],
        action: usize,
        reward: f64,
        next_state: &[f64],
    ) -> Result<()> {
        let key = self.get_key(state)?;
        let next_key = self.get_key(next_state)?;
        if action >= self.action_size() {
            return Err(AutoscaleError::InvalidAction(action));
        }

        let max_next_q = max_value(self.q_table.entry(next_key));
        let q_values = self.q_table.entry(key);
        let current_q = q_values[action];
        let td_error = reward + self.discount_factor * max_next_q - current_q;
        q_values[action] = current_q + self.learning_rate * td_error;

        Ok(())
    }

    /// Best known action without exploring or growing the table.
    /// Unvisited states fall back to action 0.
    pub fn greedy_action(&self, state: &[f64]) -> Result<usize> {
        let key = self.get_key(state)?;
        Ok(self.q_table.get(&key).map_or(0, argmax))
    }

    /// Current values for a state, if it has been visited
    pub fn q_values(&self, state: &[f64]) -> Result<Option<Vec<f64>>> {
        let key = self.get_key(state)?;
        Ok(self.q_table.get(&key).map(|values| values.to_vec()))
    }

    /// Decay exploration once an episode has finished
    pub fn end_episode(&mut self) {
        if self.epsilon_decay < 1.0 {
            self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
            debug!(epsilon = self.epsilon, "epsilon decayed");
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn table_len(&self) -> usize {
        self.q_table.len()
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn action_size(&self) -> usize {
        self.q_table.action_size()
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn params(&self) -> serde_json::Value {
        serde_json::json!({
            "alpha": self.learning_rate,
            "gamma": self.discount_factor,
            "epsilon": self.epsilon,
            "q_table_size": self.q_table.len()
        })
    }

    fn check_dimension(&self, state: &[f64]) -> Result<()> {
        if state.len() == self.state_size {
            Ok(())
        } else {
            Err(AutoscaleError::DimensionMismatch {
                expected: self.state_size,
                actual: state.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_with_epsilon(epsilon: f64, seed: u64) -> QAgent {
        let config = AgentConfig {
            epsilon,
            ..Default::default()
        };
        QAgent::with_seed(3, 3, &config, seed).unwrap()
    }

    #[test]
    fn test_agent_creation() {
        let agent = agent_with_epsilon(0.2, 1);
        assert_eq!(agent.state_size(), 3);
        assert_eq!(agent.action_size(), 3);
        assert_eq!(agent.table_len(), 0);
        assert_eq!(agent.epsilon(), 0.2);
    }

    #[test]
    fn test_empty_action_space_rejected() {
        let result = QAgent::with_seed(3, 0, &AgentConfig::default(), 1);
        assert!(matches!(result, Err(AutoscaleError::InvalidConfig(_))));
    }

    #[test]
    fn test_learn_on_fresh_agent() {
        let mut agent = agent_with_epsilon(0.2, 1);
        let s = [2.0, 0.0, 0.0];
        let s2 = [3.0, 0.2, 1.0];

        agent.learn(&s, 1, -5.0, &s2).unwrap();

        assert_eq!(agent.table_len(), 2);
        let q = agent.q_values(&s).unwrap().unwrap();
        assert!((q[1] - 0.1 * -5.0).abs() < 1e-12);
        assert_eq!(q[0], 0.0);
        assert_eq!(q[2], 0.0);
        assert_eq!(agent.q_values(&s2).unwrap().unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn test_learn_same_state_creates_one_entry() {
        let mut agent = agent_with_epsilon(0.2, 1);
        let s = [2.0, 0.31, 1.0];

        agent.learn(&s, 2, -3.0, &s).unwrap();
        assert_eq!(agent.table_len(), 1);
    }

    #[test]
    fn test_learn_bootstraps_from_next_state() {
        let mut agent = agent_with_epsilon(0.0, 1);
        let s = [1.0, 0.1, 0.0];
        let s2 = [1.0, 0.2, 0.0];

        // Q[s2][0] = 0.1 * -2 = -0.2, so max(Q[s2]) stays 0.0 via the other actions
        agent.learn(&s2, 0, -2.0, &s2).unwrap();
        agent.learn(&s, 0, -1.0, &s2).unwrap();
        let q = agent.q_values(&s).unwrap().unwrap();
        assert!((q[0] - -0.1).abs() < 1e-12);

        // Make every action of s2 positive, then the bootstrap term shows up
        for action in 0..3 {
            agent.learn(&s2, action, 10.0, &[9.0, 9.0, 9.0]).unwrap();
        }
        let max_next = agent
            .q_values(&s2)
            .unwrap()
            .unwrap()
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);
        let before = agent.q_values(&s).unwrap().unwrap()[0];
        agent.learn(&s, 0, -1.0, &s2).unwrap();
        let after = agent.q_values(&s).unwrap().unwrap()[0];
        let expected = before + 0.1 * (-1.0 + 0.9 * max_next - before);
        assert!((after - expected).abs() < 1e-12);
    }

    #[test]
    fn test_learn_rejects_bad_inputs() {
        let mut agent = agent_with_epsilon(0.2, 1);

        assert!(matches!(
            agent.learn(&[1.0, 0.0, 0.0], 3, -1.0, &[1.0, 0.0, 0.0]),
            Err(AutoscaleError::InvalidAction(3))
        ));
        assert!(matches!(
            agent.learn(&[1.0, 0.0], 0, -1.0, &[1.0, 0.0, 0.0]),
            Err(AutoscaleError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(agent.table_len(), 0);
    }

    #[test]
    fn test_choose_rejects_wrong_dimension() {
        let mut agent = agent_with_epsilon(0.2, 1);
        assert!(agent.choose(&[1.0, 0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_exploitation_creates_entry_and_picks_best() {
        let mut agent = agent_with_epsilon(0.0, 7);
        let s = [2.0, 0.5, 3.0];

        assert_eq!(agent.choose(&s).unwrap(), 0);
        assert_eq!(agent.table_len(), 1);

        agent.learn(&s, 0, -10.0, &s).unwrap();
        agent.learn(&s, 1, -10.0, &s).unwrap();
        assert_eq!(agent.choose(&s).unwrap(), 2);
    }

    #[test]
    fn test_exploration_does_not_touch_table() {
        let mut agent = agent_with_epsilon(1.0, 3);
        for _ in 0..100 {
            let action = agent.choose(&[5.0, 0.7, 4.0]).unwrap();
            assert!(action < 3);
        }
        assert_eq!(agent.table_len(), 0);
    }

    #[test]
    fn test_greedy_action_does_not_grow_table() {
        let mut agent = agent_with_epsilon(0.2, 3);
        assert_eq!(agent.greedy_action(&[1.0, 0.0, 0.0]).unwrap(), 0);
        assert_eq!(agent.table_len(), 0);

        agent.learn(&[1.0, 0.0, 0.0], 0, -1.0, &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(agent.greedy_action(&[1.0, 0.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn test_epsilon_decay() {
        let config = AgentConfig {
            epsilon: 0.5,
            epsilon_decay: 0.5,
            min_epsilon: 0.1,
            ..Default::default()
        };
        let mut agent = QAgent::with_seed(3, 3, &config, 1).unwrap();

        agent.end_episode();
        assert_eq!(agent.epsilon(), 0.25);
        agent.end_episode();
        agent.end_episode();
        assert_eq!(agent.epsilon(), 0.1);
    }

    #[test]
    fn test_fixed_epsilon_by_default() {
        let mut agent = agent_with_epsilon(0.2, 1);
        for _ in 0..10 {
            agent.end_episode();
        }
        assert_eq!(agent.epsilon(), 0.2);
    }

    #[test]
    fn test_set_epsilon_clamps_and_switches_to_greedy() {
        let mut agent = agent_with_epsilon(1.0, 5);
        agent.set_epsilon(1.5);
        assert_eq!(agent.epsilon(), 1.0);

        agent.set_epsilon(0.0);
        let s = [2.0, 0.5, 3.0];
        agent.learn(&s, 0, -10.0, &s).unwrap();
        agent.learn(&s, 2, -10.0, &s).unwrap();
        for _ in 0..50 {
            assert_eq!(agent.choose(&s).unwrap(), 1);
        }

        agent.set_epsilon(-0.3);
        assert_eq!(agent.epsilon(), 0.0);
    }

    #[test]
    fn test_params() {
        let mut agent = agent_with_epsilon(0.2, 1);
        agent.learn(&[1.0, 0.0, 0.0], 0, -1.0, &[2.0, 0.0, 0.0]).unwrap();

        let params = agent.params();
        assert_eq!(params["alpha"], 0.1);
        assert_eq!(params["gamma"], 0.9);
        assert_eq!(params["epsilon"], 0.2);
        assert_eq!(params["q_table_size"], 2);
    }
}
