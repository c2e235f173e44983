//! State discretization and the sparse Q-table

use std::collections::HashMap;

use ndarray::Array1;

/// Discretized observation used as a Q-table key.
///
/// Each component is rounded to one decimal digit (ties to even) and stored
/// as an integer count of tenths, so equal keys hash equally regardless of
/// floating-point noise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey(Box<[i64]>);

impl StateKey {
    /// Tenths per unit
    pub const SCALE: f64 = 10.0;

    pub fn from_features(features: &[f64]) -> Self {
        Self(
            features
                .iter()
                .map(|value| (value * Self::SCALE).round_ties_even() as i64)
                .collect(),
        )
    }

    /// The rounded values this key stands for
    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|&tenths| tenths as f64 / Self::SCALE).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.values().iter().map(|v| format!("{v:.1}")).collect();
        write!(f, "({})", values.join(", "))
    }
}

/// Q-values per discretized state, created lazily and never evicted
#[derive(Debug, Clone)]
pub struct QTable {
    entries: HashMap<StateKey, Array1<f64>>,
    action_size: usize,
}

impl QTable {
    pub fn new(action_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            action_size,
        }
    }

    /// Values for `key`, inserting a zero vector on first visit
    pub fn entry(&mut self, key: StateKey) -> &mut Array1<f64> {
        let action_size = self.action_size;
        self.entries
            .entry(key)
            .or_insert_with(|| Array1::zeros(action_size))
    }

    pub fn get(&self, key: &StateKey) -> Option<&Array1<f64>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Array1<f64>)> {
        self.entries.iter()
    }
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: &Array1<f64>) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}

/// Largest value, or 0.0 for an empty vector
pub fn max_value(values: &Array1<f64>) -> f64 {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_key_rounds_to_one_decimal() {
        let key = StateKey::from_features(&[2.0, 0.31, 1.0]);
        assert_eq!(key.values(), vec![2.0, 0.3, 1.0]);
        assert_eq!(key.len(), 3);
    }

    #[test]
    fn test_nearby_observations_collide() {
        let a = StateKey::from_features(&[2.0, 0.31, 1.0]);
        let b = StateKey::from_features(&[2.0, 0.34, 1.0]);
        let c = StateKey::from_features(&[2.0, 0.36, 1.0]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_half_rounds_to_even() {
        assert_eq!(StateKey::from_features(&[0.25]).values(), vec![0.2]);
        assert_eq!(StateKey::from_features(&[0.75]).values(), vec![0.8]);
    }

    #[test]
    fn test_key_display() {
        let key = StateKey::from_features(&[3.0, 0.449, 12.0]);
        assert_eq!(key.to_string(), "(3.0, 0.4, 12.0)");
    }

    #[test]
    fn test_table_lazy_entry() {
        let mut table = QTable::new(3);
        let key = StateKey::from_features(&[2.0, 0.0, 0.0]);

        assert!(table.is_empty());
        assert!(table.get(&key).is_none());

        table.entry(key.clone())[1] = 4.0;
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key).unwrap(), &array![0.0, 4.0, 0.0]);

        // Re-entering keeps the existing values
        assert_eq!(table.entry(key)[1], 4.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&array![0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&array![-1.0, 2.0, 2.0]), 1);
        assert_eq!(argmax(&array![-3.0, -2.0, -1.0]), 2);
    }

    #[test]
    fn test_max_value() {
        assert_eq!(max_value(&array![-3.0, -2.5, -7.0]), -2.5);
        assert_eq!(max_value(&Array1::zeros(0)), 0.0);
    }
}
