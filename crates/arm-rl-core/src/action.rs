//! Action representations and action spaces

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for actions in an RL environment
pub trait Action: Clone + Debug + Send + Sync {
    /// Convert action to a vector representation
    fn to_vec(&self) -> Vec<f64>;
}

/// Trait for defining action spaces
pub trait ActionSpace: Send + Sync {
    /// The type of actions in this space
    type Action: Action;

    /// Sample a random action from the space
    fn sample(&self) -> Self::Action;

    /// Check if an action is valid within this space
    fn contains(&self, action: &Self::Action) -> bool;

    /// Get the dimensionality of the action space
    fn dim(&self) -> Option<usize>;
}

/// Continuous action: one control signal per degree of freedom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousAction(pub Vec<f64>);

impl ContinuousAction {
    /// All-zero action of the given width
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    /// Signals as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Copy of the action with every signal clipped into `[low, high]`
    #[must_use]
    pub fn clipped(&self, low: f64, high: f64) -> Self {
        Self(self.0.iter().map(|v| v.clamp(low, high)).collect())
    }
}

impl Action for ContinuousAction {
    fn to_vec(&self) -> Vec<f64> {
        self.0.clone()
    }
}

impl From<Vec<f64>> for ContinuousAction {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Continuous action space (box)
#[derive(Debug, Clone)]
pub struct ContinuousSpace {
    /// Lower bounds for each dimension
    pub low: Vec<f64>,
    /// Upper bounds for each dimension
    pub high: Vec<f64>,
}

impl ContinuousSpace {
    /// Create a new continuous action space
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> crate::Result<Self> {
        if low.len() != high.len() {
            return Err(crate::RLError::DimensionMismatch {
                expected: low.len(),
                actual: high.len(),
            });
        }
        Ok(Self { low, high })
    }

    /// Symmetric `[-1, 1]` box with `dim` dimensions
    #[must_use]
    pub fn unit(dim: usize) -> Self {
        Self {
            low: vec![-1.0; dim],
            high: vec![1.0; dim],
        }
    }
}

impl ActionSpace for ContinuousSpace {
    type Action = ContinuousAction;

    fn sample(&self) -> Self::Action {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let values: Vec<f64> = self.low.iter()
            .zip(&self.high)
            .map(|(l, h)| rng.gen_range(*l..=*h))
            .collect();

        ContinuousAction(values)
    }

    fn contains(&self, action: &Self::Action) -> bool {
        action.0.len() == self.low.len() &&
        action.0.iter()
            .zip(&self.low)
            .zip(&self.high)
            .all(|((x, l), h)| x >= l && x <= h)
    }

    fn dim(&self) -> Option<usize> {
        Some(self.low.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_bounds_rejected() {
        let err = ContinuousSpace::new(vec![-1.0, -1.0], vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            crate::RLError::DimensionMismatch { expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_unit_space_samples_stay_inside() {
        let space = ContinuousSpace::unit(6);
        for _ in 0..100 {
            let action = space.sample();
            assert_eq!(action.0.len(), 6);
            assert!(space.contains(&action));
        }
    }

    #[test]
    fn test_clipped() {
        let action = ContinuousAction(vec![-3.0, 0.25, 7.5]);
        assert_eq!(action.clipped(-1.0, 1.0).0, vec![-1.0, 0.25, 1.0]);
        assert!(!ContinuousSpace::unit(3).contains(&action));
    }

    proptest::proptest! {
        #[test]
        fn prop_clipped_lands_in_unit_space(values in proptest::collection::vec(-10.0f64..10.0, 0..8)) {
            let clipped = ContinuousAction(values.clone()).clipped(-1.0, 1.0);
            proptest::prop_assert!(ContinuousSpace::unit(values.len()).contains(&clipped));
        }
    }
}
