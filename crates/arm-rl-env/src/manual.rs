//! Keyboard control as a policy
//!
//! Key state is written by an input thread or task and read on every tick,
//! producing the same control vector a learned policy would.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use arm_rl_core::{ContinuousAction, Policy, RLError, Result, VectorObservation};

use crate::config::TaskVariant;

/// Keys with a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Base +
    Q,
    /// Base -
    W,
    /// Shoulder +
    A,
    /// Shoulder -
    S,
    /// Elbow +
    Z,
    /// Elbow -
    X,
    /// Wrist +
    E,
    /// Wrist -
    R,
    /// Claw rotation +
    D,
    /// Claw rotation -
    F,
    /// Claw close
    C,
    /// Claw open
    V,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for Key {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self> {
        let key = match s.to_ascii_uppercase().as_str() {
            "Q" => Self::Q,
            "W" => Self::W,
            "A" => Self::A,
            "S" => Self::S,
            "Z" => Self::Z,
            "X" => Self::X,
            "E" => Self::E,
            "R" => Self::R,
            "D" => Self::D,
            "F" => Self::F,
            "C" => Self::C,
            "V" => Self::V,
            _ => return Err(RLError::InvalidAction(format!("unbound key {s:?}"))),
        };
        Ok(key)
    }
}

/// Two keys driving one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBinding {
    /// Key producing +1
    pub positive: Key,
    /// Key producing -1
    pub negative: Key,
}

impl AxisBinding {
    const fn new(positive: Key, negative: Key) -> Self {
        Self { positive, negative }
    }

    /// Signal for a key state; the positive key wins when both are held
    #[must_use]
    pub fn signal(&self, held: &BTreeSet<Key>) -> f64 {
        if held.contains(&self.positive) {
            1.0
        } else if held.contains(&self.negative) {
            -1.0
        } else {
            0.0
        }
    }
}

const ARM_BINDINGS: [AxisBinding; 4] = [
    AxisBinding::new(Key::Q, Key::W),
    AxisBinding::new(Key::A, Key::S),
    AxisBinding::new(Key::Z, Key::X),
    AxisBinding::new(Key::E, Key::R),
];

const CLAW_BINDINGS: [AxisBinding; 2] = [AxisBinding::new(Key::D, Key::F), AxisBinding::new(Key::C, Key::V)];

/// Human control-signal source
#[derive(Debug, Clone)]
pub struct ManualControl {
    bindings: Vec<AxisBinding>,
    held: Arc<RwLock<BTreeSet<Key>>>,
}

impl ManualControl {
    /// Bindings matching a task's control vector
    #[must_use]
    pub fn for_variant(variant: TaskVariant) -> Self {
        let mut bindings = ARM_BINDINGS.to_vec();
        if variant.has_claw() {
            bindings.extend(CLAW_BINDINGS);
        }
        Self {
            bindings,
            held: Arc::new(RwLock::new(BTreeSet::new())),
        }
    }

    /// Bindings in control-vector order
    #[must_use]
    pub fn bindings(&self) -> &[AxisBinding] {
        &self.bindings
    }

    /// Mark a key as held
    pub async fn press(&self, key: Key) {
        self.held.write().await.insert(key);
    }

    /// Mark a key as released
    pub async fn release(&self, key: Key) {
        self.held.write().await.remove(&key);
    }

    /// Release every key
    pub async fn clear(&self) {
        self.held.write().await.clear();
    }

    /// Current control vector
    pub async fn signals(&self) -> Vec<f64> {
        let held = self.held.read().await;
        self.bindings.iter().map(|b| b.signal(&held)).collect()
    }
}

#[async_trait]
impl Policy for ManualControl {
    type Observation = VectorObservation;
    type Action = ContinuousAction;

    async fn act(&self, _observation: &Self::Observation) -> Result<Self::Action> {
        Ok(ContinuousAction(self.signals().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reach_bindings() {
        let control = ManualControl::for_variant(TaskVariant::Reach);
        assert_eq!(control.signals().await, vec![0.0; 4]);

        control.press(Key::Q).await;
        control.press(Key::S).await;
        control.press(Key::R).await;
        assert_eq!(control.signals().await, vec![1.0, -1.0, 0.0, -1.0]);

        control.release(Key::S).await;
        assert_eq!(control.signals().await, vec![1.0, 0.0, 0.0, -1.0]);
    }

    #[tokio::test]
    async fn test_positive_key_wins() {
        let control = ManualControl::for_variant(TaskVariant::Grasp);
        control.press(Key::C).await;
        control.press(Key::V).await;
        let signals = control.signals().await;
        assert_eq!(signals.len(), 6);
        assert_eq!(signals[5], 1.0);
    }

    #[tokio::test]
    async fn test_shared_state_across_clones() {
        let control = ManualControl::for_variant(TaskVariant::Grasp);
        let input = control.clone();
        input.press(Key::D).await;

        let action = control.act(&VectorObservation::new(vec![0.0; 13])).await.unwrap();
        assert_eq!(action.0, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

        input.clear().await;
        assert_eq!(control.signals().await, vec![0.0; 6]);
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("q".parse::<Key>().unwrap(), Key::Q);
        assert_eq!("V".parse::<Key>().unwrap(), Key::V);
        assert!("P".parse::<Key>().is_err());
        assert_eq!(Key::Z.to_string(), "Z");
    }
}
