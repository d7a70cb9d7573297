//! Per-tick shaping rewards and terminal rewards

use serde::{Deserialize, Serialize};

use arm_rl_core::Reward;

use crate::grasp::GraspController;

/// Coefficients of every reward term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Scale of the `-Σ|signal|` penalty
    pub action_penalty: f64,
    /// Scale of the signed distance improvement
    pub distance_scale: f64,
    /// Distance under which the proximity bonus applies (exclusive)
    pub proximity_radius: f64,
    /// Flat bonus while inside the proximity radius
    pub proximity_bonus: f64,
    /// Scale of the closing-while-close bonus
    pub closing_bonus: f64,
    /// Flat bonus while holding the target
    pub holding_bonus: f64,
    /// Terminal reward for reaching the goal
    pub success_reward: f64,
    /// Terminal reward for failing
    pub failure_penalty: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            action_penalty: 0.001,
            distance_scale: 0.3,
            proximity_radius: 0.15,
            proximity_bonus: 0.05,
            closing_bonus: 0.01,
            holding_bonus: 0.005,
            success_reward: 1.0,
            failure_penalty: -1.0,
        }
    }
}

/// Individual shaping terms of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Action magnitude penalty (non-positive)
    pub action_penalty: f64,
    /// Distance improvement term
    pub distance: f64,
    /// Proximity bonus
    pub proximity: f64,
    /// Closing-while-close bonus
    pub closing: f64,
    /// Holding bonus
    pub holding: f64,
}

impl RewardBreakdown {
    /// Sum of the terms, added in declaration order
    #[must_use]
    pub fn total(&self) -> f64 {
        self.action_penalty + self.distance + self.proximity + self.closing + self.holding
    }
}

/// Stateless reward calculator
#[derive(Debug, Clone, Default)]
pub struct RewardShaper {
    weights: RewardWeights,
}

impl RewardShaper {
    /// Shaper with the given weights
    #[must_use]
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    /// Weights in use
    #[must_use]
    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Shaping reward for one tick
    ///
    /// Returns the breakdown and the distance to carry into the next tick.
    /// The grasp terms are only evaluated when a claw is supplied.
    #[must_use]
    pub fn step_reward(
        &self,
        previous_distance: f64,
        current_distance: f64,
        signals: &[f64],
        grasp: Option<&GraspController>,
    ) -> (RewardBreakdown, f64) {
        let w = &self.weights;
        let mut breakdown = RewardBreakdown {
            action_penalty: -w.action_penalty * signals.iter().map(|s| s.abs()).sum::<f64>(),
            distance: (previous_distance - current_distance) * w.distance_scale,
            ..RewardBreakdown::default()
        };
        if current_distance < w.proximity_radius {
            breakdown.proximity = w.proximity_bonus;
        }

        if let Some(claw) = grasp {
            if claw.is_close(current_distance) {
                breakdown.closing = w.closing_bonus * (1.0 - claw.progress());
            }
            if claw.is_grasped() {
                breakdown.holding = w.holding_bonus;
            }
        }

        (breakdown, current_distance)
    }

    /// Terminal reward for reaching the goal
    #[must_use]
    pub fn success(&self) -> Reward {
        Reward(self.weights.success_reward)
    }

    /// Terminal reward for failing
    #[must_use]
    pub fn failure(&self) -> Reward {
        Reward(self.weights.failure_penalty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grasp::{GraspConfig, Target};
    use crate::scene::{ArmRig, RigGeometry};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_distance_term() {
        let shaper = RewardShaper::default();
        let (breakdown, carried) = shaper.step_reward(2.0, 1.5, &[0.0; 4], None);
        assert_relative_eq!(breakdown.distance, 0.15, epsilon = 1e-12);
        assert_eq!(breakdown.action_penalty, 0.0);
        assert_eq!(breakdown.proximity, 0.0);
        assert_eq!(carried, 1.5);

        let (away, _) = shaper.step_reward(1.5, 2.0, &[0.0; 4], None);
        assert_relative_eq!(away.distance, -0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_proximity_boundary() {
        let shaper = RewardShaper::default();
        let (at, _) = shaper.step_reward(0.15, 0.15, &[], None);
        assert_eq!(at.proximity, 0.0);
        assert_eq!(at.total(), 0.0);

        let (inside, _) = shaper.step_reward(0.1499, 0.1499, &[], None);
        assert_eq!(inside.proximity, 0.05);
        assert_relative_eq!(inside.total(), 0.05);
    }

    #[test]
    fn test_action_penalty_uses_magnitudes() {
        let shaper = RewardShaper::default();
        let (breakdown, _) = shaper.step_reward(1.0, 1.0, &[1.0, -1.0, 0.5, -0.5], None);
        assert_relative_eq!(breakdown.action_penalty, -0.003, epsilon = 1e-12);
    }

    #[test]
    fn test_grasp_terms() {
        let (chain, layout) = ArmRig::build(&RigGeometry::default(), true).unwrap();
        let shaper = RewardShaper::default();
        let mut claw = GraspController::new(GraspConfig::default());
        claw.advance_progress(0.4, 1.0);

        let (near, _) = shaper.step_reward(0.05, 0.05, &[], Some(&claw));
        assert_relative_eq!(near.closing, 0.006, epsilon = 1e-12);
        assert_eq!(near.holding, 0.0);

        let (far, _) = shaper.step_reward(0.5, 0.5, &[], Some(&claw));
        assert_eq!(far.closing, 0.0);

        let mut target = Target::at(Vector3::new(0.0, 2.8, 0.0));
        claw.advance_progress(1.0, 1.0);
        assert!(claw.try_grasp(&mut target, &chain, layout.frame, layout.tip, 0.0));
        let (held, _) = shaper.step_reward(0.5, 0.5, &[], Some(&claw));
        assert_eq!(held.holding, 0.005);
        assert_eq!(held.closing, 0.0);
    }

    #[test]
    fn test_terminal_rewards() {
        let shaper = RewardShaper::default();
        assert_eq!(shaper.success(), Reward(1.0));
        assert_eq!(shaper.failure(), Reward(-1.0));
    }
}
