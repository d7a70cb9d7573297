//! Trajectory recording

use serde::{Deserialize, Serialize};

use crate::Reward;

/// Single transition in a trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition<O, A> {
    /// Current observation
    pub observation: O,
    /// Action taken
    pub action: A,
    /// Reward received
    pub reward: Reward,
    /// Next observation
    pub next_observation: O,
    /// Whether episode ended
    pub done: bool,
}

/// Complete trajectory of an episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory<O, A> {
    /// Sequence of transitions
    pub transitions: Vec<Transition<O, A>>,
    /// Total reward
    pub total_reward: f64,
    /// Episode ID
    pub episode_id: String,
}

impl<O, A> Trajectory<O, A> {
    /// Create a new empty trajectory
    pub fn new(episode_id: String) -> Self {
        Self {
            transitions: Vec::new(),
            total_reward: 0.0,
            episode_id,
        }
    }

    /// Add a transition to the trajectory
    pub fn push(&mut self, transition: Transition<O, A>) {
        self.total_reward += transition.reward.0;
        self.transitions.push(transition);
    }

    /// Get the length of the trajectory
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if trajectory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Whether the last recorded transition ended the episode
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.transitions.last().is_some_and(|t| t.done)
    }

    /// Compute returns (cumulative discounted rewards)
    #[must_use]
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut running_return = 0.0;

        for i in (0..self.len()).rev() {
            if self.transitions[i].done {
                running_return = 0.0;
            }
            running_return = self.transitions[i].reward.0 + gamma * running_return;
            returns[i] = running_return;
        }

        returns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transition(reward: f64, done: bool) -> Transition<u8, u8> {
        Transition {
            observation: 0,
            action: 0,
            reward: Reward(reward),
            next_observation: 0,
            done,
        }
    }

    #[test]
    fn test_returns_discount_backwards() {
        let mut trajectory = Trajectory::new("ep".to_string());
        trajectory.push(transition(0.1, false));
        trajectory.push(transition(0.2, false));
        trajectory.push(transition(1.0, true));

        assert_eq!(trajectory.len(), 3);
        assert!(trajectory.is_complete());
        assert_relative_eq!(trajectory.total_reward, 1.3, epsilon = 1e-12);

        let returns = trajectory.returns(0.5);
        assert_relative_eq!(returns[2], 1.0);
        assert_relative_eq!(returns[1], 0.2 + 0.5 * 1.0);
        assert_relative_eq!(returns[0], 0.1 + 0.5 * 0.7);
    }

    #[test]
    fn test_empty() {
        let trajectory: Trajectory<u8, u8> = Trajectory::new(String::new());
        assert!(trajectory.is_empty());
        assert!(!trajectory.is_complete());
        assert!(trajectory.returns(0.99).is_empty());
    }
}
