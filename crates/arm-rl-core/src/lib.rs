//! Core reinforcement learning traits and types for arm-rl
//!
//! This crate provides the foundational abstractions shared by the arm
//! environments: the gym-style [`Environment`] trait, step and episode
//! records, continuous actions, vector observations and policies.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod state;
pub mod trajectory;

// Re-export core traits and types
pub use action::{Action, ActionSpace, ContinuousAction, ContinuousSpace};
pub use environment::{Environment, EnvironmentConfig, Episode, Step, StepInfo};
pub use error::{RLError, Result};
pub use observation::{BoxObservationSpace, Observation, ObservationSpace, VectorObservation};
pub use policy::{Policy, RandomPolicy, ZeroPolicy};
pub use reward::Reward;
pub use state::{State, Terminal};
pub use trajectory::{Trajectory, Transition};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, ContinuousAction, Environment, Observation, ObservationSpace,
        Policy, Result, Reward, State, Step,
    };
}
