//! Robotic arm environments for arm-rl
//!
//! A multi-joint arm reaches for, or grasps, a target placed around its base.
//! The crate provides:
//! - the arm engine: joint actuation with hard stops, claw grasping, observation
//!   encoding, reward shaping and the episode state machine
//! - a pose interface separating the engine from whatever owns the transforms,
//!   plus a reference kinematic chain implementing it
//! - trigger-volume collisions and keyboard control
//! - [`ArmEnv`], the gym-style [`Environment`] over all of the above

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod actuator;
pub mod config;
pub mod contact;
pub mod encoder;
pub mod env;
pub mod episode;
pub mod grasp;
pub mod joint;
pub mod kinematics;
pub mod manual;
pub mod pose;
pub mod rollout;
pub mod scene;
pub mod shaping;

// Re-export the arm components
pub use actuator::{Actuation, JointActuator};
pub use config::{ArmEnvConfig, TaskVariant, TriggerConfig};
pub use contact::{ContactFrame, ContactSource, ContactTag, NoContacts, TriggerVolumes};
pub use encoder::{normalize_angle, AngleEncoding, ObservationEncoder};
pub use env::{ArmEnv, ArmSnapshot};
pub use episode::{
    EpisodeController, EpisodeOutcome, EpisodePhase, EpisodeState, OutcomeIndicator, StepReport,
    TargetSpawn,
};
pub use grasp::{GraspConfig, GraspController, GraspState, ReleasePolicy, Target, TargetParent};
pub use joint::{Joint, JointAxis, JointLimits};
pub use kinematics::ArmKinematicsState;
pub use manual::{AxisBinding, Key, ManualControl};
pub use pose::{NodeId, PoseInterface};
pub use rollout::run_episode;
pub use scene::{ArmLayout, ArmRig, JointSpec, KinematicChain, RigGeometry};
pub use shaping::{RewardBreakdown, RewardShaper, RewardWeights};

// Re-export core types
pub use arm_rl_core::{
    Action, ActionSpace, ContinuousAction, Environment, EnvironmentConfig, Episode, Observation,
    ObservationSpace, Reward, State, Step, VectorObservation,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{run_episode, ArmEnv, ArmEnvConfig, ManualControl, PoseInterface, TaskVariant};
    pub use arm_rl_core::prelude::*;
}
