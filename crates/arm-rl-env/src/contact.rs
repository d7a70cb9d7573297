//! Collision tags and the reference trigger volumes

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use arm_rl_core::RLError;

use crate::config::TriggerConfig;

/// Tag carried by a collision event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactTag {
    /// The arm hit the floor
    Ground,
    /// The tip touched the goal
    Goal,
}

impl fmt::Display for ContactTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ground => write!(f, "Ground"),
            Self::Goal => write!(f, "Goal"),
        }
    }
}

impl FromStr for ContactTag {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ground" | "ground" => Ok(Self::Ground),
            "Goal" | "goal" => Ok(Self::Goal),
            other => Err(RLError::Environment(format!("unknown contact tag {other:?}"))),
        }
    }
}

/// Geometry a contact source inspects after actuation
#[derive(Debug, Clone)]
pub struct ContactFrame {
    /// End-effector position
    pub tip: Vector3<f64>,
    /// Joint node positions, base to tip
    pub links: Vec<Vector3<f64>>,
    /// Target position
    pub target: Vector3<f64>,
    /// Whether the claw holds the target
    pub target_held: bool,
}

/// Anything that reports collisions for a tick
pub trait ContactSource: Send + Sync {
    /// Tags raised by the arm in this configuration, in delivery order
    fn detect(&self, frame: &ContactFrame) -> Vec<ContactTag>;
}

/// Source that never reports anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContacts;

impl ContactSource for NoContacts {
    fn detect(&self, _frame: &ContactFrame) -> Vec<ContactTag> {
        Vec::new()
    }
}

/// Ground plane plus a goal sphere around the target
#[derive(Debug, Clone, Default)]
pub struct TriggerVolumes {
    config: TriggerConfig,
}

impl TriggerVolumes {
    /// Volumes from config
    #[must_use]
    pub fn new(config: TriggerConfig) -> Self {
        Self { config }
    }
}

impl ContactSource for TriggerVolumes {
    fn detect(&self, frame: &ContactFrame) -> Vec<ContactTag> {
        let mut tags = Vec::new();
        // the base sits on the floor, so only nodes above it count
        let below = |p: &Vector3<f64>| p.y < self.config.ground_height;
        if below(&frame.tip) || frame.links.iter().skip(1).any(below) {
            tags.push(ContactTag::Ground);
        }
        if let Some(radius) = self.config.goal_radius {
            if !frame.target_held && (frame.tip - frame.target).norm() < radius {
                tags.push(ContactTag::Goal);
            }
        }
        tags
    }
}
