//! Arm environment configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use arm_rl_core::{EnvironmentConfig, RLError, Result};

use crate::episode::TargetSpawn;
use crate::grasp::GraspConfig;
use crate::scene::RigGeometry;
use crate::shaping::RewardWeights;

/// Which task the arm is trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskVariant {
    /// Touch the target with the tip
    #[default]
    Reach,
    /// Close the claw around the target
    Grasp,
}

impl TaskVariant {
    /// Whether the claw is part of the control vector
    #[must_use]
    pub fn has_claw(self) -> bool {
        matches!(self, Self::Grasp)
    }
}

/// Reference collision volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Height of the ground plane in the reference frame
    pub ground_height: f64,
    /// Radius of the goal sphere around the target, `None` to disable
    pub goal_radius: Option<f64>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            ground_height: 0.0,
            goal_radius: Some(0.1),
        }
    }
}

/// Arm environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmEnvConfig {
    /// Seed and step budget
    pub environment: EnvironmentConfig,
    /// Task variant
    pub variant: TaskVariant,
    /// Joint speed at full signal, degrees per second
    pub rotation_speed: f64,
    /// Seconds per tick
    pub time_step: f64,
    /// Reference rig dimensions
    pub geometry: RigGeometry,
    /// Target placement
    pub target: TargetSpawn,
    /// Reward coefficients
    pub reward: RewardWeights,
    /// Grasp thresholds
    pub grasp: GraspConfig,
    /// Reference collision volumes
    pub triggers: TriggerConfig,
    /// Observation length the consuming policy expects
    pub observation_size: Option<usize>,
}

impl Default for ArmEnvConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::default(),
            variant: TaskVariant::Reach,
            rotation_speed: 90.0,
            time_step: 0.02,
            geometry: RigGeometry::default(),
            target: TargetSpawn::default(),
            reward: RewardWeights::default(),
            grasp: GraspConfig::default(),
            triggers: TriggerConfig::default(),
            observation_size: None,
        }
    }
}

impl ArmEnvConfig {
    /// Reach task defaults
    #[must_use]
    pub fn reach() -> Self {
        Self::default()
    }

    /// Grasp task defaults; the goal sphere is off so only grasping scores
    #[must_use]
    pub fn grasp() -> Self {
        Self {
            variant: TaskVariant::Grasp,
            triggers: TriggerConfig {
                goal_radius: None,
                ..TriggerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Builder-style seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.environment.seed = Some(seed);
        self
    }

    /// Builder-style step budget
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.environment.max_steps = Some(max_steps);
        self
    }

    /// Reject values no arm can run with
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(RLError::Config(format!("{name} must be positive, got {value}")))
            }
        }

        positive("rotation_speed", self.rotation_speed)?;
        positive("time_step", self.time_step)?;
        positive("geometry.joint_limit", self.geometry.joint_limit)?;
        let spawn = &self.target;
        if ![spawn.min_radius, spawn.max_radius, spawn.height].iter().all(|v| v.is_finite()) {
            return Err(RLError::Config("target spawn values must be finite".to_string()));
        }
        if spawn.min_radius < 0.0 || spawn.max_radius < spawn.min_radius {
            return Err(RLError::Config(format!(
                "target radius range [{}, {}] is empty",
                spawn.min_radius, spawn.max_radius
            )));
        }
        let grasp = &self.grasp;
        if !(0.0..=1.0).contains(&grasp.open_threshold)
            || !(0.0..=1.0).contains(&grasp.close_threshold)
            || grasp.open_threshold >= grasp.close_threshold
        {
            return Err(RLError::Config(
                "grasp thresholds must satisfy 0 <= open < close <= 1".to_string(),
            ));
        }
        positive("grasp.proximity_threshold", grasp.proximity_threshold)?;
        if let Some(radius) = self.triggers.goal_radius {
            positive("triggers.goal_radius", radius)?;
        }
        if self.environment.max_steps == Some(0) {
            return Err(RLError::Config("max_steps must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading arm config {}", path.display()))?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.display(), variant = ?config.variant, "loaded arm config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let reach = ArmEnvConfig::reach();
        assert!(reach.validate().is_ok());
        assert_eq!(reach.triggers.goal_radius, Some(0.1));
        assert!(!reach.variant.has_claw());

        let grasp = ArmEnvConfig::grasp().with_seed(3).with_max_steps(500);
        assert!(grasp.validate().is_ok());
        assert!(grasp.variant.has_claw());
        assert_eq!(grasp.triggers.goal_radius, None);
        assert_eq!(grasp.environment.seed, Some(3));
        assert_eq!(grasp.environment.max_steps, Some(500));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = ArmEnvConfig::from_json_str(
            r#"{
                "variant": "grasp",
                "environment": { "seed": 42 },
                "reward": { "distance_scale": 0.5 },
                "grasp": { "release_policy": "continue" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.variant, TaskVariant::Grasp);
        assert_eq!(config.environment.seed, Some(42));
        assert_eq!(config.reward.distance_scale, 0.5);
        assert_eq!(config.reward.proximity_bonus, 0.05);
        assert_eq!(config.rotation_speed, 90.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ArmEnvConfig::from_json_str(r#"{"time_step": 0.0}"#),
            Err(RLError::Config(_))
        ));
        assert!(matches!(
            ArmEnvConfig::from_json_str(r#"{"target": {"min_radius": 3.0, "max_radius": 1.0}}"#),
            Err(RLError::Config(_))
        ));
        assert!(matches!(
            ArmEnvConfig::from_json_str(r#"{"grasp": {"open_threshold": 0.99}}"#),
            Err(RLError::Config(_))
        ));
        for field in 0..3 {
            let mut config = ArmEnvConfig::reach();
            match field {
                0 => config.target.min_radius = f64::NAN,
                1 => config.target.max_radius = f64::NAN,
                _ => config.target.height = f64::INFINITY,
            }
            assert!(matches!(config.validate(), Err(RLError::Config(_))), "field {field}");
        }
        assert!(matches!(
            ArmEnvConfig::from_json_str("not json"),
            Err(RLError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("arm-env-config-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"rotation_speed": 45.0}"#).await.unwrap();
        let config = ArmEnvConfig::load(&path).await.unwrap();
        assert_eq!(config.rotation_speed, 45.0);
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(matches!(ArmEnvConfig::load(&path).await, Err(RLError::Other(_))));
    }
}
