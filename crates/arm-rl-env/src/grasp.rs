//! Claw closure, grasping and the target's reference frame

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pose::{NodeId, PoseInterface};

/// What happens to the episode when the claw lets go of a held target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// End the episode on release
    #[default]
    EndEpisode,
    /// Keep the episode running
    Continue,
}

/// Grasp thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspConfig {
    /// Tip-to-target distance under which the target can be grabbed
    pub proximity_threshold: f64,
    /// Progress above which the claw counts as closed
    pub close_threshold: f64,
    /// Progress below which a held target is dropped
    pub open_threshold: f64,
    /// Episode handling on release
    pub release_policy: ReleasePolicy,
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 0.1,
            close_threshold: 0.95,
            open_threshold: 0.05,
            release_policy: ReleasePolicy::EndEpisode,
        }
    }
}

/// Frame the target's position is expressed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetParent {
    /// Free in the environment frame
    Environment,
    /// Held by the claw at a fixed offset in the tip's local frame
    EndEffector {
        /// Offset from the tip
        offset: Vector3<f64>,
    },
}

/// The object the arm reaches for
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    position: Vector3<f64>,
    parent: TargetParent,
}

impl Target {
    /// Free target at a position in the environment frame
    #[must_use]
    pub fn at(position: Vector3<f64>) -> Self {
        Self {
            position,
            parent: TargetParent::Environment,
        }
    }

    /// Current parent frame
    #[must_use]
    pub fn parent(&self) -> TargetParent {
        self.parent
    }

    /// Whether the claw owns the target's frame
    #[must_use]
    pub fn is_held(&self) -> bool {
        matches!(self.parent, TargetParent::EndEffector { .. })
    }

    /// Position in the environment frame, following the claw while held
    #[must_use]
    pub fn local_position<P: PoseInterface + ?Sized>(&self, pose: &P, frame: NodeId, tip: NodeId) -> Vector3<f64> {
        match self.parent {
            TargetParent::Environment => self.position,
            TargetParent::EndEffector { offset } => {
                pose.inverse_transform_point(frame, pose.transform_point(tip, offset))
            }
        }
    }

    fn attach<P: PoseInterface + ?Sized>(&mut self, pose: &P, frame: NodeId, tip: NodeId) {
        let world = pose.transform_point(frame, self.position);
        self.parent = TargetParent::EndEffector {
            offset: pose.inverse_transform_point(tip, world),
        };
    }

    fn detach<P: PoseInterface + ?Sized>(&mut self, pose: &P, frame: NodeId, tip: NodeId) {
        self.position = self.local_position(pose, frame, tip);
        self.parent = TargetParent::Environment;
    }
}

/// Snapshot of the claw
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GraspState {
    /// Closure in `[0, 1]`
    pub progress: f64,
    /// Whether the target is held
    pub grasped: bool,
}

/// Drives claw closure and the grasp/release transitions
///
/// `grasped` always agrees with the target's parent: it is set only by
/// [`try_grasp`](Self::try_grasp), which moves the target under the tip, and
/// cleared only by [`release`](Self::release) or [`reset`](Self::reset), which
/// move it back.
#[derive(Debug, Clone)]
pub struct GraspController {
    config: GraspConfig,
    progress: f64,
    grasped: bool,
}

impl GraspController {
    /// Open claw holding nothing
    #[must_use]
    pub fn new(config: GraspConfig) -> Self {
        Self {
            config,
            progress: 0.0,
            grasped: false,
        }
    }

    /// Thresholds in use
    #[must_use]
    pub fn config(&self) -> &GraspConfig {
        &self.config
    }

    /// Integrate closure: `progress += delta * dt`, clamped to `[0, 1]`
    pub fn advance_progress(&mut self, signed_delta: f64, dt: f64) {
        self.progress = (self.progress + signed_delta * dt).clamp(0.0, 1.0);
    }

    /// Grab the target if the claw is closed and the tip is close enough
    ///
    /// Returns `true` only on the tick the grasp happens.
    pub fn try_grasp<P: PoseInterface + ?Sized>(
        &mut self,
        target: &mut Target,
        pose: &P,
        frame: NodeId,
        tip: NodeId,
        distance: f64,
    ) -> bool {
        if self.grasped || self.progress <= self.config.close_threshold || !self.is_close(distance) {
            return false;
        }
        target.attach(pose, frame, tip);
        self.grasped = true;
        info!(progress = self.progress, distance, "target grasped");
        true
    }

    /// Drop the target back into the environment frame; no-op when empty
    pub fn release<P: PoseInterface + ?Sized>(&mut self, target: &mut Target, pose: &P, frame: NodeId, tip: NodeId) {
        if !self.grasped {
            return;
        }
        target.detach(pose, frame, tip);
        self.grasped = false;
        info!(progress = self.progress, "target released");
    }

    /// Whether a held target should be dropped this tick
    #[must_use]
    pub fn should_release(&self) -> bool {
        self.grasped && self.progress < self.config.open_threshold
    }

    /// Whether a distance is inside the grasp radius
    #[must_use]
    pub fn is_close(&self, distance: f64) -> bool {
        distance < self.config.proximity_threshold
    }

    /// Open the claw and drop anything held
    pub fn reset<P: PoseInterface + ?Sized>(&mut self, target: &mut Target, pose: &P, frame: NodeId, tip: NodeId) {
        if self.grasped {
            debug!("dropping held target on reset");
        }
        self.release(target, pose, frame, tip);
        self.progress = 0.0;
    }

    /// Closure in `[0, 1]`
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Whether the target is held
    #[must_use]
    pub fn is_grasped(&self) -> bool {
        self.grasped
    }

    /// Copy of the claw state
    #[must_use]
    pub fn state(&self) -> GraspState {
        GraspState {
            progress: self.progress,
            grasped: self.grasped,
        }
    }
}
