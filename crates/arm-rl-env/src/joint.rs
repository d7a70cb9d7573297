//! Rotational joints: axis, limits and the cumulative angle accumulator

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

use arm_rl_core::{RLError, Result};

use crate::pose::{NodeId, PoseInterface};

/// Single cardinal rotation axis of a joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAxis(Unit<Vector3<f64>>);

impl JointAxis {
    /// Axis from a vector with exactly one non-zero component
    pub fn new(axis: Vector3<f64>) -> Result<Self> {
        let non_zero = axis.iter().filter(|c| **c != 0.0).count();
        if non_zero != 1 {
            return Err(RLError::Config(format!(
                "joint axis must lie along x, y or z, got {axis:?}"
            )));
        }
        Ok(Self(Unit::new_normalize(axis)))
    }

    /// +Y
    #[must_use]
    pub fn up() -> Self {
        Self(Vector3::y_axis())
    }

    /// +Z
    #[must_use]
    pub fn forward() -> Self {
        Self(Vector3::z_axis())
    }

    /// Index of the euler component this axis drives (0 = x, 1 = y, 2 = z)
    #[must_use]
    pub fn component(&self) -> usize {
        self.0.iamax()
    }

    /// Sign applied to every commanded delta
    #[must_use]
    pub fn direction(&self) -> f64 {
        (self.0.x + self.0.y + self.0.z).signum()
    }
}

/// Angular travel permitted for a joint, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JointLimits {
    /// Continuous rotation
    Unbounded,
    /// Hard mechanical stops
    Bounded {
        /// Lowest reachable accumulated angle
        min: f64,
        /// Highest reachable accumulated angle
        max: f64,
    },
}

impl JointLimits {
    /// `[-degrees, degrees]`
    #[must_use]
    pub fn symmetric(degrees: f64) -> Self {
        Self::Bounded { min: -degrees, max: degrees }
    }

    /// Whether an accumulated angle lies inside the stops (inclusive)
    #[must_use]
    pub fn allows(&self, angle: f64) -> bool {
        match *self {
            Self::Unbounded => true,
            Self::Bounded { min, max } => min <= angle && angle <= max,
        }
    }

    /// Width of the travel, `None` when unbounded
    #[must_use]
    pub fn range(&self) -> Option<f64> {
        match *self {
            Self::Unbounded => None,
            Self::Bounded { min, max } => Some(max - min),
        }
    }
}

/// One rotational degree of freedom of the arm
///
/// `current_angle` is the signed rotation accumulated since the start of the
/// episode. It is never wrapped, so bounded joints are checked against a stable
/// value and unbounded joints can turn indefinitely.
#[derive(Debug, Clone)]
pub struct Joint {
    index: usize,
    name: String,
    node: NodeId,
    axis: JointAxis,
    limits: JointLimits,
    initial_rotation: Vector3<f64>,
    pub(crate) current_angle: f64,
}

impl Joint {
    /// Joint bound to a scene node; the initial rotation is zero until captured
    #[must_use]
    pub fn new(index: usize, name: impl Into<String>, node: NodeId, axis: JointAxis, limits: JointLimits) -> Self {
        Self {
            index,
            name: name.into(),
            node,
            axis,
            limits,
            initial_rotation: Vector3::zeros(),
            current_angle: 0.0,
        }
    }

    /// Record the node's present euler angles as the rest pose
    pub(crate) fn capture_initial<P: PoseInterface + ?Sized>(&mut self, pose: &P) {
        self.initial_rotation = pose.local_euler_angles(self.node);
    }

    /// Position in the control vector
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scene node driven by this joint
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Rotation axis
    #[must_use]
    pub fn axis(&self) -> JointAxis {
        self.axis
    }

    /// Travel limits
    #[must_use]
    pub fn limits(&self) -> JointLimits {
        self.limits
    }

    /// Rest angle about the joint axis
    #[must_use]
    pub fn initial_angle(&self) -> f64 {
        self.initial_rotation[self.axis.component()]
    }

    /// Full rest euler angles of the node
    #[must_use]
    pub fn initial_rotation(&self) -> Vector3<f64> {
        self.initial_rotation
    }

    /// Accumulated rotation since episode start
    #[must_use]
    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    /// Euler angles to write to the node: the rest pose with `initial + current`
    /// on the joint axis and every other component untouched
    #[must_use]
    pub fn pose_rotation(&self) -> Vector3<f64> {
        let mut rotation = self.initial_rotation;
        rotation[self.axis.component()] = self.initial_angle() + self.current_angle;
        rotation
    }
}
