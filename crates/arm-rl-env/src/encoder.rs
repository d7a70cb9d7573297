//! Fixed-layout observation vectors
//!
//! Layout, in order:
//! 1. one value per joint: bounded joints through [`normalize_angle`] over their
//!    travel, unbounded joints as turns (`angle / 360`)
//! 2. claw progress (grasp task only)
//! 3. end-effector position in the reference frame, unscaled
//! 4. target position in the reference frame, unscaled
//! 5. grasp flag as 0 or 1 (grasp task only)
//!
//! Angles are the raw euler component read back from the pose interface, not
//! the joint accumulator.

use nalgebra::Vector3;

use arm_rl_core::{BoxObservationSpace, RLError, Result, VectorObservation};

use crate::grasp::GraspState;
use crate::joint::Joint;
use crate::kinematics::ArmKinematicsState;
use crate::pose::PoseInterface;

/// `(angle % range) / (range / 2) - 1`
///
/// `%` keeps the sign of `angle`, so negative inputs land below -1.
#[must_use]
pub fn normalize_angle(angle: f64, range: f64) -> f64 {
    (angle % range) / (range / 2.0) - 1.0
}

/// How one joint angle is encoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleEncoding {
    /// [`normalize_angle`] over the given range
    Centered {
        /// Width of the joint's travel
        range: f64,
    },
    /// Fraction of a full turn
    Turns,
}

impl AngleEncoding {
    fn for_joint(joint: &Joint) -> Self {
        joint
            .limits()
            .range()
            .map_or(Self::Turns, |range| Self::Centered { range })
    }

    fn encode(self, angle: f64) -> f64 {
        match self {
            Self::Centered { range } => normalize_angle(angle, range),
            Self::Turns => angle / 360.0,
        }
    }

    fn bounds(self) -> (f64, f64) {
        match self {
            Self::Centered { .. } => (-3.0, 1.0),
            Self::Turns => (-1.0, 1.0),
        }
    }
}

/// Builds observation vectors for one arm
#[derive(Debug, Clone)]
pub struct ObservationEncoder {
    angles: Vec<AngleEncoding>,
    grasp: bool,
}

impl ObservationEncoder {
    /// Encoder for an arm; `grasp` adds the claw progress and grasp flag
    #[must_use]
    pub fn new(arm: &ArmKinematicsState, grasp: bool) -> Self {
        Self {
            angles: arm.joints().iter().map(AngleEncoding::for_joint).collect(),
            grasp,
        }
    }

    /// Length of every vector this encoder produces
    #[must_use]
    pub fn len(&self) -> usize {
        self.angles.len() + 6 + if self.grasp { 2 } else { 0 }
    }

    /// Never true; present for symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Per-joint encodings
    #[must_use]
    pub fn angle_encodings(&self) -> &[AngleEncoding] {
        &self.angles
    }

    /// Check a consumer's declared observation length
    pub fn validate(&self, declared: Option<usize>) -> Result<()> {
        match declared {
            Some(expected) if expected != self.len() => Err(RLError::DimensionMismatch {
                expected,
                actual: self.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Encode the current arm, claw and target
    pub fn encode<P: PoseInterface + ?Sized>(
        &self,
        arm: &ArmKinematicsState,
        pose: &P,
        grasp: Option<GraspState>,
        target: Vector3<f64>,
    ) -> VectorObservation {
        let mut data = Vec::with_capacity(self.len());
        for (joint, encoding) in arm.joints().iter().zip(&self.angles) {
            let raw = pose.local_euler_angles(joint.node())[joint.axis().component()];
            data.push(encoding.encode(raw));
        }

        let claw = grasp.unwrap_or_default();
        if self.grasp {
            data.push(claw.progress);
        }
        data.extend(arm.end_effector_position(pose).iter());
        data.extend(target.iter());
        if self.grasp {
            data.push(if claw.grasped { 1.0 } else { 0.0 });
        }
        VectorObservation::new(data)
    }

    /// Box bounds, with positions limited to `±position_bound`
    pub fn space(&self, position_bound: f64) -> Result<BoxObservationSpace> {
        let mut low = Vec::with_capacity(self.len());
        let mut high = Vec::with_capacity(self.len());
        for (l, h) in self.angles.iter().map(|a| a.bounds()) {
            low.push(l);
            high.push(h);
        }
        if self.grasp {
            low.push(0.0);
            high.push(1.0);
        }
        low.extend([-position_bound; 6]);
        high.extend([position_bound; 6]);
        if self.grasp {
            low.push(0.0);
            high.push(1.0);
        }
        BoxObservationSpace::flat(low, high)
    }
}
