//! Joint actuation with hard mechanical stops

use tracing::trace;

use crate::joint::Joint;
use crate::pose::PoseInterface;

/// Result of a rotation request
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Actuation {
    /// Accepted; carries the new accumulated angle
    Applied {
        /// Accumulated angle after the rotation
        angle: f64,
    },
    /// Would have left the joint's travel; nothing changed
    Rejected {
        /// Accumulated angle that was refused
        requested: f64,
    },
}

impl Actuation {
    /// Whether the rotation went through
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Converts control signals into joint rotations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointActuator {
    rotation_speed: f64,
    time_step: f64,
}

impl JointActuator {
    /// Actuator turning `rotation_speed` degrees per second of full signal
    #[must_use]
    pub fn new(rotation_speed: f64, time_step: f64) -> Self {
        Self {
            rotation_speed,
            time_step,
        }
    }

    /// Degrees per tick for a signal in `[-1, 1]`
    #[must_use]
    pub fn step_magnitude(&self, signal: f64) -> f64 {
        signal * self.rotation_speed * self.time_step
    }

    /// Turn a control signal into one tick of rotation
    pub fn drive<P: PoseInterface + ?Sized>(&self, joint: &mut Joint, pose: &mut P, signal: f64) -> Actuation {
        Self::rotate(joint, pose, self.step_magnitude(signal))
    }

    /// Rotate a joint by a signed magnitude in degrees
    ///
    /// Bounded joints refuse any request that would land outside their stops.
    /// The joint is left untouched in that case; it is not clamped to the limit.
    pub fn rotate<P: PoseInterface + ?Sized>(joint: &mut Joint, pose: &mut P, signed_magnitude: f64) -> Actuation {
        let requested = joint.current_angle + signed_magnitude * joint.axis().direction();
        if !joint.limits().allows(requested) {
            trace!(joint = joint.name(), requested, "rotation rejected at stop");
            return Actuation::Rejected { requested };
        }

        joint.current_angle = requested;
        pose.set_local_euler_angles(joint.node(), joint.pose_rotation());
        Actuation::Applied { angle: requested }
    }
}

impl Default for JointActuator {
    fn default() -> Self {
        Self::new(90.0, 0.02)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{JointAxis, JointLimits};
    use crate::scene::{ArmRig, KinematicChain, RigGeometry};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use proptest::prelude::*;

    fn rig() -> (KinematicChain, Vec<Joint>) {
        let (chain, layout) = ArmRig::build(&RigGeometry::default(), true).unwrap();
        let joints = layout
            .joints
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Joint::new(i, spec.name, spec.node, spec.axis, spec.limits))
            .collect();
        (chain, joints)
    }

    #[test]
    fn test_bounded_joint_stops_at_limit() {
        let (mut chain, mut joints) = rig();
        let shoulder = &mut joints[1];

        let mut applied = 0;
        for _ in 0..20 {
            if JointActuator::rotate(shoulder, &mut chain, 10.0).is_applied() {
                applied += 1;
            }
            assert!(shoulder.current_angle() <= 90.0);
        }
        assert_eq!(applied, 9);
        assert_relative_eq!(shoulder.current_angle(), 90.0);
        assert_relative_eq!(chain.local_euler_angles(shoulder.node()).z, 90.0);
    }

    #[test]
    fn test_rejection_does_not_saturate() {
        let (mut chain, mut joints) = rig();
        let elbow = &mut joints[2];

        let _ = JointActuator::rotate(elbow, &mut chain, 85.0);
        let result = JointActuator::rotate(elbow, &mut chain, 10.0);
        assert_eq!(result, Actuation::Rejected { requested: 95.0 });
        assert_relative_eq!(elbow.current_angle(), 85.0);
    }

    #[test]
    fn test_unbounded_accumulates_without_wrap() {
        let (mut chain, mut joints) = rig();
        let base = &mut joints[0];
        for _ in 0..2000 {
            let _ = JointActuator::rotate(base, &mut chain, 0.5);
        }
        assert_eq!(base.current_angle(), 1000.0);
        // the scene reports the wrapped angle
        assert_relative_eq!(chain.local_euler_angles(base.node()).y, 280.0, epsilon = 1e-9);
    }

    #[test]
    fn test_only_the_driven_node_moves() {
        let (mut chain, mut joints) = rig();
        let before: Vec<Vector3<f64>> = joints.iter().map(|j| chain.local_euler_angles(j.node())).collect();

        let _ = JointActuator::default().drive(&mut joints[3], &mut chain, 1.0);

        for (i, joint) in joints.iter().enumerate() {
            let after = chain.local_euler_angles(joint.node());
            if i == 3 {
                assert_relative_eq!(after.z, 1.8, epsilon = 1e-12);
            } else {
                assert_eq!(after, before[i]);
            }
        }
    }

    #[test]
    fn test_negative_axis_flips_direction() {
        let mut chain = KinematicChain::new();
        let node = chain.add_root("joint", Vector3::zeros());
        let axis = JointAxis::new(Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let mut joint = Joint::new(0, "flipped", node, axis, JointLimits::symmetric(90.0));

        let result = JointActuator::rotate(&mut joint, &mut chain, 30.0);
        assert_eq!(result, Actuation::Applied { angle: -30.0 });
        assert_relative_eq!(chain.local_euler_angles(node).z, 330.0, epsilon = 1e-9);
    }

    #[test]
    fn test_step_magnitude_scales_by_speed_and_dt() {
        let actuator = JointActuator::new(90.0, 0.02);
        assert_relative_eq!(actuator.step_magnitude(1.0), 1.8);
        assert_relative_eq!(actuator.step_magnitude(-0.5), -0.9);
        assert_eq!(actuator.step_magnitude(0.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_bounded_angle_never_leaves_limits(deltas in proptest::collection::vec(-40.0f64..40.0, 1..200)) {
            let (mut chain, mut joints) = rig();
            let wrist = &mut joints[3];
            for delta in deltas {
                let before = wrist.current_angle();
                match JointActuator::rotate(wrist, &mut chain, delta) {
                    Actuation::Applied { angle } => {
                        prop_assert_eq!(angle, wrist.current_angle());
                    }
                    Actuation::Rejected { .. } => {
                        prop_assert_eq!(before, wrist.current_angle());
                    }
                }
                prop_assert!((-90.0..=90.0).contains(&wrist.current_angle()));
            }
        }

        #[test]
        fn prop_unbounded_sums_integer_steps(count in 1usize..500, step in -20i32..20) {
            let (mut chain, mut joints) = rig();
            let base = &mut joints[0];
            for _ in 0..count {
                let _ = JointActuator::rotate(base, &mut chain, f64::from(step));
            }
            #[allow(clippy::cast_precision_loss)]
            let expected = count as f64 * f64::from(step);
            prop_assert_eq!(base.current_angle(), expected);
        }
    }
}
