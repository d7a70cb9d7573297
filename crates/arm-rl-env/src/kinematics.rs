//! Arm joint set and derived pose queries

use nalgebra::Vector3;
use tracing::debug;

use arm_rl_core::{RLError, Result};

use crate::joint::Joint;
use crate::pose::{NodeId, PoseInterface};
use crate::scene::ArmLayout;

/// Joints of one arm plus the handles needed to read its pose
#[derive(Debug, Clone)]
pub struct ArmKinematicsState {
    frame: NodeId,
    base: NodeId,
    tip: NodeId,
    joints: Vec<Joint>,
}

impl ArmKinematicsState {
    /// Build the joint set from a layout
    #[must_use]
    pub fn new(layout: &ArmLayout) -> Self {
        let joints = layout
            .joints
            .iter()
            .enumerate()
            .map(|(index, spec)| Joint::new(index, spec.name.clone(), spec.node, spec.axis, spec.limits))
            .collect();
        Self {
            frame: layout.frame,
            base: layout.base,
            tip: layout.tip,
            joints,
        }
    }

    /// Check every handle against the pose interface
    pub fn validate<P: PoseInterface + ?Sized>(&self, pose: &P) -> Result<()> {
        let named = [("frame", self.frame), ("base", self.base), ("tip", self.tip)];
        for (name, node) in named {
            if !pose.contains(node) {
                return Err(RLError::Config(format!("{name} node {} is not in the scene", node.0)));
            }
        }
        if let Some(joint) = self.joints.iter().find(|j| !pose.contains(j.node())) {
            return Err(RLError::Config(format!(
                "joint {} references missing node {}",
                joint.name(),
                joint.node().0
            )));
        }
        if self.joints.is_empty() {
            return Err(RLError::Config("arm has no joints".to_string()));
        }
        Ok(())
    }

    /// Record every joint's present rotation as its rest pose
    pub fn capture_initial<P: PoseInterface + ?Sized>(&mut self, pose: &P) {
        for joint in &mut self.joints {
            joint.capture_initial(pose);
            debug!(joint = joint.name(), initial = joint.initial_angle(), "captured joint");
        }
    }

    /// Zero every accumulator and write the rest pose back
    pub fn reset_to_initial<P: PoseInterface + ?Sized>(&mut self, pose: &mut P) {
        for joint in &mut self.joints {
            joint.current_angle = 0.0;
            pose.set_local_euler_angles(joint.node(), joint.initial_rotation());
        }
    }

    /// Tip position in the reference frame
    #[must_use]
    pub fn end_effector_position<P: PoseInterface + ?Sized>(&self, pose: &P) -> Vector3<f64> {
        pose.position_in(self.tip, self.frame)
    }

    /// Base position in the reference frame
    #[must_use]
    pub fn base_position<P: PoseInterface + ?Sized>(&self, pose: &P) -> Vector3<f64> {
        pose.position_in(self.base, self.frame)
    }

    /// Positions of every joint node in the reference frame, base to tip
    #[must_use]
    pub fn link_positions<P: PoseInterface + ?Sized>(&self, pose: &P) -> Vec<Vector3<f64>> {
        self.joints
            .iter()
            .map(|j| pose.position_in(j.node(), self.frame))
            .collect()
    }

    /// Straight-line base-to-tip distance in the current pose
    #[must_use]
    pub fn reach<P: PoseInterface + ?Sized>(&self, pose: &P) -> f64 {
        (self.end_effector_position(pose) - self.base_position(pose)).norm()
    }

    /// Joints in control-vector order
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Mutable joints, for the actuator
    pub fn joints_mut(&mut self) -> &mut [Joint] {
        &mut self.joints
    }

    /// Accumulated angle of each joint
    #[must_use]
    pub fn current_angles(&self) -> Vec<f64> {
        self.joints.iter().map(Joint::current_angle).collect()
    }

    /// Reference frame node
    #[must_use]
    pub fn frame(&self) -> NodeId {
        self.frame
    }

    /// End-effector node
    #[must_use]
    pub fn tip(&self) -> NodeId {
        self.tip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::JointActuator;
    use crate::scene::{ArmRig, KinematicChain, RigGeometry};
    use approx::assert_relative_eq;

    fn arm() -> (KinematicChain, ArmKinematicsState) {
        let (chain, layout) = ArmRig::build(&RigGeometry::default(), false).unwrap();
        let mut state = ArmKinematicsState::new(&layout);
        state.validate(&chain).unwrap();
        state.capture_initial(&chain);
        (chain, state)
    }

    #[test]
    fn test_reset_restores_rest_pose() {
        let (mut chain, mut state) = arm();
        let rest = state.end_effector_position(&chain);

        for joint in state.joints_mut() {
            let _ = JointActuator::rotate(joint, &mut chain, 30.0);
        }
        assert!((state.end_effector_position(&chain) - rest).norm() > 0.1);

        state.reset_to_initial(&mut chain);
        assert_eq!(state.current_angles(), vec![0.0; 4]);
        assert_relative_eq!(state.end_effector_position(&chain), rest, epsilon = 1e-12);
    }

    #[test]
    fn test_non_zero_rest_pose_is_kept() {
        let (mut chain, layout) = ArmRig::build(&RigGeometry::default(), false).unwrap();
        let elbow = layout.joints[2].node;
        chain.set_local_euler_angles(elbow, Vector3::new(0.0, 0.0, 20.0));

        let mut state = ArmKinematicsState::new(&layout);
        state.capture_initial(&chain);
        let _ = JointActuator::rotate(&mut state.joints_mut()[2], &mut chain, 15.0);
        assert_relative_eq!(chain.local_euler_angles(elbow).z, 35.0, epsilon = 1e-9);

        state.reset_to_initial(&mut chain);
        assert_relative_eq!(chain.local_euler_angles(elbow).z, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_positions_are_frame_relative() {
        let (mut chain, layout) = ArmRig::build(&RigGeometry::default(), false).unwrap();
        chain.set_local_euler_angles(layout.frame, Vector3::new(0.0, 90.0, 0.0));

        let state = ArmKinematicsState::new(&layout);
        assert_relative_eq!(
            state.end_effector_position(&chain),
            Vector3::new(0.0, 2.8, 0.0),
            epsilon = 1e-9
        );
        assert_relative_eq!(state.reach(&chain), 2.8, epsilon = 1e-9);
        assert_eq!(state.link_positions(&chain).len(), 4);
    }

    #[test]
    fn test_validate_rejects_foreign_handles() {
        let (_, layout) = ArmRig::build(&RigGeometry::default(), false).unwrap();
        let state = ArmKinematicsState::new(&layout);
        let err = state.validate(&KinematicChain::new()).unwrap_err();
        assert!(matches!(err, RLError::Config(_)));
    }
}
