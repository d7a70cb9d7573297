//! Reference scene: a rigid kinematic chain implementing [`PoseInterface`]
//!
//! Nodes carry a translation and euler rotation relative to their parent.
//! World transforms are composed up the parent chain on demand. Euler angles
//! are applied z, then x, then y, and read back wrapped into `[0, 360)`, the
//! way engine scene graphs report them.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use arm_rl_core::{RLError, Result};

use crate::joint::{JointAxis, JointLimits};
use crate::pose::{NodeId, PoseInterface};

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    translation: Vector3<f64>,
    euler: Vector3<f64>,
}

impl Node {
    fn local_transform(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), euler_rotation(&self.euler))
    }
}

fn euler_rotation(degrees: &Vector3<f64>) -> UnitQuaternion<f64> {
    let radians = degrees.map(f64::to_radians);
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), radians.y)
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), radians.x)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), radians.z)
}

/// Tree of rigid nodes
#[derive(Debug, Clone, Default)]
pub struct KinematicChain {
    nodes: Vec<Node>,
}

impl KinematicChain {
    /// Empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parentless node
    pub fn add_root(&mut self, name: impl Into<String>, translation: Vector3<f64>) -> NodeId {
        self.push(name.into(), None, translation)
    }

    /// Add a node under an existing parent
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, translation: Vector3<f64>) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(RLError::Config(format!("unknown parent node {}", parent.0)));
        }
        Ok(self.push(name.into(), Some(parent), translation))
    }

    fn push(&mut self, name: String, parent: Option<NodeId>, translation: Vector3<f64>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            parent,
            translation,
            euler: Vector3::zeros(),
        });
        id
    }

    /// Look a node up by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Name of a node
    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.name.as_str())
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Composed world transform; identity for unknown nodes
    #[must_use]
    pub fn world_transform(&self, node: NodeId) -> Isometry3<f64> {
        let mut transform = Isometry3::identity();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.nodes.get(id.0) else {
                break;
            };
            transform = n.local_transform() * transform;
            current = n.parent;
        }
        transform
    }
}

impl PoseInterface for KinematicChain {
    fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn local_euler_angles(&self, node: NodeId) -> Vector3<f64> {
        self.nodes
            .get(node.0)
            .map_or_else(Vector3::zeros, |n| n.euler.map(|a| a.rem_euclid(360.0)))
    }

    fn set_local_euler_angles(&mut self, node: NodeId, angles: Vector3<f64>) {
        match self.nodes.get_mut(node.0) {
            Some(n) => n.euler = angles,
            None => trace!(node = node.0, "ignoring rotation of unknown node"),
        }
    }

    fn world_position(&self, node: NodeId) -> Vector3<f64> {
        if !self.contains(node) {
            return Vector3::zeros();
        }
        self.world_transform(node).translation.vector
    }

    fn inverse_transform_point(&self, frame: NodeId, world_point: Vector3<f64>) -> Vector3<f64> {
        self.world_transform(frame)
            .inverse_transform_point(&Point3::from(world_point))
            .coords
    }

    fn transform_point(&self, frame: NodeId, local_point: Vector3<f64>) -> Vector3<f64> {
        self.world_transform(frame)
            .transform_point(&Point3::from(local_point))
            .coords
    }
}

/// Link lengths and joint travel of the standard arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigGeometry {
    /// Base to shoulder
    pub shoulder_height: f64,
    /// Shoulder to elbow
    pub upper_arm: f64,
    /// Elbow to wrist
    pub forearm: f64,
    /// Wrist to claw rotation
    pub hand: f64,
    /// Claw rotation to tip
    pub claw: f64,
    /// Symmetric travel of shoulder, elbow and wrist, in degrees
    pub joint_limit: f64,
}

impl Default for RigGeometry {
    fn default() -> Self {
        Self {
            shoulder_height: 0.3,
            upper_arm: 1.0,
            forearm: 1.0,
            hand: 0.3,
            claw: 0.2,
            joint_limit: 90.0,
        }
    }
}

impl RigGeometry {
    /// Base-to-tip length with the arm fully extended
    #[must_use]
    pub fn reach(&self) -> f64 {
        self.shoulder_height + self.upper_arm + self.forearm + self.hand + self.claw
    }

    fn lengths(&self) -> [f64; 5] {
        [self.shoulder_height, self.upper_arm, self.forearm, self.hand, self.claw]
    }
}

/// Declaration of one actuated joint
#[derive(Debug, Clone)]
pub struct JointSpec {
    /// Human-readable name
    pub name: String,
    /// Node rotated by the joint
    pub node: NodeId,
    /// Rotation axis
    pub axis: JointAxis,
    /// Travel limits
    pub limits: JointLimits,
}

/// Handles the engine needs to drive an arm
#[derive(Debug, Clone)]
pub struct ArmLayout {
    /// Reference frame for observations and rewards
    pub frame: NodeId,
    /// Arm base
    pub base: NodeId,
    /// Actuated joints, in control-vector order
    pub joints: Vec<JointSpec>,
    /// End effector
    pub tip: NodeId,
}

/// Builder for the standard five-node arm
///
/// Base (yaw, continuous), shoulder, elbow and wrist (pitch, limited), claw
/// rotation (yaw, continuous) and the claw tip. The arm rests pointing
/// straight up.
pub struct ArmRig;

impl ArmRig {
    /// Build the chain; `claw_rotation` makes the claw joint actuated
    pub fn build(geometry: &RigGeometry, claw_rotation: bool) -> Result<(KinematicChain, ArmLayout)> {
        if geometry.lengths().iter().any(|l| !l.is_finite() || *l <= 0.0) {
            return Err(RLError::Config("rig link lengths must be positive".to_string()));
        }

        let mut chain = KinematicChain::new();
        let frame = chain.add_root("environment", Vector3::zeros());
        let base = chain.add_child(frame, "base", Vector3::zeros())?;
        let shoulder = chain.add_child(base, "shoulder", Vector3::y() * geometry.shoulder_height)?;
        let elbow = chain.add_child(shoulder, "elbow", Vector3::y() * geometry.upper_arm)?;
        let wrist = chain.add_child(elbow, "wrist", Vector3::y() * geometry.forearm)?;
        let claw = chain.add_child(wrist, "claw_rotation", Vector3::y() * geometry.hand)?;
        let tip = chain.add_child(claw, "claw_tip", Vector3::y() * geometry.claw)?;

        let limited = JointLimits::symmetric(geometry.joint_limit);
        let spec = |name: &str, node, axis, limits| JointSpec {
            name: name.to_string(),
            node,
            axis,
            limits,
        };

        let mut joints = vec![
            spec("base", base, JointAxis::up(), JointLimits::Unbounded),
            spec("shoulder", shoulder, JointAxis::forward(), limited),
            spec("elbow", elbow, JointAxis::forward(), limited),
            spec("wrist", wrist, JointAxis::forward(), limited),
        ];
        if claw_rotation {
            joints.push(spec("claw_rotation", claw, JointAxis::up(), JointLimits::Unbounded));
        }

        Ok((chain, ArmLayout { frame, base, joints, tip }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rest_pose_points_up() {
        let geometry = RigGeometry::default();
        let (chain, layout) = ArmRig::build(&geometry, false).unwrap();

        assert_eq!(layout.joints.len(), 4);
        let tip = chain.position_in(layout.tip, layout.frame);
        assert_relative_eq!(tip, Vector3::new(0.0, geometry.reach(), 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_claw_rotation_joint_optional() {
        let (chain, layout) = ArmRig::build(&RigGeometry::default(), true).unwrap();
        assert_eq!(layout.joints.len(), 5);
        assert_eq!(layout.joints[4].name, "claw_rotation");
        assert_eq!(chain.find("claw_rotation"), Some(layout.joints[4].node));
    }

    #[test]
    fn test_shoulder_pitch_swings_arm_sideways() {
        let (mut chain, layout) = ArmRig::build(&RigGeometry::default(), false).unwrap();
        let shoulder = layout.joints[1].node;
        chain.set_local_euler_angles(shoulder, Vector3::new(0.0, 0.0, 90.0));

        // 0.3 shoulder height, 2.5 of arm now lying along -x
        let tip = chain.position_in(layout.tip, layout.frame);
        assert_relative_eq!(tip, Vector3::new(-2.5, 0.3, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_euler_read_back_wraps() {
        let (mut chain, layout) = ArmRig::build(&RigGeometry::default(), false).unwrap();
        let node = layout.joints[0].node;
        chain.set_local_euler_angles(node, Vector3::new(0.0, -30.0, 0.0));
        assert_relative_eq!(chain.local_euler_angles(node), Vector3::new(0.0, 330.0, 0.0));
        chain.set_local_euler_angles(node, Vector3::new(0.0, 725.0, 0.0));
        assert_relative_eq!(chain.local_euler_angles(node).y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transform_round_trip_through_frame() {
        let (mut chain, layout) = ArmRig::build(&RigGeometry::default(), false).unwrap();
        chain.set_local_euler_angles(layout.joints[0].node, Vector3::new(0.0, 40.0, 0.0));
        chain.set_local_euler_angles(layout.joints[2].node, Vector3::new(0.0, 0.0, -35.0));

        let world = Vector3::new(0.7, 1.1, -0.4);
        let local = chain.inverse_transform_point(layout.tip, world);
        assert_relative_eq!(chain.transform_point(layout.tip, local), world, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_nodes_are_inert() {
        let mut chain = KinematicChain::new();
        let root = chain.add_root("root", Vector3::new(1.0, 0.0, 0.0));
        assert!(chain.add_child(NodeId(9), "orphan", Vector3::zeros()).is_err());

        chain.set_local_euler_angles(NodeId(9), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(chain.world_position(NodeId(9)), Vector3::zeros());
        assert_eq!(chain.local_euler_angles(NodeId(9)), Vector3::zeros());
        assert_eq!(chain.world_position(root), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_rejects_degenerate_geometry() {
        let geometry = RigGeometry { forearm: 0.0, ..RigGeometry::default() };
        assert!(ArmRig::build(&geometry, false).is_err());
    }
}
