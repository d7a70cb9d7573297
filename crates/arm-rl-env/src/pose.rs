//! Pose interface between the arm engine and the owner of the transform hierarchy
//!
//! The engine never holds references into a scene graph. It addresses nodes
//! through opaque [`NodeId`] handles and reads or writes their transforms
//! through [`PoseInterface`]. Angles are euler angles in degrees.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Opaque handle to a node in the transform hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Read/write access to node transforms
///
/// Implementations must treat unknown handles as no-ops on write and return
/// the zero vector on read.
pub trait PoseInterface: Send + Sync {
    /// Whether the handle refers to a live node
    fn contains(&self, node: NodeId) -> bool;

    /// Local euler angles of a node
    fn local_euler_angles(&self, node: NodeId) -> Vector3<f64>;

    /// Overwrite the local euler angles of a node
    fn set_local_euler_angles(&mut self, node: NodeId, angles: Vector3<f64>);

    /// World-space position of a node's origin
    fn world_position(&self, node: NodeId) -> Vector3<f64>;

    /// Express a world-space point in the local coordinates of `frame`
    fn inverse_transform_point(&self, frame: NodeId, world_point: Vector3<f64>) -> Vector3<f64>;

    /// Express a point given in the local coordinates of `frame` in world space
    fn transform_point(&self, frame: NodeId, local_point: Vector3<f64>) -> Vector3<f64>;

    /// Position of `node` in the local coordinates of `frame`
    fn position_in(&self, node: NodeId, frame: NodeId) -> Vector3<f64> {
        self.inverse_transform_point(frame, self.world_position(node))
    }
}
