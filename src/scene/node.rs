//! Scene graph node types
//!
//! Core types for the CPU-side scene graph: node IDs, transforms, content variants, and nodes.

use glam::{Mat4, Quat, Vec3};

use crate::math::Aabb;
use crate::render::batch::{Light, Material, VoxelInstance};

/// Unique identifier for a scene graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneNodeId(pub u64);

/// Local transform relative to the parent node.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

impl LocalTransform {
    /// Identity transform (no translation, rotation, or scaling).
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a rotation-only transform.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a 4x4 matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.position,
        )
    }
}

/// One instanced mesh of boxes sharing a material.
#[derive(Clone, Debug)]
pub struct VoxelBatch {
    /// Edge length of the shared box geometry.
    pub box_edge: f32,
    pub instances: Vec<VoxelInstance>,
    pub material: Material,
    /// Bounds of all boxes in the node's local space.
    pub bounds: Aabb,
}

/// What a scene node contains.
#[derive(Clone, Debug)]
pub enum NodeContent {
    /// A grouping node with no geometry of its own.
    Group,

    /// Square line grid on the XZ plane.
    Grid { size: f32, divisions: u32 },

    /// Coloured X/Y/Z axis lines from the origin.
    Axes { size: f32 },

    /// Instanced voxel boxes.
    Voxels(VoxelBatch),

    /// A light source; directional lights take their direction from the node position.
    Light(Light),
}

/// A single node in the scene graph.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub id: SceneNodeId,
    pub name: String,
    pub parent: Option<SceneNodeId>,
    pub children: Vec<SceneNodeId>,
    pub local_transform: LocalTransform,
    /// Cached world transform (recomputed during propagation).
    pub world_transform: Mat4,
    pub content: NodeContent,
}

impl SceneNode {
    /// Create a new scene node.
    pub fn new(id: SceneNodeId, name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local_transform: LocalTransform::identity(),
            world_transform: Mat4::IDENTITY,
            content,
        }
    }
}
