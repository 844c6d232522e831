//! Scene graph, flattening and picking

pub mod flatten;
pub mod focus;
pub mod graph;
pub mod node;

pub use flatten::{FlatLight, FlatScene, FlatVoxel, LineVertex};
pub use focus::resolve_focus;
pub use graph::{RayHit, SceneGraph};
pub use node::{LocalTransform, NodeContent, SceneNode, SceneNodeId, VoxelBatch};
