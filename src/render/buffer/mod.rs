//! GPU buffer management

pub mod cube_mesh;
pub mod instance_buffer;
pub mod scene_buffer;

pub use cube_mesh::{CubeMesh, CubeVertex};
pub use instance_buffer::{InstanceBuffer, InstanceRaw, LineBuffer, VertexArrayBuffer};
pub use scene_buffer::{SceneBuffer, SceneUniform};
