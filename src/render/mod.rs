//! Rendering system and GPU interfaces

pub mod batch;
pub mod buffer;
pub mod context;
pub mod pipeline;
pub mod render_loop;
pub mod renderer;
pub mod texture;

pub use batch::{InstanceBatcher, RenderMode, RenderPayload};
pub use context::GpuContext;
pub use render_loop::RenderLoop;
pub use renderer::Renderer;
