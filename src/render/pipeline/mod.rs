//! Render pipelines

pub mod lines;
pub mod shadow;
pub mod voxel;

pub use lines::LinePipeline;
pub use shadow::{light_view_proj, ShadowPipeline};
pub use voxel::VoxelPipeline;
