//! Voxel occupancy data and colour grading

pub mod voxel;
pub mod map;
pub mod color;

pub use voxel::Voxel;
pub use map::{RegionBounds, VoxelMap, VoxelView};
pub use color::{boost, Hsl};
