//! voxview - interactive viewer for voxelized octree occupancy maps

pub mod convert;
pub mod core;
pub mod export;
pub mod math;
pub mod render;
pub mod scene;
pub mod viewer;
pub mod voxel;
