//! Map loading: conversion payload parsing and the external converter
//!
//! Octree files are turned into `{ "voxels": [...], "resolution": r }` JSON by
//! an external `octomap2json` executable. JSON files in that format are loaded
//! directly.

pub mod octomap;

use std::path::Path;

use serde::Deserialize;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::{Voxel, VoxelMap};

pub use octomap::OctomapConverter;

/// Conversion result as it comes off the wire; both fields may be absent
#[derive(Debug, Deserialize)]
struct RawPayload {
    voxels: Option<Vec<Voxel>>,
    resolution: Option<f32>,
}

/// Parse and validate a conversion payload
///
/// A missing `voxels` array or a missing or non-positive `resolution` is an
/// [`Error::InvalidPayload`]. Malformed JSON is an [`Error::Json`].
pub fn parse_payload(bytes: &[u8]) -> Result<VoxelMap> {
    let raw: RawPayload = serde_json::from_slice(bytes)?;

    let voxels = raw
        .voxels
        .ok_or_else(|| Error::InvalidPayload("missing voxels".to_string()))?;
    let resolution = match raw.resolution {
        Some(r) if r != 0.0 => r,
        _ => return Err(Error::InvalidPayload("missing resolution".to_string())),
    };

    VoxelMap::new(voxels, resolution)
}

/// Whether `path` should skip conversion
pub fn is_payload_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Load a map from a payload JSON file or, for anything else, via `converter`
///
/// Blocks the calling thread until conversion finishes.
pub fn load_map_file(path: &Path, converter: &OctomapConverter) -> Result<VoxelMap> {
    let map = if is_payload_file(path) {
        let bytes = std::fs::read(path)?;
        parse_payload(&bytes)?
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(converter.convert(path))?
    };

    log::info!(
        "Loaded {} voxels at resolution {} from {}",
        map.len(),
        map.resolution(),
        path.display()
    );
    Ok(map)
}
