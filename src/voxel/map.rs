//! Voxel occupancy map and axis-aligned region selection
//!
//! A [`VoxelMap`] is immutable once built. Region filtering never touches the
//! map; it produces a [`VoxelView`] that either borrows the full voxel slice or
//! owns the filtered subset.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::voxel::Voxel;
use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::math::Aabb;

/// Inclusive axis-aligned box in map coordinates
///
/// All-zero is the "no selection" sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl RegionBounds {
    /// The "no selection" sentinel
    pub const ZERO: RegionBounds = RegionBounds {
        min_x: 0.0,
        max_x: 0.0,
        min_y: 0.0,
        max_y: 0.0,
        min_z: 0.0,
        max_z: 0.0,
    };

    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32, min_z: f32, max_z: f32) -> Self {
        Self { min_x, max_x, min_y, max_y, min_z, max_z }
    }

    /// A region filters only if at least one axis has `min < max`.
    ///
    /// Two axes may stay degenerate while the third constrains the view.
    pub fn is_valid(&self) -> bool {
        self.min_x < self.max_x || self.min_y < self.max_y || self.min_z < self.max_z
    }

    /// Inclusive containment on all three axes
    pub fn contains(&self, voxel: &Voxel) -> bool {
        voxel.x >= self.min_x && voxel.x <= self.max_x &&
        voxel.y >= self.min_y && voxel.y <= self.max_y &&
        voxel.z >= self.min_z && voxel.z <= self.max_z
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.min_x, self.min_y, self.min_z)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.max_x, self.max_y, self.max_z)
    }

    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(self.min(), self.max())
    }
}

/// A voxel set with a fixed resolution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoxelMap {
    voxels: Vec<Voxel>,
    resolution: f32,
}

impl VoxelMap {
    /// Create a map; `resolution` must be finite and positive
    pub fn new(voxels: Vec<Voxel>, resolution: f32) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(Error::InvalidPayload(format!(
                "resolution must be a positive number, got {resolution}"
            )));
        }
        Ok(Self { voxels, resolution })
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Integer-aligned box containing every voxel centre
    ///
    /// Minimums are floored and maximums ceiled. Empty maps yield
    /// [`RegionBounds::ZERO`].
    pub fn bounds(&self) -> RegionBounds {
        let Some(first) = self.voxels.first() else {
            return RegionBounds::ZERO;
        };

        let mut min = first.center();
        let mut max = min;
        for v in &self.voxels[1..] {
            let c = v.center();
            min = min.min(c);
            max = max.max(c);
        }
        let (min, max) = (min.floor(), max.ceil());

        RegionBounds::new(min.x, max.x, min.y, max.y, min.z, max.z)
    }

    /// Voxels inside `region`, in map order
    pub fn select(&self, region: &RegionBounds) -> VoxelView<'_> {
        let voxels: Vec<Voxel> = self
            .voxels
            .iter()
            .filter(|v| region.contains(v))
            .copied()
            .collect();
        log::debug!("Region selection kept {} of {} voxels", voxels.len(), self.voxels.len());
        VoxelView {
            voxels: Cow::Owned(voxels),
            resolution: self.resolution,
        }
    }

    /// The whole map
    pub fn deselect(&self) -> VoxelView<'_> {
        VoxelView {
            voxels: Cow::Borrowed(&self.voxels),
            resolution: self.resolution,
        }
    }

    /// What should be rendered or exported for an optional region
    ///
    /// Invalid regions mean "no filter".
    pub fn effective_view(&self, region: Option<&RegionBounds>) -> VoxelView<'_> {
        match region {
            Some(region) if region.is_valid() => self.select(region),
            _ => self.deselect(),
        }
    }
}

/// Ordered voxels plus the resolution of the map they came from
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelView<'a> {
    voxels: Cow<'a, [Voxel]>,
    resolution: f32,
}

impl<'a> VoxelView<'a> {
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// True if this view borrows the full map rather than a filtered copy
    pub fn is_unfiltered(&self) -> bool {
        matches!(self.voxels, Cow::Borrowed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(voxels: Vec<Voxel>) -> VoxelMap {
        VoxelMap::new(voxels, 0.1).unwrap()
    }

    fn scenario_voxels() -> Vec<Voxel> {
        vec![
            Voxel::new(1.0, 2.0, 3.0, [255, 0, 0]),
            Voxel::new(-1.0, 5.0, 0.0, [0, 255, 0]),
            Voxel::new(10.0, -3.0, 8.0, [0, 0, 255]),
        ]
    }

    #[test]
    fn test_bounds_integer_coords() {
        let m = map(scenario_voxels());
        assert_eq!(m.bounds(), RegionBounds::new(-1.0, 10.0, -3.0, 5.0, 0.0, 8.0));
    }

    #[test]
    fn test_bounds_empty_is_sentinel() {
        let m = map(Vec::new());
        assert_eq!(m.bounds(), RegionBounds::ZERO);
        assert!(!m.bounds().is_valid());
    }

    #[test]
    fn test_bounds_round_outward() {
        let m = map(vec![
            Voxel::new(1.2, -0.4, 0.0, [0, 0, 0]),
            Voxel::new(1.5, 0.3, 2.0, [0, 0, 0]),
        ]);
        let b = m.bounds();
        assert_eq!((b.min_x, b.max_x), (1.0, 2.0));
        assert_eq!((b.min_y, b.max_y), (-1.0, 1.0));
        assert_eq!((b.min_z, b.max_z), (0.0, 2.0));
        for v in m.voxels() {
            assert!(b.contains(v));
        }
    }

    #[test]
    fn test_select_inclusive_bounds() {
        let m = map(scenario_voxels());
        let region = RegionBounds::new(0.0, 2.0, 0.0, 5.0, 0.0, 5.0);
        let view = m.select(&region);
        assert_eq!(view.voxels(), &[Voxel::new(1.0, 2.0, 3.0, [255, 0, 0])]);
        assert_eq!(view.resolution(), 0.1);

        let edge = RegionBounds::new(1.0, 1.0, 2.0, 2.0, 3.0, 4.0);
        assert_eq!(m.select(&edge).len(), 1);
    }

    #[test]
    fn test_select_is_idempotent() {
        let m = map(scenario_voxels());
        let region = RegionBounds::new(-1.0, 1.0, 0.0, 5.0, 0.0, 3.0);
        let once = m.select(&region);
        let selected = VoxelMap::new(once.voxels().to_vec(), once.resolution()).unwrap();
        let twice = selected.select(&region);
        assert_eq!(once.voxels(), twice.voxels());
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_deselect_restores_full_map() {
        let m = map(scenario_voxels());
        let _ = m.select(&RegionBounds::new(0.0, 2.0, 0.0, 5.0, 0.0, 5.0));
        let full = m.deselect();
        assert!(full.is_unfiltered());
        assert_eq!(full.voxels(), scenario_voxels().as_slice());
        assert_eq!(full.resolution(), 0.1);
    }

    #[test]
    fn test_validity_any_axis() {
        let y_only = RegionBounds::new(0.0, 0.0, 0.0, 5.0, 0.0, 0.0);
        assert!(y_only.is_valid());
        assert!(!RegionBounds::ZERO.is_valid());
        assert!(!RegionBounds::new(3.0, 1.0, 2.0, 2.0, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_effective_view_invalid_region_is_no_filter() {
        let m = map(scenario_voxels());
        let view = m.effective_view(Some(&RegionBounds::ZERO));
        assert!(view.is_unfiltered());
        assert_eq!(view.len(), 3);

        let view = m.effective_view(None);
        assert_eq!(view.len(), 3);

        let y_only = RegionBounds::new(0.0, 0.0, 0.0, 5.0, 0.0, 0.0);
        assert!(m.effective_view(Some(&y_only)).is_empty());
    }

    #[test]
    fn test_new_rejects_bad_resolution() {
        assert!(matches!(VoxelMap::new(Vec::new(), 0.0), Err(Error::InvalidPayload(_))));
        assert!(matches!(VoxelMap::new(Vec::new(), f32::NAN), Err(Error::InvalidPayload(_))));
    }

    #[test]
    fn test_region_json_names() {
        let r: RegionBounds = serde_json::from_str(
            r#"{"minX":-1,"maxX":10,"minY":-3,"maxY":5,"minZ":0,"maxZ":8}"#,
        )
        .unwrap();
        assert_eq!(r, RegionBounds::new(-1.0, 10.0, -3.0, 5.0, 0.0, 8.0));
    }
}
