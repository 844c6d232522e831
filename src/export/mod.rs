//! Export of the effective voxel view to PLY files

pub mod ply;

use std::path::{Path, PathBuf};

use crate::core::types::Result;
use crate::voxel::VoxelView;

/// Cube mesh file name
pub const VOXEL_MESH_FILE: &str = "map-voxels.ply";
/// Point cloud file name
pub const POINT_CLOUD_FILE: &str = "map-simple.ply";

/// Files written by one export
#[derive(Clone, Debug, PartialEq)]
pub struct ExportReport {
    pub voxel_mesh: PathBuf,
    pub point_cloud: PathBuf,
    pub voxel_count: usize,
}

/// Write the cube mesh and point cloud for `view` into `directory`
///
/// The directory is created if needed; existing files are overwritten. The
/// two files are written side by side and are not bundled into an archive.
pub fn export_view(view: &VoxelView<'_>, directory: &Path) -> Result<ExportReport> {
    std::fs::create_dir_all(directory)?;

    let voxel_mesh = directory.join(VOXEL_MESH_FILE);
    let point_cloud = directory.join(POINT_CLOUD_FILE);

    ply::write_ply(&mut ply::voxel_mesh_ply(view), &voxel_mesh)?;
    ply::write_ply(&mut ply::point_cloud_ply(view), &point_cloud)?;

    log::info!("Exported {} voxels to {}", view.len(), directory.display());
    Ok(ExportReport {
        voxel_mesh,
        point_cloud,
        voxel_count: view.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::{RegionBounds, Voxel, VoxelMap};

    fn map() -> VoxelMap {
        VoxelMap::new(
            vec![
                Voxel::new(0.0, 0.0, 0.0, [10, 20, 30]),
                Voxel::new(5.0, 5.0, 5.0, [40, 50, 60]),
            ],
            0.1,
        )
        .unwrap()
    }

    #[test]
    fn test_export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let map = map();
        let report = export_view(&map.deselect(), dir.path()).unwrap();

        assert_eq!(report.voxel_count, 2);
        let mesh = std::fs::read_to_string(&report.voxel_mesh).unwrap();
        assert!(mesh.starts_with("ply\nformat ascii 1.0\n"));
        assert!(mesh.contains("element vertex 16"));
        assert!(mesh.contains("element face 12"));
        assert!(mesh.contains("property list uchar int vertex_indices"));

        let cloud = std::fs::read_to_string(&report.point_cloud).unwrap();
        assert!(cloud.contains("element vertex 2"));
        assert!(cloud.contains("property uchar red"));
        assert!(!cloud.contains("element face"));
    }

    #[test]
    fn test_export_uses_selection() {
        let dir = tempfile::tempdir().unwrap();
        let map = map();
        let region = RegionBounds::new(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0);
        let report = export_view(&map.effective_view(Some(&region)), &dir.path().join("nested")).unwrap();

        assert_eq!(report.voxel_count, 1);
        let cloud = std::fs::read_to_string(&report.point_cloud).unwrap();
        assert!(cloud.contains("element vertex 1"));
    }
}
