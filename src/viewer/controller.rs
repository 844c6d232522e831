//! Viewport orchestration
//!
//! [`ViewportController`] owns the loaded map, the user-facing view state
//! (shading, region, projection) and the scene that renders them. Every state
//! change that affects what is visible rebuilds the scene content in one step.

use std::path::Path;

use serde::Serialize;

use crate::core::camera_rig::{CameraRig, CameraRigConfig, Projection};
use crate::core::error::Error;
use crate::core::input::InputState;
use crate::core::orbit_controller::OrbitController;
use crate::core::types::{Result, Vec3};
use crate::export::{self, ExportReport};
use crate::render::batch::{InstanceBatcher, RenderMode};
use crate::scene::focus::resolve_focus;
use crate::scene::SceneGraph;
use crate::voxel::{RegionBounds, VoxelMap, VoxelView};

/// Snapshot of what the viewer is showing
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewerStatus {
    pub has_map: bool,
    pub total_voxels: usize,
    pub visible_voxels: usize,
    pub resolution: Option<f32>,
    pub shading: bool,
    pub projection: Projection,
    pub region: Option<RegionBounds>,
    /// Integer bounds of the full map
    pub bounds: Option<RegionBounds>,
}

/// Composes map, camera rig, orbit controller and scene
pub struct ViewportController {
    map: Option<VoxelMap>,
    region: Option<RegionBounds>,
    shading: bool,
    rig: CameraRig,
    orbit: OrbitController,
    scene: SceneGraph,
}

impl ViewportController {
    pub fn new(camera: &CameraRigConfig, width: u32, height: u32) -> Self {
        let mut rig = CameraRig::new(camera, width, height);
        let mut orbit = OrbitController::default();
        orbit.update(rig.active_mut());

        Self {
            map: None,
            region: None,
            shading: false,
            rig,
            orbit,
            scene: SceneGraph::new(),
        }
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    pub fn map(&self) -> Option<&VoxelMap> {
        self.map.as_ref()
    }

    /// The voxels currently on screen, if a map is loaded
    pub fn effective_view(&self) -> Option<VoxelView<'_>> {
        self.map.as_ref().map(|m| m.effective_view(self.region.as_ref()))
    }

    pub fn shading(&self) -> bool {
        self.shading
    }

    pub fn render_mode(&self) -> RenderMode {
        RenderMode::from_shading(self.shading)
    }

    pub fn region(&self) -> Option<&RegionBounds> {
        self.region.as_ref()
    }

    pub fn projection(&self) -> Projection {
        self.rig.mode()
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Replace the map and show it whole
    ///
    /// Any previous region belongs to the old map and is dropped.
    pub fn load_map(&mut self, map: VoxelMap) {
        log::info!("Map loaded: {} voxels, resolution {}", map.len(), map.resolution());
        self.map = Some(map);
        self.region = None;
        self.render();
    }

    /// Apply a conversion result
    ///
    /// On failure the current map stays loaded and rendered; the error is
    /// logged and returned for the caller to surface.
    pub fn apply_load(&mut self, result: Result<VoxelMap>) -> Result<()> {
        match result {
            Ok(map) => {
                self.load_map(map);
                Ok(())
            }
            Err(e) => {
                log::error!("Conversion error: {}", e);
                Err(e)
            }
        }
    }

    /// Load from a file path through `convert::load_map_file`
    pub fn load_file(&mut self, path: &Path, converter: &crate::convert::OctomapConverter) -> Result<()> {
        self.apply_load(crate::convert::load_map_file(path, converter))
    }

    /// Switch between flat and shaded rendering
    ///
    /// The flag is stored even without a map, so it applies to the next load,
    /// but nothing is rendered and [`Error::NoMapLoaded`] is returned.
    pub fn set_shading(&mut self, enabled: bool) -> Result<()> {
        self.shading = enabled;
        if self.map.is_none() {
            log::warn!("Shading set to {} with no map loaded", enabled);
            return Err(Error::NoMapLoaded);
        }
        self.render();
        Ok(())
    }

    /// Restrict the view to `region`; invalid regions show the full map
    pub fn set_region(&mut self, region: RegionBounds) {
        if region.is_valid() {
            log::debug!("Region bounds: {:?}", region);
        } else {
            log::warn!("Region {:?} has no extent on any axis, showing the full map", region);
        }
        self.region = Some(region);
        self.render();
    }

    pub fn clear_region(&mut self) {
        log::debug!("Region bounds cleared");
        self.region = None;
        self.render();
    }

    /// Returns false when `mode` was already active
    pub fn set_projection(&mut self, mode: Projection) -> bool {
        self.rig.set_projection(mode, &mut self.orbit)
    }

    /// Textual variant for external callers; unknown names leave the camera alone
    pub fn set_projection_named(&mut self, mode: &str) -> Result<bool> {
        self.rig.set_projection_named(mode, &mut self.orbit).inspect_err(|e| {
            log::error!("{}", e);
        })
    }

    pub fn toggle_projection(&mut self) -> Projection {
        let mode = self.rig.mode().toggled();
        self.set_projection(mode);
        mode
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.rig.resize(width as f32 / height as f32, (width, height));
    }

    /// Re-target the orbit on the surface under a screen point
    ///
    /// Returns the new target, or `None` (target unchanged) on a miss.
    pub fn focus_at(&mut self, screen_x: f32, screen_y: f32) -> Option<Vec3> {
        let (width, height) = self.rig.surface_size();
        let point = resolve_focus(screen_x, screen_y, width, height, self.rig.active(), &self.scene)?;
        self.orbit.set_target(point);
        self.orbit.update(self.rig.active_mut());
        log::info!("Orbit target set to {:?}", point);
        Some(point)
    }

    /// Per-frame update: feed input to the orbit controller and move the camera
    pub fn tick(&mut self, input: &InputState) -> bool {
        let viewport = self.rig.surface_size();
        self.orbit.apply_input(input, self.rig.active_mut(), viewport);
        self.orbit.update(self.rig.active_mut())
    }

    /// Export the effective view as PLY files into `directory`
    pub fn export(&self, directory: &Path) -> Result<ExportReport> {
        let Some(view) = self.effective_view() else {
            log::warn!("No map data to export");
            return Err(Error::NoMapLoaded);
        };
        export::export_view(&view, directory)
    }

    pub fn status(&self) -> ViewerStatus {
        let view = self.effective_view();
        ViewerStatus {
            has_map: self.map.is_some(),
            total_voxels: self.map.as_ref().map_or(0, |m| m.len()),
            visible_voxels: view.as_ref().map_or(0, |v| v.len()),
            resolution: self.map.as_ref().map(|m| m.resolution()),
            shading: self.shading,
            projection: self.rig.mode(),
            region: self.region,
            bounds: self.map.as_ref().map(|m| m.bounds()),
        }
    }

    /// Rebuild scene content from the effective view
    fn render(&mut self) {
        let Some(map) = &self.map else {
            return;
        };
        let view = map.effective_view(self.region.as_ref());
        log::info!("Selected voxels: {}", view.len());
        let payload = InstanceBatcher::build(&view, RenderMode::from_shading(self.shading));
        self.scene.apply_payload(payload);
    }
}
