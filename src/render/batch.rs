//! Voxel view to GPU instance batch conversion
//!
//! The batcher is stateless: every call turns an ordered voxel view into a
//! complete [`RenderPayload`] (instances, material, lights). The scene graph
//! swaps the payload in as one unit, so a batch is never patched in place.

use serde::{Deserialize, Serialize};

use crate::core::types::{Mat4, Quat, Vec3};
use crate::math::Aabb;
use crate::voxel::color::{self, SHADED_GAIN, SHADED_SATURATION};
use crate::voxel::map::VoxelView;

/// Edge length assumed for voxels with no explicit size
pub const DEFAULT_VOXEL_SIZE: f32 = 1.0;

/// How voxels are coloured and lit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Flat, unlit colours straight from the map
    #[default]
    Raw,
    /// Graded colours under a physically-lit material and three lights
    Shaded,
}

impl RenderMode {
    pub fn from_shading(enabled: bool) -> Self {
        if enabled { RenderMode::Shaded } else { RenderMode::Raw }
    }

    pub fn is_shaded(self) -> bool {
        self == RenderMode::Shaded
    }
}

/// Per-instance transform and RGB colour in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelInstance {
    pub transform: Mat4,
    pub color: [f32; 3],
}

/// Physically based surface parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicalMaterial {
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub reflectivity: f32,
}

impl PhysicalMaterial {
    pub const SHADED: PhysicalMaterial = PhysicalMaterial {
        roughness: 0.4,
        metalness: 0.7,
        clearcoat: 0.6,
        clearcoat_roughness: 0.3,
        reflectivity: 0.9,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    Unlit,
    Physical(PhysicalMaterial),
}

/// Shadow map parameters of a directional light
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
    /// PCF kernel radius in texels
    pub radius: f32,
    pub bias: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Light shines from this position towards the origin
    pub position: Vec3,
    pub shadow: Option<ShadowSettings>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient { color: [f32; 3], intensity: f32 },
    Directional(DirectionalLight),
}

/// Convert a 0xRRGGBB literal to normalised RGB
pub const fn hex_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

/// Lights used by the shaded mode
pub fn shaded_lights() -> Vec<Light> {
    vec![
        Light::Ambient { color: hex_rgb(0xDDFF00), intensity: 0.075 },
        Light::Ambient { color: hex_rgb(0xFFFFFF), intensity: 0.3 },
        Light::Directional(DirectionalLight {
            color: hex_rgb(0xF0FEFE),
            intensity: 0.8,
            position: Vec3::new(0.2, 0.2, 1.0),
            shadow: Some(ShadowSettings {
                map_size: 2048,
                radius: 4.0,
                bias: -0.001,
            }),
        }),
    ]
}

/// Everything needed to draw one voxel view
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPayload {
    pub mode: RenderMode,
    /// Edge length of the shared box geometry (the map resolution)
    pub box_edge: f32,
    pub instances: Vec<VoxelInstance>,
    pub material: Material,
    pub lights: Vec<Light>,
    /// Bounds of all instance boxes, before any parent transform
    pub bounds: Aabb,
}

impl RenderPayload {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Builds render payloads from voxel views
pub struct InstanceBatcher;

impl InstanceBatcher {
    /// Build the instance batch for `view` under `mode`
    ///
    /// Instances keep the view's order. Each box has edge `resolution` and is
    /// scaled by `size / resolution`, so its final edge equals the voxel size.
    pub fn build(view: &VoxelView<'_>, mode: RenderMode) -> RenderPayload {
        let resolution = view.resolution();
        let half = Vec3::splat(resolution * 0.5);
        let mut bounds = Aabb::EMPTY;

        let instances: Vec<VoxelInstance> = view
            .voxels()
            .iter()
            .map(|voxel| {
                let scale = voxel.size.unwrap_or(DEFAULT_VOXEL_SIZE) / resolution;
                let center = voxel.center();
                bounds = bounds.merged(&Aabb::from_center_half_extent(center, half * scale));

                let color = match mode {
                    RenderMode::Raw => voxel.color_normalized(),
                    RenderMode::Shaded => color::boost(voxel.color, SHADED_GAIN, SHADED_SATURATION),
                };

                VoxelInstance {
                    transform: Mat4::from_scale_rotation_translation(
                        Vec3::splat(scale),
                        Quat::IDENTITY,
                        center,
                    ),
                    color,
                }
            })
            .collect();

        let (material, lights) = match mode {
            RenderMode::Raw => (Material::Unlit, Vec::new()),
            RenderMode::Shaded => (Material::Physical(PhysicalMaterial::SHADED), shaded_lights()),
        };

        log::debug!("Batched {} voxel instances ({:?})", instances.len(), mode);

        RenderPayload {
            mode,
            box_edge: resolution,
            instances,
            material,
            lights,
            bounds,
        }
    }
}
