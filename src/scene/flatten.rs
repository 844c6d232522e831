//! Flattened scene graph output for GPU upload.
//!
//! `FlatScene` is the result of walking the scene graph: world-space voxel
//! instances, helper line vertices and lights, ready to be packed into GPU
//! buffers.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::math::Aabb;
use crate::render::batch::{hex_rgb, Light, Material, ShadowSettings};

/// Grid centre-line colour
const GRID_CENTER_COLOR: u32 = 0x444444;
/// Grid line colour
const GRID_COLOR: u32 = 0x888888;

/// One voxel box: unit cube model matrix plus colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatVoxel {
    pub model: Mat4,
    pub color: [f32; 3],
}

/// Line-list vertex for the grid and axes helpers.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    fn new(position: Vec3, color: [f32; 3]) -> Self {
        Self { position: position.to_array(), color }
    }
}

/// A light in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlatLight {
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
    Directional {
        color: [f32; 3],
        intensity: f32,
        /// Direction the light travels (from the light towards its target)
        direction: Vec3,
        shadow: Option<ShadowSettings>,
    },
}

impl FlatLight {
    /// Resolve a light node; directional lights aim at the world origin.
    pub fn from_light(light: &Light, world: &Mat4) -> Self {
        match *light {
            Light::Ambient { color, intensity } => FlatLight::Ambient { color, intensity },
            Light::Directional(dir) => {
                let position = world.transform_point3(Vec3::ZERO);
                FlatLight::Directional {
                    color: dir.color,
                    intensity: dir.intensity,
                    direction: (-position).try_normalize().unwrap_or(-Vec3::Y),
                    shadow: dir.shadow,
                }
            }
        }
    }
}

/// Everything visible in the scene, in world space.
#[derive(Clone, Debug)]
pub struct FlatScene {
    pub voxels: Vec<FlatVoxel>,
    pub lines: Vec<LineVertex>,
    pub lights: Vec<FlatLight>,
    /// Material of the voxel batch, if any.
    pub material: Option<Material>,
    /// World-space bounds of all voxel boxes.
    pub voxel_bounds: Aabb,
}

impl Default for FlatScene {
    fn default() -> Self {
        Self {
            voxels: Vec::new(),
            lines: Vec::new(),
            lights: Vec::new(),
            material: None,
            voxel_bounds: Aabb::EMPTY,
        }
    }
}

impl FlatScene {
    /// Sum of ambient light contributions.
    pub fn ambient(&self) -> [f32; 3] {
        self.lights.iter().fold([0.0; 3], |acc, light| match light {
            FlatLight::Ambient { color, intensity } => [
                acc[0] + color[0] * intensity,
                acc[1] + color[1] * intensity,
                acc[2] + color[2] * intensity,
            ],
            FlatLight::Directional { .. } => acc,
        })
    }

    /// First directional light, if any.
    pub fn sun(&self) -> Option<&FlatLight> {
        self.lights.iter().find(|l| matches!(l, FlatLight::Directional { .. }))
    }

    /// Square grid on the local XZ plane with a darker centre line.
    pub(crate) fn push_grid(&mut self, world: &Mat4, size: f32, divisions: u32) {
        let divisions = divisions.max(1);
        let half = size * 0.5;
        let step = size / divisions as f32;
        let center = divisions / 2;

        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            let color = hex_rgb(if i == center { GRID_CENTER_COLOR } else { GRID_COLOR });
            for (a, b) in [
                (Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k)),
                (Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half)),
            ] {
                self.lines.push(LineVertex::new(world.transform_point3(a), color));
                self.lines.push(LineVertex::new(world.transform_point3(b), color));
            }
        }
    }

    /// X, Y and Z axis lines of length `size`.
    pub(crate) fn push_axes(&mut self, world: &Mat4, size: f32) {
        let origin = world.transform_point3(Vec3::ZERO);
        let axes = [
            (Vec3::X, [1.0, 0.0, 0.0], [1.0, 0.6, 0.0]),
            (Vec3::Y, [0.0, 1.0, 0.0], [0.6, 1.0, 0.0]),
            (Vec3::Z, [0.0, 0.0, 1.0], [0.0, 0.6, 1.0]),
        ];
        for (axis, start, end) in axes {
            self.lines.push(LineVertex::new(origin, start));
            self.lines.push(LineVertex::new(world.transform_point3(axis * size), end));
        }
    }
}
