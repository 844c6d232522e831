//! GPU uniform buffer for per-frame camera, light and material data

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::core::camera::Camera;
use crate::render::batch::Material;
use crate::scene::{FlatLight, FlatScene};

/// Per-frame uniform data (must match `SceneUniform` in the shaders)
///
/// Every field is a vec4 or mat4 so the WGSL layout has no implicit padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    /// Camera view-projection matrix (offset 0)
    pub view_proj: [[f32; 4]; 4],
    /// Shadow-casting light view-projection matrix (offset 64)
    pub light_view_proj: [[f32; 4]; 4],
    /// xyz = camera position, w = exposure (offset 128)
    pub camera_position: [f32; 4],
    /// xyz = camera forward, w = 1 for orthographic projection (offset 144)
    pub camera_forward: [f32; 4],
    /// rgb = summed ambient light, w = 1 when shaded (offset 160)
    pub ambient: [f32; 4],
    /// xyz = direction light travels, w = intensity (offset 176)
    pub sun_direction: [f32; 4],
    /// rgb = light colour, w = 1 when the light casts shadows (offset 192)
    pub sun_color: [f32; 4],
    /// roughness, metalness, clearcoat, clearcoat roughness (offset 208)
    pub material: [f32; 4],
    /// reflectivity, shadow bias, shadow radius, shadow map size (offset 224)
    pub params: [f32; 4],
    /// x = 1 when the shader must encode sRGB itself (offset 240)
    pub output: [f32; 4],
}

impl SceneUniform {
    pub fn new(
        camera: &Camera,
        scene: &FlatScene,
        light_view_proj: Mat4,
        exposure: f32,
        encode_srgb: bool,
    ) -> Self {
        let mut uniform = Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            light_view_proj: light_view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(exposure).to_array(),
            camera_forward: camera
                .forward()
                .extend(if camera.is_orthographic() { 1.0 } else { 0.0 })
                .to_array(),
            output: [if encode_srgb { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
            ..Self::default()
        };

        if let Some(Material::Physical(m)) = scene.material {
            let ambient = scene.ambient();
            uniform.ambient = [ambient[0], ambient[1], ambient[2], 1.0];
            uniform.material = [m.roughness, m.metalness, m.clearcoat, m.clearcoat_roughness];
            uniform.params[0] = m.reflectivity;
        }

        if let Some(FlatLight::Directional { color, intensity, direction, shadow }) = scene.sun() {
            uniform.sun_direction = direction.extend(*intensity).to_array();
            uniform.sun_color = [color[0], color[1], color[2], if shadow.is_some() { 1.0 } else { 0.0 }];
            if let Some(shadow) = shadow {
                uniform.params[1] = shadow.bias;
                uniform.params[2] = shadow.radius;
                uniform.params[3] = shadow.map_size as f32;
            }
        }

        uniform
    }

    /// Whether the shaded lighting path is active
    pub fn is_shaded(&self) -> bool {
        self.ambient[3] > 0.5
    }

    /// Whether the shadow pass should run
    pub fn casts_shadow(&self) -> bool {
        self.is_shaded() && self.sun_color[3] > 0.5
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0, 0.0, 0.0, 1.0],
            camera_forward: [0.0, 0.0, -1.0, 0.0],
            ambient: [0.0; 4],
            sun_direction: [0.0, -1.0, 0.0, 0.0],
            sun_color: [0.0; 4],
            material: [1.0, 0.0, 0.0, 0.0],
            params: [0.0, 0.0, 1.0, 1.0],
            output: [0.0; 4],
        }
    }
}

/// GPU buffer for the scene uniform
pub struct SceneBuffer {
    buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl SceneBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniform"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[Self::layout_entry(0)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group_layout,
            bind_group,
        }
    }

    /// Layout entry for binding the uniform into other bind groups
    pub fn layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &SceneUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }

    /// Layout of the uniform-only bind group
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Uniform-only bind group
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}
