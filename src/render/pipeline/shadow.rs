//! Directional light shadow map pass

use glam::{Mat4, Vec3};

use crate::math::Aabb;
use crate::render::buffer::{CubeMesh, CubeVertex, InstanceBuffer, InstanceRaw};
use crate::render::texture::{DepthTexture, DEPTH_FORMAT};

/// Light-space view-projection that fits `bounds` when looking along `direction`
///
/// The orthographic box encloses the bounding sphere of `bounds`, so every
/// voxel lands inside the shadow map regardless of the light angle.
pub fn light_view_proj(direction: Vec3, bounds: &Aabb) -> Mat4 {
    let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
    let (center, radius) = if bounds.is_empty() {
        (Vec3::ZERO, 1.0)
    } else {
        (bounds.center(), (bounds.size().length() * 0.5).max(1.0))
    };

    let eye = center - direction * radius * 2.0;
    let up = if direction.cross(Vec3::Y).length_squared() < 1e-6 { Vec3::Z } else { Vec3::Y };
    let view = Mat4::look_at_rh(eye, center, up);
    let proj = Mat4::orthographic_rh(-radius, radius, -radius, radius, radius * 0.5, radius * 3.5);
    proj * view
}

/// Depth-only pipeline rendering voxel instances from the light
pub struct ShadowPipeline {
    pipeline: wgpu::RenderPipeline,
}

impl ShadowPipeline {
    pub fn new(device: &wgpu::Device, scene_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(
                concat!(include_str!("../../../shaders/common.wgsl"), include_str!("../../../shaders/shadow.wgsl")).into(),
            ),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[scene_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[CubeVertex::layout(), InstanceRaw::layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            multiview_mask: None,
            cache: None,
        });

        Self { pipeline }
    }

    /// Render all instances into the shadow map
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        shadow_map: &DepthTexture,
        scene_bind_group: &wgpu::BindGroup,
        cube: &CubeMesh,
        instances: &InstanceBuffer,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: shadow_map.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if instances.is_empty() {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, scene_bind_group, &[]);
        pass.set_vertex_buffer(0, cube.vertex_buffer().slice(..));
        pass.set_vertex_buffer(1, instances.slice());
        pass.set_index_buffer(cube.index_buffer().slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..cube.index_count(), 0, 0..instances.len() as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn to_clip(m: &Mat4, p: Vec3) -> Vec3 {
        m.project_point3(p)
    }

    #[test]
    fn test_bounds_fit_inside_light_frustum() {
        let bounds = Aabb::new(Vec3::new(-3.0, 0.0, -2.0), Vec3::new(5.0, 4.0, 6.0));
        let m = light_view_proj(Vec3::new(-0.2, -1.0, -0.2), &bounds);

        for x in [bounds.min.x, bounds.max.x] {
            for y in [bounds.min.y, bounds.max.y] {
                for z in [bounds.min.z, bounds.max.z] {
                    let clip = to_clip(&m, Vec3::new(x, y, z));
                    assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0, "{clip:?}");
                    assert!((0.0..=1.0).contains(&clip.z), "{clip:?}");
                }
            }
        }
    }

    #[test]
    fn test_nearer_to_light_has_smaller_depth() {
        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let m = light_view_proj(Vec3::NEG_Y, &bounds);
        let top = to_clip(&m, Vec3::new(0.0, 1.0, 0.0));
        let bottom = to_clip(&m, Vec3::new(0.0, -1.0, 0.0));
        assert!(top.z < bottom.z);
        assert_relative_eq!(top.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_bounds_still_valid() {
        let m = light_view_proj(Vec3::new(0.2, 0.2, 1.0), &Aabb::EMPTY);
        assert!(m.is_finite());
    }
}
