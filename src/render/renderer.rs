//! Forward renderer for the flattened scene graph
//!
//! Owns every GPU resource the viewer draws with. Scene content is re-uploaded
//! only when the scene graph generation changes; the camera and light
//! uniforms are rewritten every frame.

use glam::Mat4;

use crate::core::camera::Camera;
use crate::core::types::Result;
use crate::render::batch::{Material, RenderMode};
use crate::render::buffer::{CubeMesh, InstanceBuffer, InstanceRaw, LineBuffer, SceneBuffer, SceneUniform};
use crate::render::context::GpuContext;
use crate::render::pipeline::{light_view_proj, LinePipeline, ShadowPipeline, VoxelPipeline};
use crate::render::texture::DepthTexture;
use crate::scene::{FlatLight, FlatScene, SceneGraph};

/// Shadow map size used before any shadow-casting light is present
const DEFAULT_SHADOW_MAP_SIZE: u32 = 1;

/// Clear colour for a background given in sRGB
///
/// sRGB targets expect linear clear values; other targets take them as-is.
pub fn clear_color(rgb: [f32; 3], srgb_target: bool) -> wgpu::Color {
    let convert = |c: f32| -> f64 {
        let c = c as f64;
        if !srgb_target {
            c
        } else if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: convert(rgb[0]),
        g: convert(rgb[1]),
        b: convert(rgb[2]),
        a: 1.0,
    }
}

/// Render mode implied by the flattened scene's material
fn mode_of(flat: &FlatScene) -> RenderMode {
    match flat.material {
        Some(Material::Physical(_)) => RenderMode::Shaded,
        _ => RenderMode::Raw,
    }
}

pub struct Renderer {
    scene_buffer: SceneBuffer,
    voxel_pipeline: VoxelPipeline,
    line_pipeline: LinePipeline,
    shadow_pipeline: ShadowPipeline,
    cube: CubeMesh,
    instances: InstanceBuffer,
    lines: LineBuffer,
    depth: DepthTexture,
    shadow_map: DepthTexture,
    voxel_bind_group: wgpu::BindGroup,
    flat: FlatScene,
    light_view_proj: Mat4,
    generation: Option<u64>,
    background: [f32; 3],
    exposure: f32,
    destroyed: bool,
}

impl Renderer {
    pub fn new(ctx: &GpuContext, background: [f32; 3], exposure: f32) -> Self {
        let device = &ctx.device;
        let (width, height) = ctx.size();

        let scene_buffer = SceneBuffer::new(device);
        let voxel_pipeline = VoxelPipeline::new(device, ctx.format());
        let line_pipeline = LinePipeline::new(device, ctx.format(), scene_buffer.bind_group_layout());
        let shadow_pipeline = ShadowPipeline::new(device, scene_buffer.bind_group_layout());
        let depth = DepthTexture::new(device, width, height);
        let shadow_map = DepthTexture::shadow_map(device, DEFAULT_SHADOW_MAP_SIZE);
        let voxel_bind_group = voxel_pipeline.create_bind_group(device, &scene_buffer, &shadow_map);

        log::info!("Renderer initialized ({}x{}, {:?})", width, height, ctx.format());

        Self {
            cube: CubeMesh::new(device),
            instances: InstanceBuffer::new(device, "voxel_instances", 1024),
            lines: LineBuffer::new(device, "helper_lines", 256),
            scene_buffer,
            voxel_pipeline,
            line_pipeline,
            shadow_pipeline,
            depth,
            shadow_map,
            voxel_bind_group,
            flat: FlatScene::default(),
            light_view_proj: Mat4::IDENTITY,
            generation: None,
            background,
            exposure,
            destroyed: false,
        }
    }

    /// Re-upload scene content if the graph changed since the last sync
    ///
    /// Returns true when buffers were rebuilt.
    pub fn sync(&mut self, ctx: &GpuContext, scene: &SceneGraph) -> bool {
        if self.destroyed || self.generation == Some(scene.generation()) {
            return false;
        }

        self.flat = scene.flatten();
        self.generation = Some(scene.generation());

        let instances: Vec<InstanceRaw> = self.flat.voxels.iter().map(InstanceRaw::from).collect();
        self.instances.upload(&ctx.device, &ctx.queue, &instances);
        self.lines.upload(&ctx.device, &ctx.queue, &self.flat.lines);

        if let Some(FlatLight::Directional { direction, shadow, .. }) = self.flat.sun() {
            self.light_view_proj = light_view_proj(*direction, &self.flat.voxel_bounds);
            if let Some(shadow) = shadow {
                self.ensure_shadow_map(&ctx.device, shadow.map_size);
            }
        }

        log::debug!(
            "Scene uploaded: {} instances, {} line vertices, {:?} mode",
            self.instances.len(),
            self.lines.len(),
            mode_of(&self.flat)
        );
        true
    }

    fn ensure_shadow_map(&mut self, device: &wgpu::Device, size: u32) {
        if self.shadow_map.resize(device, size, size) {
            self.voxel_bind_group = self.voxel_pipeline.create_bind_group(device, &self.scene_buffer, &self.shadow_map);
            log::debug!("Shadow map resized to {}x{}", size, size);
        }
    }

    /// Match the depth buffer to the surface
    pub fn resize(&mut self, ctx: &GpuContext) {
        if self.destroyed {
            return;
        }
        let (width, height) = ctx.size();
        self.depth.resize(&ctx.device, width, height);
    }

    /// Draw one frame with `camera`
    pub fn render(&mut self, ctx: &GpuContext, camera: &Camera) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }

        let uniform = SceneUniform::new(camera, &self.flat, self.light_view_proj, self.exposure, !ctx.is_srgb());
        self.scene_buffer.update(&ctx.queue, &uniform);

        let frame = match ctx.get_current_texture() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Surface unavailable ({}), reconfiguring", e);
                ctx.reconfigure();
                return Ok(());
            }
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        if uniform.casts_shadow() {
            self.shadow_pipeline.render(
                &mut encoder,
                &self.shadow_map,
                self.scene_buffer.bind_group(),
                &self.cube,
                &self.instances,
            );
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(self.background, ctx.is_srgb())),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.line_pipeline.draw(&mut pass, self.scene_buffer.bind_group(), &self.lines);
            self.voxel_pipeline.draw(
                &mut pass,
                mode_of(&self.flat),
                &self.voxel_bind_group,
                &self.cube,
                &self.instances,
            );
        }

        ctx.queue.submit([encoder.finish()]);
        frame.present();
        Ok(())
    }

    /// Number of voxel instances currently on the GPU
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Release all GPU buffers and textures; later calls are no-ops
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.instances.destroy();
        self.lines.destroy();
        self.cube.destroy();
        self.scene_buffer.destroy();
        self.depth.destroy();
        self.shadow_map.destroy();
        self.destroyed = true;
        log::info!("Renderer resources released");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::render::batch::InstanceBatcher;
    use crate::voxel::{Voxel, VoxelMap};

    #[test]
    fn test_clear_color_linearizes_for_srgb_targets() {
        let bg = crate::render::batch::hex_rgb(0xF0F0F0);
        let raw = clear_color(bg, false);
        assert_relative_eq!(raw.r, 240.0 / 255.0, epsilon = 1e-6);

        let linear = clear_color(bg, true);
        assert_relative_eq!(linear.g, 0.871367, epsilon = 1e-4);
        assert_eq!(linear.a, 1.0);
    }

    #[test]
    fn test_mode_follows_material() {
        let map = VoxelMap::new(vec![Voxel::new(0.0, 0.0, 0.0, [1, 2, 3])], 1.0).unwrap();
        let mut scene = SceneGraph::new();
        assert_eq!(mode_of(&scene.flatten()), RenderMode::Raw);

        scene.apply_payload(InstanceBatcher::build(&map.deselect(), RenderMode::Shaded));
        assert_eq!(mode_of(&scene.flatten()), RenderMode::Shaded);

        scene.apply_payload(InstanceBatcher::build(&map.deselect(), RenderMode::Raw));
        assert_eq!(mode_of(&scene.flatten()), RenderMode::Raw);
    }
}
