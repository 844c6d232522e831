//! Instanced voxel box pipeline with flat and shaded fragment entry points

use crate::render::batch::RenderMode;
use crate::render::buffer::{CubeMesh, CubeVertex, InstanceBuffer, InstanceRaw, SceneBuffer};
use crate::render::texture::{DepthTexture, DEPTH_FORMAT};

/// Draws voxel instances; one pipeline per fragment entry point
pub struct VoxelPipeline {
    flat: wgpu::RenderPipeline,
    shaded: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    shadow_sampler: wgpu::Sampler,
}

impl VoxelPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("voxel_shader"),
            source: wgpu::ShaderSource::Wgsl(
                concat!(include_str!("../../../shaders/common.wgsl"), include_str!("../../../shaders/voxel.wgsl")).into(),
            ),
        });

        // Group 0: scene uniform, shadow map, comparison sampler
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("voxel_bind_group_layout"),
            entries: &[
                SceneBuffer::layout_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("voxel_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let create = |label: &str, fragment_entry: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[CubeVertex::layout(), InstanceRaw::layout()],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
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
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        let flat = create("voxel_flat_pipeline", "fs_flat");
        let shaded = create("voxel_shaded_pipeline", "fs_shaded");

        Self {
            flat,
            shaded,
            bind_group_layout,
            shadow_sampler,
        }
    }

    /// Bind group over the scene uniform and the current shadow map
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        scene: &SceneBuffer,
        shadow_map: &DepthTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("voxel_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow_map.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.shadow_sampler),
                },
            ],
        })
    }

    /// Record instanced draws into an open render pass
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        mode: RenderMode,
        bind_group: &wgpu::BindGroup,
        cube: &CubeMesh,
        instances: &InstanceBuffer,
    ) {
        if instances.is_empty() {
            return;
        }

        let pipeline = if mode.is_shaded() { &self.shaded } else { &self.flat };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, cube.vertex_buffer().slice(..));
        pass.set_vertex_buffer(1, instances.slice());
        pass.set_index_buffer(cube.index_buffer().slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..cube.index_count(), 0, 0..instances.len() as u32);
    }
}
