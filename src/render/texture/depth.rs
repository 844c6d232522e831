//! Depth targets for the main pass and the shadow map

use wgpu::{Device, Extent3d, Texture, TextureView};

/// Depth format shared by every depth target
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A depth texture that can be resized and optionally sampled
pub struct DepthTexture {
    label: &'static str,
    usage: wgpu::TextureUsages,
    texture: Texture,
    view: TextureView,
    width: u32,
    height: u32,
}

impl DepthTexture {
    /// Depth buffer for the window-sized main pass
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        Self::with_usage(device, "depth_texture", width, height, wgpu::TextureUsages::RENDER_ATTACHMENT)
    }

    /// Square shadow map that is rendered into and sampled with a comparison sampler
    pub fn shadow_map(device: &Device, size: u32) -> Self {
        Self::with_usage(
            device,
            "shadow_map",
            size,
            size,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        )
    }

    fn with_usage(device: &Device, label: &'static str, width: u32, height: u32, usage: wgpu::TextureUsages) -> Self {
        let (texture, view) = Self::create(device, label, width, height, usage);
        Self {
            label,
            usage,
            texture,
            view,
            width: width.max(1),
            height: height.max(1),
        }
    }

    fn create(
        device: &Device,
        label: &'static str,
        width: u32,
        height: u32,
        usage: wgpu::TextureUsages,
    ) -> (Texture, TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreate the texture at a new size; no-op if unchanged
    ///
    /// Returns true when the texture (and therefore its view) was replaced.
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return false;
        }
        self.texture.destroy();
        let (texture, view) = Self::create(device, self.label, width, height, self.usage);
        self.texture = texture;
        self.view = view;
        self.width = width;
        self.height = height;
        true
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}
