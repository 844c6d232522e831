//! Vertex buffers for voxel instances and helper lines

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

use crate::scene::{FlatVoxel, LineVertex};

/// Per-instance data for the voxel pipeline (80 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// Model matrix columns (unit cube to world)
    pub model: [[f32; 4]; 4],
    /// rgb = colour in sRGB, a unused
    pub color: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&FlatVoxel> for InstanceRaw {
    fn from(voxel: &FlatVoxel) -> Self {
        Self {
            model: voxel.model.to_cols_array_2d(),
            color: [voxel.color[0], voxel.color[1], voxel.color[2], 1.0],
        }
    }
}

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertex buffer that is recreated when its contents outgrow it
pub struct VertexArrayBuffer<T: Pod> {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> VertexArrayBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            label,
            buffer: Self::create(device, label, capacity),
            capacity,
            len: 0,
            _marker: PhantomData,
        }
    }

    fn create(device: &wgpu::Device, label: &'static str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * std::mem::size_of::<T>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Replace the buffer contents, growing it when needed
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        if data.len() > self.capacity {
            let capacity = grown_capacity(self.capacity, data.len());
            log::debug!("Growing {} buffer: {} -> {} elements", self.label, self.capacity, capacity);
            self.buffer.destroy();
            self.buffer = Self::create(device, self.label, capacity);
            self.capacity = capacity;
        }

        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.len = data.len();
    }

    /// Slice covering the uploaded elements
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..(self.len * std::mem::size_of::<T>()) as u64)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn destroy(&mut self) {
        self.buffer.destroy();
        self.len = 0;
    }
}

/// Next power of two that fits `needed`, never shrinking
fn grown_capacity(current: usize, needed: usize) -> usize {
    needed.next_power_of_two().max(current)
}

/// Instance buffer for voxel boxes
pub type InstanceBuffer = VertexArrayBuffer<InstanceRaw>;
/// Vertex buffer for grid and axes lines
pub type LineBuffer = VertexArrayBuffer<LineVertex>;
