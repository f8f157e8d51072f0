use std::{marker::PhantomData, num::NonZeroU64};

use bytemuck::{Pod, bytes_of};
use wgpu::{
    BindGroupLayoutEntry, BindingResource, BindingType, Buffer, BufferBinding, BufferBindingType,
    BufferDescriptor, BufferUsages, Device, DynamicOffset, Queue, ShaderStages,
};

/// A uniform buffer holding exactly one `T`.
#[derive(Debug)]
pub struct ConstantBuffer<T: Pod> {
    buf: Buffer,
    _marker: PhantomData<T>,
}

/// A uniform buffer holding `capacity` values of `T`, each in its own slot
/// aligned for use as a dynamic offset.
#[derive(Debug)]
pub struct DynamicConstantBuffer<T: Pod> {
    buf: Buffer,
    stride: u64,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> ConstantBuffer<T> {
    pub fn new(label: &str, device: &Device) -> Self {
        Self {
            buf: device.create_buffer(&BufferDescriptor {
                label: Some(label),
                size: size_of::<T>() as u64,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            _marker: PhantomData,
        }
    }

    pub fn push(&self, value: &T, queue: &Queue) {
        queue.write_buffer(&self.buf, 0, bytes_of(value));
    }

    pub fn binding(&self) -> BindingResource<'_> {
        self.buf.as_entire_binding()
    }

    pub fn layout_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size_of::<T>() as u64),
            },
            count: None,
        }
    }
}

impl<T: Pod> DynamicConstantBuffer<T> {
    pub fn new(label: &str, capacity: usize, device: &Device) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_up(size_of::<T>() as u64, alignment);

        Self {
            buf: device.create_buffer(&BufferDescriptor {
                label: Some(label),
                size: stride * capacity.max(1) as u64,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            stride,
            capacity,
            _marker: PhantomData,
        }
    }

    /// The dynamic offset that selects `slot` when binding this buffer.
    pub fn offset(&self, slot: usize) -> DynamicOffset {
        assert!(slot < self.capacity);

        (slot as u64 * self.stride) as DynamicOffset
    }

    /// Writes `values` into slots `0..values.len()`.
    pub fn write(&self, values: &[T], queue: &Queue) {
        assert!(values.len() <= self.capacity);

        if values.is_empty() {
            return;
        }

        let mut bytes = vec![0u8; values.len() * self.stride as usize];
        for (slot, value) in bytes.chunks_exact_mut(self.stride as usize).zip(values) {
            slot[..size_of::<T>()].copy_from_slice(bytes_of(value));
        }

        queue.write_buffer(&self.buf, 0, &bytes);
    }

    /// Binds a window of one `T`; the dynamic offset picks the slot.
    pub fn binding(&self) -> BindingResource<'_> {
        BindingResource::Buffer(BufferBinding {
            buffer: &self.buf,
            offset: 0,
            size: NonZeroU64::new(size_of::<T>() as u64),
        })
    }

    pub fn layout_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(size_of::<T>() as u64),
            },
            count: None,
        }
    }
}

fn align_up(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}
