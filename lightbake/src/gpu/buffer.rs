use std::sync::mpsc;
use std::{any, mem};

use bytemuck::Pod;

use super::Bindable;
use crate::BakeError;

/// Storage buffer living in VRAM; uploaded from and read back into host
/// slices.
#[derive(Debug)]
pub struct StorageBuffer {
    label: String,
    buffer: wgpu::Buffer,
}

impl StorageBuffer {
    /// Allocates a buffer holding `items`.
    pub fn new<T>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: impl AsRef<str>,
        items: &[T],
    ) -> Self
    where
        T: Pod,
    {
        let this = Self::alloc::<T>(device, label, items.len());

        if !items.is_empty() {
            queue.write_buffer(&this.buffer, 0, bytemuck::cast_slice(items));
        }

        this
    }

    /// Allocates a buffer holding `len` zeroed items.
    pub fn zeroed<T>(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        len: usize,
    ) -> Self
    where
        T: Pod,
    {
        Self::alloc::<T>(device, label, len)
    }

    fn alloc<T>(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        len: usize,
    ) -> Self
    where
        T: Pod,
    {
        let label = label.as_ref();
        let size = pad_size(len * mem::size_of::<T>());

        log::debug!(
            "Allocating storage buffer `{label}`; ty={}, len={len}, \
             size={size}",
            any::type_name::<T>(),
        );

        // Buffers are zero-initialized by wgpu
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            size: size as _,
            mapped_at_creation: false,
        });

        Self {
            label: label.to_string(),
            buffer,
        }
    }

    pub fn write<T>(&self, queue: &wgpu::Queue, items: &[T])
    where
        T: Pod,
    {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(items));
    }

    /// Copies first `len` items back to the host, waiting for all previously
    /// submitted work to finish.
    pub fn read<T>(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        len: usize,
    ) -> Result<Vec<T>, BakeError>
    where
        T: Pod,
    {
        let size = (len * mem::size_of::<T>()) as u64;

        if size == 0 {
            return Ok(Vec::new());
        }

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{}_staging", self.label)),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            size,
            mapped_at_creation: false,
        });

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&format!("{}_readback", self.label)),
            });

        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, size);
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();

        slice.map_async(wgpu::MapMode::Read, move |result| {
            _ = tx.send(result);
        });

        device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => (),

            Ok(Err(source)) => {
                return Err(BakeError::BufferMapping {
                    label: self.label.clone(),
                    source,
                });
            }

            Err(_) => {
                return Err(BakeError::BufferMappingAborted {
                    label: self.label.clone(),
                });
            }
        }

        let items = bytemuck::pod_collect_to_vec(&slice.get_mapped_range());

        staging.unmap();

        Ok(items)
    }
}

impl Bindable for StorageBuffer {
    fn resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Layout entry shared by all kernels' bindings.
pub fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Returns `size` rounded up so that even an empty buffer can be bound to
/// any kernel's runtime-sized array.
fn pad_size(size: usize) -> usize {
    const MIN_SIZE: usize = 256;

    size.max(MIN_SIZE).next_multiple_of(16)
}
