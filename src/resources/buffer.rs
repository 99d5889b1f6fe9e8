//! GPU buffer resource.

use std::sync::Arc;

use crate::backend::GpuBuffer;
use crate::device::GraphicsDevice;
use crate::types::{BufferDescriptor, BufferUsage, ResourceId};

use super::GpuResource;

/// A GPU buffer resource.
///
/// Buffers are created by [`GraphicsDevice::create_buffer`]. They keep their
/// parent device alive and destroy the backend allocation when dropped.
///
/// # Example
///
/// ```ignore
/// let buffer = device.create_buffer(&BufferDescriptor::new(1024, BufferUsage::STORAGE))?;
/// println!("Buffer size: {}", buffer.size());
/// ```
pub struct Buffer {
    device: Arc<GraphicsDevice>,
    id: ResourceId,
    descriptor: BufferDescriptor,
    gpu: GpuBuffer,
}

impl Buffer {
    /// Create a new buffer (called by GraphicsDevice).
    pub(crate) fn new(
        device: Arc<GraphicsDevice>,
        id: ResourceId,
        descriptor: BufferDescriptor,
        gpu: GpuBuffer,
    ) -> Self {
        Self {
            device,
            id,
            descriptor,
            gpu,
        }
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Device-unique identifier.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the buffer usage flags.
    pub fn usage(&self) -> BufferUsage {
        self.descriptor.usage
    }

    /// Number of whole `T` values the buffer holds.
    pub fn element_count<T>(&self) -> usize {
        self.descriptor.size as usize / std::mem::size_of::<T>()
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Backend handle.
    pub fn gpu_handle(&self) -> &GpuBuffer {
        &self.gpu
    }
}

impl GpuResource for Buffer {
    const KIND: &'static str = "buffer";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        log::trace!("Buffer {} {:?}: releasing", self.id, self.descriptor.label);
        self.device.backend().destroy_buffer(&self.gpu);
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);
