//! Graphics device.
//!
//! The [`GraphicsDevice`] is the resource-management collaborator of the
//! baker: it validates descriptors, hands out [`Buffer`]s and [`Texture`]s
//! backed by the active [`GpuBackend`], and routes uploads and copies.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::{self, GpuBackend};
use crate::error::GraphicsError;
use crate::resources::{Buffer, Texture};
use crate::types::{BufferDescriptor, ResourceId, TextureDescriptor, TextureUsage};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture dimension.
    pub max_texture_dimension: u32,
    /// Maximum buffer size.
    pub max_buffer_size: u64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_buffer_size: 1 << 30, // 1 GB
        }
    }
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
///
/// # Example
///
/// ```ignore
/// let device = GraphicsDevice::new(Arc::new(DummyBackend::new()));
/// let buffer = device.create_buffer(&BufferDescriptor::new(1024, BufferUsage::STORAGE))?;
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: DeviceCapabilities,
    next_resource_id: AtomicU64,
}

impl GraphicsDevice {
    /// Create a device on top of an existing backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        Self::with_capabilities(backend, DeviceCapabilities::default())
    }

    /// Create a device with explicit limits.
    pub fn with_capabilities(
        backend: Arc<dyn GpuBackend>,
        capabilities: DeviceCapabilities,
    ) -> Arc<Self> {
        log::info!("Creating GraphicsDevice on {}", backend.name());
        Arc::new(Self {
            backend,
            capabilities,
            next_resource_id: AtomicU64::new(1),
        })
    }

    /// Create a device on the best available backend.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend can be initialized.
    pub fn create_default() -> Result<Arc<Self>, GraphicsError> {
        Ok(Self::new(backend::create_backend()?))
    }

    /// Get the GPU backend.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn allocate_id(&self) -> ResourceId {
        ResourceId(self.next_resource_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size exceeds device limits or allocation fails.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Buffer, GraphicsError> {
        if descriptor.size > self.capabilities.max_buffer_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} exceeds maximum {}",
                descriptor.size, self.capabilities.max_buffer_size
            )));
        }

        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        let gpu = self.backend.create_buffer(descriptor)?;
        let id = self.allocate_id();

        log::trace!(
            "GraphicsDevice: created buffer {} {:?}, size={}",
            id,
            descriptor.label,
            descriptor.size
        );

        Ok(Buffer::new(Arc::clone(self), id, descriptor.clone(), gpu))
    }

    /// Create a GPU texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture dimensions exceed device limits or allocation fails.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
    ) -> Result<Texture, GraphicsError> {
        let max_dim = self.capabilities.max_texture_dimension;
        if descriptor.size.width > max_dim
            || descriptor.size.height > max_dim
            || descriptor.size.depth > max_dim
        {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }

        if descriptor.size.width == 0 || descriptor.size.height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        let gpu = self.backend.create_texture(descriptor)?;
        let id = self.allocate_id();

        log::trace!(
            "GraphicsDevice: created texture {} {:?}, size={}",
            id,
            descriptor.label,
            descriptor.size
        );

        Ok(Texture::new(Arc::clone(self), id, descriptor.clone(), gpu))
    }

    /// Upload bytes into a buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write does not fit the buffer.
    pub fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if offset + data.len() as u64 > buffer.size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {} overflows buffer {} of {} bytes",
                data.len(),
                offset,
                buffer.id(),
                buffer.size()
            )));
        }
        self.backend.write_buffer(buffer.gpu_handle(), offset, data)
    }

    /// Read back the full contents of a buffer.
    pub fn read_buffer(&self, buffer: &Buffer) -> Vec<u8> {
        self.backend.read_buffer(buffer.gpu_handle(), 0, buffer.size())
    }

    /// Check that `src` can be copied into `dst` without touching either.
    ///
    /// # Errors
    ///
    /// Returns an error if the sizes or formats differ, or if `src` lacks
    /// `COPY_SRC` or `dst` lacks `COPY_DST` usage.
    pub fn validate_copy(&self, src: &Texture, dst: &Texture) -> Result<(), GraphicsError> {
        if src.size() != dst.size() || src.format() != dst.format() {
            return Err(GraphicsError::InvalidParameter(format!(
                "cannot copy texture {} ({} {:?}) into {} ({} {:?})",
                src.id(),
                src.size(),
                src.format(),
                dst.id(),
                dst.size(),
                dst.format()
            )));
        }
        if !src.usage().contains(TextureUsage::COPY_SRC) {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {} is missing COPY_SRC usage",
                src.id()
            )));
        }
        if !dst.usage().contains(TextureUsage::COPY_DST) {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {} is missing COPY_DST usage",
                dst.id()
            )));
        }
        Ok(())
    }

    /// Overwrite `dst` with the full contents of `src`.
    ///
    /// # Errors
    ///
    /// Returns an error if [`validate_copy`](Self::validate_copy) rejects
    /// the pair or the backend fails the copy.
    pub fn copy_texture(&self, src: &Texture, dst: &Texture) -> Result<(), GraphicsError> {
        self.validate_copy(src, dst)?;
        self.backend
            .copy_texture_to_texture(src.gpu_handle(), dst.gpu_handle(), src.size())
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
