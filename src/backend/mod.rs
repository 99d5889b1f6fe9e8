//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the host engine's
//! allocation, upload and copy APIs, so the baker can run on real hardware
//! or entirely in host memory.
//!
//! # Available Backends
//!
//! - `dummy` (always available): keeps resource contents in host memory and
//!   counts allocations, used by tests and headless tools
//! - `wgpu-backend`: cross-platform backend using wgpu
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Resource creation and explicit destruction (buffers, textures)
//! - Buffer upload and readback
//! - Full-image texture copies

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub mod dummy;

use std::any::Any;
use std::sync::Arc;

use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, Extent3d, TextureDescriptor};

pub use dummy::{DummyBackend, DummyStats};

/// Handle to a GPU buffer resource.
pub enum GpuBuffer {
    /// Dummy backend buffer (slot in host memory)
    Dummy { slot: u64 },
    /// wgpu backend buffer
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Buffer>),
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy { slot } => f.debug_struct("GpuBuffer::Dummy").field("slot", slot).finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => f.debug_tuple("GpuBuffer::Wgpu").field(buffer).finish(),
        }
    }
}

impl Clone for GpuBuffer {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy { slot } => Self::Dummy { slot: *slot },
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => Self::Wgpu(buffer.clone()),
        }
    }
}

/// Handle to a GPU texture resource.
pub enum GpuTexture {
    /// Dummy backend texture (slot in host memory)
    Dummy { slot: u64 },
    /// wgpu backend texture
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        texture: Arc<wgpu::Texture>,
        view: Arc<wgpu::TextureView>,
    },
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy { slot } => f
                .debug_struct("GpuTexture::Dummy")
                .field("slot", slot)
                .finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { texture, view } => f
                .debug_struct("GpuTexture::Wgpu")
                .field("texture", texture)
                .field("view", view)
                .finish(),
        }
    }
}

impl Clone for GpuTexture {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy { slot } => Self::Dummy { slot: *slot },
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { texture, view } => Self::Wgpu {
                texture: texture.clone(),
                view: view.clone(),
            },
        }
    }
}

/// GPU backend trait for abstracting different GPU APIs.
///
/// All commands are issued in program order: a buffer written with
/// [`write_buffer`](GpuBackend::write_buffer) is visible to any work the
/// caller dispatches afterwards in the same frame.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError>;

    /// Create a texture resource.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError>;

    /// Release a buffer's GPU memory.
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    /// Release a texture's GPU memory.
    fn destroy_texture(&self, texture: &GpuTexture);

    /// Write data to a buffer.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8])
    -> Result<(), GraphicsError>;

    /// Read data from a buffer.
    ///
    /// This is a blocking operation that waits for the GPU to finish.
    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64) -> Vec<u8>;

    /// Copy `extent` texels from the origin of `src` to the origin of `dst`.
    fn copy_texture_to_texture(
        &self,
        src: &GpuTexture,
        dst: &GpuTexture,
        extent: Extent3d,
    ) -> Result<(), GraphicsError>;

    /// Access the concrete backend, used by kernels bound to a specific API.
    fn as_any(&self) -> &dyn Any;
}

/// Selects and creates the appropriate backend based on available features.
pub fn create_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    #[cfg(feature = "wgpu-backend")]
    {
        match wgpu_backend::WgpuBackend::new() {
            Ok(backend) => {
                log::info!("Using wgpu backend");
                return Ok(Arc::new(backend));
            }
            Err(e) => {
                log::warn!("Failed to create wgpu backend: {}", e);
            }
        }
    }

    // Fall back to dummy backend
    log::info!("Using dummy backend");
    Ok(Arc::new(DummyBackend::new()))
}
