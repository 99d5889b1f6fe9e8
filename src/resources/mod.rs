//! GPU resources.
//!
//! This module contains the GPU resource types created by [`GraphicsDevice`]:
//! - [`Buffer`] - GPU memory buffer
//! - [`Texture`] - GPU texture/image
//! - [`ScopedGpuResource`] - owning slot with deterministic release
//!
//! Buffers and textures return their memory to the backend when dropped.
//! Owners that need the release to happen at a precise point (reallocation,
//! shutdown) keep them in a [`ScopedGpuResource`].
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice

mod buffer;
mod scoped;
mod texture;

pub use buffer::Buffer;
pub use scoped::{GpuResource, ScopedGpuResource};
pub use texture::Texture;
