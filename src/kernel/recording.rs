//! Kernel that records invocations instead of running them.
//!
//! Used with the dummy backend: every [`dispatch`](ComputeKernel::dispatch)
//! captures the scalar parameters, the bound images and a snapshot of every
//! bound buffer, so tests can inspect exactly what a GPU kernel would have
//! seen.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use crate::backend::GpuBuffer;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::{Buffer, Texture};
use crate::types::{Extent3d, ResourceId, TextureFormat};

use super::ComputeKernel;

/// A buffer as seen by one kernel invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferBinding {
    /// Bound buffer.
    pub id: ResourceId,
    /// Contents at dispatch time, decoded as little-endian `f32`.
    pub contents: Vec<f32>,
}

/// An image as seen by one kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBinding {
    /// Bound texture.
    pub id: ResourceId,
    /// Texture size.
    pub size: Extent3d,
    /// Texture format.
    pub format: TextureFormat,
}

/// Everything a single dispatch was invoked with.
#[derive(Debug, Clone, Default)]
pub struct KernelInvocation {
    /// Integer parameters.
    pub ints: HashMap<String, i32>,
    /// Float parameters.
    pub floats: HashMap<String, f32>,
    /// Matrix parameters.
    pub matrices: HashMap<String, Mat4>,
    /// Buffer bindings.
    pub buffers: HashMap<String, BufferBinding>,
    /// Image bindings.
    pub images: HashMap<String, ImageBinding>,
    /// Thread group counts.
    pub groups: [u32; 3],
}

struct BoundBuffer {
    id: ResourceId,
    size: u64,
    device: Arc<GraphicsDevice>,
    handle: GpuBuffer,
}

/// Compute kernel that records instead of executing.
#[derive(Default)]
pub struct RecordingKernel {
    ints: HashMap<String, i32>,
    floats: HashMap<String, f32>,
    matrices: HashMap<String, Mat4>,
    buffers: HashMap<String, BoundBuffer>,
    images: HashMap<String, ImageBinding>,
    invocations: Vec<KernelInvocation>,
    fail_next: Option<GraphicsError>,
}

impl RecordingKernel {
    /// Create an empty recording kernel.
    pub fn new() -> Self {
        Self::default()
    }

    /// All invocations so far, oldest first.
    pub fn invocations(&self) -> &[KernelInvocation] {
        &self.invocations
    }

    /// The most recent invocation.
    pub fn last_invocation(&self) -> Option<&KernelInvocation> {
        self.invocations.last()
    }

    /// Forget recorded invocations, keeping current bindings.
    pub fn clear(&mut self) {
        self.invocations.clear();
    }

    /// Make the next dispatch fail with `error`.
    pub fn fail_next_dispatch(&mut self, error: GraphicsError) {
        self.fail_next = Some(error);
    }
}

fn decode_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl ComputeKernel for RecordingKernel {
    fn set_int(&mut self, name: &str, value: i32) {
        let _ = self.ints.insert(name.to_string(), value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        let _ = self.floats.insert(name.to_string(), value);
    }

    fn set_matrix(&mut self, name: &str, value: Mat4) {
        let _ = self.matrices.insert(name.to_string(), value);
    }

    fn bind_buffer(&mut self, name: &str, buffer: &Buffer) {
        let _ = self.buffers.insert(
            name.to_string(),
            BoundBuffer {
                id: buffer.id(),
                size: buffer.size(),
                device: Arc::clone(buffer.device()),
                handle: buffer.gpu_handle().clone(),
            },
        );
    }

    fn bind_image(&mut self, name: &str, texture: &Texture) {
        let _ = self.images.insert(
            name.to_string(),
            ImageBinding {
                id: texture.id(),
                size: texture.size(),
                format: texture.format(),
            },
        );
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), GraphicsError> {
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }

        log::trace!("RecordingKernel: dispatch ({}, {}, {})", x, y, z);

        let buffers = self
            .buffers
            .iter()
            .map(|(name, bound)| {
                let bytes = bound.device.backend().read_buffer(&bound.handle, 0, bound.size);
                (
                    name.clone(),
                    BufferBinding {
                        id: bound.id,
                        contents: decode_f32(&bytes),
                    },
                )
            })
            .collect();

        self.invocations.push(KernelInvocation {
            ints: self.ints.clone(),
            floats: self.floats.clone(),
            matrices: self.matrices.clone(),
            buffers,
            images: self.images.clone(),
            groups: [x, y, z],
        });
        Ok(())
    }
}

impl std::fmt::Debug for RecordingKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingKernel")
            .field("invocations", &self.invocations.len())
            .finish_non_exhaustive()
    }
}
