//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't talk to a GPU. Buffer contents live in host memory so
//! uploads can be read back, textures only remember their descriptor and the
//! copies they received, and every allocation is counted so tests can check
//! that resources are released exactly once.

use std::any::Any;
use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, Extent3d, TextureDescriptor};

use super::{GpuBackend, GpuBuffer, GpuTexture};

/// Allocation counters of a [`DummyBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DummyStats {
    /// Buffers created so far.
    pub buffers_created: u64,
    /// Buffers destroyed so far.
    pub buffers_destroyed: u64,
    /// Textures created so far.
    pub textures_created: u64,
    /// Textures destroyed so far.
    pub textures_destroyed: u64,
    /// Texture-to-texture copies executed.
    pub texture_copies: u64,
    /// Total bytes uploaded through `write_buffer`.
    pub bytes_written: u64,
    /// Destroy calls for resources that were not alive.
    pub invalid_releases: u64,
}

impl DummyStats {
    /// Buffers currently alive.
    pub fn live_buffers(&self) -> u64 {
        self.buffers_created - self.buffers_destroyed
    }

    /// Textures currently alive.
    pub fn live_textures(&self) -> u64 {
        self.textures_created - self.textures_destroyed
    }
}

#[derive(Debug)]
struct DummyTexture {
    descriptor: TextureDescriptor,
    copies_received: u32,
    last_copy_source: Option<u64>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_slot: u64,
    buffers: HashMap<u64, Vec<u8>>,
    textures: HashMap<u64, DummyTexture>,
    stats: DummyStats,
}

impl DummyState {
    fn allocate_slot(&mut self) -> u64 {
        self.next_slot += 1;
        self.next_slot
    }
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the allocation counters.
    pub fn stats(&self) -> DummyStats {
        self.state.lock().stats
    }

    /// Number of copies a texture has received as destination.
    pub fn copies_received(&self, texture: &GpuTexture) -> Option<u32> {
        let GpuTexture::Dummy { slot } = texture else {
            return None;
        };
        self.state
            .lock()
            .textures
            .get(slot)
            .map(|t| t.copies_received)
    }

    /// Slot of the texture most recently copied into `texture`.
    pub fn last_copy_source(&self, texture: &GpuTexture) -> Option<u64> {
        let GpuTexture::Dummy { slot } = texture else {
            return None;
        };
        self.state
            .lock()
            .textures
            .get(slot)
            .and_then(|t| t.last_copy_source)
    }

    /// Descriptor a texture was created with, if it is still alive.
    pub fn texture_descriptor(&self, texture: &GpuTexture) -> Option<TextureDescriptor> {
        let GpuTexture::Dummy { slot } = texture else {
            return None;
        };
        self.state
            .lock()
            .textures
            .get(slot)
            .map(|t| t.descriptor.clone())
    }
}

fn fits(extent: Extent3d, descriptor: &TextureDescriptor) -> bool {
    extent.width <= descriptor.size.width
        && extent.height <= descriptor.size.height
        && extent.depth <= descriptor.size.depth
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        let mut state = self.state.lock();
        let slot = state.allocate_slot();
        let _ = state
            .buffers
            .insert(slot, vec![0u8; descriptor.size as usize]);
        state.stats.buffers_created += 1;
        Ok(GpuBuffer::Dummy { slot })
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        let mut state = self.state.lock();
        let slot = state.allocate_slot();
        let _ = state.textures.insert(
            slot,
            DummyTexture {
                descriptor: descriptor.clone(),
                copies_received: 0,
                last_copy_source: None,
            },
        );
        state.stats.textures_created += 1;
        Ok(GpuTexture::Dummy { slot })
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        let mut state = self.state.lock();
        let removed = match buffer {
            GpuBuffer::Dummy { slot } => state.buffers.remove(slot).is_some(),
            #[cfg(feature = "wgpu-backend")]
            GpuBuffer::Wgpu(_) => false,
        };
        if removed {
            state.stats.buffers_destroyed += 1;
        } else {
            log::warn!("DummyBackend: destroy of unknown buffer {:?}", buffer);
            state.stats.invalid_releases += 1;
        }
    }

    fn destroy_texture(&self, texture: &GpuTexture) {
        let mut state = self.state.lock();
        let removed = match texture {
            GpuTexture::Dummy { slot } => state.textures.remove(slot).is_some(),
            #[cfg(feature = "wgpu-backend")]
            GpuTexture::Wgpu { .. } => false,
        };
        if removed {
            state.stats.textures_destroyed += 1;
        } else {
            log::warn!("DummyBackend: destroy of unknown texture {:?}", texture);
            state.stats.invalid_releases += 1;
        }
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyBackend: write_buffer offset={} len={}",
            offset,
            data.len()
        );
        let GpuBuffer::Dummy { slot } = buffer else {
            return Err(GraphicsError::InvalidParameter(
                "buffer was not created by the dummy backend".to_string(),
            ));
        };
        let mut state = self.state.lock();
        let contents = state
            .buffers
            .get_mut(slot)
            .ok_or_else(|| GraphicsError::ResourceReleased(format!("buffer slot {slot}")))?;
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {} overflows buffer of {} bytes",
                data.len(),
                offset,
                contents.len()
            )));
        }
        contents[start..end].copy_from_slice(data);
        state.stats.bytes_written += data.len() as u64;
        Ok(())
    }

    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64) -> Vec<u8> {
        log::trace!("DummyBackend: read_buffer offset={} size={}", offset, size);
        let GpuBuffer::Dummy { slot } = buffer else {
            return vec![0u8; size as usize];
        };
        let state = self.state.lock();
        let mut out = vec![0u8; size as usize];
        if let Some(contents) = state.buffers.get(slot) {
            let start = (offset as usize).min(contents.len());
            let end = (start + size as usize).min(contents.len());
            out[..end - start].copy_from_slice(&contents[start..end]);
        }
        out
    }

    fn copy_texture_to_texture(
        &self,
        src: &GpuTexture,
        dst: &GpuTexture,
        extent: Extent3d,
    ) -> Result<(), GraphicsError> {
        let (GpuTexture::Dummy { slot: src_slot }, GpuTexture::Dummy { slot: dst_slot }) =
            (src, dst)
        else {
            return Err(GraphicsError::InvalidParameter(
                "texture was not created by the dummy backend".to_string(),
            ));
        };
        log::trace!(
            "DummyBackend: copy_texture {} -> {} ({})",
            src_slot,
            dst_slot,
            extent
        );
        let mut state = self.state.lock();
        let src_desc = state
            .textures
            .get(src_slot)
            .map(|t| t.descriptor.clone())
            .ok_or_else(|| GraphicsError::ResourceReleased(format!("texture slot {src_slot}")))?;
        let target = state
            .textures
            .get_mut(dst_slot)
            .ok_or_else(|| GraphicsError::ResourceReleased(format!("texture slot {dst_slot}")))?;
        if !fits(extent, &src_desc) || !fits(extent, &target.descriptor) {
            return Err(GraphicsError::InvalidParameter(format!(
                "copy extent {} exceeds source {} or destination {}",
                extent, src_desc.size, target.descriptor.size
            )));
        }
        if src_desc.format != target.descriptor.format {
            return Err(GraphicsError::InvalidParameter(format!(
                "cannot copy {:?} into {:?}",
                src_desc.format, target.descriptor.format
            )));
        }
        target.copies_received += 1;
        target.last_copy_source = Some(*src_slot);
        state.stats.texture_copies += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
