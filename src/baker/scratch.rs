//! Scratch GPU resources owned by the baker.

use std::sync::Arc;

use crate::config::BakerConfig;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::{Buffer, ScopedGpuResource, Texture};
use crate::types::{BufferDescriptor, BufferUsage, Extent3d, TextureDescriptor, TextureFormat};

/// Floats stored per vertex in every scratch buffer.
pub const FLOATS_PER_VERTEX: usize = 3;

/// Position history and normal buffers.
///
/// The two position buffers always have the same size. Their roles swap after
/// every bake, so `previous` holds last frame's positions when the kernel runs.
#[derive(Debug, Default)]
pub struct ScratchBufferSet {
    current: ScopedGpuResource<Buffer>,
    previous: ScopedGpuResource<Buffer>,
    normals: ScopedGpuResource<Buffer>,
}

impl ScratchBufferSet {
    /// Whether the buffers exist.
    pub fn is_allocated(&self) -> bool {
        self.current.is_allocated()
    }

    /// Number of `f32` elements in each buffer.
    pub fn element_count(&self) -> Option<usize> {
        self.current.get().map(|b| b.element_count::<f32>())
    }

    /// Buffer receiving this frame's positions.
    pub fn current(&self) -> Option<&Buffer> {
        self.current.get()
    }

    /// Buffer holding last frame's positions.
    pub fn previous(&self) -> Option<&Buffer> {
        self.previous.get()
    }

    /// Buffer receiving this frame's normals.
    pub fn normals(&self) -> Option<&Buffer> {
        self.normals.get()
    }

    fn allocate(
        &mut self,
        device: &Arc<GraphicsDevice>,
        config: &BakerConfig,
        vertex_count: usize,
    ) -> Result<(), GraphicsError> {
        let descriptor = |name: &str| {
            BufferDescriptor::array_of::<f32>(
                vertex_count * FLOATS_PER_VERTEX,
                BufferUsage::STORAGE | BufferUsage::COPY_DST | BufferUsage::COPY_SRC,
            )
            .with_label(config.label(name))
        };
        self.current
            .replace(device.create_buffer(&descriptor("PositionBuffer1"))?);
        self.previous
            .replace(device.create_buffer(&descriptor("PositionBuffer2"))?);
        self.normals
            .replace(device.create_buffer(&descriptor("NormalBuffer"))?);
        Ok(())
    }

    /// Release all three buffers. Returns `true` if anything was held.
    pub fn release(&mut self) -> bool {
        let current = self.current.release();
        let previous = self.previous.release();
        let normals = self.normals.release();
        current || previous || normals
    }

    /// Exchange the current and previous position buffers.
    pub fn swap_history(&mut self) {
        self.current.swap(&mut self.previous);
    }
}

/// Images the kernel writes before they are copied to the outputs.
#[derive(Debug, Default)]
pub struct ScratchTextureSet {
    position: ScopedGpuResource<Texture>,
    velocity: ScopedGpuResource<Texture>,
    normal: ScopedGpuResource<Texture>,
}

impl ScratchTextureSet {
    /// Whether the images exist.
    pub fn is_allocated(&self) -> bool {
        self.position.is_allocated()
    }

    /// Size shared by all three images.
    pub fn size(&self) -> Option<Extent3d> {
        self.position.get().map(|t| t.size())
    }

    /// Size and per-image formats of the allocated set.
    pub fn layout(&self) -> Option<ImageLayout> {
        match (self.position.get(), self.velocity.get(), self.normal.get()) {
            (Some(position), Some(velocity), Some(normal)) => Some(ImageLayout {
                size: position.size(),
                formats: [position.format(), velocity.format(), normal.format()],
            }),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<&Texture> {
        self.position.get()
    }

    pub fn velocity(&self) -> Option<&Texture> {
        self.velocity.get()
    }

    pub fn normal(&self) -> Option<&Texture> {
        self.normal.get()
    }

    fn allocate(
        &mut self,
        device: &Arc<GraphicsDevice>,
        config: &BakerConfig,
        layout: &ImageLayout,
    ) -> Result<(), GraphicsError> {
        let [position, velocity, normal] = layout.formats;
        let descriptor = |name: &str, format: TextureFormat| {
            TextureDescriptor::new_2d(
                layout.size.width,
                layout.size.height,
                format,
                config.scratch_usage,
            )
            .with_label(config.label(name))
        };
        self.position
            .replace(device.create_texture(&descriptor("PositionMap", position))?);
        self.velocity
            .replace(device.create_texture(&descriptor("VelocityMap", velocity))?);
        self.normal
            .replace(device.create_texture(&descriptor("NormalMap", normal))?);
        Ok(())
    }

    /// Release all three images. Returns `true` if anything was held.
    pub fn release(&mut self) -> bool {
        let position = self.position.release();
        let velocity = self.velocity.release();
        let normal = self.normal.release();
        position || velocity || normal
    }
}

/// Size and formats the scratch images must have.
///
/// Formats are in position, velocity, normal order and mirror the outputs,
/// so every scratch image can be copied into its output without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    pub size: Extent3d,
    pub formats: [TextureFormat; 3],
}

impl ImageLayout {
    fn matches(&self, other: &ImageLayout) -> bool {
        self.size.width == other.size.width
            && self.size.height == other.size.height
            && self.formats == other.formats
    }
}

/// What [`ResourceManager::ensure`] had to (re)create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reallocation {
    /// The scratch buffers were created.
    pub buffers: bool,
    /// The scratch images were created.
    pub textures: bool,
}

impl Reallocation {
    /// Whether nothing was created.
    pub fn is_empty(&self) -> bool {
        !self.buffers && !self.textures
    }
}

/// Keeps the scratch sets sized to the mesh and the output maps.
#[derive(Debug)]
pub struct ResourceManager {
    device: Arc<GraphicsDevice>,
    buffers: ScratchBufferSet,
    textures: ScratchTextureSet,
}

impl ResourceManager {
    pub fn new(device: Arc<GraphicsDevice>) -> Self {
        Self {
            device,
            buffers: ScratchBufferSet::default(),
            textures: ScratchTextureSet::default(),
        }
    }

    pub fn buffers(&self) -> &ScratchBufferSet {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut ScratchBufferSet {
        &mut self.buffers
    }

    pub fn textures(&self) -> &ScratchTextureSet {
        &self.textures
    }

    /// Make sure the buffers hold `vertex_count` vertices and the images
    /// match `layout`, recreating whichever set does not fit.
    ///
    /// A set is always released as a whole before it is recreated.
    ///
    /// # Errors
    ///
    /// Returns the device error if an allocation fails. Sets that could not
    /// be fully created are left released.
    pub fn ensure(
        &mut self,
        config: &BakerConfig,
        vertex_count: usize,
        layout: &ImageLayout,
    ) -> Result<Reallocation, GraphicsError> {
        let elements = vertex_count * FLOATS_PER_VERTEX;
        if let Some(current) = self.buffers.element_count()
            && current != elements
        {
            log::debug!(
                "ResourceManager: vertex count changed ({} -> {}), releasing buffers",
                current / FLOATS_PER_VERTEX,
                vertex_count
            );
            let _ = self.buffers.release();
        }
        if let Some(current) = self.textures.layout()
            && !current.matches(layout)
        {
            log::debug!(
                "ResourceManager: output layout changed ({} {:?} -> {} {:?}), releasing images",
                current.size,
                current.formats,
                layout.size,
                layout.formats
            );
            let _ = self.textures.release();
        }

        let mut reallocation = Reallocation::default();
        if !self.buffers.is_allocated() {
            log::debug!("ResourceManager: allocating buffers for {vertex_count} vertices");
            if let Err(e) = self.buffers.allocate(&self.device, config, vertex_count) {
                let _ = self.buffers.release();
                return Err(e);
            }
            reallocation.buffers = true;
        }
        if !self.textures.is_allocated() {
            log::debug!(
                "ResourceManager: allocating {} images {:?}",
                layout.size,
                layout.formats
            );
            if let Err(e) = self.textures.allocate(&self.device, config, layout) {
                let _ = self.textures.release();
                return Err(e);
            }
            reallocation.textures = true;
        }
        Ok(reallocation)
    }

    /// Release every scratch resource. Returns `true` if anything was held.
    pub fn release_all(&mut self) -> bool {
        let buffers = self.buffers.release();
        let textures = self.textures.release();
        buffers || textures
    }
}
