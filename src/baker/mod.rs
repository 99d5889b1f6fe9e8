//! The skinned mesh baker.
//!
//! Each [`SkinnedMeshBaker::tick`] runs one pass of the pipeline:
//!
//! 1. [`MeshSampler`] pulls this frame's vertices out of the [`MeshSource`].
//! 2. [`ConsistencyChecker`] validates the output maps, latching on failure.
//! 3. [`ResourceManager`] makes sure the scratch buffers and images fit.
//! 4. [`TransferExecutor`] uploads, dispatches the kernel and copies out.
//! 5. The position buffers swap roles so this frame becomes next frame's
//!    history.
//!
//! A tick with nothing to do (no source, no outputs, empty mesh, halted)
//! returns early and leaves every resource as it was.

mod consistency;
mod sampler;
mod scratch;
mod timing;
mod transfer;

use std::sync::Arc;

pub use consistency::{ConsistencyChecker, ConsistencyViolation, OutputTextures, find_violations};
pub use sampler::{BakedMesh, MeshSampler, MeshSource, VertexSnapshot};
pub use scratch::{
    FLOATS_PER_VERTEX, ImageLayout, Reallocation, ResourceManager, ScratchBufferSet, ScratchTextureSet,
};
pub use timing::frame_rate;
pub use transfer::TransferExecutor;

use crate::config::BakerConfig;
use crate::device::GraphicsDevice;
use crate::diagnostics::DiagnosticsSink;
use crate::error::{BakerError, BakerResult};
use crate::kernel::ComputeKernel;

/// Summary of a tick that reached the GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakeReport {
    /// Number of vertices uploaded.
    pub vertex_count: usize,
    /// Scratch resources created this tick.
    pub reallocation: Reallocation,
    /// Thread groups dispatched.
    pub groups: [u32; 3],
    /// Frame rate handed to the kernel.
    pub frame_rate: f32,
}

/// What a call to [`SkinnedMeshBaker::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No mesh source is configured.
    NoSource,
    /// No output textures are configured.
    NoOutputs,
    /// The source produced no vertices.
    EmptyMesh,
    /// The output maps failed validation; the baker stays halted.
    Halted,
    /// [`SkinnedMeshBaker::shutdown`] has been called.
    ShutDown,
    /// The maps were written.
    Baked(BakeReport),
}

impl TickOutcome {
    /// Whether the output maps were written.
    pub fn is_baked(&self) -> bool {
        matches!(self, Self::Baked(_))
    }
}

/// Bakes a deforming mesh into position, velocity and normal maps.
///
/// # Example
///
/// ```ignore
/// let mut baker = SkinnedMeshBaker::new(
///     device.clone(),
///     RecordingKernel::new(),
///     Arc::new(LogDiagnostics),
///     BakerConfig::default(),
/// )?;
/// baker.set_source(Box::new(my_mesh));
/// baker.set_outputs(OutputTextures::new(position, velocity, normal))?;
/// baker.tick(1.0 / 60.0)?;
/// ```
pub struct SkinnedMeshBaker<K: ComputeKernel> {
    device: Arc<GraphicsDevice>,
    kernel: K,
    diagnostics: Arc<dyn DiagnosticsSink>,
    config: BakerConfig,
    source: Option<Box<dyn MeshSource>>,
    outputs: Option<OutputTextures>,
    sampler: MeshSampler,
    checker: ConsistencyChecker,
    resources: ResourceManager,
    shut_down: bool,
}

impl<K: ComputeKernel> SkinnedMeshBaker<K> {
    /// Create a baker that allocates its scratch resources on `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is not usable.
    pub fn new(
        device: Arc<GraphicsDevice>,
        kernel: K,
        diagnostics: Arc<dyn DiagnosticsSink>,
        config: BakerConfig,
    ) -> BakerResult<Self> {
        config.validate()?;
        log::info!(
            "Creating SkinnedMeshBaker on {} (labels prefixed {:?})",
            device.backend().name(),
            config.label_prefix
        );
        Ok(Self {
            resources: ResourceManager::new(Arc::clone(&device)),
            device,
            kernel,
            diagnostics,
            config,
            source: None,
            outputs: None,
            sampler: MeshSampler::new(),
            checker: ConsistencyChecker::new(),
            shut_down: false,
        })
    }

    /// Set the mesh to bake.
    pub fn set_source(&mut self, source: Box<dyn MeshSource>) {
        self.source = Some(source);
    }

    /// Stop baking until a new source is set.
    pub fn clear_source(&mut self) -> Option<Box<dyn MeshSource>> {
        self.source.take()
    }

    /// Set the textures to write.
    ///
    /// # Errors
    ///
    /// Returns [`BakerError::ForeignOutputTexture`] if any texture was created
    /// on a different device.
    pub fn set_outputs(&mut self, outputs: OutputTextures) -> BakerResult<()> {
        if outputs
            .iter()
            .any(|t| !Arc::ptr_eq(t.device(), &self.device))
        {
            return Err(BakerError::ForeignOutputTexture);
        }
        self.outputs = Some(outputs);
        Ok(())
    }

    /// Currently configured outputs.
    pub fn outputs(&self) -> Option<&OutputTextures> {
        self.outputs.as_ref()
    }

    /// The kernel driven by this baker.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Mutable access to the kernel.
    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }

    /// The device scratch resources live on.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Active configuration.
    pub fn config(&self) -> &BakerConfig {
        &self.config
    }

    /// Scratch resources.
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Whether an output validation failure has halted the baker.
    pub fn is_latched(&self) -> bool {
        self.checker.is_latched()
    }

    /// Run the pipeline once for a frame that took `delta_time` seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if a scratch resource cannot be allocated, or the
    /// upload, dispatch or copy fails. Configuration problems with the
    /// output maps are reported to the diagnostics sink instead.
    pub fn tick(&mut self, delta_time: f32) -> BakerResult<TickOutcome> {
        if self.shut_down {
            return Ok(TickOutcome::ShutDown);
        }
        let Some(source) = self.source.as_deref_mut() else {
            return Ok(TickOutcome::NoSource);
        };
        let snapshot = self.sampler.sample(source);

        let Some(outputs) = self.outputs.as_ref() else {
            return Ok(TickOutcome::NoOutputs);
        };
        if !self.checker.check(outputs, self.diagnostics.as_ref()) {
            return Ok(TickOutcome::Halted);
        }
        if snapshot.is_empty() {
            log::debug!("SkinnedMeshBaker: source has no vertices, skipping");
            return Ok(TickOutcome::EmptyMesh);
        }

        let vertex_count = snapshot.vertex_count();
        let layout = outputs.layout();
        let reallocation = self
            .resources
            .ensure(&self.config, vertex_count, &layout)?;
        if !reallocation.is_empty() {
            log::debug!(
                "SkinnedMeshBaker: reallocated {:?} for {} vertices at {}",
                reallocation,
                vertex_count,
                layout.size
            );
        }

        let frame_rate = frame_rate(delta_time, &self.config);
        let groups = TransferExecutor::new(&self.device, &mut self.kernel).execute(
            self.resources.buffers(),
            self.resources.textures(),
            &snapshot,
            frame_rate,
            outputs,
        )?;

        self.resources.buffers_mut().swap_history();

        Ok(TickOutcome::Baked(BakeReport {
            vertex_count,
            reallocation,
            groups,
            frame_rate,
        }))
    }

    /// Release every scratch resource.
    ///
    /// Further ticks do nothing. Calling this more than once is a no-op.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        let released = self.resources.release_all();
        log::info!("SkinnedMeshBaker shut down (released scratch resources: {released})");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl<K: ComputeKernel> Drop for SkinnedMeshBaker<K> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<K: ComputeKernel> std::fmt::Debug for SkinnedMeshBaker<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinnedMeshBaker")
            .field("device", &self.device)
            .field("has_source", &self.source.is_some())
            .field("outputs", &self.outputs)
            .field("latched", &self.checker.is_latched())
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}
