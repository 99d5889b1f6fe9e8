//! # RedLilium Mesh Baker
//!
//! Bakes a deforming (skinned) mesh into GPU textures every frame so a
//! particle or VFX system can sample vertex positions, velocities and normals.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`SkinnedMeshBaker`] - Per-frame pipeline driven by `tick` / `shutdown`
//! - [`GraphicsDevice`] - Resource allocation on top of a [`GpuBackend`]
//! - [`ComputeKernel`] - Named-parameter contract of the bake kernel
//! - [`DiagnosticsSink`] - Where output configuration errors are reported
//! - Backends: Dummy (host memory, for testing) and wgpu (`wgpu-backend` feature)
//!
//! Velocity is derived on the GPU by differencing this frame's positions
//! against last frame's. Two position buffers alternate between the
//! "current" and "previous" roles to make that possible without copies.
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_mesh_baker::*;
//!
//! let device = GraphicsDevice::create_default()?;
//! let mut baker = SkinnedMeshBaker::new(
//!     device.clone(),
//!     RecordingKernel::new(),
//!     Arc::new(LogDiagnostics),
//!     BakerConfig::default(),
//! )?;
//! baker.set_source(Box::new(character));
//! baker.set_outputs(OutputTextures::new(position_map, velocity_map, normal_map))?;
//!
//! loop {
//!     baker.tick(delta_time)?;
//! }
//! ```

pub mod backend;
pub mod baker;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod kernel;
pub mod resources;
pub mod types;

// Re-export main types for convenience
pub use backend::{DummyBackend, DummyStats, GpuBackend};
pub use baker::{
    BakeReport, BakedMesh, ConsistencyChecker, ConsistencyViolation, MeshSource, OutputTextures,
    Reallocation, SkinnedMeshBaker, TickOutcome,
};
pub use config::BakerConfig;
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use diagnostics::{CollectingDiagnostics, DiagnosticsSink, LogDiagnostics};
pub use error::{BakerError, BakerResult, GraphicsError};
pub use kernel::{ComputeKernel, KernelInvocation, RecordingKernel};
pub use resources::{Buffer, GpuResource, ScopedGpuResource, Texture};
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, ResourceId, TextureDescriptor, TextureFormat,
    TextureUsage,
};

#[cfg(feature = "wgpu-backend")]
pub use backend::wgpu_backend::WgpuBackend;
#[cfg(feature = "wgpu-backend")]
pub use kernel::WgpuBakeKernel;

/// Mesh baker library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the mesh baker.
///
/// Only logs the version; call it once at startup so the log shows which
/// baker build is in use.
pub fn init() {
    log::info!("RedLilium Mesh Baker v{} initialized", VERSION);
}
