//! Error types.
//!
//! [`GraphicsError`] is raised by backends and the [`GraphicsDevice`] when a
//! resource cannot be created or a transfer is malformed. [`BakerError`] is
//! what [`SkinnedMeshBaker::tick`] hands back to the embedding application.
//!
//! Configuration problems with the output maps are *not* errors: they are
//! reported through the diagnostics sink and latch the baker instead.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice
//! [`SkinnedMeshBaker::tick`]: crate::SkinnedMeshBaker::tick

use std::fmt;

use thiserror::Error;

/// Errors that can occur in the graphics layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to initialize a backend.
    InitializationFailed(String),
    /// A requested feature is not supported.
    FeatureNotSupported(String),
    /// Out of GPU memory.
    OutOfMemory,
    /// The GPU device was lost.
    DeviceLost,
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// A resource was used after it had been released.
    ResourceReleased(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::FeatureNotSupported(msg) => write!(f, "feature not supported: {msg}"),
            Self::OutOfMemory => write!(f, "out of GPU memory"),
            Self::DeviceLost => write!(f, "GPU device lost"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::ResourceReleased(msg) => write!(f, "resource already released: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Errors returned by the baker pipeline.
#[derive(Error, Debug)]
pub enum BakerError {
    #[error("graphics error: {0}")]
    Graphics(#[from] GraphicsError),
    #[error("output textures belong to a different graphics device")]
    ForeignOutputTexture,
    #[error("kernel dispatch failed: {0}")]
    Dispatch(String),
}

/// Result alias for baker operations.
pub type BakerResult<T> = Result<T, BakerError>;
