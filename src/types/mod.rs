//! Common types and descriptors for baker resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! shared by the backends, the device and the baker pipeline.

mod buffer;
mod common;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::{Extent3d, ResourceId};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
