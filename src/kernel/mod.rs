//! Compute kernel capability.
//!
//! The bake kernel is an opaque GPU procedure. The baker only knows its
//! named-parameter contract (see [`params`]) and drives it through the
//! [`ComputeKernel`] trait, which maps onto any compute-shader binding model.

mod recording;
#[cfg(feature = "wgpu-backend")]
mod wgpu_kernel;

use glam::Mat4;

use crate::error::GraphicsError;
use crate::resources::{Buffer, Texture};

pub use recording::{BufferBinding, ImageBinding, KernelInvocation, RecordingKernel};
#[cfg(feature = "wgpu-backend")]
pub use wgpu_kernel::WgpuBakeKernel;

/// Parameter and binding names understood by the bake kernel.
pub mod params {
    /// Number of vertices in the bound buffers (int).
    pub const VERTEX_COUNT: &str = "VertexCount";
    /// Local-to-world matrix of the mesh source (4x4).
    pub const TRANSFORM: &str = "Transform";
    /// Reciprocal of the elapsed frame time (float).
    pub const FRAME_RATE: &str = "FrameRate";
    /// This frame's positions, 3 floats per vertex.
    pub const POSITION_BUFFER: &str = "PositionBuffer";
    /// Previous frame's positions, 3 floats per vertex.
    pub const OLD_POSITION_BUFFER: &str = "OldPositionBuffer";
    /// This frame's normals, 3 floats per vertex.
    pub const NORMAL_BUFFER: &str = "NormalBuffer";
    /// Position map output image.
    pub const POSITION_MAP: &str = "PositionMap";
    /// Velocity map output image.
    pub const VELOCITY_MAP: &str = "VelocityMap";
    /// Normal map output image.
    pub const NORMAL_MAP: &str = "NormalMap";

    /// Edge length of the kernel's square thread group.
    pub const THREAD_GROUP_SIZE: u32 = 8;
}

/// A compute procedure invoked with named bindings and scalar parameters.
///
/// Bindings and parameters persist until overwritten; [`dispatch`] runs the
/// kernel with whatever is bound at that point.
///
/// [`dispatch`]: ComputeKernel::dispatch
pub trait ComputeKernel {
    /// Set an integer parameter.
    fn set_int(&mut self, name: &str, value: i32);

    /// Set a float parameter.
    fn set_float(&mut self, name: &str, value: f32);

    /// Set a 4x4 matrix parameter.
    fn set_matrix(&mut self, name: &str, value: Mat4);

    /// Bind a storage buffer.
    fn bind_buffer(&mut self, name: &str, buffer: &Buffer);

    /// Bind a writable storage image.
    fn bind_image(&mut self, name: &str, texture: &Texture);

    /// Run the kernel over `x * y * z` thread groups.
    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), GraphicsError>;
}

/// Number of thread groups needed to cover `extent` texels.
///
/// Truncates, so callers must guarantee `extent` is a multiple of
/// [`params::THREAD_GROUP_SIZE`].
pub fn group_count(extent: u32) -> u32 {
    extent / params::THREAD_GROUP_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_count() {
        assert_eq!(group_count(256), 32);
        assert_eq!(group_count(8), 1);
        assert_eq!(group_count(63), 7);
    }
}
