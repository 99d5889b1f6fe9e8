//! Upload, dispatch and copy-out for one frame.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::{BakerError, BakerResult, GraphicsError};
use crate::kernel::{ComputeKernel, group_count, params};

use super::consistency::OutputTextures;
use super::sampler::VertexSnapshot;
use super::scratch::{ScratchBufferSet, ScratchTextureSet};

fn missing(what: &str) -> BakerError {
    GraphicsError::ResourceReleased(format!("scratch {what} is not allocated")).into()
}

/// Runs the bake kernel over a frame's vertex data.
pub struct TransferExecutor<'a> {
    device: &'a Arc<GraphicsDevice>,
    kernel: &'a mut dyn ComputeKernel,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(device: &'a Arc<GraphicsDevice>, kernel: &'a mut dyn ComputeKernel) -> Self {
        Self { device, kernel }
    }

    /// Upload `snapshot`, run the kernel and copy the scratch images into
    /// `outputs`.
    ///
    /// Returns the thread group counts that were dispatched.
    ///
    /// # Errors
    ///
    /// Fails if a scratch resource is missing, a scratch image cannot be
    /// copied into its output, an upload is rejected by the device, or the
    /// kernel cannot be dispatched. Copies are checked before anything is
    /// uploaded.
    pub fn execute(
        &mut self,
        buffers: &ScratchBufferSet,
        textures: &ScratchTextureSet,
        snapshot: &VertexSnapshot<'_>,
        frame_rate: f32,
        outputs: &OutputTextures,
    ) -> BakerResult<[u32; 3]> {
        let current = buffers.current().ok_or_else(|| missing("position buffer"))?;
        let previous = buffers
            .previous()
            .ok_or_else(|| missing("old position buffer"))?;
        let normals = buffers.normals().ok_or_else(|| missing("normal buffer"))?;
        let position_map = textures.position().ok_or_else(|| missing("position map"))?;
        let velocity_map = textures.velocity().ok_or_else(|| missing("velocity map"))?;
        let normal_map = textures.normal().ok_or_else(|| missing("normal map"))?;

        // Nothing is uploaded or dispatched unless every copy-out can succeed.
        let copies = [
            (position_map, &outputs.position_map),
            (velocity_map, &outputs.velocity_map),
            (normal_map, &outputs.normal_map),
        ];
        for (scratch, output) in copies {
            self.device.validate_copy(scratch, output)?;
        }

        self.device
            .write_buffer(current, 0, bytemuck::cast_slice(snapshot.positions))?;
        self.device
            .write_buffer(normals, 0, bytemuck::cast_slice(snapshot.normals))?;

        let vertex_count = i32::try_from(snapshot.vertex_count()).map_err(|_| {
            GraphicsError::InvalidParameter(format!(
                "vertex count {} does not fit the kernel",
                snapshot.vertex_count()
            ))
        })?;
        self.kernel.set_int(params::VERTEX_COUNT, vertex_count);
        self.kernel
            .set_matrix(params::TRANSFORM, snapshot.local_to_world);
        self.kernel.set_float(params::FRAME_RATE, frame_rate);

        self.kernel.bind_buffer(params::POSITION_BUFFER, current);
        self.kernel.bind_buffer(params::OLD_POSITION_BUFFER, previous);
        self.kernel.bind_buffer(params::NORMAL_BUFFER, normals);
        self.kernel.bind_image(params::POSITION_MAP, position_map);
        self.kernel.bind_image(params::VELOCITY_MAP, velocity_map);
        self.kernel.bind_image(params::NORMAL_MAP, normal_map);

        let size = outputs.size();
        let groups = [group_count(size.width), group_count(size.height), 1];
        self.kernel
            .dispatch(groups[0], groups[1], groups[2])
            .map_err(|e| BakerError::Dispatch(e.to_string()))?;

        for (scratch, output) in copies {
            self.device.copy_texture(scratch, output)?;
        }

        log::trace!(
            "TransferExecutor: {} vertices, groups {:?}",
            vertex_count,
            groups
        );
        Ok(groups)
    }
}
