//! Bake kernel running on wgpu.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::backend::wgpu_backend::{WgpuBackend, convert_texture_format};
use crate::backend::{GpuBuffer, GpuTexture};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::{Buffer, Texture};
use crate::types::TextureFormat;

use super::{ComputeKernel, params};

const SHADER_SOURCE: &str = include_str!("../../shaders/skinned_mesh_bake.wgsl");

/// Uniform block layout shared with `skinned_mesh_bake.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BakeParams {
    transform: [[f32; 4]; 4],
    vertex_count: u32,
    frame_rate: f32,
    _pad: [u32; 2],
}

const BUFFER_SLOTS: [&str; 3] = [
    params::POSITION_BUFFER,
    params::OLD_POSITION_BUFFER,
    params::NORMAL_BUFFER,
];
const IMAGE_SLOTS: [&str; 3] = [
    params::POSITION_MAP,
    params::VELOCITY_MAP,
    params::NORMAL_MAP,
];

/// The reference bake kernel on a wgpu device.
///
/// Binding 0 is the parameter block, bindings 1..=3 the vertex buffers and
/// 4..=6 the output images, in the order of [`params`]. A pipeline is built
/// the first time a combination of image formats is dispatched and kept for
/// later frames.
pub struct WgpuBakeKernel {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: HashMap<[TextureFormat; 3], wgpu::ComputePipeline>,
    params_buffer: wgpu::Buffer,
    params: BakeParams,
    buffers: [Option<Arc<wgpu::Buffer>>; 3],
    images: [Option<(Arc<wgpu::TextureView>, TextureFormat)>; 3],
}

fn wgsl_storage_format(format: TextureFormat) -> Result<&'static str, GraphicsError> {
    match format {
        TextureFormat::Rgba16Float => Ok("rgba16float"),
        TextureFormat::Rgba32Float => Ok("rgba32float"),
        other => Err(GraphicsError::FeatureNotSupported(format!(
            "{other:?} is not a bake output format"
        ))),
    }
}

/// Kernel source with each output image declared in its own format.
///
/// `formats` follows the position, velocity, normal order.
pub(crate) fn shader_source(formats: [TextureFormat; 3]) -> Result<String, GraphicsError> {
    let mut source = SHADER_SOURCE.to_string();
    for (name, format) in IMAGE_SLOTS.iter().zip(formats) {
        let declared = format!("var {name}: texture_storage_2d<rgba16float, write>;");
        if !source.contains(&declared) {
            return Err(GraphicsError::InitializationFailed(format!(
                "kernel source does not declare {name}"
            )));
        }
        let wanted = format!(
            "var {name}: texture_storage_2d<{}, write>;",
            wgsl_storage_format(format)?
        );
        source = source.replace(&declared, &wanted);
    }
    Ok(source)
}

impl WgpuBakeKernel {
    /// Create the kernel on `backend`. Pipelines are compiled on demand.
    pub fn new(backend: &WgpuBackend) -> Self {
        let device = Arc::clone(backend.device());
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("skinned_mesh_bake params"),
            size: std::mem::size_of::<BakeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device,
            queue: Arc::clone(backend.queue()),
            pipelines: HashMap::new(),
            params_buffer,
            params: BakeParams {
                transform: Mat4::IDENTITY.to_cols_array_2d(),
                vertex_count: 0,
                frame_rate: 0.0,
                _pad: [0; 2],
            },
            buffers: [None, None, None],
            images: [None, None, None],
        }
    }

    /// Create the kernel for the wgpu backend behind `device`.
    pub fn for_device(device: &GraphicsDevice) -> Result<Self, GraphicsError> {
        let backend = device
            .backend()
            .as_any()
            .downcast_ref::<WgpuBackend>()
            .ok_or_else(|| {
                GraphicsError::FeatureNotSupported(format!(
                    "WgpuBakeKernel requires the wgpu backend, device uses {}",
                    device.backend().name()
                ))
            })?;
        Ok(Self::new(backend))
    }

    /// Number of pipelines compiled so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Run `f` and turn any validation error it raises into an `Err`.
    fn validated<T>(&self, what: &str, f: impl FnOnce() -> T) -> Result<T, GraphicsError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(value),
            Some(e) => Err(GraphicsError::InvalidParameter(format!("{what}: {e}"))),
        }
    }

    fn pipeline(
        &mut self,
        formats: [TextureFormat; 3],
    ) -> Result<&wgpu::ComputePipeline, GraphicsError> {
        if !self.pipelines.contains_key(&formats) {
            let source = shader_source(formats)?;
            log::debug!(
                "WgpuBakeKernel: compiling for {:?}",
                formats.map(convert_texture_format)
            );
            let device = Arc::clone(&self.device);
            let pipeline = self.validated("skinned_mesh_bake pipeline", || {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("skinned_mesh_bake"),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("skinned_mesh_bake"),
                    layout: None,
                    module: &module,
                    entry_point: Some("main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    cache: None,
                })
            })?;
            self.pipelines.insert(formats, pipeline);
        }
        self.pipelines.get(&formats).ok_or_else(|| {
            GraphicsError::InitializationFailed("bake pipeline was not cached".to_string())
        })
    }
}

impl ComputeKernel for WgpuBakeKernel {
    fn set_int(&mut self, name: &str, value: i32) {
        match name {
            params::VERTEX_COUNT => self.params.vertex_count = value.max(0) as u32,
            _ => log::warn!("WgpuBakeKernel: unknown int parameter {name}"),
        }
    }

    fn set_float(&mut self, name: &str, value: f32) {
        match name {
            params::FRAME_RATE => self.params.frame_rate = value,
            _ => log::warn!("WgpuBakeKernel: unknown float parameter {name}"),
        }
    }

    fn set_matrix(&mut self, name: &str, value: Mat4) {
        match name {
            params::TRANSFORM => self.params.transform = value.to_cols_array_2d(),
            _ => log::warn!("WgpuBakeKernel: unknown matrix parameter {name}"),
        }
    }

    fn bind_buffer(&mut self, name: &str, buffer: &Buffer) {
        let Some(slot) = BUFFER_SLOTS.iter().position(|n| *n == name) else {
            log::warn!("WgpuBakeKernel: unknown buffer binding {name}");
            return;
        };
        match buffer.gpu_handle() {
            GpuBuffer::Wgpu(inner) => self.buffers[slot] = Some(Arc::clone(inner)),
            GpuBuffer::Dummy { .. } => {
                log::warn!("WgpuBakeKernel: {name} is not a wgpu buffer");
                self.buffers[slot] = None;
            }
        }
    }

    fn bind_image(&mut self, name: &str, texture: &Texture) {
        let Some(slot) = IMAGE_SLOTS.iter().position(|n| *n == name) else {
            log::warn!("WgpuBakeKernel: unknown image binding {name}");
            return;
        };
        match texture.gpu_handle() {
            GpuTexture::Wgpu { view, .. } => {
                self.images[slot] = Some((Arc::clone(view), texture.format()));
            }
            GpuTexture::Dummy { .. } => {
                log::warn!("WgpuBakeKernel: {name} is not a wgpu texture");
                self.images[slot] = None;
            }
        }
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), GraphicsError> {
        let missing = |names: &[&str], bound: &[bool]| {
            names
                .iter()
                .zip(bound)
                .find(|(_, b)| !**b)
                .map(|(n, _)| n.to_string())
        };
        let buffers_bound = self.buffers.each_ref().map(Option::is_some);
        let images_bound = self.images.each_ref().map(Option::is_some);
        if let Some(name) =
            missing(&BUFFER_SLOTS, &buffers_bound).or_else(|| missing(&IMAGE_SLOTS, &images_bound))
        {
            return Err(GraphicsError::InvalidParameter(format!(
                "binding {name} is not set"
            )));
        }

        let formats = [0, 1, 2].map(|i| {
            self.images[i]
                .as_ref()
                .map_or(TextureFormat::Rgba16Float, |(_, format)| *format)
        });
        let layout = self.pipeline(formats)?.get_bind_group_layout(0);

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: self.params_buffer.as_entire_binding(),
        }];
        for (i, buffer) in self.buffers.iter().flatten().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + i as u32,
                resource: buffer.as_entire_binding(),
            });
        }
        for (i, (view, _)) in self.images.iter().flatten().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 4 + i as u32,
                resource: wgpu::BindingResource::TextureView(view.as_ref()),
            });
        }
        let bind_group = self.validated("skinned_mesh_bake bindings", || {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("skinned_mesh_bake bindings"),
                layout: &layout,
                entries: &entries,
            })
        })?;
        let pipeline = self.pipelines.get(&formats).ok_or_else(|| {
            GraphicsError::InitializationFailed("bake pipeline was not cached".to_string())
        })?;

        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("skinned_mesh_bake"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("skinned_mesh_bake"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(x, y, z);
        }
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl std::fmt::Debug for WgpuBakeKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBakeKernel")
            .field("params", &self.params)
            .field("pipelines", &self.pipelines.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
