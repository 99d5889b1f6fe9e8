//! Common utilities for baker integration tests.
//!
//! Every test runs against the dummy backend with a [`RecordingKernel`], so
//! allocations can be counted and kernel inputs inspected after each tick.

#![allow(dead_code)]

use std::sync::Arc;

use glam::{Mat4, Vec3};
use parking_lot::Mutex;

use redlilium_mesh_baker::{
    BakedMesh, BakerConfig, CollectingDiagnostics, DummyBackend, GpuBackend, GraphicsDevice,
    MeshSource, OutputTextures, RecordingKernel, SkinnedMeshBaker, Texture, TextureDescriptor,
    TextureFormat, TextureUsage,
};

/// Initialize logging once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Mesh Source
// ============================================================================

#[derive(Debug, Default)]
struct MeshState {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    transform: Mat4,
}

/// Mesh source whose contents the test can change between ticks.
#[derive(Debug, Clone, Default)]
pub struct SharedMesh {
    state: Arc<Mutex<MeshState>>,
}

impl SharedMesh {
    /// A mesh of `count` vertices produced by [`marker_vertices`].
    pub fn with_vertices(count: usize, marker: f32) -> Self {
        let mesh = Self::default();
        mesh.set_vertices(marker_vertices(count, marker));
        mesh
    }

    /// Replace the positions; normals follow as +Y, one per vertex.
    pub fn set_vertices(&self, vertices: Vec<Vec3>) {
        let mut state = self.state.lock();
        state.normals = vec![Vec3::Y; vertices.len()];
        state.vertices = vertices;
    }

    /// Replace the normals only.
    pub fn set_normals(&self, normals: Vec<Vec3>) {
        self.state.lock().normals = normals;
    }

    pub fn set_transform(&self, transform: Mat4) {
        self.state.lock().transform = transform;
    }
}

impl MeshSource for SharedMesh {
    fn bake_mesh(&mut self, mesh: &mut BakedMesh) {
        let state = self.state.lock();
        mesh.set_vertices(&state.vertices);
        mesh.set_normals(&state.normals);
    }

    fn local_to_world(&self) -> Mat4 {
        self.state.lock().transform
    }
}

/// `count` vertices whose x component is `marker` and y the vertex index.
pub fn marker_vertices(count: usize, marker: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| Vec3::new(marker, i as f32, 0.0))
        .collect()
}

/// Flatten vertices the way the baker uploads them.
pub fn flatten(vertices: &[Vec3]) -> Vec<f32> {
    vertices.iter().flat_map(|v| v.to_array()).collect()
}

// ============================================================================
// Test Context
// ============================================================================

/// Dummy device, collecting diagnostics and a baker wired to both.
pub struct TestContext {
    pub backend: Arc<DummyBackend>,
    pub device: Arc<GraphicsDevice>,
    pub diagnostics: Arc<CollectingDiagnostics>,
}

impl TestContext {
    pub fn new() -> Self {
        init_logging();
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone() as Arc<dyn GpuBackend>);
        Self {
            backend,
            device,
            diagnostics: Arc::new(CollectingDiagnostics::new()),
        }
    }

    pub fn baker(&self) -> SkinnedMeshBaker<RecordingKernel> {
        self.baker_with_config(BakerConfig::default())
    }

    pub fn baker_with_config(&self, config: BakerConfig) -> SkinnedMeshBaker<RecordingKernel> {
        SkinnedMeshBaker::new(
            self.device.clone(),
            RecordingKernel::new(),
            self.diagnostics.clone(),
            config,
        )
        .expect("valid baker config")
    }

    /// Output texture as an application would create it.
    pub fn output(&self, width: u32, height: u32, format: TextureFormat) -> Arc<Texture> {
        Arc::new(
            self.device
                .create_texture(
                    &TextureDescriptor::new_2d(
                        width,
                        height,
                        format,
                        TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
                    )
                    .with_label("output"),
                )
                .expect("output texture"),
        )
    }

    /// Three outputs of the same size and format.
    pub fn outputs(&self, width: u32, height: u32, format: TextureFormat) -> OutputTextures {
        OutputTextures::new(
            self.output(width, height, format),
            self.output(width, height, format),
            self.output(width, height, format),
        )
    }
}
