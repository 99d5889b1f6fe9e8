//! Mesh sampling.

use glam::{Mat4, Vec3};

/// A deforming mesh that can be baked into a static snapshot each frame.
pub trait MeshSource {
    /// Write the mesh's current deformed vertices into `mesh`.
    ///
    /// Implementations should overwrite `mesh` in place so its storage is
    /// reused between frames.
    fn bake_mesh(&mut self, mesh: &mut BakedMesh);

    /// Local-to-world transform of the mesh.
    fn local_to_world(&self) -> Mat4;
}

/// Static snapshot of a deformed mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BakedMesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl BakedMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Vertex normals.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Replace the vertex positions, keeping the allocation.
    pub fn set_vertices(&mut self, vertices: &[Vec3]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
    }

    /// Replace the vertex normals, keeping the allocation.
    pub fn set_normals(&mut self, normals: &[Vec3]) {
        self.normals.clear();
        self.normals.extend_from_slice(normals);
    }

    /// Remove all vertices and normals.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
    }

    /// Copy the positions into `out`, replacing its contents.
    pub fn get_vertices(&self, out: &mut Vec<Vec3>) {
        out.clear();
        out.extend_from_slice(&self.vertices);
    }

    /// Copy the normals into `out`, replacing its contents.
    pub fn get_normals(&self, out: &mut Vec<Vec3>) {
        out.clear();
        out.extend_from_slice(&self.normals);
    }
}

/// One frame of sampled vertex data.
#[derive(Debug, Clone, Copy)]
pub struct VertexSnapshot<'a> {
    /// Positions in mesh-local space.
    pub positions: &'a [Vec3],
    /// Normals, same length as `positions`.
    pub normals: &'a [Vec3],
    /// Local-to-world transform at sampling time.
    pub local_to_world: Mat4,
}

impl VertexSnapshot<'_> {
    /// Number of sampled vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether the mesh had no vertices.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Pulls vertex data out of a [`MeshSource`] into reusable lists.
#[derive(Debug, Default)]
pub struct MeshSampler {
    mesh: BakedMesh,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl MeshSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bake `source` and return this frame's snapshot.
    ///
    /// The normal list is padded with zero vectors or truncated so it always
    /// has one entry per position.
    pub fn sample<S: MeshSource + ?Sized>(&mut self, source: &mut S) -> VertexSnapshot<'_> {
        source.bake_mesh(&mut self.mesh);
        self.mesh.get_vertices(&mut self.positions);
        self.mesh.get_normals(&mut self.normals);

        if self.normals.len() != self.positions.len() {
            log::debug!(
                "MeshSampler: {} normals for {} vertices, adjusting",
                self.normals.len(),
                self.positions.len()
            );
            self.normals.resize(self.positions.len(), Vec3::ZERO);
        }

        VertexSnapshot {
            positions: &self.positions,
            normals: &self.normals,
            local_to_world: source.local_to_world(),
        }
    }
}
