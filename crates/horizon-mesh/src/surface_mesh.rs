//! Surface mesh data: positions, normals, UVs and triangle indices for one chunk LOD.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex layout for GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// Chunk-local position; the chunk centre is the origin.
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

static_assertions::const_assert_eq!(std::mem::size_of::<TerrainVertex>(), 32);

/// An immutable triangle mesh for a chunk at a single LOD.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions in chunk-local coordinates (x/z centred, y up).
    pub positions: Vec<Vec3>,
    /// Unit normals, one per vertex.
    pub normals: Vec<Vec3>,
    /// Texture coordinates in `[0, 1]` across the chunk.
    pub uvs: Vec<Vec2>,
    /// Triangle list, counter-clockwise when viewed from +Y.
    pub indices: Vec<u32>,
    lod: u8,
}

impl SurfaceMesh {
    /// Empty mesh for `lod` with room for the given vertex and index counts.
    pub fn with_capacity(lod: u8, vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            lod,
        }
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    /// Append one counter-clockwise triangle.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// LOD this mesh was built for.
    pub fn lod(&self) -> u8 {
        self.lod
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Interleave attributes into a GPU-ready vertex buffer.
    pub fn interleaved(&self) -> Vec<TerrainVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((p, n), uv)| TerrainVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }

    /// Approximate heap footprint in bytes.
    pub fn byte_size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<TerrainVertex>()
            + self.indices.len() * std::mem::size_of::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> SurfaceMesh {
        let mut mesh = SurfaceMesh::with_capacity(0, 4, 6);
        let up = Vec3::Y;
        let a = mesh.push_vertex(Vec3::new(0.0, 0.0, 0.0), up, Vec2::new(0.0, 0.0));
        let b = mesh.push_vertex(Vec3::new(0.0, 0.0, 1.0), up, Vec2::new(0.0, 1.0));
        let c = mesh.push_vertex(Vec3::new(1.0, 0.0, 1.0), up, Vec2::new(1.0, 1.0));
        let d = mesh.push_vertex(Vec3::new(1.0, 0.0, 0.0), up, Vec2::new(1.0, 0.0));
        mesh.push_triangle(a, b, c);
        mesh.push_triangle(a, c, d);
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles().collect::<Vec<_>>(), vec![[0, 1, 2], [0, 2, 3]]);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn test_interleaved_matches_attributes() {
        let mesh = quad();
        let vertices = mesh.interleaved();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[2].position, [1.0, 0.0, 1.0]);
        assert_eq!(vertices[2].uv, [1.0, 1.0]);
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 4 * 32);
    }

    #[test]
    fn test_byte_size() {
        assert_eq!(quad().byte_size(), 4 * 32 + 6 * 4);
    }
}
