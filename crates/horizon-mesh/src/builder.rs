//! LOD tessellation of bordered elevation fields.
//!
//! The interior of a chunk is decimated by the LOD increment, but every edge sample is
//! always emitted so adjacent chunks at any LOD meet on identical edge vertices. Cells
//! that touch the chunk edge become convex polygons (their corners plus the edge
//! samples between them) and are triangulated as a fan from a corner whose two sides
//! carry no extra samples, which avoids degenerate triangles.
//!
//! Normals come from central differences over the curved heights. The one-sample
//! border supplies the outer neighbour for edge vertices, so both chunks sharing an
//! edge compute the same normal there.

use glam::{Vec2, Vec3};
use horizon_terrain::ElevationField;

use crate::error::MeshError;
use crate::height_curve::HeightCurve;
use crate::surface_mesh::SurfaceMesh;

const UNUSED: u32 = u32::MAX;

/// Builds [`SurfaceMesh`]es for one chunk core size.
#[derive(Clone, Debug)]
pub struct SurfaceMeshBuilder {
    core_size: usize,
    height_multiplier: f32,
    height_curve: HeightCurve,
}

impl SurfaceMeshBuilder {
    /// `core_size` is the vertex count per side at LOD 0, border excluded.
    pub fn new(
        core_size: usize,
        height_multiplier: f32,
        height_curve: HeightCurve,
    ) -> Result<Self, MeshError> {
        if core_size < 2 {
            return Err(MeshError::CoreTooSmall(core_size));
        }
        Ok(Self {
            core_size,
            height_multiplier,
            height_curve,
        })
    }

    /// Vertices per side at LOD 0.
    pub fn core_size(&self) -> usize {
        self.core_size
    }

    /// Field size this builder accepts: the core plus a one-sample border.
    pub fn bordered_size(&self) -> usize {
        self.core_size + 2
    }

    /// Vertical scale applied after the curve.
    pub fn height_multiplier(&self) -> f32 {
        self.height_multiplier
    }

    /// Curve applied to raw elevation.
    pub fn height_curve(&self) -> &HeightCurve {
        &self.height_curve
    }

    /// Interior vertex step for `lod`: 1 at LOD 0, otherwise `2 * lod`.
    ///
    /// Clamped so at least two cells span each axis.
    pub fn increment_for_lod(&self, lod: u8) -> usize {
        let increment = if lod == 0 { 1 } else { lod as usize * 2 };
        increment.min(((self.core_size - 1) / 2).max(1))
    }

    /// Tessellate `field` at `lod`.
    pub fn build(&self, field: &ElevationField, lod: u8) -> Result<SurfaceMesh, MeshError> {
        let size = self.bordered_size();
        if field.size() != size {
            return Err(MeshError::SizeMismatch {
                expected: size,
                actual: field.size(),
                core: self.core_size,
            });
        }

        let core = self.core_size;
        let increment = self.increment_for_lod(lod);
        let axis = axis_positions(core, increment);
        let mut on_axis = vec![false; size];
        for &a in &axis {
            on_axis[a] = true;
        }

        let heights: Vec<f32> = field
            .heights()
            .iter()
            .map(|e| self.height_curve.evaluate(*e) * self.height_multiplier)
            .collect();
        let h = |x: usize, y: usize| heights[y * size + x];

        let half = (core - 1) as f32 / 2.0;
        let span = (core - 1) as f32;
        let estimate = axis.len() * axis.len() + 4 * core;
        let mut mesh = SurfaceMesh::with_capacity(lod, estimate, estimate * 6);
        let mut index = vec![UNUSED; size * size];

        for y in 1..=core {
            for x in 1..=core {
                let on_edge = x == 1 || y == 1 || x == core || y == core;
                if !on_edge && !(on_axis[x] && on_axis[y]) {
                    continue;
                }
                let position = Vec3::new(x as f32 - 1.0 - half, h(x, y), y as f32 - 1.0 - half);
                let normal = Vec3::new(h(x - 1, y) - h(x + 1, y), 2.0, h(x, y - 1) - h(x, y + 1))
                    .normalize();
                let uv = Vec2::new((x - 1) as f32 / span, (y - 1) as f32 / span);
                index[y * size + x] = mesh.push_vertex(position, normal, uv);
            }
        }

        let at = |x: usize, y: usize| index[y * size + x];
        let mut ring = Vec::with_capacity(4 + 4 * increment);
        for ys in axis.windows(2) {
            for xs in axis.windows(2) {
                let (x0, x1, y0, y1) = (xs[0], xs[1], ys[0], ys[1]);
                ring.clear();

                // Counter-clockwise from +Y: down the x0 side, along y1, up x1, back along y0.
                let mut corners = [0usize; 4];
                let mut extras = [false; 4];
                corners[0] = push_corner(&mut ring, at(x0, y0));
                extras[0] = push_side(&mut ring, (y0 + 1..y1).map(|y| at(x0, y)));
                corners[1] = push_corner(&mut ring, at(x0, y1));
                extras[1] = push_side(&mut ring, (x0 + 1..x1).map(|x| at(x, y1)));
                corners[2] = push_corner(&mut ring, at(x1, y1));
                extras[2] = push_side(&mut ring, (y0 + 1..y1).rev().map(|y| at(x1, y)));
                corners[3] = push_corner(&mut ring, at(x1, y0));
                extras[3] = push_side(&mut ring, (x0 + 1..x1).rev().map(|x| at(x, y0)));

                let apex = (0..4)
                    .find(|&k| !extras[k] && !extras[(k + 3) % 4])
                    .unwrap_or(0);
                ring.rotate_left(corners[apex]);
                for pair in ring[1..].windows(2) {
                    mesh.push_triangle(ring[0], pair[0], pair[1]);
                }
            }
        }

        Ok(mesh)
    }
}

/// Bordered coordinates of the decimated grid lines: every `increment`-th core sample,
/// always ending on the last one.
fn axis_positions(core: usize, increment: usize) -> Vec<usize> {
    let mut axis: Vec<usize> = (1..=core).step_by(increment).collect();
    if axis.last() != Some(&core) {
        axis.push(core);
    }
    axis
}

fn push_corner(ring: &mut Vec<u32>, vertex: u32) -> usize {
    ring.push(vertex);
    ring.len() - 1
}

/// Append the emitted vertices along one cell side. Returns whether any were found.
fn push_side(ring: &mut Vec<u32>, side: impl Iterator<Item = u32>) -> bool {
    let before = ring.len();
    ring.extend(side.filter(|&i| i != UNUSED));
    ring.len() > before
}
