//! Per-chunk state owned by the streamer.

use std::collections::BTreeMap;
use std::sync::Arc;

use horizon_lod::ChunkBounds;
use horizon_mesh::{MeshError, SurfaceMesh};
use horizon_terrain::{Color, ElevationField};

use crate::coordinate::GridCoordinate;
use crate::pipeline::GenerationToken;

/// Generation progress of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Elevation was requested and has not arrived.
    ElevationPending,
    /// Elevation is present; meshes may be requested for any LOD.
    ElevationReady,
}

/// Cached mesh state for one LOD.
#[derive(Clone, Debug)]
pub enum LodMeshSlot {
    Pending,
    Ready(Arc<SurfaceMesh>),
    /// The build failed; the LOD is not retried.
    Failed(MeshError),
}

/// A streamed terrain tile.
#[derive(Debug)]
pub struct TerrainChunk {
    coordinate: GridCoordinate,
    bounds: ChunkBounds,
    /// Distinguishes this chunk from an earlier one at the same coordinate.
    pub(crate) epoch: u64,
    pub(crate) token: GenerationToken,
    pub(crate) elevation: Option<Arc<ElevationField>>,
    pub(crate) meshes: BTreeMap<u8, LodMeshSlot>,
    pub(crate) current_lod: Option<u8>,
    pub(crate) visible: bool,
    /// Update counter value when the chunk was last made visible.
    pub(crate) last_visible: u64,
}

impl TerrainChunk {
    /// A hidden chunk waiting for its elevation.
    pub(crate) fn new(
        coordinate: GridCoordinate,
        bounds: ChunkBounds,
        epoch: u64,
        token: GenerationToken,
        created_at: u64,
    ) -> Self {
        Self {
            coordinate,
            bounds,
            epoch,
            token,
            elevation: None,
            meshes: BTreeMap::new(),
            current_lod: None,
            visible: false,
            last_visible: created_at,
        }
    }

    /// Grid position of the chunk.
    pub fn coordinate(&self) -> GridCoordinate {
        self.coordinate
    }

    /// World-space footprint used for distance checks.
    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    /// Whether the elevation field has arrived.
    pub fn state(&self) -> ChunkState {
        if self.elevation.is_some() {
            ChunkState::ElevationReady
        } else {
            ChunkState::ElevationPending
        }
    }

    /// Bordered elevation field, once generated.
    pub fn elevation(&self) -> Option<&Arc<ElevationField>> {
        self.elevation.as_ref()
    }

    /// LOD of the mesh being displayed, if any mesh has arrived.
    pub fn current_lod(&self) -> Option<u8> {
        self.current_lod
    }

    /// Mesh for [`current_lod`](Self::current_lod).
    pub fn current_mesh(&self) -> Option<&Arc<SurfaceMesh>> {
        self.current_lod.and_then(|lod| self.mesh(lod))
    }

    /// Biome colors of the core samples, row-major.
    pub fn current_color_grid(&self) -> Option<&[Color]> {
        self.elevation.as_deref().map(ElevationField::colors)
    }

    /// Whether the renderer should draw this chunk.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a finished mesh is cached for `lod`.
    pub fn has_mesh(&self, lod: u8) -> bool {
        self.mesh(lod).is_some()
    }

    /// Finished mesh for `lod`; pending and failed builds return `None`.
    pub fn mesh(&self, lod: u8) -> Option<&Arc<SurfaceMesh>> {
        match self.meshes.get(&lod) {
            Some(LodMeshSlot::Ready(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// Raw cache slot for `lod`, including pending and failed builds.
    pub fn mesh_slot(&self, lod: u8) -> Option<&LodMeshSlot> {
        self.meshes.get(&lod)
    }

    /// LODs with a slot of any kind, ascending.
    pub fn requested_lods(&self) -> impl Iterator<Item = u8> + '_ {
        self.meshes.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn chunk() -> TerrainChunk {
        let coord = GridCoordinate::new(1, 2);
        TerrainChunk::new(coord, coord.bounds(16.0), 7, GenerationToken::new(), 0)
    }

    #[test]
    fn test_new_chunk_is_pending_and_hidden() {
        let chunk = chunk();
        assert_eq!(chunk.state(), ChunkState::ElevationPending);
        assert!(!chunk.is_visible());
        assert!(chunk.current_mesh().is_none());
        assert!(chunk.current_color_grid().is_none());
        assert_eq!(chunk.bounds().center(), Vec2::new(16.0, 32.0));
    }

    #[test]
    fn test_mesh_lookup_ignores_pending_and_failed() {
        let mut chunk = chunk();
        chunk.meshes.insert(0, LodMeshSlot::Pending);
        chunk.meshes.insert(2, LodMeshSlot::Failed(MeshError::CoreTooSmall(1)));
        chunk
            .meshes
            .insert(1, LodMeshSlot::Ready(Arc::new(SurfaceMesh::default())));
        assert!(!chunk.has_mesh(0));
        assert!(chunk.has_mesh(1));
        assert!(!chunk.has_mesh(2));
        assert_eq!(chunk.requested_lods().collect::<Vec<_>>(), vec![0, 1, 2]);

        chunk.current_lod = Some(1);
        assert!(chunk.current_mesh().is_some());
    }

    #[test]
    fn test_color_grid_follows_elevation() {
        let mut chunk = chunk();
        chunk.elevation = Some(Arc::new(ElevationField::from_heights(4, vec![0.0; 16])));
        assert_eq!(chunk.state(), ChunkState::ElevationReady);
        assert_eq!(chunk.current_color_grid().map(<[Color]>::len), Some(4));
    }
}
