//! Chunk streaming around a moving viewer.
//!
//! Each update enumerates the square window of chunk coordinates within the view
//! radius, creates missing chunks (requesting their elevation once), and re-evaluates
//! existing ones: visibility from the nearest-edge distance, LOD from the table, and a
//! mesh request or cached-mesh swap when the LOD changes. Completed generation work is
//! merged back at the start of every tick through the pipeline callbacks.

use std::sync::Arc;

use glam::Vec2;
use horizon_config::Config;
use horizon_lod::LodSelector;
use horizon_terrain::ElevationField;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, info};

use crate::chunk::{LodMeshSlot, TerrainChunk};
use crate::coordinate::GridCoordinate;
use crate::pipeline::{GenerationPipeline, GenerationToken, MeshResult, PipelineStats};
use crate::settings::{StreamError, TerrainSettings, UpdatePolicy};

/// Summary of one [`ChunkStreamer::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the visible set was recomputed.
    pub updated: bool,
    /// Pipeline callbacks dispatched.
    pub completions: usize,
    pub created: usize,
    pub evicted: usize,
    /// Chunks visible after the tick.
    pub visible: usize,
}

/// Owns the live chunks and drives their generation.
pub struct ChunkStreamer {
    settings: TerrainSettings,
    selector: LodSelector,
    pipeline: GenerationPipeline<ChunkStreamer>,
    chunks: FxHashMap<GridCoordinate, TerrainChunk>,
    visible_last_update: FxHashSet<GridCoordinate>,
    viewer_position: Vec2,
    viewer_coordinate: GridCoordinate,
    last_update_position: Option<Vec2>,
    chunk_visible_radius: i32,
    update_count: u64,
    next_epoch: u64,
}

impl ChunkStreamer {
    /// Start the generation pipeline. No chunks exist until the first tick.
    pub fn new(settings: TerrainSettings) -> Result<Self, StreamError> {
        let generator = settings.elevation_generator()?;
        let builder = settings.mesh_builder()?;
        let pipeline = GenerationPipeline::new(
            generator,
            builder,
            settings.chunk_size as f64,
            &settings.pipeline,
        );
        let chunk_visible_radius = settings.chunk_visible_radius();
        info!(
            chunk_size = settings.chunk_size,
            radius = chunk_visible_radius,
            workers = pipeline.worker_count(),
            "chunk streamer ready"
        );

        Ok(Self {
            selector: LodSelector::new(settings.lod_table.clone()),
            settings,
            pipeline,
            chunks: FxHashMap::default(),
            visible_last_update: FxHashSet::default(),
            viewer_position: Vec2::ZERO,
            viewer_coordinate: GridCoordinate::default(),
            last_update_position: None,
            chunk_visible_radius,
            update_count: 0,
            next_epoch: 0,
        })
    }

    /// Validate `config` and build a streamer from it.
    pub fn from_config(config: &Config) -> Result<Self, StreamError> {
        Self::new(TerrainSettings::from_config(config)?)
    }

    /// Advance one frame with the viewer at `viewer` (world X, world Z).
    pub fn tick(&mut self, viewer: Vec2) -> TickReport {
        self.viewer_position = viewer;
        let mut report = TickReport {
            completions: self.process_completions(),
            ..Default::default()
        };

        let due = match (self.settings.update_policy, self.last_update_position) {
            (_, None) | (UpdatePolicy::EveryTick, _) => true,
            (UpdatePolicy::MoveThreshold { distance }, Some(last)) => {
                last.distance_squared(viewer) > distance * distance
            }
        };
        if due {
            self.last_update_position = Some(viewer);
            report.created = self.update_visible_chunks();
            report.updated = true;
        }

        report.evicted = self.evict();
        report.visible = self.chunks.values().filter(|c| c.visible).count();
        report
    }

    /// Run every generation callback that completed since the last call.
    pub fn process_completions(&mut self) -> usize {
        let completions = self.pipeline.take_completions();
        completions.dispatch(self)
    }

    /// Recompute the visible set around the current viewer position. Returns the number
    /// of chunks created.
    pub fn update_visible_chunks(&mut self) -> usize {
        self.update_count += 1;
        let previous = std::mem::take(&mut self.visible_last_update);

        let centre =
            GridCoordinate::from_world(self.viewer_position, self.settings.chunk_size as f32);
        self.viewer_coordinate = centre;
        let radius = self.chunk_visible_radius;
        let mut updated = FxHashSet::default();
        let mut created = 0;

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coordinate = centre.offset(dx, dy);
                updated.insert(coordinate);
                if self.chunks.contains_key(&coordinate) {
                    if self.update_chunk(coordinate) {
                        self.visible_last_update.insert(coordinate);
                    }
                } else {
                    self.create_chunk(coordinate);
                    created += 1;
                }
            }
        }

        for coordinate in previous {
            if updated.contains(&coordinate) {
                continue;
            }
            if let Some(chunk) = self.chunks.get_mut(&coordinate) {
                chunk.visible = false;
            }
        }

        debug!(
            viewer = %centre,
            created,
            visible = self.visible_last_update.len(),
            "visible chunks updated"
        );
        created
    }

    fn create_chunk(&mut self, coordinate: GridCoordinate) {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        let chunk = TerrainChunk::new(
            coordinate,
            coordinate.bounds(self.settings.chunk_size as f32),
            epoch,
            GenerationToken::new(),
            self.update_count,
        );
        let token = chunk.token.clone();
        self.chunks.insert(coordinate, chunk);
        self.pipeline
            .request_elevation(coordinate, token, move |streamer: &mut ChunkStreamer, field| {
                streamer.on_elevation_ready(coordinate, epoch, field)
            });
        debug!(%coordinate, epoch, "chunk created");
    }

    /// Re-evaluate visibility and LOD of one chunk. Returns whether it is visible.
    fn update_chunk(&mut self, coordinate: GridCoordinate) -> bool {
        let viewer = self.viewer_position;
        let Some(chunk) = self.chunks.get_mut(&coordinate) else {
            return false;
        };
        let Some(field) = chunk.elevation.clone() else {
            return chunk.visible;
        };
        let Some(slot) = self.selector.select(&chunk.bounds(), viewer) else {
            chunk.visible = false;
            return false;
        };

        let lod = self.selector.lod_for_slot(slot);
        if chunk.current_lod != Some(lod) {
            match chunk.meshes.get(&lod) {
                Some(LodMeshSlot::Ready(_)) => {
                    debug!(%coordinate, from = ?chunk.current_lod, to = lod, "lod swapped");
                    chunk.current_lod = Some(lod);
                }
                Some(LodMeshSlot::Pending | LodMeshSlot::Failed(_)) => {}
                None => {
                    chunk.meshes.insert(lod, LodMeshSlot::Pending);
                    let epoch = chunk.epoch;
                    self.pipeline.request_mesh(
                        field,
                        lod,
                        chunk.token.clone(),
                        move |streamer: &mut ChunkStreamer, result| {
                            streamer.on_mesh_ready(coordinate, epoch, lod, result)
                        },
                    );
                    debug!(%coordinate, lod, "mesh requested");
                }
            }
        }

        chunk.visible = true;
        chunk.last_visible = self.update_count;
        true
    }

    /// Re-evaluate after new data arrived and track the chunk if it became visible.
    fn refresh_chunk(&mut self, coordinate: GridCoordinate) {
        if self.update_chunk(coordinate) {
            self.visible_last_update.insert(coordinate);
        }
    }

    fn is_current(&self, coordinate: GridCoordinate, epoch: u64) -> bool {
        self.chunks
            .get(&coordinate)
            .is_some_and(|chunk| chunk.epoch == epoch)
    }

    pub(crate) fn on_elevation_ready(
        &mut self,
        coordinate: GridCoordinate,
        epoch: u64,
        field: Arc<ElevationField>,
    ) {
        if !self.is_current(coordinate, epoch) {
            debug!(%coordinate, epoch, "stale elevation result ignored");
            return;
        }
        if let Some(chunk) = self.chunks.get_mut(&coordinate) {
            if chunk.elevation.is_some() {
                return;
            }
            chunk.elevation = Some(field);
        }
        debug!(%coordinate, "elevation ready");
        self.refresh_chunk(coordinate);
    }

    pub(crate) fn on_mesh_ready(
        &mut self,
        coordinate: GridCoordinate,
        epoch: u64,
        lod: u8,
        result: MeshResult,
    ) {
        if !self.is_current(coordinate, epoch) {
            debug!(%coordinate, epoch, lod, "stale mesh result ignored");
            return;
        }
        let Some(chunk) = self.chunks.get_mut(&coordinate) else {
            return;
        };
        if matches!(chunk.meshes.get(&lod), Some(LodMeshSlot::Ready(_))) {
            return;
        }
        match result {
            Ok(mesh) => {
                debug!(%coordinate, lod, vertices = mesh.vertex_count(), "mesh ready");
                chunk.meshes.insert(lod, LodMeshSlot::Ready(mesh));
            }
            Err(err) => {
                error!(%coordinate, lod, %err, "mesh build failed");
                chunk.meshes.insert(lod, LodMeshSlot::Failed(err));
                return;
            }
        }
        self.refresh_chunk(coordinate);
    }

    /// Drop least-recently-visible chunks outside the current window until the cache
    /// fits its capacity. Returns how many were evicted.
    fn evict(&mut self) -> usize {
        let Some(capacity) = self.settings.max_cached_chunks else {
            return 0;
        };
        if self.chunks.len() <= capacity {
            return 0;
        }

        let centre = self.viewer_coordinate;
        let radius = self.chunk_visible_radius;
        let mut candidates: Vec<(u64, GridCoordinate)> = self
            .chunks
            .values()
            .filter(|c| !c.visible && c.coordinate().chebyshev_distance(centre) > radius)
            .map(|c| (c.last_visible, c.coordinate()))
            .collect();
        candidates.sort_unstable();

        let excess = self.chunks.len() - capacity;
        let mut evicted = 0;
        for (_, coordinate) in candidates.into_iter().take(excess) {
            if self.remove_chunk(coordinate).is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            debug!(evicted, cached = self.chunks.len(), "chunks evicted");
        }
        evicted
    }

    /// Remove a chunk and cancel its outstanding generation work.
    pub fn remove_chunk(&mut self, coordinate: GridCoordinate) -> Option<TerrainChunk> {
        let chunk = self.chunks.remove(&coordinate)?;
        chunk.token.cancel();
        self.visible_last_update.remove(&coordinate);
        Some(chunk)
    }

    /// Remove every chunk. The next tick recomputes the visible set.
    pub fn clear(&mut self) {
        for chunk in self.chunks.values() {
            chunk.token.cancel();
        }
        self.chunks.clear();
        self.visible_last_update.clear();
        self.last_update_position = None;
    }

    /// Live chunk at `coordinate`.
    pub fn chunk(&self, coordinate: GridCoordinate) -> Option<&TerrainChunk> {
        self.chunks.get(&coordinate)
    }

    /// All live chunks, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    /// Number of live chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks the renderer should draw.
    pub fn visible_chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values().filter(|c| c.visible)
    }

    /// Chunk containing the viewer at the last visible-set update.
    pub fn viewer_coordinate(&self) -> GridCoordinate {
        self.viewer_coordinate
    }

    /// Viewer position passed to the last tick.
    pub fn viewer_position(&self) -> Vec2 {
        self.viewer_position
    }

    /// Chunks enumerated on each side of the viewer.
    pub fn chunk_visible_radius(&self) -> i32 {
        self.chunk_visible_radius
    }

    /// Validated settings.
    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Generation counters.
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// True when no generation work is queued, running, or awaiting dispatch.
    pub fn is_idle(&self) -> bool {
        self.pipeline.is_idle()
    }
}
