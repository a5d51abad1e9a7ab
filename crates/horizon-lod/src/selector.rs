//! Distance-based LOD selection against a validated threshold table.

use glam::Vec2;

use crate::bounds::ChunkBounds;

/// One row of the LOD table: mesh detail `lod` is used up to `visible_distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodLevel {
    /// Mesh LOD index. Higher is coarser.
    pub lod: u8,
    /// Largest nearest-edge distance at which this level is used.
    pub visible_distance: f32,
}

impl LodLevel {
    /// Level `lod` used up to `visible_distance` from the viewer.
    pub fn new(lod: u8, visible_distance: f32) -> Self {
        Self {
            lod,
            visible_distance,
        }
    }
}

/// Errors from building a [`LodTable`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
    #[error("LOD table has no levels")]
    Empty,

    #[error("LOD level {index} has non-positive visible distance {distance}")]
    NonPositiveDistance { index: usize, distance: f32 },

    #[error("LOD visible distances must be strictly increasing (level {index}: {distance})")]
    NotIncreasing { index: usize, distance: f32 },
}

/// Ordered LOD levels with strictly increasing visible distances.
///
/// The last level's distance is the maximum view distance.
#[derive(Clone, Debug, PartialEq)]
pub struct LodTable {
    levels: Vec<LodLevel>,
}

impl LodTable {
    /// Validate `levels`: non-empty, positive finite distances, strictly increasing.
    pub fn new(levels: Vec<LodLevel>) -> Result<Self, LodError> {
        if levels.is_empty() {
            return Err(LodError::Empty);
        }
        for (index, level) in levels.iter().enumerate() {
            let distance = level.visible_distance;
            if !distance.is_finite() || distance <= 0.0 {
                return Err(LodError::NonPositiveDistance { index, distance });
            }
            if index > 0 && distance <= levels[index - 1].visible_distance {
                return Err(LodError::NotIncreasing { index, distance });
            }
        }
        Ok(Self { levels })
    }

    /// Levels in ascending distance order.
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false for a validated table.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Distance of the last level; chunks beyond it are hidden.
    pub fn max_view_distance(&self) -> f32 {
        self.levels
            .last()
            .map(|level| level.visible_distance)
            .unwrap_or(0.0)
    }

    /// Slot for a nearest-edge `distance`, or `None` past the maximum view distance.
    ///
    /// The first slot whose threshold is not exceeded wins.
    pub fn select(&self, distance: f32) -> Option<usize> {
        if distance > self.max_view_distance() {
            return None;
        }
        let slot = self
            .levels
            .iter()
            .position(|level| distance <= level.visible_distance)
            .unwrap_or(self.levels.len() - 1);
        Some(slot)
    }
}

/// Selects a LOD slot for a chunk from the viewer position.
#[derive(Clone, Debug)]
pub struct LodSelector {
    table: LodTable,
}

impl LodSelector {
    /// Selector over a validated table.
    pub fn new(table: LodTable) -> Self {
        Self { table }
    }

    /// Slot for `bounds` seen from `viewer`, or `None` when the chunk is out of range.
    pub fn select(&self, bounds: &ChunkBounds, viewer: Vec2) -> Option<usize> {
        self.table.select(bounds.distance(viewer))
    }

    /// Mesh LOD index stored in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn lod_for_slot(&self, slot: usize) -> u8 {
        self.table.levels[slot].lod
    }

    /// Distance beyond which [`select`](Self::select) returns `None`.
    pub fn max_view_distance(&self) -> f32 {
        self.table.max_view_distance()
    }

    /// The underlying table.
    pub fn table(&self) -> &LodTable {
        &self.table
    }
}
