//! Chunk grid coordinates.

use std::fmt;

use glam::{DVec2, Vec2};
use horizon_lod::ChunkBounds;

/// Integer chunk position on the world grid. Chunk `(x, y)` is centred at
/// `(x, y) * chunk_size` in world XZ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
}

impl GridCoordinate {
    /// Coordinate `(x, y)` in chunks.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk whose centre is nearest to `position`. Positions beyond the grid
    /// saturate to its outermost chunk.
    pub fn from_world(position: Vec2, chunk_size: f32) -> Self {
        Self::new(
            (position.x / chunk_size).round() as i32,
            (position.y / chunk_size).round() as i32,
        )
    }

    /// The coordinate `(dx, dy)` chunks away, saturating at the grid limits.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// World-space centre, in double precision for noise sampling.
    pub fn world_centre(self, chunk_size: f64) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64) * chunk_size
    }

    /// World-space footprint of the chunk.
    pub fn bounds(self, chunk_size: f32) -> ChunkBounds {
        ChunkBounds::new(Vec2::new(self.x as f32, self.y as f32) * chunk_size, chunk_size)
    }

    /// Chebyshev distance in chunks, saturating at `i32::MAX`.
    pub fn chebyshev_distance(self, other: Self) -> i32 {
        let distance = self.x.abs_diff(other.x).max(self.y.abs_diff(other.y));
        i32::try_from(distance).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_rounds_to_nearest_centre() {
        assert_eq!(GridCoordinate::from_world(Vec2::ZERO, 16.0), GridCoordinate::new(0, 0));
        assert_eq!(GridCoordinate::from_world(Vec2::new(7.9, -7.9), 16.0), GridCoordinate::new(0, 0));
        assert_eq!(GridCoordinate::from_world(Vec2::new(8.1, -24.1), 16.0), GridCoordinate::new(1, -2));
    }

    #[test]
    fn test_bounds_and_centre() {
        let coord = GridCoordinate::new(5, 0);
        assert_eq!(coord.world_centre(16.0), DVec2::new(80.0, 0.0));
        let bounds = coord.bounds(16.0);
        assert_eq!(bounds.center(), Vec2::new(80.0, 0.0));
        assert_eq!(bounds.distance(Vec2::ZERO), 72.0);
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = GridCoordinate::new(1, 1);
        assert_eq!(a.chebyshev_distance(GridCoordinate::new(-2, 3)), 3);
        assert_eq!(a.chebyshev_distance(a.offset(0, 0)), 0);
    }

    #[test]
    fn test_far_coordinates_saturate() {
        let edge = GridCoordinate::from_world(Vec2::new(1.0e12, -1.0e12), 16.0);
        assert_eq!(edge, GridCoordinate::new(i32::MAX, i32::MIN));
        assert_eq!(edge.offset(3, -3), edge);
        assert_eq!(edge.offset(-1, 1), GridCoordinate::new(i32::MAX - 1, i32::MIN + 1));
        assert_eq!(edge.chebyshev_distance(GridCoordinate::new(i32::MIN, 0)), i32::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(GridCoordinate::new(-3, 4).to_string(), "(-3, 4)");
    }
}
