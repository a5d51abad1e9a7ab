//! Axis-aligned chunk footprints on the XZ plane.

use glam::Vec2;

/// Square footprint of a chunk in world units. `Vec2::y` is world Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    center: Vec2,
    size: f32,
}

impl ChunkBounds {
    /// Footprint of edge length `size` centred on `center`.
    pub fn new(center: Vec2, size: f32) -> Self {
        Self { center, size }
    }

    /// Centre in world XZ.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Edge length.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Corner with the smallest coordinates.
    pub fn min(&self) -> Vec2 {
        self.center - Vec2::splat(self.size * 0.5)
    }

    /// Corner with the largest coordinates.
    pub fn max(&self) -> Vec2 {
        self.center + Vec2::splat(self.size * 0.5)
    }

    /// Whether `point` lies inside or on the edge.
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }

    /// The point of the footprint nearest to `point`.
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    /// Squared distance from `point` to the nearest point of the footprint; zero inside.
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        self.closest_point(point).distance_squared(point)
    }

    /// Distance from `point` to the nearest point of the footprint; zero inside.
    pub fn distance(&self, point: Vec2) -> f32 {
        self.sqr_distance(point).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extents() {
        let bounds = ChunkBounds::new(Vec2::new(16.0, -16.0), 16.0);
        assert_eq!(bounds.min(), Vec2::new(8.0, -24.0));
        assert_eq!(bounds.max(), Vec2::new(24.0, -8.0));
        assert_eq!(bounds.size(), 16.0);
    }

    #[test]
    fn test_inside_is_zero_distance() {
        let bounds = ChunkBounds::new(Vec2::ZERO, 16.0);
        assert!(bounds.contains(Vec2::new(3.0, -8.0)));
        assert_eq!(bounds.distance(Vec2::new(3.0, -8.0)), 0.0);
    }

    #[test]
    fn test_distance_is_to_nearest_edge_not_centre() {
        let bounds = ChunkBounds::new(Vec2::new(80.0, 0.0), 16.0);
        assert_eq!(bounds.distance(Vec2::ZERO), 72.0);
    }

    #[test]
    fn test_distance_to_corner() {
        let bounds = ChunkBounds::new(Vec2::new(10.0, 10.0), 4.0);
        // Nearest point is the (8, 8) corner.
        assert_eq!(bounds.sqr_distance(Vec2::new(5.0, 4.0)), 9.0 + 16.0);
        assert_eq!(bounds.distance(Vec2::new(5.0, 4.0)), 5.0);
    }
}
