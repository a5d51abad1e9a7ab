//! Elevation-band coloring.
//!
//! Regions are kept in ascending threshold order. An elevation takes the color of the
//! first region whose threshold it does not exceed; anything above the last threshold
//! uses the last region.

/// Linear RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Color from linear components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Color from `[r, g, b, a]`.
    pub const fn from_array(rgba: [f32; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2], rgba[3])
    }

    /// Component-wise interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    /// Quantize to 8-bit RGBA.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// One elevation band.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeRegion {
    pub name: String,
    /// Upper elevation bound (inclusive).
    pub height: f32,
    pub color: Color,
}

impl BiomeRegion {
    /// Region named `name` covering elevations up to `height`.
    pub fn new(name: impl Into<String>, height: f32, color: Color) -> Self {
        Self {
            name: name.into(),
            height,
            color,
        }
    }
}

/// Errors from building a [`BiomeClassifier`].
#[derive(Debug, thiserror::Error)]
pub enum BiomeError {
    #[error("biome table has no regions")]
    Empty,
}

/// Maps elevations to colors through an ordered region table.
#[derive(Clone, Debug)]
pub struct BiomeClassifier {
    regions: Vec<BiomeRegion>,
}

impl BiomeClassifier {
    /// Build a classifier from regions in ascending threshold order.
    ///
    /// An out-of-order table is accepted (ordering is the caller's contract) but logged.
    pub fn new(regions: Vec<BiomeRegion>) -> Result<Self, BiomeError> {
        if regions.is_empty() {
            return Err(BiomeError::Empty);
        }
        if regions.windows(2).any(|w| w[0].height > w[1].height) {
            tracing::warn!("biome regions are not in ascending threshold order");
        }
        Ok(Self { regions })
    }

    /// Color of the first region whose threshold covers `elevation`, else the last region.
    pub fn classify(&self, elevation: f32) -> Color {
        self.regions
            .iter()
            .find(|region| elevation <= region.height)
            .or(self.regions.last())
            .map(|region| region.color)
            .unwrap_or(Color::TRANSPARENT)
    }

    /// Regions in table order.
    pub fn regions(&self) -> &[BiomeRegion] {
        &self.regions
    }
}
