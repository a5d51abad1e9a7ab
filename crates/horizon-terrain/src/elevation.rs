//! Per-chunk elevation fields and the generator that produces them.

use glam::DVec2;

use crate::biome::{BiomeClassifier, Color};
use crate::falloff::FalloffMask;
use crate::noise_field::{NoiseField, NoiseParams};

/// A square elevation grid with a one-sample border, plus the colors of its core.
///
/// `size` counts the border: the core is `size - 2` samples per side and the color
/// grid covers exactly the core, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationField {
    size: usize,
    heights: Vec<f32>,
    colors: Vec<Color>,
}

impl ElevationField {
    /// Build a field from bordered heights and core colors.
    ///
    /// # Panics
    ///
    /// Panics if `heights` is not `size * size` or `colors` is not `(size-2)^2`.
    pub fn new(size: usize, heights: Vec<f32>, colors: Vec<Color>) -> Self {
        assert_eq!(heights.len(), size * size, "height grid must be size x size");
        let core = size.saturating_sub(2);
        assert_eq!(colors.len(), core * core, "color grid must cover the core");
        Self {
            size,
            heights,
            colors,
        }
    }

    /// A field with transparent colors, for callers that only need geometry.
    pub fn from_heights(size: usize, heights: Vec<f32>) -> Self {
        let core = size.saturating_sub(2);
        Self::new(size, heights, vec![Color::TRANSPARENT; core * core])
    }

    /// Samples per side, border included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Samples per side, border excluded.
    pub fn core_size(&self) -> usize {
        self.size.saturating_sub(2)
    }

    /// Height at bordered coordinate `(x, y)`.
    pub fn height(&self, x: usize, y: usize) -> f32 {
        self.heights[y * self.size + x]
    }

    /// All heights, border included, row-major.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Heights of the core only, row-major.
    pub fn core_heights(&self) -> Vec<f32> {
        let core = self.core_size();
        (1..=core)
            .flat_map(|y| (1..=core).map(move |x| (x, y)))
            .map(|(x, y)| self.height(x, y))
            .collect()
    }

    /// Color at core coordinate `(x, y)`.
    pub fn color(&self, x: usize, y: usize) -> Color {
        self.colors[y * self.core_size() + x]
    }

    /// Core colors, row-major.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }
}

/// Produces [`ElevationField`]s for chunk centres: noise, optional falloff, coloring.
pub struct ElevationGenerator {
    noise: NoiseField,
    falloff: Option<FalloffMask>,
    classifier: BiomeClassifier,
    field_size: usize,
    global_offset: DVec2,
}

impl ElevationGenerator {
    /// `field_size` is the bordered sample count per side.
    pub fn new(
        params: NoiseParams,
        classifier: BiomeClassifier,
        field_size: usize,
        global_offset: DVec2,
        use_falloff: bool,
    ) -> Self {
        Self {
            noise: NoiseField::new(params),
            falloff: use_falloff.then(|| FalloffMask::generate(field_size)),
            classifier,
            field_size,
            global_offset,
        }
    }

    /// Generate the field for the chunk centred at world position `centre`.
    pub fn generate(&self, centre: DVec2) -> ElevationField {
        let mut grid = self
            .noise
            .sample(self.field_size, self.field_size, centre + self.global_offset);
        if let Some(falloff) = &self.falloff {
            falloff.apply(&mut grid);
        }

        let size = self.field_size;
        let core = size.saturating_sub(2);
        let mut colors = Vec::with_capacity(core * core);
        for y in 1..=core {
            for x in 1..=core {
                colors.push(self.classifier.classify(grid.get(x, y)));
            }
        }

        ElevationField::new(size, grid.into_values(), colors)
    }

    /// Bordered samples per side of generated fields.
    pub fn field_size(&self) -> usize {
        self.field_size
    }

    /// Underlying noise field.
    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Biome classifier used for colors.
    pub fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    /// Whether the island falloff mask is applied.
    pub fn uses_falloff(&self) -> bool {
        self.falloff.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeRegion;
    use crate::noise_field::NormalizeMode;

    const LOW: Color = Color::new(0.0, 0.0, 1.0, 1.0);
    const HIGH: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    fn generator(use_falloff: bool) -> ElevationGenerator {
        let classifier = BiomeClassifier::new(vec![
            BiomeRegion::new("low", 0.5, LOW),
            BiomeRegion::new("high", 1.0, HIGH),
        ])
        .unwrap();
        ElevationGenerator::new(
            NoiseParams {
                seed: 21,
                scale: 20.0,
                normalize_mode: NormalizeMode::Global,
                ..Default::default()
            },
            classifier,
            19,
            DVec2::ZERO,
            use_falloff,
        )
    }

    #[test]
    fn test_field_dimensions() {
        let field = generator(false).generate(DVec2::ZERO);
        assert_eq!(field.size(), 19);
        assert_eq!(field.core_size(), 17);
        assert_eq!(field.heights().len(), 19 * 19);
        assert_eq!(field.colors().len(), 17 * 17);
        assert_eq!(field.core_heights().len(), 17 * 17);
    }

    #[test]
    fn test_colors_follow_core_heights() {
        let field = generator(false).generate(DVec2::new(32.0, -16.0));
        for y in 0..17 {
            for x in 0..17 {
                let h = field.height(x + 1, y + 1);
                let expected = if h <= 0.5 { LOW } else { HIGH };
                assert_eq!(field.color(x, y), expected, "core ({x}, {y}) height {h}");
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let centre = DVec2::new(-48.0, 80.0);
        assert_eq!(generator(true).generate(centre), generator(true).generate(centre));
    }

    #[test]
    fn test_falloff_clamps_to_unit_range_and_sinks_edges() {
        let generator = generator(true);
        assert!(generator.uses_falloff());
        let field = generator.generate(DVec2::ZERO);
        assert!(field.heights().iter().all(|h| (0.0..=1.0).contains(h)));

        // Corners of the bordered grid lose a full unit of height.
        let raw = self::generator(false).generate(DVec2::ZERO);
        for (x, y) in [(0, 0), (18, 18)] {
            let expected = (raw.height(x, y) - 1.0).clamp(0.0, 1.0);
            assert!((field.height(x, y) - expected).abs() < 1e-6);
        }
    }

    #[test]
    #[should_panic(expected = "color grid must cover the core")]
    fn test_mismatched_colors_panic() {
        ElevationField::new(4, vec![0.0; 16], vec![Color::BLACK; 3]);
    }
}
