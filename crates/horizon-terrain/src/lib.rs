//! Procedural elevation: fractal noise fields, island falloff, biome coloring,
//! and per-chunk elevation generation.

mod biome;
mod elevation;
mod falloff;
mod noise_field;
mod texture;

pub use biome::{BiomeClassifier, BiomeError, BiomeRegion, Color};
pub use elevation::{ElevationField, ElevationGenerator};
pub use falloff::FalloffMask;
pub use noise_field::{MIN_SCALE, NoiseField, NoiseGrid, NoiseParams, NormalizeMode};
pub use texture::{color_grid_rgba8, height_grid_rgba8};
