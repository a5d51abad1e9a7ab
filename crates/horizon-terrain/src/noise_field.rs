//! Multi-octave fractal noise sampled over rectangular grids.
//!
//! Each octave reads Perlin noise at a per-octave offset drawn from a seeded
//! ChaCha generator, so a seed fully determines the field. The accumulated values
//! are rescaled either against the grid's own extrema ([`NormalizeMode::Local`]) or
//! against the analytic amplitude bound ([`NormalizeMode::Global`]), which is what
//! lets neighbouring chunks tile without seams.

use glam::DVec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Smallest usable noise scale. Non-positive scales are raised to this.
pub const MIN_SCALE: f64 = 1e-4;

/// Per-octave offsets are drawn from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// The amplitude bound is divided by this before global normalization. Real fBm
/// rarely approaches its theoretical peak, so the bound is tightened slightly.
const GLOBAL_NORMALIZE_DIVISOR: f64 = 0.9;

/// How accumulated noise is rescaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Inverse-lerp against the min/max observed in this grid. Output is `[0, 1]`
    /// but neighbouring grids do not agree on shared samples.
    Local,
    /// Divide by the geometric-series amplitude bound. Output is `>= 0` and
    /// independent of which region was sampled.
    #[default]
    Global,
}

/// Parameters for fractal noise sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Seed for the per-octave offsets and the base Perlin permutation.
    pub seed: u64,
    /// Sample-space scale. Larger values stretch features.
    pub scale: f64,
    /// Number of octaves. Zero yields an all-zero grid.
    pub octaves: u32,
    /// Amplitude multiplier between octaves. Callers keep this finite and `>= 0`.
    pub persistence: f64,
    /// Frequency multiplier between octaves. Callers clamp this to `>= 1`.
    pub lacunarity: f64,
    /// Normalization applied after accumulation.
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            normalize_mode: NormalizeMode::Global,
        }
    }
}

/// A row-major grid of noise samples.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl NoiseGrid {
    /// A grid of zeros.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    /// Sample at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    /// Columns in the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All samples, row-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Consume the grid and return its samples.
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Deterministic fractal noise generator.
pub struct NoiseField {
    perlin: Perlin,
    params: NoiseParams,
    octave_offsets: Vec<DVec2>,
    max_possible_height: f64,
}

impl NoiseField {
    /// Create a field, deriving one offset per octave from the seed.
    pub fn new(params: NoiseParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut octave_offsets = Vec::with_capacity(params.octaves as usize);
        let mut max_possible_height = 0.0;
        let mut amplitude = 1.0;

        for _ in 0..params.octaves {
            let x = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            let y = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
            octave_offsets.push(DVec2::new(x as f64, y as f64));

            max_possible_height += amplitude;
            amplitude *= params.persistence;
        }

        Self {
            perlin: Perlin::new(params.seed as u32),
            params,
            octave_offsets,
            max_possible_height,
        }
    }

    /// Sample a `width` x `height` grid centred on `offset`.
    ///
    /// Sample `(x, y)` reads world position `offset + (x - (width-1)/2, y - (height-1)/2)`,
    /// so two grids whose centres differ by an integer shift share bit-identical
    /// samples wherever they overlap (given global normalization and integral offsets).
    pub fn sample(&self, width: usize, height: usize, offset: DVec2) -> NoiseGrid {
        let mut grid = NoiseGrid::zeros(width, height);
        if self.params.octaves == 0 || width == 0 || height == 0 {
            return grid;
        }

        let scale = if self.params.scale <= 0.0 {
            MIN_SCALE
        } else {
            self.params.scale
        };
        let half_width = (width as f64 - 1.0) / 2.0;
        let half_height = (height as f64 - 1.0) / 2.0;

        let shifted: Vec<DVec2> = self.octave_offsets.iter().map(|o| *o + offset).collect();

        let mut raw = vec![0.0_f64; width * height];
        let mut min_local = f64::MAX;
        let mut max_local = f64::MIN;

        for y in 0..height {
            for x in 0..width {
                let mut amplitude = 1.0;
                let mut frequency = 1.0;
                let mut noise_height = 0.0;

                for octave_offset in &shifted {
                    let sample_x = (x as f64 - half_width + octave_offset.x) / scale * frequency;
                    let sample_y = (y as f64 - half_height + octave_offset.y) / scale * frequency;
                    noise_height += self.perlin.get([sample_x, sample_y]) * amplitude;

                    amplitude *= self.params.persistence;
                    frequency *= self.params.lacunarity;
                }

                min_local = min_local.min(noise_height);
                max_local = max_local.max(noise_height);
                raw[y * width + x] = noise_height;
            }
        }

        let range = max_local - min_local;
        // A non-positive or non-finite bound (negative or NaN persistence) flattens the grid.
        let global_bound = self.max_possible_height / GLOBAL_NORMALIZE_DIVISOR;
        let global_valid = global_bound.is_finite() && global_bound > 0.0;
        for (out, value) in grid.values_mut().iter_mut().zip(raw) {
            let normalized = match self.params.normalize_mode {
                NormalizeMode::Local => {
                    if range > 0.0 {
                        (value - min_local) / range
                    } else {
                        0.0
                    }
                }
                NormalizeMode::Global if global_valid => ((value + 1.0) / global_bound).max(0.0),
                NormalizeMode::Global => 0.0,
            };
            *out = normalized as f32;
        }

        grid
    }

    /// Sum of all octave amplitudes (`sum persistence^i`).
    pub fn max_possible_height(&self) -> f64 {
        self.max_possible_height
    }

    /// Per-octave offsets derived from the seed.
    pub fn octave_offsets(&self) -> &[DVec2] {
        &self.octave_offsets
    }

    /// Parameters the field was built with.
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }
}
