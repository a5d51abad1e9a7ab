//! Radial falloff mask for island-shaped terrain.

use crate::noise_field::NoiseGrid;

/// Curve steepness.
const FALLOFF_A: f32 = 3.0;
/// Curve midpoint shift. Larger values keep more land near the edges.
const FALLOFF_B: f32 = 2.2;

/// A square attenuation grid: ~0 in the centre, 1 at the edges.
///
/// Depends only on `size`, so one mask is built per pipeline and shared.
#[derive(Clone, Debug, PartialEq)]
pub struct FalloffMask {
    size: usize,
    values: Vec<f32>,
}

impl FalloffMask {
    /// Mask for a `size` x `size` grid.
    pub fn generate(size: usize) -> Self {
        let mut values = Vec::with_capacity(size * size);
        let denom = (size.max(2) - 1) as f32;

        for y in 0..size {
            for x in 0..size {
                let u = x as f32 / denom * 2.0 - 1.0;
                let v = y as f32 / denom * 2.0 - 1.0;
                values.push(evaluate(u.abs().max(v.abs())));
            }
        }

        Self { size, values }
    }

    /// Samples per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Attenuation at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.size + x]
    }

    /// Subtract the mask from `grid` and clamp each sample to `[0, 1]`.
    ///
    /// The grid must be `size` x `size`; mismatched grids are left untouched.
    pub fn apply(&self, grid: &mut NoiseGrid) {
        if grid.width() != self.size || grid.height() != self.size {
            tracing::warn!(
                mask = self.size,
                width = grid.width(),
                height = grid.height(),
                "falloff mask size mismatch, skipping"
            );
            return;
        }
        for (sample, falloff) in grid.values_mut().iter_mut().zip(&self.values) {
            *sample = (*sample - falloff).clamp(0.0, 1.0);
        }
    }
}

/// Smooth ramp `v^a / (v^a + (b - b*v)^a)` over `v in [0, 1]`.
fn evaluate(value: f32) -> f32 {
    let numerator = libm::powf(value, FALLOFF_A);
    numerator / (numerator + libm::powf(FALLOFF_B - FALLOFF_B * value, FALLOFF_A))
}
