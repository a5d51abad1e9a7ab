//! Monotonic elevation remapping applied before the height multiplier.

use crate::error::MeshError;

/// Piecewise-linear curve through `(input, output)` keys.
///
/// Inputs are strictly increasing and outputs non-decreasing. Inputs outside the key
/// range clamp to the first/last output.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightCurve {
    keys: Vec<(f32, f32)>,
}

impl HeightCurve {
    /// Identity on `[0, 1]`.
    pub fn linear() -> Self {
        Self {
            keys: vec![(0.0, 0.0), (1.0, 1.0)],
        }
    }

    /// Build from `(input, output)` keys with strictly increasing inputs and non-decreasing outputs.
    pub fn from_keys(keys: Vec<(f32, f32)>) -> Result<Self, MeshError> {
        if keys.is_empty() {
            return Err(MeshError::InvalidCurve("no keys".into()));
        }
        if keys.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(MeshError::InvalidCurve("non-finite key".into()));
        }
        for pair in keys.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            if x1 <= x0 {
                return Err(MeshError::InvalidCurve(format!(
                    "inputs must be strictly increasing ({x0} then {x1})"
                )));
            }
            if y1 < y0 {
                return Err(MeshError::InvalidCurve(format!(
                    "outputs must not decrease ({y0} then {y1})"
                )));
            }
        }
        Ok(Self { keys })
    }

    /// Remap `t`, clamping outside the key range.
    pub fn evaluate(&self, t: f32) -> f32 {
        let upper = self.keys.partition_point(|(x, _)| *x <= t);
        if upper == 0 {
            return self.keys[0].1;
        }
        if upper == self.keys.len() {
            return self.keys[upper - 1].1;
        }
        let (x0, y0) = self.keys[upper - 1];
        let (x1, y1) = self.keys[upper];
        y0 + (y1 - y0) * (t - x0) / (x1 - x0)
    }

    /// Keyframes in input order.
    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity() {
        let curve = HeightCurve::linear();
        for t in [0.0, 0.25, 0.5, 1.0] {
            assert!((curve.evaluate(t) - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_clamps_outside_key_range() {
        let curve = HeightCurve::from_keys(vec![(0.2, 0.1), (0.8, 0.9)]).unwrap();
        assert_eq!(curve.evaluate(-1.0), 0.1);
        assert_eq!(curve.evaluate(0.0), 0.1);
        assert_eq!(curve.evaluate(2.0), 0.9);
    }

    #[test]
    fn test_flattens_low_band() {
        let curve = HeightCurve::from_keys(vec![(0.0, 0.0), (0.4, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(curve.evaluate(0.3), 0.0);
        assert!((curve.evaluate(0.7) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_single_key_is_constant() {
        let curve = HeightCurve::from_keys(vec![(0.5, 0.3)]).unwrap();
        assert_eq!(curve.evaluate(0.0), 0.3);
        assert_eq!(curve.evaluate(0.9), 0.3);
    }

    #[test]
    fn test_is_monotonic() {
        let curve = HeightCurve::from_keys(vec![(0.0, 0.0), (0.4, 0.05), (1.0, 1.0)]).unwrap();
        let mut prev = f32::MIN;
        for i in 0..=100 {
            let v = curve.evaluate(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn test_rejects_invalid_keys() {
        assert!(HeightCurve::from_keys(Vec::new()).is_err());
        assert!(HeightCurve::from_keys(vec![(0.5, 0.0), (0.5, 1.0)]).is_err());
        assert!(HeightCurve::from_keys(vec![(0.0, 1.0), (1.0, 0.0)]).is_err());
        assert!(HeightCurve::from_keys(vec![(0.0, f32::NAN)]).is_err());
    }
}
