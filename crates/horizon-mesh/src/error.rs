//! Mesh building error types.

/// Errors from configuring or running the surface mesh builder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// The elevation field does not match the builder's core size plus border.
    #[error("elevation field is {actual} samples wide, expected {expected} (core {core} + border)")]
    SizeMismatch {
        expected: usize,
        actual: usize,
        core: usize,
    },

    /// A mesh needs at least two vertices per side.
    #[error("mesh core size must be at least 2, got {0}")]
    CoreTooSmall(usize),

    /// Height curve keys are empty, non-finite, or not monotonic.
    #[error("invalid height curve: {0}")]
    InvalidCurve(String),
}
