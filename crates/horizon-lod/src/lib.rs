//! Level-of-detail selection: validated distance tables and chunk bounds distance.

mod bounds;
mod selector;

pub use bounds::ChunkBounds;
pub use selector::{LodError, LodLevel, LodSelector, LodTable};
