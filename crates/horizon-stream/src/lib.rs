//! Infinite terrain streaming: a bounded generation worker pool and the chunk streamer
//! that decides which chunks exist, which are visible, and at what level of detail.

mod chunk;
mod coordinate;
mod pipeline;
mod settings;
mod streamer;

pub use chunk::{ChunkState, LodMeshSlot, TerrainChunk};
pub use coordinate::GridCoordinate;
pub use pipeline::{Completions, GenerationPipeline, GenerationToken, MeshResult, PipelineStats};
pub use settings::{PipelineSettings, StreamError, TerrainSettings, UpdatePolicy};
pub use streamer::{ChunkStreamer, TickReport};
