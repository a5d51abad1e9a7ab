//! Configuration system for the Horizon terrain streamer.
//!
//! Provides runtime-configurable terrain, meshing, streaming and pipeline settings
//! that persist to disk as RON files. Supports CLI overrides via clap, hot-reload
//! detection, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BiomeConfig, BiomeRegionConfig, Config, DebugConfig, LodLevelConfig, MeshConfig,
    NoiseConfig, NormalizeModeSetting, PipelineConfig, StreamingConfig, UpdatePolicySetting,
    default_config_dir,
};
pub use error::ConfigError;
