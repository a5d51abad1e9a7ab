//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level terrain configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Fractal noise settings.
    pub noise: NoiseConfig,
    /// Surface mesh settings.
    pub mesh: MeshConfig,
    /// Chunk streaming and LOD settings.
    pub streaming: StreamingConfig,
    /// Background generation pipeline sizing.
    pub pipeline: PipelineConfig,
    /// Elevation-to-color regions.
    pub biomes: BiomeConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// How raw fractal noise is rescaled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum NormalizeModeSetting {
    /// Rescale each sampled grid by its own min/max. Single-map use only.
    Local,
    /// Rescale by the analytic amplitude bound so neighbouring chunks agree.
    #[default]
    Global,
}

/// Fractal noise configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// World seed.
    pub seed: u64,
    /// Noise scale in world units. Larger values zoom in.
    pub scale: f64,
    /// Number of octaves. Negative values are clamped to zero.
    pub octaves: i32,
    /// Amplitude multiplier between octaves, recommended `[0, 1]`.
    pub persistence: f64,
    /// Frequency multiplier between octaves, clamped to `>= 1`.
    pub lacunarity: f64,
    /// Global sample offset added to every chunk.
    pub offset: (f64, f64),
    /// Normalization mode.
    pub normalize_mode: NormalizeModeSetting,
    /// Subtract the radial falloff mask to shape islands.
    pub use_falloff: bool,
}

/// Surface mesh configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshConfig {
    /// Vertical scale applied after the height curve.
    pub height_multiplier: f32,
    /// Height curve keyframes as `(elevation, remapped)` pairs.
    pub height_curve: Vec<(f32, f32)>,
}

/// When the streamer recomputes the visible chunk set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum UpdatePolicySetting {
    /// Recompute on every tick.
    EveryTick,
    /// Recompute only after the viewer moved past `viewer_move_threshold`.
    #[default]
    MoveThreshold,
}

/// One row of the LOD table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LodLevelConfig {
    /// Mesh LOD index (0 = full detail).
    pub lod: u8,
    /// Maximum nearest-edge distance at which this level is used.
    pub visible_distance: f32,
}

/// Chunk streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunk edge length in world units.
    pub chunk_size: u32,
    /// LOD table with strictly increasing distances.
    pub lod_levels: Vec<LodLevelConfig>,
    /// Visible-set recomputation policy.
    pub update_policy: UpdatePolicySetting,
    /// Viewer travel distance that triggers a recomputation.
    pub viewer_move_threshold: f32,
    /// Maximum number of live chunks. `None` keeps every chunk forever.
    pub max_cached_chunks: Option<usize>,
}

/// Background generation pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker thread count (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Capacity of the job queue shared by the workers.
    pub queue_capacity: usize,
    /// Capacity of each completion queue.
    pub result_capacity: usize,
}

/// A single named elevation band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiomeRegionConfig {
    /// Display name.
    pub name: String,
    /// Upper elevation bound of the region.
    pub height: f32,
    /// Linear RGBA color.
    pub color: [f32; 4],
}

/// Biome classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeConfig {
    /// Regions in ascending threshold order.
    pub regions: Vec<BiomeRegionConfig>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: (0.0, 0.0),
            normalize_mode: NormalizeModeSetting::Global,
            use_falloff: false,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            height_multiplier: 30.0,
            height_curve: vec![(0.0, 0.0), (0.4, 0.05), (1.0, 1.0)],
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 240,
            lod_levels: vec![
                LodLevelConfig {
                    lod: 0,
                    visible_distance: 200.0,
                },
                LodLevelConfig {
                    lod: 1,
                    visible_distance: 400.0,
                },
                LodLevelConfig {
                    lod: 4,
                    visible_distance: 600.0,
                },
            ],
            update_policy: UpdatePolicySetting::MoveThreshold,
            viewer_move_threshold: 25.0,
            max_cached_chunks: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            queue_capacity: 64,
            result_capacity: 128,
        }
    }
}

fn region(name: &str, height: f32, color: [f32; 4]) -> BiomeRegionConfig {
    BiomeRegionConfig {
        name: name.to_string(),
        height,
        color,
    }
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            regions: vec![
                region("deep_water", 0.3, [0.20, 0.38, 0.78, 1.0]),
                region("shallow_water", 0.4, [0.22, 0.42, 0.82, 1.0]),
                region("sand", 0.45, [0.84, 0.82, 0.55, 1.0]),
                region("grass", 0.55, [0.34, 0.60, 0.09, 1.0]),
                region("forest", 0.6, [0.24, 0.42, 0.07, 1.0]),
                region("rock", 0.7, [0.37, 0.27, 0.24, 1.0]),
                region("high_rock", 0.9, [0.29, 0.23, 0.21, 1.0]),
                region("snow", 1.0, [1.0, 1.0, 1.0, 1.0]),
            ],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for Horizon (e.g. `~/.config/horizon`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("horizon"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
