//! Validated runtime settings derived from [`Config`].

use glam::DVec2;
use horizon_config::{Config, NormalizeModeSetting, UpdatePolicySetting};
use horizon_lod::{LodError, LodLevel, LodTable};
use horizon_mesh::{HeightCurve, MeshError, SurfaceMeshBuilder};
use horizon_terrain::{
    BiomeClassifier, BiomeError, BiomeRegion, Color, ElevationGenerator, MIN_SCALE, NoiseParams,
    NormalizeMode,
};
use tracing::warn;

/// Errors raised while configuring or constructing the streamer.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Lod(#[from] LodError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Biome(#[from] BiomeError),
}

/// When the visible chunk set is recomputed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UpdatePolicy {
    EveryTick,
    /// Recompute once the viewer is more than `distance` away from where the last
    /// recomputation happened.
    MoveThreshold { distance: f32 },
}

/// Worker pool sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Worker thread count. Zero picks `num_cpus - 2`, at least one.
    pub worker_threads: usize,
    /// Bounded job queue length; overflow is parked in the consumer backlog.
    pub queue_capacity: usize,
    /// Bounded length of each completion queue.
    pub result_capacity: usize,
}

impl PipelineSettings {
    /// Thread count after resolving `0` to the CPU-derived default.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get().saturating_sub(2).max(1)
        } else {
            self.worker_threads
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            queue_capacity: 64,
            result_capacity: 128,
        }
    }
}

/// Everything the streamer needs, checked once up front.
#[derive(Clone, Debug)]
pub struct TerrainSettings {
    pub noise: NoiseParams,
    pub global_offset: DVec2,
    pub use_falloff: bool,
    /// World units between chunk centres; also the chunk edge length.
    pub chunk_size: u32,
    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
    pub lod_table: LodTable,
    pub biomes: Vec<BiomeRegion>,
    pub update_policy: UpdatePolicy,
    pub pipeline: PipelineSettings,
    /// Chunk cache capacity. `None` never evicts.
    pub max_cached_chunks: Option<usize>,
}

impl TerrainSettings {
    /// Validate `config`. Recoverable noise values are clamped with a warning; structural
    /// problems are errors.
    pub fn from_config(config: &Config) -> Result<Self, StreamError> {
        let noise = &config.noise;

        let mut lacunarity = noise.lacunarity;
        if lacunarity.is_nan() || lacunarity < 1.0 {
            warn!(lacunarity, "lacunarity below 1, clamping to 1");
            lacunarity = 1.0;
        }
        let mut persistence = noise.persistence;
        if !persistence.is_finite() || persistence < 0.0 {
            warn!(persistence, "persistence must be finite and non-negative, using 0");
            persistence = 0.0;
        }
        let octaves = if noise.octaves < 0 {
            warn!(octaves = noise.octaves, "negative octave count, using 0");
            0
        } else {
            noise.octaves as u32
        };
        let mut scale = noise.scale;
        if scale.is_nan() || scale <= 0.0 {
            warn!(scale, "non-positive noise scale, clamping to {MIN_SCALE}");
            scale = MIN_SCALE;
        }

        let streaming = &config.streaming;
        if streaming.chunk_size == 0 {
            return Err(StreamError::InvalidConfiguration(
                "chunk_size must be positive".into(),
            ));
        }
        let update_policy = match streaming.update_policy {
            UpdatePolicySetting::EveryTick => UpdatePolicy::EveryTick,
            UpdatePolicySetting::MoveThreshold => {
                let distance = streaming.viewer_move_threshold;
                if !distance.is_finite() || distance < 0.0 {
                    return Err(StreamError::InvalidConfiguration(format!(
                        "viewer_move_threshold must be a non-negative number, got {distance}"
                    )));
                }
                UpdatePolicy::MoveThreshold { distance }
            }
        };

        let pipeline = PipelineSettings {
            worker_threads: config.pipeline.worker_threads,
            queue_capacity: config.pipeline.queue_capacity,
            result_capacity: config.pipeline.result_capacity,
        };
        if pipeline.queue_capacity == 0 || pipeline.result_capacity == 0 {
            return Err(StreamError::InvalidConfiguration(
                "pipeline queue capacities must be positive".into(),
            ));
        }

        let lod_table = LodTable::new(
            streaming
                .lod_levels
                .iter()
                .map(|level| LodLevel::new(level.lod, level.visible_distance))
                .collect(),
        )?;
        let height_curve = HeightCurve::from_keys(config.mesh.height_curve.clone())?;
        let biomes: Vec<BiomeRegion> = config
            .biomes
            .regions
            .iter()
            .map(|r| BiomeRegion::new(r.name.clone(), r.height, Color::from_array(r.color)))
            .collect();
        if biomes.is_empty() {
            return Err(BiomeError::Empty.into());
        }

        Ok(Self {
            noise: NoiseParams {
                seed: noise.seed,
                scale,
                octaves,
                persistence,
                lacunarity,
                normalize_mode: match noise.normalize_mode {
                    NormalizeModeSetting::Local => NormalizeMode::Local,
                    NormalizeModeSetting::Global => NormalizeMode::Global,
                },
            },
            global_offset: DVec2::new(noise.offset.0, noise.offset.1),
            use_falloff: noise.use_falloff,
            chunk_size: streaming.chunk_size,
            height_multiplier: config.mesh.height_multiplier,
            height_curve,
            lod_table,
            biomes,
            update_policy,
            pipeline,
            max_cached_chunks: streaming.max_cached_chunks,
        })
    }

    /// Mesh vertices per side at LOD 0.
    pub fn core_size(&self) -> usize {
        self.chunk_size as usize + 1
    }

    /// Elevation samples per side, including the normal-sampling border.
    pub fn field_size(&self) -> usize {
        self.core_size() + 2
    }

    /// Chunks enumerated on each side of the viewer.
    pub fn chunk_visible_radius(&self) -> i32 {
        (self.lod_table.max_view_distance() / self.chunk_size as f32).round() as i32
    }

    /// Generator for bordered chunk fields.
    pub fn elevation_generator(&self) -> Result<ElevationGenerator, StreamError> {
        let classifier = BiomeClassifier::new(self.biomes.clone())?;
        Ok(ElevationGenerator::new(
            self.noise.clone(),
            classifier,
            self.field_size(),
            self.global_offset,
            self.use_falloff,
        ))
    }

    /// Mesh builder matching the generator's field size.
    pub fn mesh_builder(&self) -> Result<SurfaceMeshBuilder, StreamError> {
        Ok(SurfaceMeshBuilder::new(
            self.core_size(),
            self.height_multiplier,
            self.height_curve.clone(),
        )?)
    }
}
