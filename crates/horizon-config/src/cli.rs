//! Command-line argument parsing for Horizon.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, NormalizeModeSetting};

/// Horizon command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "horizon", about = "Horizon streaming terrain")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Chunk edge length in world units.
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Number of noise octaves.
    #[arg(long)]
    pub octaves: Option<i32>,

    /// Noise normalization mode.
    #[arg(long, value_enum)]
    pub normalize: Option<NormalizeModeSetting>,

    /// Enable or disable the island falloff mask.
    #[arg(long)]
    pub falloff: Option<bool>,

    /// Worker thread count (0 = auto).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.noise.seed = seed;
        }
        if let Some(size) = args.chunk_size {
            self.streaming.chunk_size = size;
        }
        if let Some(octaves) = args.octaves {
            self.noise.octaves = octaves;
        }
        if let Some(mode) = args.normalize {
            self.noise.normalize_mode = mode;
        }
        if let Some(falloff) = args.falloff {
            self.noise.use_falloff = falloff;
        }
        if let Some(workers) = args.workers {
            self.pipeline.worker_threads = workers;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(99),
            normalize: Some(NormalizeModeSetting::Local),
            workers: Some(3),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.noise.seed, 99);
        assert_eq!(config.noise.normalize_mode, NormalizeModeSetting::Local);
        assert_eq!(config.pipeline.worker_threads, 3);
        // Non-overridden fields retain defaults
        assert_eq!(config.streaming.chunk_size, 240);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::try_parse_from([
            "horizon",
            "--seed",
            "7",
            "--normalize",
            "local",
            "--falloff",
            "true",
        ])
        .unwrap();
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.normalize, Some(NormalizeModeSetting::Local));
        assert_eq!(args.falloff, Some(true));
        assert!(args.config.is_none());
    }
}
