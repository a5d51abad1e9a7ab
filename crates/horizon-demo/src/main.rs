//! Headless demo that streams terrain around a viewer walking along +X.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p horizon-demo -- --ticks 300 --speed 40`.

use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec2;
use horizon_config::{CliArgs, Config, default_config_dir};
use horizon_stream::{ChunkStreamer, TickReport};
use horizon_terrain::{color_grid_rgba8, height_grid_rgba8};
use tracing::{error, info, warn};

/// Demo flags on top of the shared configuration overrides.
#[derive(Parser, Debug)]
#[command(name = "horizon-demo", about = "Stream procedural terrain headlessly")]
struct DemoArgs {
    #[command(flatten)]
    cli: CliArgs,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Viewer speed in world units per second.
    #[arg(long, default_value_t = 60.0)]
    speed: f32,

    /// Simulated seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Sleep `dt` between ticks instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Log progress every this many ticks.
    #[arg(long, default_value_t = 60)]
    report_every: u32,
}

#[derive(Default)]
struct Totals {
    updates: u32,
    completions: usize,
    created: usize,
    evicted: usize,
}

impl Totals {
    fn add(&mut self, report: &TickReport) {
        self.updates += u32::from(report.updated);
        self.completions += report.completions;
        self.created += report.created;
        self.evicted += report.evicted;
    }
}

fn main() {
    let args = DemoArgs::parse();

    let config_dir = match args.cli.config.clone().map_or_else(default_config_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to resolve config directory: {e}");
            std::process::exit(1);
        }
    };

    let mut on_disk = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = on_disk.clone();
    config.apply_cli_overrides(&args.cli);

    let log_dir = config_dir.join("logs");
    horizon_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let mut streamer = match ChunkStreamer::from_config(&config) {
        Ok(streamer) => streamer,
        Err(e) => {
            error!("Invalid terrain configuration: {e}");
            std::process::exit(1);
        }
    };
    info!(
        seed = config.noise.seed,
        chunk_size = config.streaming.chunk_size,
        ticks = args.ticks,
        speed = args.speed,
        "Starting terrain streaming demo"
    );

    let started = Instant::now();
    let mut viewer = Vec2::ZERO;
    let mut totals = Totals::default();
    for tick in 1..=args.ticks {
        viewer.x += args.speed * args.dt;
        let report = streamer.tick(viewer);
        totals.add(&report);

        if args.report_every > 0 && tick % args.report_every == 0 {
            let stats = streamer.pipeline_stats();
            info!(
                tick,
                viewer = %streamer.viewer_coordinate(),
                chunks = streamer.chunk_count(),
                visible = report.visible,
                in_flight = stats.in_flight,
                backlog = stats.backlog,
                "streaming"
            );

            // Terrain parameters are fixed once chunks exist; report edits instead of applying them.
            match on_disk.reload(&config_dir) {
                Ok(Some(changed)) => {
                    info!("config.ron changed on disk, restart the demo to apply it");
                    on_disk = changed;
                }
                Ok(None) => {}
                Err(e) => warn!("Config hot-reload check failed: {e}"),
            }
        }
        if args.realtime {
            std::thread::sleep(Duration::from_secs_f32(args.dt.max(0.0)));
        }
    }

    // Let outstanding work land so the summary reflects the final view.
    let drain_deadline = Instant::now() + Duration::from_secs(10);
    while !streamer.is_idle() {
        if Instant::now() > drain_deadline {
            warn!("Generation still busy after 10s, reporting partial results");
            break;
        }
        totals.add(&streamer.tick(viewer));
        std::thread::sleep(Duration::from_millis(2));
    }

    let stats = streamer.pipeline_stats();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        updates = totals.updates,
        callbacks = totals.completions,
        created = totals.created,
        evicted = totals.evicted,
        chunks = streamer.chunk_count(),
        visible = streamer.visible_chunks().count(),
        elevations = stats.elevations_generated,
        meshes = stats.meshes_built,
        cancelled = stats.cancelled,
        mesh_failures = stats.mesh_failures,
        "Terrain streaming demo finished"
    );

    match streamer.chunk(streamer.viewer_coordinate()) {
        Some(chunk) => {
            let color_bytes = chunk.current_color_grid().map_or(0, |c| color_grid_rgba8(c).len());
            let height_bytes = chunk
                .elevation()
                .map_or(0, |field| height_grid_rgba8(&field.core_heights()).len());
            info!(
                coordinate = %chunk.coordinate(),
                lod = ?chunk.current_lod(),
                vertices = chunk.current_mesh().map_or(0, |m| m.vertex_count()),
                triangles = chunk.current_mesh().map_or(0, |m| m.triangle_count()),
                color_bytes,
                height_bytes,
                "Chunk under viewer"
            );
        }
        None => warn!("No chunk under the viewer"),
    }
}
