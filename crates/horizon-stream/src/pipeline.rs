//! Asynchronous elevation and mesh generation on a bounded worker pool.
//!
//! Requests go through a bounded job channel to named worker threads. Finished work is
//! queued on one bounded completion channel per result type together with the
//! requester's callback. The consumer drains both queues once per tick and runs the
//! callbacks on its own thread with `&mut` access to its context, so no per-chunk
//! state is ever shared with the workers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use horizon_mesh::{MeshError, SurfaceMesh, SurfaceMeshBuilder};
use horizon_terrain::{ElevationField, ElevationGenerator};
use tracing::{debug, warn};

use crate::coordinate::GridCoordinate;
use crate::settings::PipelineSettings;

/// Outcome of a mesh request.
pub type MeshResult = Result<Arc<SurfaceMesh>, MeshError>;

type Callback<C, T> = Box<dyn FnOnce(&mut C, T) + Send>;

/// Shared cancellation flag for one or more requests.
///
/// A cancelled request is skipped by the worker, before or after computing, and its
/// callback never runs.
#[derive(Clone, Debug, Default)]
pub struct GenerationToken(Arc<AtomicBool>);

impl GenerationToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every request sharing this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Snapshot of pipeline counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub elevations_generated: u64,
    pub meshes_built: u64,
    /// Requests dropped because their token was cancelled.
    pub cancelled: u64,
    pub mesh_failures: u64,
    /// Jobs queued to or running on workers.
    pub in_flight: usize,
    /// Jobs parked on the consumer side while the job queue is full.
    pub backlog: usize,
}

enum Job<C> {
    Elevation {
        coordinate: GridCoordinate,
        token: GenerationToken,
        on_ready: Callback<C, Arc<ElevationField>>,
    },
    Mesh {
        field: Arc<ElevationField>,
        lod: u8,
        token: GenerationToken,
        on_ready: Callback<C, MeshResult>,
    },
}

struct Completed<C, T> {
    on_ready: Callback<C, T>,
    result: T,
}

/// Work drained from the completion queues, ready to run against a context.
pub struct Completions<C> {
    elevation: Vec<Completed<C, Arc<ElevationField>>>,
    mesh: Vec<Completed<C, MeshResult>>,
}

impl<C> Completions<C> {
    /// Number of drained callbacks.
    pub fn len(&self) -> usize {
        self.elevation.len() + self.mesh.len()
    }

    /// True when nothing was drained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every callback, elevation results first. Returns how many ran.
    pub fn dispatch(self, ctx: &mut C) -> usize {
        let count = self.len();
        for done in self.elevation {
            (done.on_ready)(ctx, done.result);
        }
        for done in self.mesh {
            (done.on_ready)(ctx, done.result);
        }
        count
    }
}

struct Shared {
    generator: ElevationGenerator,
    builder: SurfaceMeshBuilder,
    chunk_size: f64,
    shutdown: AtomicBool,
    in_flight: AtomicUsize,
    elevations_generated: AtomicU64,
    meshes_built: AtomicU64,
    cancelled: AtomicU64,
    mesh_failures: AtomicU64,
}

/// Bounded worker pool for elevation and mesh generation.
///
/// `C` is the consumer context handed to callbacks when completions are dispatched.
pub struct GenerationPipeline<C> {
    job_sender: Option<Sender<Job<C>>>,
    elevation_receiver: Option<Receiver<Completed<C, Arc<ElevationField>>>>,
    mesh_receiver: Option<Receiver<Completed<C, MeshResult>>>,
    backlog: VecDeque<Job<C>>,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl<C: 'static> GenerationPipeline<C> {
    /// Spawn the worker pool. `chunk_size` converts grid coordinates to world centres.
    pub fn new(
        generator: ElevationGenerator,
        builder: SurfaceMeshBuilder,
        chunk_size: f64,
        settings: &PipelineSettings,
    ) -> Self {
        let (job_sender, job_receiver) = bounded::<Job<C>>(settings.queue_capacity);
        let (elevation_sender, elevation_receiver) = bounded(settings.result_capacity);
        let (mesh_sender, mesh_receiver) = bounded(settings.result_capacity);
        let shared = Arc::new(Shared {
            generator,
            builder,
            chunk_size,
            shutdown: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            elevations_generated: AtomicU64::new(0),
            meshes_built: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            mesh_failures: AtomicU64::new(0),
        });

        let thread_count = settings.resolved_worker_threads();
        let mut workers = Vec::with_capacity(thread_count);
        for index in 0..thread_count {
            let jobs = job_receiver.clone();
            let elevation_sender = elevation_sender.clone();
            let mesh_sender = mesh_sender.clone();
            let shared = Arc::clone(&shared);

            let handle = std::thread::Builder::new()
                .name(format!("terrain-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = jobs.recv() {
                        if !shared.shutdown.load(Ordering::Acquire) {
                            run_job(&shared, job, &elevation_sender, &mesh_sender);
                        }
                        shared.in_flight.fetch_sub(1, Ordering::AcqRel);
                    }
                })
                .expect("Failed to spawn terrain worker thread");
            workers.push(handle);
        }
        debug!(workers = thread_count, "generation pipeline started");

        Self {
            job_sender: Some(job_sender),
            elevation_receiver: Some(elevation_receiver),
            mesh_receiver: Some(mesh_receiver),
            backlog: VecDeque::new(),
            shared,
            workers,
        }
    }

    /// Queue elevation generation for the chunk at `coordinate`.
    pub fn request_elevation(
        &mut self,
        coordinate: GridCoordinate,
        token: GenerationToken,
        on_ready: impl FnOnce(&mut C, Arc<ElevationField>) + Send + 'static,
    ) {
        self.submit(Job::Elevation {
            coordinate,
            token,
            on_ready: Box::new(on_ready),
        });
    }

    /// Queue a mesh build of `field` at `lod`.
    pub fn request_mesh(
        &mut self,
        field: Arc<ElevationField>,
        lod: u8,
        token: GenerationToken,
        on_ready: impl FnOnce(&mut C, MeshResult) + Send + 'static,
    ) {
        self.submit(Job::Mesh {
            field,
            lod,
            token,
            on_ready: Box::new(on_ready),
        });
    }
}

impl<C> GenerationPipeline<C> {
    fn submit(&mut self, job: Job<C>) {
        if self.backlog.is_empty() {
            if let Some(job) = self.try_dispatch(job) {
                self.backlog.push_back(job);
            }
        } else {
            self.backlog.push_back(job);
        }
    }

    /// Hand `job` to the workers. Returns it if the queue is full.
    fn try_dispatch(&self, job: Job<C>) -> Option<Job<C>> {
        let Some(sender) = &self.job_sender else {
            warn!("generation pipeline is shut down, dropping request");
            return None;
        };
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        match sender.try_send(job) {
            Ok(()) => None,
            Err(TrySendError::Full(job)) => {
                self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
                Some(job)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
                warn!("generation workers are gone, dropping request");
                None
            }
        }
    }

    fn flush_backlog(&mut self) {
        while let Some(job) = self.backlog.pop_front() {
            if let Some(job) = self.try_dispatch(job) {
                self.backlog.push_front(job);
                break;
            }
        }
    }

    /// Move backlog into the job queue and drain everything completed so far.
    ///
    /// Only entries present when the call starts are taken, so a worker finishing
    /// during the drain cannot extend it.
    pub fn take_completions(&mut self) -> Completions<C> {
        self.flush_backlog();
        Completions {
            elevation: drain_available(self.elevation_receiver.as_ref()),
            mesh: drain_available(self.mesh_receiver.as_ref()),
        }
    }

    /// [`take_completions`](Self::take_completions) and dispatch against `ctx`.
    pub fn poll(&mut self, ctx: &mut C) -> usize {
        self.take_completions().dispatch(ctx)
    }

    /// Jobs queued to or running on workers.
    pub fn in_flight_count(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Requests parked while the job queue is full.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Completed results waiting to be dispatched.
    pub fn pending_results(&self) -> usize {
        self.elevation_receiver.as_ref().map_or(0, Receiver::len)
            + self.mesh_receiver.as_ref().map_or(0, Receiver::len)
    }

    /// True when nothing is queued, running, or waiting for dispatch.
    pub fn is_idle(&self) -> bool {
        self.in_flight_count() == 0 && self.backlog.is_empty() && self.pending_results() == 0
    }

    /// Live worker threads; zero after shutdown.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            elevations_generated: self.shared.elevations_generated.load(Ordering::Relaxed),
            meshes_built: self.shared.meshes_built.load(Ordering::Relaxed),
            cancelled: self.shared.cancelled.load(Ordering::Relaxed),
            mesh_failures: self.shared.mesh_failures.load(Ordering::Relaxed),
            in_flight: self.in_flight_count(),
            backlog: self.backlog.len(),
        }
    }

    /// Stop the workers. Queued jobs are skipped and threads are joined.
    pub fn shutdown(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.backlog.clear();
        self.job_sender.take();
        // Dropping the receivers unblocks workers waiting on a full completion queue.
        self.elevation_receiver.take();
        self.mesh_receiver.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl<C> Drop for GenerationPipeline<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain_available<T>(receiver: Option<&Receiver<T>>) -> Vec<T> {
    let Some(receiver) = receiver else {
        return Vec::new();
    };
    let available = receiver.len();
    let mut drained = Vec::with_capacity(available);
    for _ in 0..available {
        match receiver.try_recv() {
            Ok(item) => drained.push(item),
            Err(_) => break,
        }
    }
    drained
}

fn run_job<C>(
    shared: &Shared,
    job: Job<C>,
    elevation_sender: &Sender<Completed<C, Arc<ElevationField>>>,
    mesh_sender: &Sender<Completed<C, MeshResult>>,
) {
    match job {
        Job::Elevation {
            coordinate,
            token,
            on_ready,
        } => {
            if token.is_cancelled() {
                shared.cancelled.fetch_add(1, Ordering::Relaxed);
                return;
            }
            let field = shared
                .generator
                .generate(coordinate.world_centre(shared.chunk_size));
            shared.elevations_generated.fetch_add(1, Ordering::Relaxed);
            if token.is_cancelled() {
                shared.cancelled.fetch_add(1, Ordering::Relaxed);
                return;
            }
            let _ = elevation_sender.send(Completed {
                on_ready,
                result: Arc::new(field),
            });
        }
        Job::Mesh {
            field,
            lod,
            token,
            on_ready,
        } => {
            if token.is_cancelled() {
                shared.cancelled.fetch_add(1, Ordering::Relaxed);
                return;
            }
            let result = shared.builder.build(&field, lod).map(Arc::new);
            match &result {
                Ok(_) => shared.meshes_built.fetch_add(1, Ordering::Relaxed),
                Err(_) => shared.mesh_failures.fetch_add(1, Ordering::Relaxed),
            };
            if token.is_cancelled() {
                shared.cancelled.fetch_add(1, Ordering::Relaxed);
                return;
            }
            let _ = mesh_sender.send(Completed { on_ready, result });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use horizon_mesh::HeightCurve;
    use horizon_terrain::{BiomeClassifier, BiomeRegion, Color, NoiseParams};

    use glam::DVec2;

    const CHUNK: usize = 16;

    #[derive(Default)]
    struct Sink {
        fields: Vec<(GridCoordinate, Arc<ElevationField>)>,
        meshes: Vec<(u8, MeshResult)>,
    }

    fn pipeline(workers: usize, queue: usize) -> GenerationPipeline<Sink> {
        pipeline_with_results(workers, queue, 8)
    }

    fn pipeline_with_results(
        workers: usize,
        queue: usize,
        results: usize,
    ) -> GenerationPipeline<Sink> {
        let classifier =
            BiomeClassifier::new(vec![BiomeRegion::new("all", 1.0, Color::WHITE)]).unwrap();
        let generator = ElevationGenerator::new(
            NoiseParams {
                scale: 10.0,
                ..Default::default()
            },
            classifier,
            CHUNK + 3,
            DVec2::ZERO,
            false,
        );
        let builder = SurfaceMeshBuilder::new(CHUNK + 1, 10.0, HeightCurve::linear()).unwrap();
        GenerationPipeline::new(
            generator,
            builder,
            CHUNK as f64,
            &PipelineSettings {
                worker_threads: workers,
                queue_capacity: queue,
                result_capacity: results,
            },
        )
    }

    fn request_field(pipeline: &mut GenerationPipeline<Sink>, coord: GridCoordinate) {
        pipeline.request_elevation(coord, GenerationToken::new(), move |sink: &mut Sink, f| {
            sink.fields.push((coord, f))
        });
    }

    fn poll_until(
        pipeline: &mut GenerationPipeline<Sink>,
        sink: &mut Sink,
        done: impl Fn(&GenerationPipeline<Sink>, &Sink) -> bool,
    ) {
        let start = Instant::now();
        while !done(pipeline, sink) {
            pipeline.poll(sink);
            assert!(
                start.elapsed() < Duration::from_secs(10),
                "Timed out waiting for pipeline"
            );
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// A requested field arrives through the callback with the generator's size.
    #[test]
    fn test_elevation_request_delivers_field() {
        let mut pipeline = pipeline(2, 8);
        let mut sink = Sink::default();
        request_field(&mut pipeline, GridCoordinate::new(2, -1));
        poll_until(&mut pipeline, &mut sink, |_, s| !s.fields.is_empty());

        let (coord, field) = &sink.fields[0];
        assert_eq!(*coord, GridCoordinate::new(2, -1));
        assert_eq!(field.size(), CHUNK + 3);
        assert_eq!(pipeline.stats().elevations_generated, 1);
    }

    /// Worker output matches a direct synchronous generation at the chunk centre.
    #[test]
    fn test_elevation_matches_synchronous_generation() {
        let mut pipeline = pipeline(1, 4);
        let mut sink = Sink::default();
        let coord = GridCoordinate::new(-3, 5);
        request_field(&mut pipeline, coord);
        poll_until(&mut pipeline, &mut sink, |_, s| !s.fields.is_empty());

        let direct = pipeline
            .shared
            .generator
            .generate(coord.world_centre(CHUNK as f64));
        assert_eq!(*sink.fields[0].1, direct);
    }

    #[test]
    fn test_mesh_request_builds_mesh() {
        let mut pipeline = pipeline(1, 4);
        let mut sink = Sink::default();
        request_field(&mut pipeline, GridCoordinate::new(0, 0));
        poll_until(&mut pipeline, &mut sink, |_, s| !s.fields.is_empty());

        let field = Arc::clone(&sink.fields[0].1);
        pipeline.request_mesh(field, 1, GenerationToken::new(), |sink: &mut Sink, mesh| {
            sink.meshes.push((1, mesh))
        });
        poll_until(&mut pipeline, &mut sink, |_, s| !s.meshes.is_empty());

        let (lod, mesh) = &sink.meshes[0];
        assert_eq!(*lod, 1);
        assert_eq!(mesh.as_ref().unwrap().lod(), 1);
        assert_eq!(pipeline.stats().meshes_built, 1);
    }

    /// A wrongly sized field is reported through the callback, not a panic.
    #[test]
    fn test_mesh_size_mismatch_reported() {
        let mut pipeline = pipeline(1, 4);
        let mut sink = Sink::default();
        let field = Arc::new(ElevationField::from_heights(5, vec![0.0; 25]));
        pipeline.request_mesh(field, 0, GenerationToken::new(), |sink: &mut Sink, mesh| {
            sink.meshes.push((0, mesh))
        });
        poll_until(&mut pipeline, &mut sink, |_, s| !s.meshes.is_empty());

        assert!(matches!(
            sink.meshes[0].1,
            Err(MeshError::SizeMismatch { actual: 5, .. })
        ));
        assert_eq!(pipeline.stats().mesh_failures, 1);
    }

    /// Requests beyond the job queue capacity wait in the backlog and are never lost.
    #[test]
    fn test_backpressure_parks_requests_in_backlog() {
        // With one completion slot and no polling, at most three jobs leave the
        // consumer: one completed, one blocked in the worker, one queued.
        let mut pipeline = pipeline_with_results(1, 1, 1);
        let mut sink = Sink::default();
        for i in 0..12 {
            request_field(&mut pipeline, GridCoordinate::new(i, 0));
        }
        assert!(pipeline.backlog_len() >= 9);
        assert_eq!(pipeline.stats().backlog, pipeline.backlog_len());

        poll_until(&mut pipeline, &mut sink, |_, s| s.fields.len() == 12);
        assert!(pipeline.is_idle());

        let mut coords: Vec<i32> = sink.fields.iter().map(|(c, _)| c.x).collect();
        coords.sort_unstable();
        assert_eq!(coords, (0..12).collect::<Vec<_>>());
    }

    /// Cancelled requests never reach their callback.
    #[test]
    fn test_cancelled_requests_are_dropped() {
        let mut pipeline = pipeline(1, 16);
        let mut sink = Sink::default();
        let token = GenerationToken::new();
        token.cancel();
        for i in 0..5 {
            let coord = GridCoordinate::new(i, i);
            pipeline.request_elevation(coord, token.clone(), move |sink: &mut Sink, f| {
                sink.fields.push((coord, f))
            });
        }
        request_field(&mut pipeline, GridCoordinate::new(9, 9));

        poll_until(&mut pipeline, &mut sink, |p, _| p.is_idle());
        pipeline.poll(&mut sink);

        assert_eq!(sink.fields.len(), 1);
        assert_eq!(sink.fields[0].0, GridCoordinate::new(9, 9));
        assert_eq!(pipeline.stats().cancelled, 5);
    }

    #[test]
    fn test_token_is_shared_between_clones() {
        let token = GenerationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_shutdown_joins_workers_with_pending_work() {
        let mut pipeline = pipeline(2, 2);
        for i in 0..20 {
            request_field(&mut pipeline, GridCoordinate::new(i, 0));
        }
        assert_eq!(pipeline.worker_count(), 2);
        pipeline.shutdown();
        assert_eq!(pipeline.worker_count(), 0);
        assert_eq!(pipeline.backlog_len(), 0);

        // Requests after shutdown are dropped without panicking.
        request_field(&mut pipeline, GridCoordinate::new(0, 1));
        assert!(pipeline.take_completions().is_empty());
    }
}
