//! Pyramid orchestrator: the producer side of the render queue.
//!
//! Spawns the worker pool, walks the plan zoom by zoom, creates the output
//! directories and feeds one task per tile into a bounded queue. The queue
//! bound keeps the producer at most `queue_capacity` tiles ahead of the
//! workers. Once every task is queued, one shutdown message per worker
//! follows and the workers are joined.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{SendTimeoutError, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use super::config::PyramidConfig;
use super::error::PyramidError;
use super::plan::PyramidPlan;
use super::progress::{NoopObserver, ProgressObserver};
use super::report::RenderSummary;
use super::worker::{RenderWorker, WorkerContext};
use crate::coord::{ProjectionTable, TileIndex};
use crate::render::{RenderError, RendererFactory};
use crate::tile::{ensure_dir, TileEncoder, TileLayout, TileTask, WorkItem};

/// How long a blocked enqueue waits before checking for cancellation again.
const SEND_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why submission stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitStop {
    Cancelled,
    Disconnected,
}

type WorkerHandle = JoinHandle<Result<RenderSummary, RenderError>>;

/// Renders the tile pyramid for one region.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tilegen::coord::{BoundingBox, ZoomRange};
/// use tilegen::pyramid::{PyramidConfig, PyramidRenderer};
/// use tilegen::render::GraticuleRendererFactory;
///
/// let config = PyramidConfig::new(
///     BoundingBox::world(),
///     ZoomRange::new(0, 4).unwrap(),
///     Path::new("./tiles"),
///     "world",
/// );
/// let summary = PyramidRenderer::new(config, GraticuleRendererFactory::default())
///     .run()
///     .unwrap();
/// println!("{}", summary);
/// ```
pub struct PyramidRenderer<F: RendererFactory> {
    config: PyramidConfig,
    factory: Arc<F>,
    observer: Arc<dyn ProgressObserver>,
    cancel: CancellationToken,
}

impl<F> PyramidRenderer<F>
where
    F: RendererFactory + 'static,
{
    pub fn new(config: PyramidConfig, factory: F) -> Self {
        Self::with_shared_factory(config, Arc::new(factory))
    }

    /// Build from a factory shared with other runs (batch rendering).
    pub fn with_shared_factory(config: PyramidConfig, factory: Arc<F>) -> Self {
        Self {
            config,
            factory,
            observer: Arc::new(NoopObserver),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use an externally owned token, e.g. one cancelled by a signal handler.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops this run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PyramidConfig {
        &self.config
    }

    /// Tile ranges the run will cover, without rendering anything.
    pub fn plan(&self) -> Result<PyramidPlan, PyramidError> {
        let projection = ProjectionTable::new(self.config.zooms().levels());
        Ok(PyramidPlan::new(
            &projection,
            self.config.bbox(),
            self.config.zooms(),
        )?)
    }

    /// Render every tile of the pyramid and wait for completion.
    ///
    /// Per-tile failures do not abort the run; they are listed in the
    /// returned summary.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::Cancelled`] if the token fired before all tiles
    ///   were resolved. Tiles already written stay on disk.
    /// - [`PyramidError::NoWorkers`] if every worker failed to start.
    /// - Setup errors (invalid region, unwritable output root, calibration).
    pub fn run(&self) -> Result<RenderSummary, PyramidError> {
        let started = Instant::now();
        let config = &self.config;
        config.validate()?;

        let projection = Arc::new(ProjectionTable::new(config.zooms().levels()));
        let plan = PyramidPlan::new(&projection, config.bbox(), config.zooms())?;
        let total = plan.tile_count();

        info!(
            region = config.region(),
            bbox = %config.bbox(),
            zooms = %config.zooms(),
            tiles = total,
            workers = config.workers(),
            scheme = %config.row_scheme(),
            "Rendering tile pyramid"
        );
        self.observer.on_planned(total);

        let encoder = TileEncoder::new();
        let empty_tile_bytes = config
            .empty_tiles()
            .signature(&encoder)
            .map_err(PyramidError::Calibration)?;
        if let Some(bytes) = empty_tile_bytes {
            debug!(bytes, "Empty tile signature");
        }

        let layout = TileLayout::new(config.output_root(), config.region(), config.row_scheme());
        ensure_dir(layout.region_dir()).map_err(|source| PyramidError::Io {
            path: layout.region_dir().to_path_buf(),
            source,
        })?;

        let ctx = WorkerContext {
            projection,
            encoder,
            empty_tile_bytes,
            buffer_size: config.buffer_size(),
            cancel: self.cancel.clone(),
            observer: Arc::clone(&self.observer),
        };

        let (sender, receiver) = crossbeam_channel::bounded(config.queue_capacity());
        let handles = self.spawn_workers(&ctx, receiver)?;

        let submitted = self.submit(&plan, &layout, &sender);

        // One shutdown per worker. A failed send means every worker is gone.
        for _ in 0..handles.len() {
            if sender.send(WorkItem::Shutdown).is_err() {
                break;
            }
        }
        drop(sender);

        let spawned = handles.len();
        let mut summary = join_workers(handles);
        summary.elapsed = started.elapsed();

        let all_workers_failed = summary.worker_errors.len() == spawned;
        if submitted == Err(SubmitStop::Disconnected) || (all_workers_failed && total > 0) {
            error!(
                region = config.region(),
                errors = ?summary.worker_errors,
                "No render workers available"
            );
            return Err(PyramidError::NoWorkers { summary });
        }

        if submitted == Err(SubmitStop::Cancelled) || summary.abandoned > 0 {
            warn!(region = config.region(), %summary, "Rendering cancelled");
            return Err(PyramidError::Cancelled { summary });
        }

        if summary.failed > 0 {
            warn!(region = config.region(), %summary, "Pyramid finished with failures");
        } else {
            info!(region = config.region(), %summary, "Pyramid complete");
        }
        Ok(summary)
    }

    fn spawn_workers(
        &self,
        ctx: &WorkerContext,
        receiver: crossbeam_channel::Receiver<WorkItem>,
    ) -> Result<Vec<WorkerHandle>, PyramidError> {
        let mut handles = Vec::with_capacity(self.config.workers());

        for id in 0..self.config.workers() {
            let receiver = receiver.clone();
            let factory = Arc::clone(&self.factory);
            let ctx = ctx.clone();

            let spawned = thread::Builder::new()
                .name(format!("tilegen-worker-{}", id))
                .spawn(move || -> Result<RenderSummary, RenderError> {
                    let span = info_span!("worker", id);
                    let _guard = span.enter();

                    let renderer = factory.create().map_err(|e| {
                        error!(error = %e, "Failed to create renderer");
                        e
                    })?;
                    debug!("Worker started");
                    Ok(RenderWorker::new(id, renderer, ctx).run(receiver))
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) if handles.is_empty() => return Err(PyramidError::Spawn(e)),
                Err(e) => {
                    warn!(spawned = handles.len(), error = %e, "Could not spawn all workers");
                    break;
                }
            }
        }

        Ok(handles)
    }

    /// Enqueue every planned tile, creating zoom and column directories
    /// along the way.
    fn submit(
        &self,
        plan: &PyramidPlan,
        layout: &TileLayout,
        sender: &Sender<WorkItem>,
    ) -> Result<(), SubmitStop> {
        let region: Arc<str> = Arc::from(self.config.region());

        for range in plan.levels() {
            let zoom_dir = layout.zoom_dir(range.zoom);
            if let Err(e) = ensure_dir(&zoom_dir) {
                warn!(path = %zoom_dir.display(), error = %e, "Failed to create zoom directory");
            }
            if range.is_empty() {
                continue;
            }

            info!(zoom = range.zoom, tiles = range.count(), "Queueing zoom level");

            for x in range.columns() {
                let column_dir = layout.column_dir(range.zoom, x);
                if let Err(e) = ensure_dir(&column_dir) {
                    // Tiles in this column will fail individually on write.
                    warn!(path = %column_dir.display(), error = %e, "Failed to create column directory");
                }

                for y in range.rows() {
                    let tile = TileIndex::new(range.zoom, x, y);
                    let task = TileTask::new(tile, layout.tile_path(&tile), Arc::clone(&region));
                    self.enqueue(sender, WorkItem::Render(task))?;
                    self.observer.on_queued(&tile);
                }
            }
        }

        Ok(())
    }

    /// Blocking send that gives up when the run is cancelled.
    fn enqueue(&self, sender: &Sender<WorkItem>, item: WorkItem) -> Result<(), SubmitStop> {
        let mut item = item;
        loop {
            if self.cancel.is_cancelled() {
                return Err(SubmitStop::Cancelled);
            }
            match sender.send_timeout(item, SEND_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => item = returned,
                Err(SendTimeoutError::Disconnected(_)) => return Err(SubmitStop::Disconnected),
            }
        }
    }
}

fn join_workers(handles: Vec<WorkerHandle>) -> RenderSummary {
    let mut summary = RenderSummary::default();
    for handle in handles {
        let name = handle.thread().name().unwrap_or("worker").to_string();
        match handle.join() {
            Ok(Ok(worker_summary)) => summary.merge(worker_summary),
            Ok(Err(e)) => summary.worker_errors.push(format!("{}: {}", name, e)),
            Err(_) => {
                error!(worker = %name, "Worker thread panicked");
                summary.worker_errors.push(format!("{}: panicked", name));
            }
        }
    }
    summary
}
