//! Render worker: the consumer side of the render queue.
//!
//! Each worker owns one renderer and resolves tasks until it receives
//! [`WorkItem::Shutdown`] or the queue disconnects. Resolving a task means:
//!
//! 1. Skip it if the destination already exists.
//! 2. Project the tile's geographic bounds into the renderer's native
//!    projection and render with a margin.
//! 3. Encode to PNG and write atomically.
//! 4. Delete the file again if its size marks it as empty.
//!
//! A failure at any step is recorded against the tile and the worker carries
//! on with the next task.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use image::RgbaImage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::progress::ProgressObserver;
use super::report::{RenderSummary, TileFailure, TileOutcome};
use crate::coord::ProjectionTable;
use crate::render::{NativeBounds, RenderError, RenderRequest, TileRenderer};
use crate::tile::{file_size, remove_tile, write_atomic, TileEncoder, TileError, TileTask, WorkItem};

/// State shared by all workers of a run.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub projection: Arc<ProjectionTable>,
    pub encoder: TileEncoder,
    /// Encoded size that marks a tile as empty; `None` keeps every render.
    pub empty_tile_bytes: Option<u64>,
    pub buffer_size: u32,
    pub cancel: CancellationToken,
    pub observer: Arc<dyn ProgressObserver>,
}

/// Consumes tasks from the render queue with a renderer of its own.
pub(crate) struct RenderWorker<R: TileRenderer> {
    id: usize,
    renderer: R,
    ctx: WorkerContext,
}

impl<R: TileRenderer> RenderWorker<R> {
    pub fn new(id: usize, renderer: R, ctx: WorkerContext) -> Self {
        Self { id, renderer, ctx }
    }

    /// Drain `queue` until shutdown, returning this worker's tally.
    pub fn run(mut self, queue: Receiver<WorkItem>) -> RenderSummary {
        let mut summary = RenderSummary::default();

        loop {
            let task = match queue.recv() {
                Ok(WorkItem::Render(task)) => task,
                Ok(WorkItem::Shutdown) => {
                    debug!(worker = self.id, "Shutdown received");
                    break;
                }
                Err(_) => {
                    debug!(worker = self.id, "Render queue closed");
                    break;
                }
            };

            let outcome = if self.ctx.cancel.is_cancelled() {
                TileOutcome::Abandoned { tile: task.index() }
            } else {
                self.resolve(&task)
            };

            self.ctx.observer.on_tile(&outcome);
            summary.record(outcome);
        }

        debug!(worker = self.id, %summary, "Worker finished");
        summary
    }

    /// Resolve one task to an outcome. Never fails; errors become
    /// [`TileOutcome::Failed`].
    pub fn resolve(&mut self, task: &TileTask) -> TileOutcome {
        let tile = task.index();
        let path = task.path().to_path_buf();

        if path.exists() {
            debug!(%tile, path = %path.display(), "Tile exists, skipping");
            return TileOutcome::Skipped { tile, path };
        }

        match self.render_to_file(task) {
            Ok(bytes) if Some(bytes) == self.ctx.empty_tile_bytes => {
                if let Err(e) = remove_tile(&path) {
                    return self.failed(task, e);
                }
                debug!(%tile, region = task.region(), "Empty tile removed");
                TileOutcome::Empty { tile, path }
            }
            Ok(bytes) => {
                debug!(%tile, region = task.region(), bytes, "Tile rendered");
                TileOutcome::Rendered { tile, path, bytes }
            }
            Err(e) => self.failed(task, e),
        }
    }

    fn failed(&self, task: &TileTask, error: TileError) -> TileOutcome {
        warn!(
            worker = self.id,
            tile = %task.index(),
            path = %task.path().display(),
            error = %error,
            "Tile failed"
        );
        TileOutcome::Failed(TileFailure {
            tile: task.index(),
            path: task.path().to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Render, encode and write the tile; returns the size on disk.
    fn render_to_file(&mut self, task: &TileTask) -> Result<u64, TileError> {
        let tile = task.index();
        let geo = self.ctx.projection.tile_bounds(&tile)?;

        let native = self.renderer.projection();
        let bounds = NativeBounds::from_corners(
            native.forward(geo.west(), geo.south()),
            native.forward(geo.east(), geo.north()),
        );
        let request = RenderRequest::tile(tile, bounds, self.ctx.buffer_size);

        let image = self.render_guarded(&request)?;
        let png = self.ctx.encoder.encode(&image)?;
        write_atomic(task.path(), &png)?;
        file_size(task.path())
    }

    /// Call the renderer, turning a panic into an error for this tile.
    fn render_guarded(&mut self, request: &RenderRequest) -> Result<RgbaImage, RenderError> {
        let renderer = &mut self.renderer;
        let image = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(request)))
            .map_err(|payload| RenderError::Panicked {
                tile: request.tile,
                message: panic_message(payload.as_ref()),
            })??;

        if image.width() != request.width || image.height() != request.height {
            return Err(RenderError::SizeMismatch {
                tile: request.tile,
                width: request.width,
                height: request.height,
                actual_width: image.width(),
                actual_height: image.height(),
            });
        }
        Ok(image)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileIndex;
    use crate::pyramid::progress::NoopObserver;
    use crate::render::{MapProjection, SphericalMercator};
    use image::Rgba;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Test renderer whose behaviour depends on the tile column.
    ///
    /// Column 0 draws a diagonal, column 1 is blank, column 2 errors,
    /// column 3 panics and column 4 returns the wrong size.
    struct ScriptedRenderer {
        projection: SphericalMercator,
        calls: usize,
    }

    impl ScriptedRenderer {
        fn new() -> Self {
            Self {
                projection: SphericalMercator,
                calls: 0,
            }
        }
    }

    impl TileRenderer for ScriptedRenderer {
        fn projection(&self) -> &dyn MapProjection {
            &self.projection
        }

        fn render(&mut self, request: &RenderRequest) -> Result<RgbaImage, RenderError> {
            self.calls += 1;
            match request.tile.x {
                0 => {
                    let mut image = RgbaImage::new(request.width, request.height);
                    for i in 0..request.width.min(request.height) {
                        image.put_pixel(i, i, Rgba([255, 0, 0, 255]));
                    }
                    Ok(image)
                }
                1 => Ok(RgbaImage::new(request.width, request.height)),
                2 => Err(RenderError::Failed {
                    tile: request.tile,
                    reason: "datasource offline".to_string(),
                }),
                3 => panic!("renderer exploded"),
                _ => Ok(RgbaImage::new(16, 16)),
            }
        }
    }

    fn context(cancel: CancellationToken) -> WorkerContext {
        let encoder = TileEncoder::new();
        WorkerContext {
            projection: Arc::new(ProjectionTable::new(4)),
            encoder,
            empty_tile_bytes: Some(encoder.blank_tile_size().unwrap()),
            buffer_size: 128,
            cancel,
            observer: Arc::new(NoopObserver),
        }
    }

    fn task(dir: &Path, x: u32) -> TileTask {
        let tile = TileIndex::new(3, x, 2);
        TileTask::new(tile, dir.join(format!("{}.png", x)), Arc::from("test"))
    }

    #[test]
    fn test_resolve_renders_and_keeps_drawn_tile() {
        let temp = TempDir::new().unwrap();
        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));

        let outcome = worker.resolve(&task(temp.path(), 0));
        match outcome {
            TileOutcome::Rendered { bytes, path, .. } => {
                assert_eq!(fs::metadata(&path).unwrap().len(), bytes);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_resolve_deletes_empty_tile() {
        let temp = TempDir::new().unwrap();
        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));

        let task = task(temp.path(), 1);
        let outcome = worker.resolve(&task);
        assert!(matches!(outcome, TileOutcome::Empty { .. }));
        assert!(!task.path().exists());
    }

    #[test]
    fn test_resolve_keeps_empty_tile_without_signature() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(CancellationToken::new());
        ctx.empty_tile_bytes = None;
        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), ctx);

        let task = task(temp.path(), 1);
        assert!(matches!(worker.resolve(&task), TileOutcome::Rendered { .. }));
        assert!(task.path().exists());
    }

    #[test]
    fn test_resolve_skips_existing_without_rendering() {
        let temp = TempDir::new().unwrap();
        let task = task(temp.path(), 0);
        fs::write(task.path(), b"already here").unwrap();

        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));
        assert!(matches!(worker.resolve(&task), TileOutcome::Skipped { .. }));
        assert_eq!(worker.renderer.calls, 0);
        assert_eq!(fs::read(task.path()).unwrap(), b"already here");
    }

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_skipped_tile_logged_at_debug() {
        let temp = TempDir::new().unwrap();
        let task = task(temp.path(), 0);
        fs::write(task.path(), b"already here").unwrap();

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));
        tracing::subscriber::with_default(subscriber, || {
            assert!(matches!(worker.resolve(&task), TileOutcome::Skipped { .. }));
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("DEBUG"), "{}", output);
        assert!(output.contains("Tile exists, skipping"), "{}", output);
    }

    #[test]
    fn test_resolve_records_render_error() {
        let temp = TempDir::new().unwrap();
        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));

        let task = task(temp.path(), 2);
        match worker.resolve(&task) {
            TileOutcome::Failed(failure) => {
                assert!(failure.message.contains("datasource offline"));
                assert_eq!(failure.tile, task.index());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!task.path().exists());
    }

    #[test]
    fn test_resolve_contains_panic() {
        let temp = TempDir::new().unwrap();
        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));

        match worker.resolve(&task(temp.path(), 3)) {
            TileOutcome::Failed(failure) => assert!(failure.message.contains("renderer exploded")),
            other => panic!("unexpected outcome {:?}", other),
        }

        // The worker is still usable afterwards.
        assert!(matches!(
            worker.resolve(&task(temp.path(), 0)),
            TileOutcome::Rendered { .. }
        ));
    }

    #[test]
    fn test_resolve_rejects_wrong_size() {
        let temp = TempDir::new().unwrap();
        let mut worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));

        match worker.resolve(&task(temp.path(), 4)) {
            TileOutcome::Failed(failure) => assert!(failure.message.contains("16x16")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let temp = TempDir::new().unwrap();
        let (tx, rx) = crossbeam_channel::bounded(8);
        tx.send(WorkItem::Render(task(temp.path(), 0))).unwrap();
        tx.send(WorkItem::Render(task(temp.path(), 1))).unwrap();
        tx.send(WorkItem::Shutdown).unwrap();
        tx.send(WorkItem::Render(task(temp.path(), 2))).unwrap();

        let worker = RenderWorker::new(0, ScriptedRenderer::new(), context(CancellationToken::new()));
        let summary = worker.run(rx);

        assert_eq!(summary.rendered, 1);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn test_run_abandons_after_cancel() {
        let temp = TempDir::new().unwrap();
        let (tx, rx) = crossbeam_channel::bounded(8);
        tx.send(WorkItem::Render(task(temp.path(), 0))).unwrap();
        tx.send(WorkItem::Render(task(temp.path(), 1))).unwrap();
        drop(tx);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let worker = RenderWorker::new(0, ScriptedRenderer::new(), context(cancel));
        let summary = worker.run(rx);

        assert_eq!(summary.abandoned, 2);
        assert_eq!(summary.rendered, 0);
        assert!(!temp.path().join("0.png").exists());
    }

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic");
    }
}
