//! Tile pyramid generation.
//!
//! A run renders every tile covering a bounding box over a range of zoom
//! levels into `<output>/<region>/<z>/<x>/<y>.png`. The work is split into a
//! single producer and a pool of workers connected by a bounded queue:
//!
//! ```text
//! PyramidRenderer ──▶ bounded(queue_capacity) ──▶ RenderWorker × N
//!   (plan, mkdir,        WorkItem::Render           (skip existing, render,
//!    enqueue)            WorkItem::Shutdown          encode, write, prune)
//! ```
//!
//! Runs are idempotent: existing tiles are skipped, so an interrupted run
//! can be resumed by running it again.

mod config;
mod error;
mod orchestrator;
mod plan;
mod progress;
mod report;
mod worker;

pub use config::{default_worker_count, PyramidConfig, DEFAULT_QUEUE_CAPACITY};
pub use error::PyramidError;
pub use orchestrator::PyramidRenderer;
pub use plan::PyramidPlan;
pub use progress::{NoopObserver, ProgressObserver};
pub use report::{RenderSummary, TileFailure, TileOutcome};
