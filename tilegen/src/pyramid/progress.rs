//! Progress reporting hooks.

use super::report::TileOutcome;
use crate::coord::TileIndex;

/// Receives progress events from a pyramid run.
///
/// `on_tile` is called from worker threads, concurrently; implementations
/// must synchronise their own state.
pub trait ProgressObserver: Send + Sync {
    /// Number of tiles the run will enqueue.
    fn on_planned(&self, _total: u64) {}

    /// A task was accepted by the render queue. Called from the producer
    /// thread, in submission order.
    fn on_queued(&self, _tile: &TileIndex) {}

    /// A task was resolved.
    fn on_tile(&self, _outcome: &TileOutcome) {}
}

/// Observer that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
