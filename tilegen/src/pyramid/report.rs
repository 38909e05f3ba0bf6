//! Per-tile outcomes and the run summary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::coord::TileIndex;

/// A tile the worker could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFailure {
    pub tile: TileIndex,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for TileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.tile, self.path.display(), self.message)
    }
}

/// How a dequeued task was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOutcome {
    /// Rendered and kept.
    Rendered {
        tile: TileIndex,
        path: PathBuf,
        bytes: u64,
    },
    /// Destination already existed; not rendered again.
    Skipped { tile: TileIndex, path: PathBuf },
    /// Rendered, recognised as blank, and deleted.
    Empty { tile: TileIndex, path: PathBuf },
    /// Rendering or writing failed; nothing left at the destination.
    Failed(TileFailure),
    /// Dequeued after cancellation and dropped without rendering.
    Abandoned { tile: TileIndex },
}

impl TileOutcome {
    pub fn tile(&self) -> TileIndex {
        match self {
            TileOutcome::Rendered { tile, .. }
            | TileOutcome::Skipped { tile, .. }
            | TileOutcome::Empty { tile, .. }
            | TileOutcome::Abandoned { tile } => *tile,
            TileOutcome::Failed(failure) => failure.tile,
        }
    }

    /// Destination path, when the outcome concerns a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            TileOutcome::Rendered { path, .. }
            | TileOutcome::Skipped { path, .. }
            | TileOutcome::Empty { path, .. } => Some(path),
            TileOutcome::Failed(failure) => Some(&failure.path),
            TileOutcome::Abandoned { .. } => None,
        }
    }

    /// Short label used in logs and progress output.
    pub fn label(&self) -> &'static str {
        match self {
            TileOutcome::Rendered { .. } => "rendered",
            TileOutcome::Skipped { .. } => "exists",
            TileOutcome::Empty { .. } => "empty",
            TileOutcome::Failed(_) => "failed",
            TileOutcome::Abandoned { .. } => "abandoned",
        }
    }
}

/// Counts of resolved tiles for a run, merged from every worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub rendered: u64,
    pub skipped: u64,
    pub empty: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub failures: Vec<TileFailure>,
    /// Workers that could not start (renderer construction failed).
    pub worker_errors: Vec<String>,
    pub elapsed: Duration,
}

impl RenderSummary {
    /// Count one outcome.
    pub fn record(&mut self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Rendered { .. } => self.rendered += 1,
            TileOutcome::Skipped { .. } => self.skipped += 1,
            TileOutcome::Empty { .. } => self.empty += 1,
            TileOutcome::Abandoned { .. } => self.abandoned += 1,
            TileOutcome::Failed(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }

    /// Fold another worker's summary into this one.
    ///
    /// `elapsed` is left alone; the orchestrator sets it for the whole run.
    pub fn merge(&mut self, other: RenderSummary) {
        self.rendered += other.rendered;
        self.skipped += other.skipped;
        self.empty += other.empty;
        self.failed += other.failed;
        self.abandoned += other.abandoned;
        self.failures.extend(other.failures);
        self.worker_errors.extend(other.worker_errors);
    }

    /// Every task dequeued, however it was resolved.
    pub fn total(&self) -> u64 {
        self.rendered + self.skipped + self.empty + self.failed + self.abandoned
    }

    /// True when no tile failed and none was abandoned.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.abandoned == 0
    }
}

impl fmt::Display for RenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rendered, {} skipped, {} empty, {} failed",
            self.rendered, self.skipped, self.empty, self.failed
        )?;
        if self.abandoned > 0 {
            write!(f, ", {} abandoned", self.abandoned)?;
        }
        write!(f, " in {:.1}s", self.elapsed.as_secs_f64())
    }
}
