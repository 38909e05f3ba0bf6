//! Run-level errors for pyramid generation.
//!
//! Per-tile problems are not errors here; they are counted in the
//! [`RenderSummary`]. Only conditions that stop the whole run appear below.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::report::RenderSummary;
use crate::coord::CoordError;
use crate::tile::TileError;

/// Errors that halt a pyramid run.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// Bounding box or zoom range cannot be planned.
    #[error("invalid pyramid parameters: {0}")]
    Coord(#[from] CoordError),

    /// Region names become a directory; separators and empty names are rejected.
    #[error("invalid region name '{0}'")]
    InvalidRegion(String),

    /// The region's output directory cannot be created.
    #[error("failed to create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Measuring the blank-tile size failed.
    #[error("empty-tile calibration failed: {0}")]
    Calibration(#[source] TileError),

    /// Not a single worker thread could be spawned.
    #[error("failed to spawn render workers: {0}")]
    Spawn(#[source] io::Error),

    /// Every worker exited before the work was done.
    #[error("no render workers available ({} startup errors)", summary.worker_errors.len())]
    NoWorkers { summary: RenderSummary },

    /// The run was interrupted; the summary covers what was resolved.
    #[error("rendering cancelled ({summary})")]
    Cancelled { summary: RenderSummary },
}

impl PyramidError {
    /// Partial results, for errors raised after workers started.
    pub fn summary(&self) -> Option<&RenderSummary> {
        match self {
            PyramidError::NoWorkers { summary } | PyramidError::Cancelled { summary } => {
                Some(summary)
            }
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PyramidError::Cancelled { .. })
    }
}
