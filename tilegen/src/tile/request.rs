//! Units of work passed through the render queue.
//!
//! A [`TileTask`] carries everything a worker needs to resolve one tile; a
//! [`WorkItem`] wraps it together with the shutdown message so consumers
//! have to handle both cases explicitly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::coord::TileIndex;

/// One tile to resolve: its index, where it goes on disk, and the region it
/// belongs to.
///
/// Created by the orchestrator, consumed exactly once by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileTask {
    index: TileIndex,
    path: PathBuf,
    region: Arc<str>,
}

impl TileTask {
    pub fn new(index: TileIndex, path: impl Into<PathBuf>, region: Arc<str>) -> Self {
        Self {
            index,
            path: path.into(),
            region,
        }
    }

    /// Tile index in XYZ addressing (independent of the output row scheme).
    pub fn index(&self) -> TileIndex {
        self.index
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Message on the render queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// Resolve this tile.
    Render(TileTask),
    /// No more work; the receiving worker exits its loop.
    Shutdown,
}
