//! Parameters of a single pyramid run.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

use super::error::PyramidError;
use crate::coord::{BoundingBox, ZoomRange};
use crate::render::MIN_BUFFER_SIZE;
use crate::tile::{EmptyTilePolicy, RowScheme};

/// Capacity of the bounded render queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Worker count when none is configured: one per available core.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// What to render and where.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use tilegen::coord::{BoundingBox, ZoomRange};
/// use tilegen::pyramid::PyramidConfig;
/// use tilegen::tile::RowScheme;
///
/// let config = PyramidConfig::new(
///     BoundingBox::new(-90.0, 40.0, -89.0, 41.0).unwrap(),
///     ZoomRange::new(0, 2).unwrap(),
///     Path::new("/tmp/tiles"),
///     "midwest",
/// )
/// .with_workers(4)
/// .with_row_scheme(RowScheme::Tms);
///
/// assert_eq!(config.workers(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PyramidConfig {
    bbox: BoundingBox,
    zooms: ZoomRange,
    output_root: PathBuf,
    region: String,
    workers: usize,
    queue_capacity: usize,
    row_scheme: RowScheme,
    buffer_size: u32,
    empty_tiles: EmptyTilePolicy,
}

impl PyramidConfig {
    pub fn new(
        bbox: BoundingBox,
        zooms: ZoomRange,
        output_root: &Path,
        region: impl Into<String>,
    ) -> Self {
        Self {
            bbox,
            zooms,
            output_root: output_root.to_path_buf(),
            region: region.into(),
            workers: default_worker_count(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            row_scheme: RowScheme::default(),
            buffer_size: MIN_BUFFER_SIZE,
            empty_tiles: EmptyTilePolicy::default(),
        }
    }

    /// Number of worker threads; values below one are raised to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Queue capacity; values below one are raised to one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_row_scheme(mut self, scheme: RowScheme) -> Self {
        self.row_scheme = scheme;
        self
    }

    /// Render margin in pixels; never below [`MIN_BUFFER_SIZE`].
    pub fn with_buffer_size(mut self, pixels: u32) -> Self {
        self.buffer_size = pixels.max(MIN_BUFFER_SIZE);
        self
    }

    pub fn with_empty_tiles(mut self, policy: EmptyTilePolicy) -> Self {
        self.empty_tiles = policy;
        self
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn zooms(&self) -> ZoomRange {
        self.zooms
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn row_scheme(&self) -> RowScheme {
        self.row_scheme
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    pub fn empty_tiles(&self) -> EmptyTilePolicy {
        self.empty_tiles
    }

    /// Reject region names that would escape the output root.
    pub fn validate(&self) -> Result<(), PyramidError> {
        let region = self.region.as_str();
        let bad = region.is_empty()
            || region == "."
            || region == ".."
            || region.contains(['/', '\\'])
            || region.trim() != region;
        if bad {
            return Err(PyramidError::InvalidRegion(self.region.clone()));
        }
        Ok(())
    }
}
