//! Tile ranges covered by a run.

use crate::coord::{BoundingBox, CoordError, ProjectionTable, TileIndex, TileRange, ZoomRange};

/// The per-zoom tile ranges a bounding box covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidPlan {
    levels: Vec<TileRange>,
}

impl PyramidPlan {
    /// Compute the covered range for every zoom in `zooms`.
    ///
    /// # Errors
    ///
    /// Fails if `projection` has fewer levels than `zooms.max() + 1`.
    pub fn new(
        projection: &ProjectionTable,
        bbox: &BoundingBox,
        zooms: ZoomRange,
    ) -> Result<Self, CoordError> {
        let levels = zooms
            .iter()
            .map(|z| projection.tile_range(bbox, z))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { levels })
    }

    /// Ranges in ascending zoom order.
    pub fn levels(&self) -> &[TileRange] {
        &self.levels
    }

    /// Total number of tiles to enqueue.
    pub fn tile_count(&self) -> u64 {
        self.levels.iter().map(TileRange::count).sum()
    }

    /// All tiles in submission order: zoom ascending, then column, then row.
    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.levels.iter().flat_map(|range| range.iter())
    }
}
