//! Coordinate conversion module
//!
//! Provides the geographic and tile coordinate types used throughout the
//! pyramid generator, and the spherical Mercator [`ProjectionTable`] that
//! maps between degrees, global pixel space and tile indices.

mod projection;
mod types;

pub use projection::{LevelScale, PixelPoint, ProjectionTable, MERCATOR_SIN_LIMIT};
pub use types::{
    tiles_per_side, BoundingBox, CoordError, TileIndex, TileRange, ZoomRange, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, TILE_SIZE,
};
