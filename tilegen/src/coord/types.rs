//! Geographic and tile coordinate types.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// Edge length of a raster tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level a pyramid may be built for.
///
/// At zoom 30 the tile grid is 2^30 tiles wide, which still fits `u32`
/// tile indices and keeps pixel coordinates exact in `f64`.
pub const MAX_ZOOM: u8 = 30;

/// Minimum longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Minimum latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Errors produced while validating or converting coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("invalid bounding box ({west}, {south}, {east}, {north}): {reason}")]
    InvalidBoundingBox {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        reason: String,
    },

    #[error("invalid zoom range {min}..={max}: {reason}")]
    InvalidZoomRange { min: u8, max: u8, reason: String },

    /// The projection table was built for fewer levels than requested.
    #[error("zoom {zoom} is outside the projection table (levels: {levels})")]
    ZoomOutOfTable { zoom: u8, levels: usize },

    #[error("cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },
}

// =============================================================================
// Bounding box
// =============================================================================

/// A geographic rectangle in degrees.
///
/// Longitudes run west → east and latitudes south → north. The box is
/// immutable once built; callers only derive pixel and tile ranges from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl BoundingBox {
    /// Create a validated bounding box.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::InvalidBoundingBox` if any edge is not finite,
    /// lies outside the geographic range, or the edges are inverted.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, CoordError> {
        let invalid = |reason: &str| CoordError::InvalidBoundingBox {
            west,
            south,
            east,
            north,
            reason: reason.to_string(),
        };

        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(invalid("coordinates must be finite"));
        }
        if !(MIN_LON..=MAX_LON).contains(&west) || !(MIN_LON..=MAX_LON).contains(&east) {
            return Err(invalid("longitude must be within -180..=180"));
        }
        if !(MIN_LAT..=MAX_LAT).contains(&south) || !(MIN_LAT..=MAX_LAT).contains(&north) {
            return Err(invalid("latitude must be within -90..=90"));
        }
        if west > east {
            return Err(invalid("west edge lies east of east edge"));
        }
        if south > north {
            return Err(invalid("south edge lies north of north edge"));
        }

        Ok(Self::from_edges(west, south, east, north))
    }

    /// Create a box from two opposite corners given in any order.
    ///
    /// Region outlines are often listed as segments whose end points run
    /// east to west or north to south; the edges are sorted so such a
    /// segment covers the tiles it touches. Range checks still apply.
    pub fn from_corners(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> Result<Self, CoordError> {
        Self::new(
            lon_a.min(lon_b),
            lat_a.min(lat_b),
            lon_a.max(lon_b),
            lat_a.max(lat_b),
        )
    }

    /// Parse `lon,lat,lon,lat` as two corners in any order.
    ///
    /// See [`BoundingBox::from_corners`]. The `FromStr` impl is strict.
    pub fn parse_corners(s: &str) -> Result<Self, CoordError> {
        let [a, b, c, d] = parse_four(s)?;
        Self::from_corners(a, b, c, d)
    }

    /// The whole world, as rendered by the overview pass.
    pub fn world() -> Self {
        Self::from_edges(MIN_LON, MIN_LAT, MAX_LON, MAX_LAT)
    }

    /// Build without validation. Used for boxes derived from tile corners.
    pub(crate) fn from_edges(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    /// North-west corner as `(lon, lat)`.
    pub fn north_west(&self) -> (f64, f64) {
        (self.west, self.north)
    }

    /// South-east corner as `(lon, lat)`.
    pub fn south_east(&self) -> (f64, f64) {
        (self.east, self.south)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.west, self.south, self.east, self.north
        )
    }
}

/// Parses `west,south,east,north`.
impl FromStr for BoundingBox {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [west, south, east, north] = parse_four(s)?;
        Self::new(west, south, east, north)
    }
}

/// Split `a,b,c,d` into four numbers.
fn parse_four(s: &str) -> Result<[f64; 4], CoordError> {
    let parse_error = |reason: &str| CoordError::Parse {
        input: s.to_string(),
        reason: reason.to_string(),
    };

    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| parse_error(&e.to_string()))?;

    match values.as_slice() {
        [a, b, c, d] => Ok([*a, *b, *c, *d]),
        _ => Err(parse_error("expected four values: west,south,east,north")),
    }
}

// =============================================================================
// Zoom range
// =============================================================================

/// Inclusive range of zoom levels `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoomRange {
    min: u8,
    max: u8,
}

impl ZoomRange {
    /// Create a validated zoom range.
    pub fn new(min: u8, max: u8) -> Result<Self, CoordError> {
        if min > max {
            return Err(CoordError::InvalidZoomRange {
                min,
                max,
                reason: "minimum zoom exceeds maximum zoom".to_string(),
            });
        }
        if max > MAX_ZOOM {
            return Err(CoordError::InvalidZoomRange {
                min,
                max,
                reason: format!("maximum supported zoom is {}", MAX_ZOOM),
            });
        }
        Ok(Self { min, max })
    }

    /// A range covering exactly one level.
    pub fn single(zoom: u8) -> Result<Self, CoordError> {
        Self::new(zoom, zoom)
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Number of projection levels needed to serve this range (`max + 1`).
    pub fn levels(&self) -> usize {
        self.max as usize + 1
    }

    /// Iterate the zoom levels in ascending order.
    pub fn iter(&self) -> RangeInclusive<u8> {
        self.min..=self.max
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Parses `N` or `MIN-MAX`.
impl FromStr for ZoomRange {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_zoom = |part: &str| {
            part.trim().parse::<u8>().map_err(|e| CoordError::Parse {
                input: s.to_string(),
                reason: e.to_string(),
            })
        };

        match s.split_once('-') {
            Some((min, max)) => Self::new(parse_zoom(min)?, parse_zoom(max)?),
            None => Self::single(parse_zoom(s)?),
        }
    }
}

// =============================================================================
// Tile index
// =============================================================================

/// Number of tiles along one axis at `zoom` (`2^zoom`).
#[inline]
pub fn tiles_per_side(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Address of one tile in the XYZ grid.
///
/// `y` grows southward from the top edge of the Mercator square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileIndex {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// True when both axes lie within `[0, 2^z)`.
    pub fn is_valid(&self) -> bool {
        self.z <= MAX_ZOOM && self.x < tiles_per_side(self.z) && self.y < tiles_per_side(self.z)
    }

    /// Row index in the inverted (TMS) addressing: `2^z - 1 - y`.
    ///
    /// Only meaningful for tiles inside the grid; see [`TileIndex::is_valid`].
    pub fn tms_row(&self) -> u32 {
        debug_assert!(self.is_valid(), "tile {} lies outside the grid", self);
        tiles_per_side(self.z) - 1 - self.y
    }

    /// Bottom-left corner of the tile in global pixel space.
    pub fn pixel_bottom_left(&self) -> (f64, f64) {
        let size = TILE_SIZE as f64;
        (self.x as f64 * size, (self.y as f64 + 1.0) * size)
    }

    /// Top-right corner of the tile in global pixel space.
    pub fn pixel_top_right(&self) -> (f64, f64) {
        let size = TILE_SIZE as f64;
        ((self.x as f64 + 1.0) * size, self.y as f64 * size)
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Inclusive rectangle of tile indices at one zoom level.
///
/// Already clamped to the valid grid; an empty range has `min > max` on
/// at least one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Clamp raw (possibly out-of-grid) index bounds to `[0, 2^zoom)`.
    ///
    /// Indices outside the grid are dropped, never wrapped.
    pub fn clamped(zoom: u8, raw_min_x: i64, raw_max_x: i64, raw_min_y: i64, raw_max_y: i64) -> Self {
        let last = tiles_per_side(zoom) as i64 - 1;
        let clamp_axis = |lo: i64, hi: i64| -> (u32, u32) {
            let lo = lo.max(0);
            let hi = hi.min(last);
            if lo > hi {
                // Empty axis: encode as min > max.
                (1, 0)
            } else {
                (lo as u32, hi as u32)
            }
        };

        let (min_x, max_x) = clamp_axis(raw_min_x, raw_max_x);
        let (min_y, max_y) = clamp_axis(raw_min_y, raw_max_y);

        Self {
            zoom,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn columns(&self) -> RangeInclusive<u32> {
        self.min_x..=self.max_x
    }

    pub fn rows(&self) -> RangeInclusive<u32> {
        self.min_y..=self.max_y
    }

    /// Number of tiles in the range.
    pub fn count(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (self.max_x - self.min_x + 1) as u64 * (self.max_y - self.min_y + 1) as u64
    }

    /// Iterate tiles column by column, rows ascending within each column.
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> + '_ {
        let zoom = self.zoom;
        self.columns()
            .flat_map(move |x| self.rows().map(move |y| TileIndex::new(zoom, x, y)))
    }
}
