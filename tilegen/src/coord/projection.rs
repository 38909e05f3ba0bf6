//! Spherical Mercator pixel projection.
//!
//! [`ProjectionTable`] converts between geographic coordinates in degrees and
//! the global pixel square of side `256 · 2^zoom`. Per-level scale factors are
//! computed once at construction, so every conversion is O(1) and the table
//! can be shared read-only between worker threads.

use std::f64::consts::PI;

use super::types::{BoundingBox, CoordError, TileIndex, TileRange, TILE_SIZE};

/// `sin(lat)` is clamped to this magnitude before the Mercator log so that
/// the poles map to a finite pixel row.
pub const MERCATOR_SIN_LIMIT: f64 = 0.9999;

const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;

/// A position in global pixel space at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    /// Pixel coordinates rounded to the nearest integer, for tile addressing.
    pub fn rounded(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    /// Tile index along each axis containing the rounded pixel.
    ///
    /// May be negative or beyond the grid; callers clamp.
    pub fn tile(&self) -> (i64, i64) {
        let (x, y) = self.rounded();
        let size = TILE_SIZE as i64;
        (x.div_euclid(size), y.div_euclid(size))
    }
}

/// Scale constants for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelScale {
    /// Width and height of the pixel square (`256 · 2^zoom`).
    pub extent: f64,
    /// Pixels per degree of longitude.
    pub pixels_per_degree: f64,
    /// Pixels per radian, for the Mercator y transform.
    pub pixels_per_radian: f64,
    /// Pixel coordinate of lon = 0, lat = 0 on both axes.
    pub origin: f64,
}

impl LevelScale {
    fn for_zoom(zoom: usize) -> Self {
        let extent = TILE_SIZE as f64 * 2f64.powi(zoom as i32);
        Self {
            extent,
            pixels_per_degree: extent / 360.0,
            pixels_per_radian: extent / (2.0 * PI),
            origin: extent / 2.0,
        }
    }
}

/// Precomputed per-zoom projection constants for levels `0..levels`.
#[derive(Debug, Clone)]
pub struct ProjectionTable {
    levels: Vec<LevelScale>,
}

impl ProjectionTable {
    /// Build the table for zoom levels `0..levels` (pass `max_zoom + 1`).
    pub fn new(levels: usize) -> Self {
        Self {
            levels: (0..levels).map(LevelScale::for_zoom).collect(),
        }
    }

    /// Number of zoom levels in the table.
    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    /// Scale constants for `zoom`.
    pub fn level(&self, zoom: u8) -> Result<&LevelScale, CoordError> {
        self.levels
            .get(zoom as usize)
            .ok_or(CoordError::ZoomOutOfTable {
                zoom,
                levels: self.levels.len(),
            })
    }

    /// Project `(lon, lat)` in degrees to pixel space at `zoom`.
    ///
    /// The result is unrounded; use [`PixelPoint::rounded`] for addressing.
    pub fn forward(&self, lon: f64, lat: f64, zoom: u8) -> Result<PixelPoint, CoordError> {
        let level = self.level(zoom)?;
        let x = level.origin + lon * level.pixels_per_degree;
        let s = (lat * DEG_TO_RAD)
            .sin()
            .clamp(-MERCATOR_SIN_LIMIT, MERCATOR_SIN_LIMIT);
        let y = level.origin - level.pixels_per_radian * 0.5 * ((1.0 + s) / (1.0 - s)).ln();
        Ok(PixelPoint { x, y })
    }

    /// Convert pixel coordinates at `zoom` back to `(lon, lat)` in degrees.
    pub fn inverse(&self, px: f64, py: f64, zoom: u8) -> Result<(f64, f64), CoordError> {
        let level = self.level(zoom)?;
        let lon = (px - level.origin) / level.pixels_per_degree;
        let g = (level.origin - py) / level.pixels_per_radian;
        let lat = RAD_TO_DEG * (2.0 * g.exp().atan() - 0.5 * PI);
        Ok((lon, lat))
    }

    /// Geographic extent of one tile, from its bottom-left and top-right
    /// pixel corners.
    pub fn tile_bounds(&self, tile: &TileIndex) -> Result<BoundingBox, CoordError> {
        let (x0, y0) = tile.pixel_bottom_left();
        let (x1, y1) = tile.pixel_top_right();
        let (west, south) = self.inverse(x0, y0, tile.z)?;
        let (east, north) = self.inverse(x1, y1, tile.z)?;
        Ok(BoundingBox::from_edges(west, south, east, north))
    }

    /// Tiles covering `bbox` at `zoom`, clamped to the valid grid.
    ///
    /// The north-west and south-east corners are projected, rounded and
    /// divided by the tile size; both bounds are inclusive so partially
    /// covered edge tiles are kept.
    pub fn tile_range(&self, bbox: &BoundingBox, zoom: u8) -> Result<TileRange, CoordError> {
        let (west, north) = bbox.north_west();
        let (east, south) = bbox.south_east();
        let (min_x, min_y) = self.forward(west, north, zoom)?.tile();
        let (max_x, max_y) = self.forward(east, south, zoom)?.tile();
        Ok(TileRange::clamped(zoom, min_x, max_x, min_y, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ProjectionTable {
        ProjectionTable::new(19)
    }

    #[test]
    fn test_level_constants() {
        let table = table();
        let zero = table.level(0).unwrap();
        assert_eq!(zero.extent, 256.0);
        assert_eq!(zero.origin, 128.0);
        assert!((zero.pixels_per_degree - 256.0 / 360.0).abs() < 1e-12);

        let ten = table.level(10).unwrap();
        assert_eq!(ten.extent, 256.0 * 1024.0);
        assert_eq!(ten.origin, 128.0 * 1024.0);
    }

    #[test]
    fn test_zoom_beyond_table_is_error() {
        let table = ProjectionTable::new(3);
        assert_eq!(table.levels(), 3);
        assert!(matches!(
            table.forward(0.0, 0.0, 3),
            Err(CoordError::ZoomOutOfTable { zoom: 3, levels: 3 })
        ));
        assert!(table.inverse(0.0, 0.0, 2).is_ok());
    }

    #[test]
    fn test_origin_maps_to_centre() {
        let table = table();
        for zoom in 0..=18 {
            let p = table.forward(0.0, 0.0, zoom).unwrap();
            let origin = table.level(zoom).unwrap().origin;
            assert!((p.x - origin).abs() < 1e-9);
            assert!((p.y - origin).abs() < 1e-9);
        }
    }

    #[test]
    fn test_antimeridian_spans_full_width() {
        let table = table();
        let west = table.forward(-180.0, 0.0, 4).unwrap();
        let east = table.forward(180.0, 0.0, 4).unwrap();
        assert_eq!(west.x, 0.0);
        assert_eq!(east.x, 256.0 * 16.0);
    }

    #[test]
    fn test_poles_are_clamped_to_finite_rows() {
        let table = table();
        let north = table.forward(0.0, 90.0, 2).unwrap();
        let south = table.forward(0.0, -90.0, 2).unwrap();
        assert!(north.y.is_finite());
        assert!(south.y.is_finite());
        // Clamped sin lands a little beyond the Web Mercator square.
        assert!(north.y < 0.0);
        assert!(south.y > 1024.0);
    }

    #[test]
    fn test_known_tile_new_york() {
        // 40.7128°N, 74.0060°W lies in tile 19295/24640 at zoom 16
        let table = table();
        let p = table.forward(-74.0060, 40.7128, 16).unwrap();
        assert_eq!(p.tile(), (19295, 24640));
    }

    #[test]
    fn test_tile_bounds_edges() {
        let table = table();
        let bounds = table.tile_bounds(&TileIndex::new(1, 0, 0)).unwrap();
        assert!((bounds.west() + 180.0).abs() < 1e-9);
        assert!(bounds.east().abs() < 1e-9);
        assert!(bounds.south().abs() < 1e-9);
        assert!((bounds.north() - 85.051_128_779_806_6).abs() < 1e-6);
    }

    #[test]
    fn test_tile_range_zoom_zero_is_single_tile() {
        let table = table();
        let bbox = BoundingBox::new(-90.0, 40.0, -89.0, 41.0).unwrap();
        let range = table.tile_range(&bbox, 0).unwrap();
        assert_eq!(range.count(), 1);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![TileIndex::new(0, 0, 0)]);
    }

    #[test]
    fn test_tile_range_world_covers_grid() {
        let table = table();
        for zoom in 0..=6 {
            let range = table.tile_range(&BoundingBox::world(), zoom).unwrap();
            let side = 1u64 << zoom;
            assert_eq!(range.count(), side * side, "zoom {}", zoom);
        }
    }

    #[test]
    fn test_tile_range_drops_out_of_grid_indices() {
        // The east edge at 180° projects one tile beyond the grid.
        let table = table();
        let bbox = BoundingBox::new(170.0, -10.0, 180.0, 10.0).unwrap();
        let range = table.tile_range(&bbox, 3).unwrap();
        assert_eq!(range.max_x, 7);
        assert!(range.iter().all(|t| t.is_valid()));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_forward_inverse_roundtrip(
                lon in -180.0..180.0_f64,
                lat in -85.0..85.0_f64,
                zoom in 0u8..=18
            ) {
                let table = ProjectionTable::new(19);
                let p = table.forward(lon, lat, zoom)?;
                let (lon2, lat2) = table.inverse(p.x, p.y, zoom)?;

                prop_assert!((lon2 - lon).abs() < 1e-9, "lon {} -> {}", lon, lon2);
                prop_assert!((lat2 - lat).abs() < 1e-9, "lat {} -> {}", lat, lat2);
            }

            #[test]
            fn test_forward_is_monotonic(
                lon1 in -180.0..0.0_f64,
                lon2 in 0.0..180.0_f64,
                lat1 in -80.0..0.0_f64,
                lat2 in 0.0..80.0_f64,
                zoom in 0u8..=18
            ) {
                let table = ProjectionTable::new(19);
                let a = table.forward(lon1, lat1, zoom)?;
                let b = table.forward(lon2, lat2, zoom)?;

                // East is larger x, north is smaller y.
                prop_assert!(a.x <= b.x);
                prop_assert!(a.y >= b.y);
            }

            #[test]
            fn test_tile_range_indices_in_grid(
                west in -180.0..180.0_f64,
                width in 0.0..60.0_f64,
                south in -90.0..90.0_f64,
                height in 0.0..40.0_f64,
                zoom in 0u8..=18
            ) {
                let east = (west + width).min(180.0);
                let north = (south + height).min(90.0);
                let bbox = BoundingBox::new(west, south, east, north)?;
                let table = ProjectionTable::new(19);
                let range = table.tile_range(&bbox, zoom)?;

                for tile in range.iter().take(4096) {
                    prop_assert!(tile.is_valid(), "{} outside grid", tile);
                }
            }
        }
    }
}
