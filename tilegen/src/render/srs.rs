//! Map projections a renderer can declare as its native coordinate system.

use std::f64::consts::PI;

/// Equatorial radius used by spherical ("web") Mercator, in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude beyond which spherical Mercator is undefined.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Conversion from geographic degrees into a renderer's native coordinates.
pub trait MapProjection {
    /// Short identifier, e.g. `"EPSG:3857"`.
    fn name(&self) -> &str;

    /// Project `(lon, lat)` in degrees to native `(x, y)`.
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);

    /// Native `(x, y)` back to `(lon, lat)` in degrees.
    fn inverse(&self, x: f64, y: f64) -> (f64, f64);
}

/// Spherical Mercator (EPSG:3857) in metres.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalMercator;

impl MapProjection for SphericalMercator {
    fn name(&self) -> &str {
        "EPSG:3857"
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}

/// Plain longitude/latitude (EPSG:4326); the identity projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LonLat;

impl MapProjection for LonLat {
    fn name(&self) -> &str {
        "EPSG:4326"
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        (lon, lat)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }
}
