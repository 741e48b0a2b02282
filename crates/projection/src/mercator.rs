//! Spherical Web Mercator projection (EPSG:3857).
//!
//! Uses the WGS84 semi-major axis as the sphere radius, as web map tiles do.

use crate::geographic::WGS84_A;
use std::f64::consts::PI;

/// Latitude at which Web Mercator becomes a square world (degrees).
pub const MAX_LATITUDE: f64 = 85.0511287798066;

/// Half the world width in meters.
pub const HALF_WORLD: f64 = PI * WGS84_A;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Project longitude/latitude (degrees) to meters.
    ///
    /// Returns None for latitudes beyond the square-world limit.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !(lat.abs() <= MAX_LATITUDE + 1e-9) {
            return None;
        }
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = lon.to_radians() * WGS84_A;
        let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * WGS84_A;
        Some((x, y))
    }

    /// Unproject meters to longitude/latitude (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let lon = (x / WGS84_A).to_degrees();
        let lat = (2.0 * (y / WGS84_A).exp().atan() - PI / 2.0).to_degrees();
        Some((lon, lat))
    }
}
