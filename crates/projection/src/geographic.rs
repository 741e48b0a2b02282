//! Geographic (longitude/latitude) coordinates on the WGS84 ellipsoid.

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6378137.0;

/// WGS84 inverse flattening
pub const WGS84_INV_F: f64 = 298.257223563;

/// WGS84 first eccentricity.
pub fn wgs84_eccentricity() -> f64 {
    let f = 1.0 / WGS84_INV_F;
    (2.0 * f - f * f).sqrt()
}

/// Wrap a longitude into [-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the sign of the input
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Check that a latitude lies on the globe.
pub fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}
