//! Polar Stereographic projection on the WGS84 ellipsoid (variant B).
//!
//! Used for sea ice and polar products:
//! - EPSG:3413: north pole, true scale at 70°N, central meridian 45°W
//! - EPSG:3031: south pole, true scale at 71°S, central meridian 0°
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual" (1987),
//! equations 21-33 to 21-41. The south polar aspect is computed with the
//! north polar formulas on negated coordinates.

use crate::geographic::{normalize_longitude, wgs84_eccentricity, WGS84_A};
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// Latitude of true scale in degrees (sign selects the pole)
    pub lat_ts: f64,
    /// Central meridian in degrees
    pub lon_0: f64,
    /// Lowest (north) or highest (south) latitude accepted by `forward`
    pub domain_limit: f64,
    e: f64,
    /// a * m_c / t_c, constant for a given latitude of true scale
    k: f64,
}

impl PolarStereographic {
    pub fn new(lat_ts: f64, lon_0: f64, domain_limit: f64) -> Self {
        let e = wgs84_eccentricity();
        let phi_c = lat_ts.abs().to_radians();
        let k = WGS84_A * m(phi_c, e) / t(phi_c, e);
        Self {
            lat_ts,
            lon_0,
            domain_limit,
            e,
            k,
        }
    }

    /// NSIDC Sea Ice Polar Stereographic North.
    pub fn epsg_3413() -> Self {
        Self::new(70.0, -45.0, 30.0)
    }

    /// Antarctic Polar Stereographic.
    pub fn epsg_3031() -> Self {
        Self::new(-71.0, 0.0, -60.0)
    }

    pub fn is_north(&self) -> bool {
        self.lat_ts >= 0.0
    }

    /// Latitude of the projection pole.
    pub fn pole_latitude(&self) -> f64 {
        if self.is_north() {
            90.0
        } else {
            -90.0
        }
    }

    /// Check if a latitude lies in the hemisphere this projection serves.
    pub fn in_domain(&self, lat: f64) -> bool {
        if self.is_north() {
            lat >= self.domain_limit && lat <= 90.0
        } else {
            lat <= self.domain_limit && lat >= -90.0
        }
    }

    /// Project longitude/latitude (degrees) to meters.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !self.in_domain(lat) {
            return None;
        }

        let sign = if self.is_north() { 1.0 } else { -1.0 };
        let phi = (sign * lat).to_radians();
        let dlam = (sign * lon - sign * self.lon_0).to_radians();

        let rho = self.k * t(phi, self.e);
        let x = rho * dlam.sin();
        let y = -rho * dlam.cos();

        Some((sign * x, sign * y))
    }

    /// Unproject meters to longitude/latitude (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let sign = if self.is_north() { 1.0 } else { -1.0 };
        let (x, y) = (sign * x, sign * y);

        let rho = x.hypot(y);
        if rho == 0.0 {
            return Some((self.lon_0, self.pole_latitude()));
        }

        let ts = rho / self.k;
        let half_e = self.e / 2.0;
        let mut phi = PI / 2.0 - 2.0 * ts.atan();
        for _ in 0..15 {
            let es = self.e * phi.sin();
            let next = PI / 2.0 - 2.0 * (ts * ((1.0 - es) / (1.0 + es)).powf(half_e)).atan();
            if (next - phi).abs() < 1e-12 {
                phi = next;
                break;
            }
            phi = next;
        }

        let lam = (sign * self.lon_0).to_radians() + x.atan2(-y);

        Some((
            normalize_longitude(sign * lam.to_degrees()),
            sign * phi.to_degrees(),
        ))
    }
}

/// Snyder eq. 15-9
fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (PI / 4.0 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

/// Snyder eq. 14-15
fn m(phi: f64, e: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e * e * s * s).sqrt()
}
