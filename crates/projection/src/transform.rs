//! Point transforms between supported CRSs.
//!
//! Every transform pivots through geographic WGS84 coordinates. NAD83 is
//! treated as identical to WGS84.

use crate::geographic::is_valid_latitude;
use crate::mercator::{WebMercator, MAX_LATITUDE};
use crate::polar::PolarStereographic;
use wcs_common::{CrsCode, WcsError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("Point ({x}, {y}) is outside the domain of {code}")]
    OutOfDomain { code: CrsCode, x: f64, y: f64 },

    #[error("Envelope has no CRS")]
    MissingCrs,

    #[error("Envelope must be 2-dimensional, got {0} axes")]
    Dimension(usize),
}

impl From<ProjectionError> for WcsError {
    fn from(err: ProjectionError) -> Self {
        WcsError::invalid("BoundingBox", err.to_string())
    }
}

/// A map projection from geographic coordinates.
#[derive(Debug, Clone)]
pub enum Projection {
    Geographic,
    WebMercator(WebMercator),
    PolarStereographic(PolarStereographic),
}

impl Projection {
    pub fn for_code(code: CrsCode) -> Self {
        match code {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => Projection::Geographic,
            CrsCode::Epsg3857 => Projection::WebMercator(WebMercator),
            CrsCode::Epsg3413 => Projection::PolarStereographic(PolarStereographic::epsg_3413()),
            CrsCode::Epsg3031 => Projection::PolarStereographic(PolarStereographic::epsg_3031()),
        }
    }

    /// Longitude/latitude to projected coordinates.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => {
                (lon.is_finite() && is_valid_latitude(lat)).then_some((lon, lat))
            }
            Projection::WebMercator(p) => p.forward(lon, lat),
            Projection::PolarStereographic(p) => p.forward(lon, lat),
        }
    }

    /// Projected coordinates to longitude/latitude.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => (x.is_finite() && is_valid_latitude(y)).then_some((x, y)),
            Projection::WebMercator(p) => p.inverse(x, y),
            Projection::PolarStereographic(p) => p.inverse(x, y),
        }
    }

    /// Latitude band where `forward` is defined, as (south, north).
    pub fn latitude_domain(&self) -> (f64, f64) {
        match self {
            Projection::Geographic => (-90.0, 90.0),
            Projection::WebMercator(_) => (-MAX_LATITUDE, MAX_LATITUDE),
            Projection::PolarStereographic(p) if p.is_north() => (p.domain_limit, 90.0),
            Projection::PolarStereographic(p) => (-90.0, p.domain_limit),
        }
    }

    /// Projected coordinates of the pole, for azimuthal projections.
    pub fn pole(&self) -> Option<(f64, (f64, f64))> {
        match self {
            Projection::PolarStereographic(p) => Some((p.pole_latitude(), (0.0, 0.0))),
            _ => None,
        }
    }
}

/// Transform from one CRS to another, easting first on both sides.
#[derive(Debug, Clone)]
pub struct CrsTransform {
    source_code: CrsCode,
    target_code: CrsCode,
    source: Projection,
    target: Projection,
}

impl CrsTransform {
    pub fn new(source: CrsCode, target: CrsCode) -> Self {
        Self {
            source_code: source,
            target_code: target,
            source: Projection::for_code(source),
            target: Projection::for_code(target),
        }
    }

    pub fn source_code(&self) -> CrsCode {
        self.source_code
    }

    pub fn target_code(&self) -> CrsCode {
        self.target_code
    }

    /// Source and target share a datum and projection.
    pub fn is_identity(&self) -> bool {
        self.source_code == self.target_code
            || (self.source_code.is_geographic() && self.target_code.is_geographic())
    }

    /// The transform in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self::new(self.target_code, self.source_code)
    }

    /// Transform a single point.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if self.is_identity() {
            return Ok((x, y));
        }

        let (lon, lat) = self
            .source
            .inverse(x, y)
            .ok_or(ProjectionError::OutOfDomain {
                code: self.source_code,
                x,
                y,
            })?;

        self.target
            .forward(lon, lat)
            .ok_or(ProjectionError::OutOfDomain {
                code: self.target_code,
                x: lon,
                y: lat,
            })
    }

    /// Transform a point, returning None outside either projection's domain.
    pub fn try_transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.transform(x, y).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_identity() {
        let t = CrsTransform::new(CrsCode::Epsg4269, CrsCode::Epsg4326);
        assert!(t.is_identity());
        assert_eq!(t.transform(-97.5, 38.5).unwrap(), (-97.5, 38.5));
    }

    #[test]
    fn test_geographic_to_mercator_and_back() {
        let t = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
        let (x, y) = t.transform(-97.5, 38.5).unwrap();
        let (lon, lat) = t.inverse().transform(x, y).unwrap();
        assert!((lon + 97.5).abs() < 1e-9);
        assert!((lat - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_to_polar() {
        let to_polar = CrsTransform::new(CrsCode::Epsg3857, CrsCode::Epsg3413);
        let from_geo = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
        let (mx, my) = from_geo.transform(-45.0, 75.0).unwrap();
        let (x, y) = to_polar.transform(mx, my).unwrap();
        assert!(x.abs() < 1e-3);
        assert!(y < 0.0);
    }

    #[test]
    fn test_out_of_domain() {
        let t = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
        let err = t.transform(0.0, 90.0).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::OutOfDomain {
                code: CrsCode::Epsg3857,
                ..
            }
        ));
        assert!(t.try_transform(0.0, 90.0).is_none());

        let wcs: WcsError = err.into();
        assert_eq!(wcs.locator(), Some("BoundingBox"));
    }

    #[test]
    fn test_latitude_domain() {
        assert_eq!(Projection::for_code(CrsCode::Epsg3031).latitude_domain(), (-90.0, -60.0));
        assert_eq!(Projection::for_code(CrsCode::Epsg3413).latitude_domain(), (30.0, 90.0));
    }
}
