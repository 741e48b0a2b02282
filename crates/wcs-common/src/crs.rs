//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes supported by the coverage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
    /// NSIDC Sea Ice Polar Stereographic North
    Epsg3413,
    /// Antarctic Polar Stereographic
    Epsg3031,
}

impl CrsCode {
    /// Look up a code by its EPSG number.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(CrsCode::Epsg4326),
            4269 => Some(CrsCode::Epsg4269),
            3857 | 900913 | 3785 => Some(CrsCode::Epsg3857),
            3413 => Some(CrsCode::Epsg3413),
            3031 => Some(CrsCode::Epsg3031),
            _ => None,
        }
    }

    /// The EPSG number of this code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg3413 => 3413,
            CrsCode::Epsg3031 => 3031,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }

    /// Geographic and Web Mercator CRSs map meridians to vertical lines,
    /// so an envelope's west edge stays the west edge across transforms.
    pub fn is_cylindrical(&self) -> bool {
        matches!(
            self,
            CrsCode::Epsg4326 | CrsCode::Epsg4269 | CrsCode::Epsg3857
        )
    }

    /// The axis order defined by the EPSG registry.
    pub fn authority_axis_order(&self) -> AxisOrder {
        if self.is_geographic() {
            AxisOrder::LatLon
        } else {
            AxisOrder::XY
        }
    }

    /// Valid extent in easting/northing (XY) order.
    pub fn valid_extent(&self) -> [f64; 4] {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => [-180.0, -90.0, 180.0, 90.0],
            CrsCode::Epsg3857 => {
                // Web Mercator bounds (approx ±85.06° latitude)
                let max_extent = 20037508.342789244;
                [-max_extent, -max_extent, max_extent, max_extent]
            }
            CrsCode::Epsg3413 | CrsCode::Epsg3031 => {
                [-4_000_000.0, -4_000_000.0, 4_000_000.0, 4_000_000.0]
            }
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}

/// Direction of a coordinate system axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisDirection {
    East,
    North,
}

/// Description of a single CRS axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisInfo {
    pub name: &'static str,
    pub direction: AxisDirection,
    /// Minimum axis value (e.g. -180 for longitude)
    pub min: f64,
    /// Maximum axis value (e.g. 180 for longitude)
    pub max: f64,
}

impl AxisInfo {
    /// Length of one full revolution along this axis.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// A CRS together with the axis order its coordinates are expressed in.
///
/// The same EPSG code may arrive with different axis orders depending on how
/// it was spelled: `EPSG:4326` is longitude first, while the URN and HTTP URI
/// forms follow the EPSG registry and put latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    pub code: CrsCode,
    pub axis_order: AxisOrder,
}

impl Crs {
    /// Create a CRS with easting/longitude first.
    pub fn new(code: CrsCode) -> Self {
        Self {
            code,
            axis_order: AxisOrder::XY,
        }
    }

    /// Create a CRS using the EPSG registry axis order.
    pub fn with_authority_order(code: CrsCode) -> Self {
        Self {
            code,
            axis_order: code.authority_axis_order(),
        }
    }

    /// WGS84 with longitude first (`EPSG:4326` / `CRS:84`).
    pub fn wgs84() -> Self {
        Self::new(CrsCode::Epsg4326)
    }

    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" (longitude first)
    /// - "urn:ogc:def:crs:EPSG::4326" (registry order, latitude first)
    /// - "http://www.opengis.net/def/crs/EPSG/0/4326" (registry order)
    /// - "http://www.opengis.net/gml/srs/epsg.xml#4326" (longitude first)
    /// - "CRS:84", "OGC:CRS84" and their URN/URI forms
    pub fn from_identifier(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_lowercase();
        let unsupported = || CrsParseError::UnsupportedCrs(s.to_string());

        if matches!(
            normalized.as_str(),
            "crs:84"
                | "ogc:crs84"
                | "urn:ogc:def:crs:ogc:1.3:crs84"
                | "urn:ogc:def:crs:ogc::crs84"
                | "http://www.opengis.net/def/crs/ogc/1.3/crs84"
        ) {
            return Ok(Self::wgs84());
        }

        let (number, axis_order_from_registry) =
            if let Some(rest) = normalized.strip_prefix("epsg:") {
                (rest, false)
            } else if let Some(rest) = normalized.strip_prefix("urn:ogc:def:crs:epsg:") {
                // Both "urn:ogc:def:crs:EPSG::4326" and "...:EPSG:6.6:4326"
                (rest.rsplit(':').next().unwrap_or(rest), true)
            } else if let Some(rest) = normalized.strip_prefix("urn:x-ogc:def:crs:epsg:") {
                (rest.rsplit(':').next().unwrap_or(rest), true)
            } else if let Some(rest) = normalized.strip_prefix("http://www.opengis.net/def/crs/epsg/")
            {
                (rest.rsplit('/').next().unwrap_or(rest), true)
            } else if let Some(rest) = normalized.strip_prefix("http://www.opengis.net/gml/srs/epsg.xml#")
            {
                (rest, false)
            } else {
                return Err(unsupported());
            };

        let code = number
            .parse::<u32>()
            .ok()
            .and_then(CrsCode::from_epsg)
            .ok_or_else(unsupported)?;

        Ok(if axis_order_from_registry {
            Self::with_authority_order(code)
        } else {
            Self::new(code)
        })
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        self.code.is_geographic()
    }

    /// Check whether two CRSs describe the same datum/projection, ignoring axis order.
    pub fn same_code(&self, other: &Crs) -> bool {
        self.code == other.code
    }

    /// The same CRS with easting/longitude first.
    pub fn to_xy(&self) -> Self {
        Self::new(self.code)
    }

    /// Axis descriptions in this CRS's axis order.
    pub fn axes(&self) -> [AxisInfo; 2] {
        let [min_x, min_y, max_x, max_y] = self.code.valid_extent();
        let (x, y) = if self.is_geographic() {
            (
                AxisInfo {
                    name: "Long",
                    direction: AxisDirection::East,
                    min: min_x,
                    max: max_x,
                },
                AxisInfo {
                    name: "Lat",
                    direction: AxisDirection::North,
                    min: min_y,
                    max: max_y,
                },
            )
        } else {
            (
                AxisInfo {
                    name: "E",
                    direction: AxisDirection::East,
                    min: min_x,
                    max: max_x,
                },
                AxisInfo {
                    name: "N",
                    direction: AxisDirection::North,
                    min: min_y,
                    max: max_y,
                },
            )
        };

        match self.axis_order {
            AxisOrder::XY => [x, y],
            AxisOrder::LatLon => [y, x],
        }
    }

    /// Index of the easting/longitude axis in this CRS's axis order.
    pub fn x_axis_index(&self) -> usize {
        match self.axis_order {
            AxisOrder::XY => 0,
            AxisOrder::LatLon => 1,
        }
    }

    /// Canonical identifier that parses back to this CRS.
    pub fn identifier(&self) -> String {
        match self.axis_order {
            AxisOrder::LatLon => format!("urn:ogc:def:crs:EPSG::{}", self.code.epsg()),
            AxisOrder::XY => self.code.to_string(),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Crs::from_identifier(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.identifier()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            Crs::from_identifier("EPSG:4326").unwrap(),
            Crs::new(CrsCode::Epsg4326)
        );
        assert_eq!(
            Crs::from_identifier("epsg:3857").unwrap().code,
            CrsCode::Epsg3857
        );
        assert_eq!(
            Crs::from_identifier("EPSG:900913").unwrap().code,
            CrsCode::Epsg3857
        );
        assert_eq!(Crs::from_identifier("CRS:84").unwrap(), Crs::wgs84());
        assert!(Crs::from_identifier("EPSG:99999").is_err());
        assert!(Crs::from_identifier("not a crs").is_err());
    }

    #[test]
    fn test_axis_order_detection() {
        let urn = Crs::from_identifier("urn:ogc:def:crs:EPSG::4326").unwrap();
        assert_eq!(urn.axis_order, AxisOrder::LatLon);

        let uri = Crs::from_identifier("http://www.opengis.net/def/crs/EPSG/0/4326").unwrap();
        assert_eq!(uri.axis_order, AxisOrder::LatLon);

        let versioned = Crs::from_identifier("urn:ogc:def:crs:EPSG:6.6:4326").unwrap();
        assert_eq!(versioned.axis_order, AxisOrder::LatLon);

        let kvp = Crs::from_identifier("EPSG:4326").unwrap();
        assert_eq!(kvp.axis_order, AxisOrder::XY);

        // Projected CRSs are easting first in the registry as well
        let mercator = Crs::from_identifier("urn:ogc:def:crs:EPSG::3857").unwrap();
        assert_eq!(mercator.axis_order, AxisOrder::XY);
    }

    #[test]
    fn test_axes_follow_axis_order() {
        let lat_lon = Crs::with_authority_order(CrsCode::Epsg4326);
        let axes = lat_lon.axes();
        assert_eq!(axes[0].direction, AxisDirection::North);
        assert_eq!(axes[1].direction, AxisDirection::East);
        assert_eq!(axes[1].range(), 360.0);
        assert_eq!(lat_lon.x_axis_index(), 1);
    }

    #[test]
    fn test_identifier_roundtrip() {
        for id in ["EPSG:4326", "urn:ogc:def:crs:EPSG::4326", "EPSG:3413", "EPSG:3031"] {
            let crs = Crs::from_identifier(id).unwrap();
            assert_eq!(Crs::from_identifier(&crs.identifier()).unwrap(), crs);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let crs: Crs = serde_json::from_str("\"urn:ogc:def:crs:EPSG::4326\"").unwrap();
        assert_eq!(crs.axis_order, AxisOrder::LatLon);
        assert_eq!(
            serde_json::to_string(&Crs::new(CrsCode::Epsg3857)).unwrap(),
            "\"EPSG:3857\""
        );
    }
}
