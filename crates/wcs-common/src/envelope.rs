//! Envelope types and operations.

use crate::crs::{AxisOrder, Crs};
use serde::{Deserialize, Serialize};

/// Lower and upper bound along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisExtent {
    pub min: f64,
    pub max: f64,
}

impl AxisExtent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// An axis-aligned bounding box.
///
/// Axis values are stored in the axis order of `crs`. An envelope without a
/// CRS is interpreted by whoever receives it (usually as the coverage's
/// native CRS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub axes: Vec<AxisExtent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Crs>,
}

impl Envelope {
    /// Create a 2-D envelope from lower and upper corners, in the CRS's axis order.
    pub fn new(lower: [f64; 2], upper: [f64; 2], crs: Option<Crs>) -> Self {
        Self {
            axes: vec![
                AxisExtent::new(lower[0], upper[0]),
                AxisExtent::new(lower[1], upper[1]),
            ],
            crs,
        }
    }

    /// Create an envelope from easting/northing bounds, stored in the CRS's axis order.
    pub fn from_xy(min_x: f64, min_y: f64, max_x: f64, max_y: f64, crs: Option<Crs>) -> Self {
        match crs.map(|c| c.axis_order) {
            Some(AxisOrder::LatLon) => Self::new([min_y, min_x], [max_y, max_x], crs),
            _ => Self::new([min_x, min_y], [max_x, max_y], crs),
        }
    }

    /// Parse a WCS BoundingBox value: "min0,min1,max0,max1[,crs]".
    ///
    /// Coordinates are taken in the axis order of the CRS, which defaults to
    /// `default_crs` when the value carries none.
    pub fn from_bbox_string(s: &str, default_crs: Option<Crs>) -> Result<Self, EnvelopeParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 && parts.len() != 5 {
            return Err(EnvelopeParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| EnvelopeParseError::InvalidNumber(part.to_string()))?;
        }

        let crs = match parts.get(4) {
            Some(id) => Some(
                Crs::from_identifier(id).map_err(|_| EnvelopeParseError::InvalidCrs(id.to_string()))?,
            ),
            None => default_crs,
        };

        Ok(Self::new([values[0], values[1]], [values[2], values[3]], crs))
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    pub fn min(&self, axis: usize) -> f64 {
        self.axes[axis].min
    }

    pub fn max(&self, axis: usize) -> f64 {
        self.axes[axis].max
    }

    pub fn span(&self, axis: usize) -> f64 {
        self.axes[axis].span()
    }

    fn x_index(&self) -> usize {
        self.crs.map(|c| c.x_axis_index()).unwrap_or(0)
    }

    fn y_index(&self) -> usize {
        1 - self.x_index()
    }

    pub fn min_x(&self) -> f64 {
        self.min(self.x_index())
    }

    pub fn max_x(&self) -> f64 {
        self.max(self.x_index())
    }

    pub fn min_y(&self) -> f64 {
        self.min(self.y_index())
    }

    pub fn max_y(&self) -> f64 {
        self.max(self.y_index())
    }

    /// Width in easting/longitude units.
    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    /// Height in northing/latitude units.
    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    /// The same envelope with easting/longitude first.
    pub fn to_xy(&self) -> Envelope {
        Envelope::new(
            [self.min_x(), self.min_y()],
            [self.max_x(), self.max_y()],
            self.crs.map(|c| c.to_xy()),
        )
    }

    /// Reinterpret the axis values in another CRS without transforming them.
    pub fn with_crs(mut self, crs: Option<Crs>) -> Envelope {
        self.crs = crs;
        self
    }

    /// `min <= max` on every axis, with no NaN bound.
    pub fn is_valid(&self) -> bool {
        self.axes.iter().all(|a| a.min <= a.max)
    }

    /// Check if this envelope overlaps another with a non-zero area.
    ///
    /// Both envelopes must use the same axis order.
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.axes
            .iter()
            .zip(&other.axes)
            .all(|(a, b)| a.min < b.max && a.max > b.min)
    }

    /// Compute the intersection of two envelopes.
    ///
    /// Returns None when they are disjoint or only touch along an edge.
    pub fn intersection(&self, other: &Envelope) -> Option<Envelope> {
        if self.dimension() != other.dimension() || !self.intersects(other) {
            return None;
        }

        Some(Envelope {
            axes: self
                .axes
                .iter()
                .zip(&other.axes)
                .map(|(a, b)| AxisExtent::new(a.min.max(b.min), a.max.min(b.max)))
                .collect(),
            crs: self.crs,
        })
    }

    /// Check if `other` lies entirely within this envelope.
    pub fn contains(&self, other: &Envelope) -> bool {
        self.axes
            .iter()
            .zip(&other.axes)
            .all(|(a, b)| b.min >= a.min && b.max <= a.max)
    }

    /// Check if a point (easting, northing) is contained within this envelope.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    /// Compare bounds with a tolerance relative to each axis span.
    pub fn approx_eq(&self, other: &Envelope, rel_tol: f64) -> bool {
        self.dimension() == other.dimension()
            && self.axes.iter().zip(&other.axes).all(|(a, b)| {
                let tol = rel_tol * a.span().abs().max(b.span().abs()).max(f64::MIN_POSITIVE);
                (a.min - b.min).abs() <= tol && (a.max - b.max).abs() <= tol
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeParseError {
    #[error("Invalid BoundingBox format: {0}. Expected 'min0,min1,max0,max1[,crs]'")]
    InvalidFormat(String),

    #[error("Invalid number in BoundingBox: {0}")]
    InvalidNumber(String),

    #[error("Invalid CRS in BoundingBox: {0}")]
    InvalidCrs(String),
}
