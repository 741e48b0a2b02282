//! Core types for coverage processing.

use crate::format::ResolvedFormat;
use serde::{Deserialize, Serialize};
use wcs_common::{Crs, Envelope, GridGeometry, WcsError};

/// One band of raster samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    /// Samples in row-major order, top row first.
    pub data: Vec<f32>,
    pub no_data: Option<f32>,
}

impl Band {
    pub fn new(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            data,
            no_data: None,
        }
    }

    pub fn with_no_data(mut self, value: f32) -> Self {
        self.no_data = Some(value);
        self
    }

    /// Check whether a sample is missing (NaN or the no-data value).
    pub fn is_no_data(&self, value: f32) -> bool {
        value.is_nan() || self.no_data == Some(value)
    }
}

/// A north-up raster with one or more bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCoverage {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<Band>,
    /// Extent covered by the outer cell edges, easting first.
    pub envelope: Envelope,
    pub crs: Crs,
}

impl GridCoverage {
    /// Create a coverage, checking every band holds `width * height` samples.
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<Band>,
        envelope: Envelope,
        crs: Crs,
    ) -> Result<Self, WcsError> {
        if width == 0 || height == 0 {
            return Err(WcsError::Processing(format!(
                "raster must not be empty, got {}x{}",
                width, height
            )));
        }
        if let Some(band) = bands.iter().find(|b| b.data.len() != width * height) {
            return Err(WcsError::Processing(format!(
                "band '{}' has {} samples, expected {}",
                band.name,
                band.data.len(),
                width * height
            )));
        }

        let crs = crs.to_xy();
        Ok(Self {
            width,
            height,
            bands,
            envelope: envelope.with_crs(Some(crs)),
            crs,
        })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Cell size (x, y) in CRS units.
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.envelope.width() / self.width as f64,
            self.envelope.height() / self.height as f64,
        )
    }

    /// Get the value at a specific grid cell.
    pub fn get(&self, band: usize, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.bands
            .get(band)
            .and_then(|b| b.data.get(row * self.width + col))
            .copied()
    }

    /// Get the value at a CRS coordinate using nearest neighbor.
    pub fn get_at_coords(&self, band: usize, x: f64, y: f64) -> Option<f32> {
        if !self.envelope.contains_point(x, y) {
            return None;
        }
        let (res_x, res_y) = self.resolution();
        let col = (((x - self.envelope.min_x()) / res_x).floor() as usize).min(self.width - 1);
        let row = (((self.envelope.max_y() - y) / res_y).floor() as usize).min(self.height - 1);
        self.get(band, col, row)
    }

    /// North-up grid geometry matching this raster.
    pub fn grid_geometry(&self) -> Result<GridGeometry, WcsError> {
        Ok(GridGeometry::from_envelope(
            &self.envelope,
            self.width,
            self.height,
        )?)
    }

    /// Band names in order.
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Interpolation method for grid resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Nearest neighbor (preserves exact values).
    #[default]
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    Bilinear,
    /// Bicubic interpolation (smoothest, more compute).
    Cubic,
}

impl InterpolationMethod {
    /// Parse a method name (case-insensitive).
    ///
    /// Returns None for names without a kernel implementation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nearest" | "nearest neighbor" | "nearest-neighbor" | "nearest_neighbor" => {
                Some(Self::Nearest)
            }
            "bilinear" | "linear" => Some(Self::Bilinear),
            "cubic" | "bicubic" => Some(Self::Cubic),
            _ => None,
        }
    }

    /// Name used in capability documents.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest neighbor",
            Self::Bilinear => "bilinear",
            Self::Cubic => "bicubic",
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Cubic => write!(f, "cubic"),
        }
    }
}

/// Output of a GetCoverage request.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub coverage: GridCoverage,
    pub grid_geometry: GridGeometry,
    /// Output CRS in the axis order the client asked for.
    pub crs: Crs,
    pub format: ResolvedFormat,
}
