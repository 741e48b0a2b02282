//! Grid geometry: pixel ranges and grid-to-CRS transforms.

use crate::crs::Crs;
use crate::envelope::Envelope;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Integer pixel range per dimension, `high` inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRange {
    pub low: Vec<i64>,
    pub high: Vec<i64>,
}

impl GridRange {
    pub fn new(low: Vec<i64>, high: Vec<i64>) -> Self {
        Self { low, high }
    }

    /// A 2-D range starting at the origin.
    pub fn from_size(width: usize, height: usize) -> Self {
        Self {
            low: vec![0, 0],
            high: vec![last_index(width), last_index(height)],
        }
    }

    pub fn dimension(&self) -> usize {
        self.low.len()
    }

    /// Number of cells along a dimension, or None when it does not fit.
    pub fn span(&self, dim: usize) -> Option<u64> {
        let cells = self.high[dim]
            .checked_sub(self.low[dim])?
            .checked_add(1)?
            .max(0);
        u64::try_from(cells).ok()
    }

    /// Cells along the first axis, saturating at `usize::MAX`.
    pub fn width(&self) -> usize {
        saturating_usize(self.span(0))
    }

    pub fn height(&self) -> usize {
        saturating_usize(self.span(1))
    }

    /// Check that `low <= high` on every dimension.
    pub fn is_valid(&self) -> bool {
        self.low.len() == self.high.len() && self.low.iter().zip(&self.high).all(|(l, h)| l <= h)
    }

    /// Total number of cells, or None on overflow.
    pub fn cell_count(&self) -> Option<u64> {
        (0..self.dimension()).try_fold(1u64, |total, d| total.checked_mul(self.span(d)?))
    }
}

fn last_index(size: usize) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX) - 1
}

fn saturating_usize(cells: Option<u64>) -> usize {
    cells.and_then(|n| usize::try_from(n).ok()).unwrap_or(usize::MAX)
}

/// 2-D affine transform from grid (column, row) to CRS (easting, northing).
///
/// ```text
/// x = scale_x * col + shear_x * row + translate_x
/// y = shear_y * col + scale_y * row + translate_y
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub scale_x: f64,
    pub shear_x: f64,
    pub translate_x: f64,
    pub shear_y: f64,
    pub scale_y: f64,
    pub translate_y: f64,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            shear_x: 0.0,
            translate_x: 0.0,
            shear_y: 0.0,
            scale_y: 1.0,
            translate_y: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// North-up transform mapping a `width` x `height` grid onto an XY envelope.
    pub fn from_envelope(envelope: &Envelope, width: usize, height: usize) -> Self {
        Self {
            scale_x: envelope.width() / width.max(1) as f64,
            shear_x: 0.0,
            translate_x: envelope.min_x(),
            shear_y: 0.0,
            scale_y: -envelope.height() / height.max(1) as f64,
            translate_y: envelope.max_y(),
        }
    }

    /// Transform from the corner of the first cell and per-axis cell offsets.
    pub fn from_origin_offsets(origin: [f64; 2], offsets: [f64; 2]) -> Self {
        Self {
            scale_x: offsets[0],
            shear_x: 0.0,
            translate_x: origin[0],
            shear_y: 0.0,
            scale_y: offsets[1],
            translate_y: origin[1],
        }
    }

    /// Map a grid position (fractional cell units) to CRS coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.scale_x * col + self.shear_x * row + self.translate_x,
            self.shear_y * col + self.scale_y * row + self.translate_y,
        )
    }

    fn to_matrix(self) -> Matrix3<f64> {
        Matrix3::new(
            self.scale_x,
            self.shear_x,
            self.translate_x,
            self.shear_y,
            self.scale_y,
            self.translate_y,
            0.0,
            0.0,
            1.0,
        )
    }

    /// The CRS-to-grid transform, or None when the matrix is singular.
    pub fn inverse(&self) -> Option<AffineTransform> {
        let inv = self.to_matrix().try_inverse()?;
        Some(Self {
            scale_x: inv[(0, 0)],
            shear_x: inv[(0, 1)],
            translate_x: inv[(0, 2)],
            shear_y: inv[(1, 0)],
            scale_y: inv[(1, 1)],
            translate_y: inv[(1, 2)],
        })
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A pixel grid and its placement in a CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridGeometryParts")]
pub struct GridGeometry {
    range: GridRange,
    transform: AffineTransform,
    crs: Option<Crs>,
}

#[derive(Deserialize)]
struct GridGeometryParts {
    range: GridRange,
    transform: AffineTransform,
    #[serde(default)]
    crs: Option<Crs>,
}

impl TryFrom<GridGeometryParts> for GridGeometry {
    type Error = GridGeometryError;

    fn try_from(parts: GridGeometryParts) -> Result<Self, Self::Error> {
        GridGeometry::new(parts.range, parts.transform, parts.crs)
    }
}

impl GridGeometry {
    /// Create a grid geometry, checking that the range matches the 2-D CRS.
    pub fn new(
        range: GridRange,
        transform: AffineTransform,
        crs: Option<Crs>,
    ) -> Result<Self, GridGeometryError> {
        if range.dimension() != 2 || range.high.len() != 2 {
            return Err(GridGeometryError::DimensionMismatch {
                grid: range.dimension(),
                crs: 2,
            });
        }
        if !range.is_valid() {
            return Err(GridGeometryError::EmptyRange(range));
        }
        Ok(Self {
            range,
            transform,
            crs,
        })
    }

    /// A north-up grid of the given size covering an XY envelope.
    pub fn from_envelope(
        envelope: &Envelope,
        width: usize,
        height: usize,
    ) -> Result<Self, GridGeometryError> {
        Self::new(
            GridRange::from_size(width, height),
            AffineTransform::from_envelope(envelope, width, height),
            envelope.crs.map(|c| c.to_xy()),
        )
    }

    pub fn range(&self) -> &GridRange {
        &self.range
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    pub fn width(&self) -> usize {
        self.range.width()
    }

    pub fn height(&self) -> usize {
        self.range.height()
    }

    /// The XY envelope covered by the outer edges of the grid cells.
    pub fn envelope(&self) -> Envelope {
        let (l0, l1) = (self.range.low[0] as f64, self.range.low[1] as f64);
        let (h0, h1) = (
            self.range.high[0] as f64 + 1.0,
            self.range.high[1] as f64 + 1.0,
        );

        let corners = [
            self.transform.apply(l0, l1),
            self.transform.apply(h0, l1),
            self.transform.apply(l0, h1),
            self.transform.apply(h0, h1),
        ];

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        Envelope::new([min_x, min_y], [max_x, max_y], self.crs.map(|c| c.to_xy()))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridGeometryError {
    #[error("Grid range has {grid} dimensions but the CRS has {crs}")]
    DimensionMismatch { grid: usize, crs: usize },

    #[error("Grid range is empty: low {:?}, high {:?}", .0.low, .0.high)]
    EmptyRange(GridRange),
}
