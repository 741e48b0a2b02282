//! Target grid geometry for a request.

use tracing::debug;
use wcs_common::{AffineTransform, Envelope, GridGeometry, GridRange, RequestGrid, WcsError};

use crate::error::Result;

/// Pixel tolerance when snapping an envelope onto the native grid.
const SNAP_EPSILON: f64 = 1e-6;

/// Check an explicit request grid before anything is built from it.
pub fn check_request_grid(grid: &RequestGrid) -> Result<()> {
    if let Some(range) = &grid.range {
        if range.dimension() != 2 || !range.is_valid() {
            return Err(WcsError::invalid(
                "GridRange",
                format!(
                    "grid range low {:?} must not exceed high {:?}",
                    range.low, range.high
                ),
            ));
        }
    }
    if let Some(offsets) = grid.offsets {
        if offsets.iter().any(|o| !o.is_finite() || *o == 0.0) {
            return Err(WcsError::invalid(
                "GridOffsets",
                format!("grid offsets {:?} must be finite and non-zero", offsets),
            ));
        }
    }
    if let Some(origin) = grid.origin {
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(WcsError::invalid(
                "GridOrigin",
                format!("grid origin {:?} must be finite", origin),
            ));
        }
    }
    Ok(())
}

/// Builds the pixel grid a request is delivered on.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridGeometryBuilder;

impl GridGeometryBuilder {
    /// Build the target grid over `target` (native CRS, easting first).
    ///
    /// In order of precedence: explicit grid bounds, explicit offsets, a
    /// 1x1 grid for coverages without georeferencing, and finally the
    /// native grid's cells covering `target`.
    pub fn build(
        &self,
        request: Option<&RequestGrid>,
        native: &GridGeometry,
        target: &Envelope,
    ) -> Result<GridGeometry> {
        let crs = target.crs.map(|c| c.to_xy());

        if let Some(grid) = request {
            check_request_grid(grid)?;

            if let Some(range) = &grid.range {
                let (w, h) = (range.width() as f64, range.height() as f64);
                let scale_x = target.width() / w;
                let scale_y = -target.height() / h;
                let transform = AffineTransform::from_origin_offsets(
                    [
                        target.min_x() - range.low[0] as f64 * scale_x,
                        target.max_y() - range.low[1] as f64 * scale_y,
                    ],
                    [scale_x, scale_y],
                );
                debug!(width = w, height = h, "Target grid from explicit range");
                return Ok(GridGeometry::new(range.clone(), transform, crs)?);
            }

            if let Some([off_x, off_y]) = grid.offsets {
                let width = cells(target.width(), off_x);
                let height = cells(target.height(), off_y);
                let (origin, offsets) = match grid.origin {
                    Some(origin) => (origin, [off_x, off_y]),
                    None => ([target.min_x(), target.max_y()], [off_x.abs(), -off_y.abs()]),
                };
                debug!(width = width, height = height, "Target grid from offsets");
                return Ok(GridGeometry::new(
                    GridRange::from_size(width, height),
                    AffineTransform::from_origin_offsets(origin, offsets),
                    crs,
                )?);
            }

            if native.transform().is_identity() {
                debug!("Native grid has no georeferencing, using a single cell");
                return Ok(GridGeometry::new(
                    GridRange::from_size(1, 1),
                    AffineTransform::identity(),
                    crs,
                )?);
            }
        }

        let inverse = native.transform().inverse().ok_or_else(|| {
            WcsError::Processing("native grid-to-CRS transform is not invertible".to_string())
        })?;

        let corners = [
            inverse.apply(target.min_x(), target.min_y()),
            inverse.apply(target.min_x(), target.max_y()),
            inverse.apply(target.max_x(), target.min_y()),
            inverse.apply(target.max_x(), target.max_y()),
        ];
        let (mut min_col, mut min_row) = (f64::INFINITY, f64::INFINITY);
        let (mut max_col, mut max_row) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (col, row) in corners {
            min_col = min_col.min(col);
            max_col = max_col.max(col);
            min_row = min_row.min(row);
            max_row = max_row.max(row);
        }

        let low = [
            (min_col + SNAP_EPSILON).floor() as i64,
            (min_row + SNAP_EPSILON).floor() as i64,
        ];
        let high = [
            ((max_col - SNAP_EPSILON).ceil() as i64 - 1).max(low[0]),
            ((max_row - SNAP_EPSILON).ceil() as i64 - 1).max(low[1]),
        ];

        Ok(GridGeometry::new(
            GridRange::new(low.to_vec(), high.to_vec()),
            *native.transform(),
            crs,
        )?)
    }
}

/// Cells needed to cover `span` at `offset`, at least one.
fn cells(span: f64, offset: f64) -> usize {
    ((span / offset.abs()).round() as usize).max(1)
}
