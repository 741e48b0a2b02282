//! Scale stage: resample onto the target grid size over a given extent.

use super::{map_bands, resample_band, SourceGrid};
use crate::error::Result;
use crate::types::{GridCoverage, InterpolationMethod};
use tracing::debug;
use wcs_common::Envelope;

/// Relative tolerance under which the extents count as equal.
const SKIP_TOLERANCE: f64 = 1e-9;

/// Resample `source` onto a `width` x `height` grid covering `extent`.
///
/// Output cell centres are mapped into source pixel space, so the result
/// covers exactly `extent` even when the source window is larger.
pub fn scale(
    source: GridCoverage,
    extent: &Envelope,
    width: usize,
    height: usize,
    method: InterpolationMethod,
    parallel: bool,
) -> Result<GridCoverage> {
    if source.width == width
        && source.height == height
        && source.envelope.approx_eq(extent, SKIP_TOLERANCE)
    {
        debug!("Scale skipped, raster already matches the target grid");
        return Ok(source);
    }

    debug!(
        from_width = source.width,
        from_height = source.height,
        to_width = width,
        to_height = height,
        method = %method,
        "Scaling raster"
    );

    let (src_res_x, src_res_y) = source.resolution();
    let src_min_x = source.envelope.min_x();
    let src_max_y = source.envelope.max_y();
    let out_res_x = extent.width() / width as f64;
    let out_res_y = extent.height() / height as f64;
    let (ext_min_x, ext_max_y) = (extent.min_x(), extent.max_y());

    let locate = move |col: usize, row: usize| {
        let x = ext_min_x + (col as f64 + 0.5) * out_res_x;
        let y = ext_max_y - (row as f64 + 0.5) * out_res_y;
        Some((
            (x - src_min_x) / src_res_x - 0.5,
            (src_max_y - y) / src_res_y - 0.5,
        ))
    };

    let grid = SourceGrid {
        width: source.width,
        height: source.height,
    };
    let bands = map_bands(&source.bands, parallel, |band| {
        resample_band(band, grid, width, height, method, &locate)
    });

    GridCoverage::new(width, height, bands, extent.clone(), source.crs)
}
