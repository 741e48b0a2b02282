//! Reproject stage: warp the raster into the target CRS.

use super::{map_bands, resample_band, SourceGrid};
use crate::error::Result;
use crate::types::{GridCoverage, InterpolationMethod};
use projection::{clamp_to_domain, transform_envelope, CrsTransform};
use tracing::debug;
use wcs_common::{Crs, WcsError};

/// Reproject `source` into `target`, keeping its grid size.
///
/// Output cells whose centre falls outside the source raster, or outside
/// the source projection's domain, get the band's no-data value (NaN when
/// the band has none).
pub fn reproject(
    source: GridCoverage,
    target: Crs,
    method: InterpolationMethod,
    parallel: bool,
) -> Result<GridCoverage> {
    let target = target.to_xy();
    let forward = CrsTransform::new(source.crs.code, target.code);

    if forward.is_identity() {
        debug!("Reproject skipped, raster is already in the target CRS");
        let GridCoverage {
            width,
            height,
            bands,
            envelope,
            ..
        } = source;
        return GridCoverage::new(width, height, bands, envelope, target);
    }

    let projectable =
        clamp_to_domain(&source.envelope, target.code).ok_or(WcsError::EmptyIntersection)?;
    let target_envelope = transform_envelope(&projectable, target).map_err(|e| {
        WcsError::Processing(format!(
            "cannot transform raster extent from {} to {}: {}",
            source.crs, target, e
        ))
    })?;

    let (width, height) = (source.width, source.height);
    debug!(
        from = %source.crs,
        to = %target,
        width = width,
        height = height,
        "Reprojecting raster"
    );

    let inverse = forward.inverse();
    let wraps = source.crs.is_geographic();
    let src_env = source.envelope.clone();
    let (src_res_x, src_res_y) = source.resolution();
    let out_res_x = target_envelope.width() / width as f64;
    let out_res_y = target_envelope.height() / height as f64;
    let (out_min_x, out_max_y) = (target_envelope.min_x(), target_envelope.max_y());

    let locate = move |col: usize, row: usize| {
        let x = out_min_x + (col as f64 + 0.5) * out_res_x;
        let y = out_max_y - (row as f64 + 0.5) * out_res_y;
        let (mut sx, sy) = inverse.try_transform(x, y)?;

        if wraps {
            if sx < src_env.min_x() {
                sx += 360.0;
            } else if sx > src_env.max_x() {
                sx -= 360.0;
            }
        }
        if !src_env.contains_point(sx, sy) {
            return None;
        }

        Some((
            (sx - src_env.min_x()) / src_res_x - 0.5,
            (src_env.max_y() - sy) / src_res_y - 0.5,
        ))
    };

    let grid = SourceGrid { width, height };
    let bands = map_bands(&source.bands, parallel, |band| {
        resample_band(band, grid, width, height, method, &locate)
    });

    GridCoverage::new(width, height, bands, target_envelope, target)
}
