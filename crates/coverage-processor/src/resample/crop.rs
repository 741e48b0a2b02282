//! Crop stage: cut the raster down to the requested envelope.

use crate::error::Result;
use crate::types::{Band, GridCoverage};
use tracing::debug;
use wcs_common::{Envelope, WcsError};

/// Relative tolerance under which the crop is skipped.
const SKIP_TOLERANCE: f64 = 1e-9;

/// Pixel tolerance when snapping the window outward.
const SNAP_EPSILON: f64 = 1e-6;

/// Crop `coverage` to `envelope` (both easting first, same CRS).
///
/// Returns the cropped raster, whose envelope follows its pixel window, and
/// the exact intersection, which is the logical extent of the stage's output.
pub fn crop(coverage: GridCoverage, envelope: &Envelope) -> Result<(GridCoverage, Envelope)> {
    let intersection = coverage
        .envelope
        .intersection(envelope)
        .ok_or(WcsError::EmptyIntersection)?;

    if intersection.approx_eq(&coverage.envelope, SKIP_TOLERANCE) {
        debug!("Crop skipped, envelope covers the whole raster");
        let extent = coverage.envelope.clone();
        return Ok((coverage, extent));
    }

    let (res_x, res_y) = coverage.resolution();
    let env = &coverage.envelope;

    let col0 = ((intersection.min_x() - env.min_x()) / res_x + SNAP_EPSILON).floor();
    let col1 = ((intersection.max_x() - env.min_x()) / res_x - SNAP_EPSILON).ceil();
    let row0 = ((env.max_y() - intersection.max_y()) / res_y + SNAP_EPSILON).floor();
    let row1 = ((env.max_y() - intersection.min_y()) / res_y - SNAP_EPSILON).ceil();

    let col0 = (col0.max(0.0) as usize).min(coverage.width - 1);
    let row0 = (row0.max(0.0) as usize).min(coverage.height - 1);
    let col1 = (col1.max(0.0) as usize).clamp(col0 + 1, coverage.width);
    let row1 = (row1.max(0.0) as usize).clamp(row0 + 1, coverage.height);

    let width = col1 - col0;
    let height = row1 - row0;

    debug!(
        col0 = col0,
        row0 = row0,
        width = width,
        height = height,
        "Cropping raster window"
    );

    let bands = coverage
        .bands
        .iter()
        .map(|band| {
            let mut data = Vec::with_capacity(width * height);
            for row in row0..row1 {
                let start = row * coverage.width;
                data.extend_from_slice(&band.data[start + col0..start + col1]);
            }
            Band {
                name: band.name.clone(),
                data,
                no_data: band.no_data,
            }
        })
        .collect();

    let window = Envelope::new(
        [
            env.min_x() + col0 as f64 * res_x,
            env.max_y() - row1 as f64 * res_y,
        ],
        [
            env.min_x() + col1 as f64 * res_x,
            env.max_y() - row0 as f64 * res_y,
        ],
        env.crs,
    );

    let cropped = GridCoverage::new(width, height, bands, window, coverage.crs)?;
    Ok((cropped, intersection))
}
