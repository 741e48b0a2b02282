//! Raster resampling stages.
//!
//! The pipeline runs these in a fixed order: crop, scale, reproject.

pub mod crop;
pub mod interpolation;
pub mod reproject;
pub mod scale;

pub use crop::crop;
pub use interpolation::PixelGrid;
pub use reproject::reproject;
pub use scale::scale;

use crate::types::{Band, InterpolationMethod};
use rayon::prelude::*;

/// Source raster dimensions handed to [`resample_band`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceGrid {
    pub width: usize,
    pub height: usize,
}

/// Resample one band onto a `width` x `height` output.
///
/// `locate` maps an output cell `(col, row)` to a fractional source pixel
/// position, or None when the cell has no source. No-data samples are
/// treated as NaN while interpolating and written back as the band's
/// no-data value.
pub(crate) fn resample_band<F>(
    band: &Band,
    source: SourceGrid,
    width: usize,
    height: usize,
    method: InterpolationMethod,
    locate: &F,
) -> Band
where
    F: Fn(usize, usize) -> Option<(f64, f64)> + Sync,
{
    let masked: Vec<f32> = match band.no_data {
        Some(nd) => band
            .data
            .iter()
            .map(|&v| if v == nd { f32::NAN } else { v })
            .collect(),
        None => band.data.clone(),
    };
    let fill = band.no_data.unwrap_or(f32::NAN);
    let grid = PixelGrid::new(&masked, source.width, source.height);

    let mut data = vec![fill; width * height];
    for row in 0..height {
        for col in 0..width {
            if let Some((sx, sy)) = locate(col, row) {
                let value = grid.sample(method, sx, sy);
                if !value.is_nan() {
                    data[row * width + col] = value;
                }
            }
        }
    }

    Band {
        name: band.name.clone(),
        data,
        no_data: band.no_data,
    }
}

/// Apply `f` to every band, in parallel when asked to.
pub(crate) fn map_bands<F>(bands: &[Band], parallel: bool, f: F) -> Vec<Band>
where
    F: Fn(&Band) -> Band + Sync + Send,
{
    if parallel && bands.len() > 1 {
        bands.par_iter().map(&f).collect()
    } else {
        bands.iter().map(f).collect()
    }
}
