//! Resampling pipeline: band select, crop, scale, reproject.
//!
//! Stages always run in that order. Each stage is a no-op when the raster
//! already satisfies it, so skipping a stage never changes the output CRS,
//! grid size or band count.

use tokio_util::sync::CancellationToken;
use tracing::debug;
use wcs_common::{Crs, Envelope, GridGeometry, WcsError};

use crate::bands::select_bands;
use crate::error::Result;
use crate::resample::{crop, reproject, scale};
use crate::types::{GridCoverage, InterpolationMethod};
use crate::validation::ValidatedQuery;

/// Everything the pipeline needs to turn a raw read into the output raster.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    /// Band indices in output order.
    pub bands: Vec<usize>,
    /// Destination envelope in the native CRS, easting first.
    pub envelope: Envelope,
    pub target_grid: GridGeometry,
    pub native_crs: Crs,
    pub target_crs: Crs,
    pub interpolation: InterpolationMethod,
    pub cancel: CancellationToken,
}

impl PipelinePlan {
    /// Plan the processing of a validated request.
    pub fn from_query(query: &ValidatedQuery, cancel: CancellationToken) -> Self {
        Self {
            bands: query.bands.clone(),
            envelope: query.envelope.clone(),
            target_grid: query.target_grid.clone(),
            native_crs: query.native_crs,
            target_crs: query.target_crs,
            interpolation: query.interpolation,
            cancel,
        }
    }

    fn check_cancelled(&self, stage: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            debug!(stage = stage, "Request cancelled between stages");
            return Err(WcsError::Cancelled);
        }
        Ok(())
    }
}

/// Runs the resampling stages over a raw raster.
#[derive(Debug, Clone, Copy)]
pub struct ResamplingPipeline {
    parallel: bool,
}

impl ResamplingPipeline {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Run every stage over `raw`, which must be in the native CRS.
    pub fn run(&self, raw: GridCoverage, plan: &PipelinePlan) -> Result<GridCoverage> {
        if !raw.crs.same_code(&plan.native_crs) {
            return Err(WcsError::Processing(format!(
                "reader returned a raster in {}, expected {}",
                raw.crs, plan.native_crs
            )));
        }

        // Band select
        let GridCoverage {
            width,
            height,
            bands,
            envelope,
            crs,
        } = raw;
        let bands = select_bands(bands, &plan.bands)?;
        let selected = GridCoverage::new(width, height, bands, envelope, crs)?;

        // Crop
        let (cropped, extent) = crop(selected, &plan.envelope)?;

        // Scale onto the planned grid; a grid without georeferencing keeps
        // the crop extent
        plan.check_cancelled("scale")?;
        let extent = if plan.target_grid.transform().is_identity() {
            extent
        } else {
            plan.target_grid.envelope()
        };
        let scaled = scale(
            cropped,
            &extent,
            plan.target_grid.width(),
            plan.target_grid.height(),
            plan.interpolation,
            self.parallel,
        )?;

        // Reproject
        plan.check_cancelled("reproject")?;
        let output = reproject(scaled, plan.target_crs, plan.interpolation, self.parallel)?;

        debug!(
            width = output.width,
            height = output.height,
            bands = output.band_count(),
            crs = %output.crs,
            "Pipeline complete"
        );
        Ok(output)
    }
}
