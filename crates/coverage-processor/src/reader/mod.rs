//! Coverage reader trait and implementations.

mod memory;
mod raw_file;

pub use memory::MemoryCoverageReader;
pub use raw_file::{encode_bands, RawFileEntry, RawFileReader};

use async_trait::async_trait;
use wcs_common::{Envelope, GridGeometry};

use crate::error::ReaderError;
use crate::types::{GridCoverage, InterpolationMethod};

/// What the pipeline is about to do with the raster.
///
/// Readers may use these to skip work; they never change the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadHints {
    /// Band indices the pipeline will keep, in output order.
    pub bands: Vec<usize>,
    pub interpolation: InterpolationMethod,
}

/// A raw raster read.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    /// Target grid of the request.
    pub grid: GridGeometry,
    /// Area of interest in the coverage's native CRS, easting first.
    pub envelope: Envelope,
    pub hints: ReadHints,
}

/// Trait for reading raw raster data of a coverage.
///
/// Implementations return every band of the coverage in declared order, in
/// the coverage's native CRS. They may return a window of the raster as
/// long as it contains the intersection of the request envelope with the
/// coverage.
#[async_trait]
pub trait CoverageReader: Send + Sync {
    /// Read raster data for a coverage.
    ///
    /// Called at most once per GetCoverage request.
    async fn read(
        &self,
        coverage_id: &str,
        request: &ReadRequest,
    ) -> Result<GridCoverage, ReaderError>;
}
