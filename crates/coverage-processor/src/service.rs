//! High-level GetCoverage service.
//!
//! The `CoverageService` ties the pipeline together: catalog lookup,
//! validation, the raw read, resampling and result assembly.
//!
//! # Example
//!
//! ```rust,ignore
//! use coverage_processor::{CoverageService, InMemoryCatalog, MemoryCoverageReader};
//!
//! // Create service (typically at application startup)
//! let service = CoverageService::new(Arc::new(catalog), Arc::new(reader), config);
//!
//! // Run a request
//! let request = QueryRequest::new("world", "image/tiff").with_bands(["nir"]);
//! let result = service.get_coverage(&request, &CancellationToken::new()).await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wcs_common::{CoverageDescriptor, QueryRequest, WcsError};

use crate::catalog::CoverageCatalog;
use crate::config::CoverageProcessorConfig;
use crate::error::Result;
use crate::format::FormatNegotiator;
use crate::metrics::CoverageMetrics;
use crate::pipeline::{PipelinePlan, ResamplingPipeline};
use crate::reader::{CoverageReader, ReadHints, ReadRequest};
use crate::types::{GridCoverage, QueryResult};
use crate::validation::{RequestValidator, ValidatedQuery};

/// Relative tolerance under which the planned grid still describes the output.
const GRID_TOLERANCE: f64 = 1e-9;

/// Serves GetCoverage requests.
///
/// Shared between requests behind an `Arc`; holds no per-request state.
pub struct CoverageService {
    catalog: Arc<dyn CoverageCatalog>,
    reader: Arc<dyn CoverageReader>,
    negotiator: FormatNegotiator,
    config: CoverageProcessorConfig,
    metrics: Arc<CoverageMetrics>,
}

impl CoverageService {
    /// Create a new CoverageService with the default encoder registry.
    pub fn new(
        catalog: Arc<dyn CoverageCatalog>,
        reader: Arc<dyn CoverageReader>,
        config: CoverageProcessorConfig,
    ) -> Self {
        Self {
            catalog,
            reader,
            negotiator: FormatNegotiator::default(),
            config,
            metrics: Arc::new(CoverageMetrics::new()),
        }
    }

    /// Use a custom format negotiator.
    pub fn with_negotiator(mut self, negotiator: FormatNegotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    pub fn config(&self) -> &CoverageProcessorConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<CoverageMetrics> {
        self.metrics.clone()
    }

    /// Validate a request without reading any data.
    pub fn validate(
        &self,
        request: &QueryRequest,
    ) -> Result<(Arc<CoverageDescriptor>, ValidatedQuery)> {
        let descriptor = self
            .catalog
            .descriptor(&request.coverage_id)
            .ok_or_else(|| {
                WcsError::invalid(
                    "identifier",
                    format!("unknown coverage '{}'", request.coverage_id),
                )
            })?;
        let query =
            RequestValidator::new(&self.negotiator, &self.config).validate(&descriptor, request)?;
        Ok((descriptor, query))
    }

    /// Run a GetCoverage request.
    ///
    /// Cancelling `cancel` aborts the read, or the pipeline at its next
    /// stage boundary; nothing partial is returned.
    pub async fn get_coverage(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        let start = Instant::now();
        let result = self.execute(request, cancel).await;
        let duration_us = start.elapsed().as_micros() as u64;

        match &result {
            Ok(output) => info!(
                coverage = %request.coverage_id,
                width = output.coverage.width,
                height = output.coverage.height,
                bands = output.coverage.band_count(),
                crs = %output.crs,
                format = %output.format.declared,
                duration_ms = duration_us / 1000,
                "GetCoverage complete"
            ),
            Err(e) => warn!(
                coverage = %request.coverage_id,
                code = %e.code(),
                locator = e.locator().unwrap_or("-"),
                error = %e,
                "GetCoverage failed"
            ),
        }
        self.metrics
            .record_request(duration_us, result.as_ref().err().map(WcsError::code))
            .await;

        result
    }

    async fn execute(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        let (_, query) = self.validate(request)?;

        let read_request = ReadRequest {
            grid: query.target_grid.clone(),
            envelope: query.envelope.clone(),
            hints: ReadHints {
                bands: query.bands.clone(),
                interpolation: query.interpolation,
            },
        };
        let raw = self.read(&query.coverage_id, &read_request, cancel).await?;

        let plan = PipelinePlan::from_query(&query, cancel.clone());
        let pipeline = ResamplingPipeline::new(self.config.parallel_bands);
        let start = Instant::now();
        let coverage = tokio::task::spawn_blocking(move || pipeline.run(raw, &plan))
            .await
            .map_err(|e| WcsError::Processing(format!("resampling task failed: {e}")))??;
        self.metrics
            .record_pipeline(start.elapsed().as_micros() as u64)
            .await;

        // The planned grid keeps a requested grid origin; otherwise describe
        // the raster as produced
        let grid_geometry = if !query.needs_reprojection()
            && query
                .target_grid
                .envelope()
                .approx_eq(&coverage.envelope, GRID_TOLERANCE)
        {
            query.target_grid.clone()
        } else {
            coverage.grid_geometry()?
        };

        Ok(QueryResult {
            coverage,
            grid_geometry,
            crs: query.target_crs,
            format: query.format,
        })
    }

    /// Read the raw raster, racing the read against cancellation and the timeout.
    async fn read(
        &self,
        coverage_id: &str,
        request: &ReadRequest,
        cancel: &CancellationToken,
    ) -> Result<GridCoverage> {
        let start = Instant::now();
        let read = tokio::time::timeout(
            self.config.read_timeout,
            self.reader.read(coverage_id, request),
        );

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(coverage = %coverage_id, "Read cancelled");
                return Err(WcsError::Cancelled);
            }
            result = read => match result {
                Ok(raw) => raw?,
                Err(_) => {
                    warn!(
                        coverage = %coverage_id,
                        timeout_secs = self.config.read_timeout.as_secs_f64(),
                        "Coverage read timed out"
                    );
                    return Err(WcsError::Timeout);
                }
            },
        };

        self.metrics
            .record_read(start.elapsed().as_micros() as u64)
            .await;
        debug!(
            coverage = %coverage_id,
            width = raw.width,
            height = raw.height,
            bands = raw.band_count(),
            "Coverage read"
        );
        Ok(raw)
    }
}
