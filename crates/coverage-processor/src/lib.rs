//! GetCoverage processing for a Web Coverage Service.
//!
//! This crate turns a parsed GetCoverage request into an output raster:
//!
//! - **Validation**: every parameter is checked against the coverage
//!   description before any data is read
//! - **Resolution**: the requested envelope is mapped into the native CRS,
//!   with antimeridian correction for geographic bounds
//! - **Resampling**: band selection, crop, scale and reprojection run in a
//!   fixed order on the raster returned by the reader
//!
//! # Architecture
//!
//! ```text
//! GetCoverage Request
//!      │
//!      ▼
//! CoverageService::get_coverage(request)
//!      │
//!      ├─► CoverageCatalog lookup ("identifier")
//!      │
//!      ├─► RequestValidator
//!      │         ├─► EnvelopeResolver (CRS transform, antimeridian)
//!      │         ├─► FormatNegotiator
//!      │         ├─► BandSelector
//!      │         └─► GridGeometryBuilder
//!      │
//!      ├─► CoverageReader::read (timeout, cancellation)
//!      │
//!      └─► ResamplingPipeline (blocking pool)
//!               │  band select ─► crop ─► scale ─► reproject
//!               ▼
//!          QueryResult
//! ```
//!
//! # Example
//!
//! ```ignore
//! use coverage_processor::{CoverageService, InMemoryCatalog, CoverageProcessorConfig};
//!
//! let catalog = InMemoryCatalog::from_yaml_file("config/coverages.yaml")?;
//! let reader = catalog.raw_file_reader();
//! let service = CoverageService::new(Arc::new(catalog), Arc::new(reader), config);
//!
//! let request = QueryRequest::new("world", "GeoTIFF")
//!     .with_envelope(envelope)
//!     .with_bands(["nir"]);
//! let result = service.get_coverage(&request, &CancellationToken::new()).await?;
//! ```

pub mod bands;
pub mod catalog;
pub mod config;
pub mod envelope_resolver;
pub mod error;
pub mod format;
pub mod grid_builder;
pub mod metrics;
pub mod pipeline;
pub mod reader;
pub mod resample;
pub mod service;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use bands::{select_bands, BandSelector};
pub use catalog::{CoverageCatalog, InMemoryCatalog};
pub use config::CoverageProcessorConfig;
pub use envelope_resolver::{correct_antimeridian, EnvelopeResolver};
pub use error::{CatalogError, ReaderError, Result};
pub use format::{
    CoverageEncoder, EncoderRegistry, FormatNegotiator, ResolvedFormat, StaticEncoder,
};
pub use grid_builder::GridGeometryBuilder;
pub use metrics::{CoverageMetrics, MetricsSnapshot};
pub use pipeline::{PipelinePlan, ResamplingPipeline};
pub use reader::{
    encode_bands, CoverageReader, MemoryCoverageReader, RawFileEntry, RawFileReader, ReadHints,
    ReadRequest,
};
pub use service::CoverageService;
pub use types::{Band, GridCoverage, InterpolationMethod, QueryResult};
pub use validation::{RequestValidator, ValidatedQuery};
