//! Common types and utilities shared across the coverage services.

pub mod coverage;
pub mod crs;
pub mod envelope;
pub mod error;
pub mod grid;
pub mod request;

pub use coverage::{BandDefinition, CoverageDescriptor, RANGE_AXIS_BAND};
pub use crs::{AxisDirection, AxisInfo, AxisOrder, Crs, CrsCode, CrsParseError};
pub use envelope::{AxisExtent, Envelope, EnvelopeParseError};
pub use error::{ExceptionCode, ExceptionReport, WcsError, WcsResult};
pub use grid::{AffineTransform, GridGeometry, GridGeometryError, GridRange};
pub use request::{
    AxisSelection, AxisSubset, DomainSubset, OutputSpec, QueryRequest, RangeSubset, RequestGrid,
};
