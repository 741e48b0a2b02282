//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies.
//! All coordinates passed to and returned from this crate are easting first
//! (longitude, latitude for geographic CRSs); axis order is applied by the
//! envelope helpers only.

pub mod envelope;
pub mod geographic;
pub mod mercator;
pub mod polar;
pub mod transform;

pub use envelope::{clamp_to_domain, densify_boundary, transform_envelope};
pub use mercator::WebMercator;
pub use polar::PolarStereographic;
pub use transform::{CrsTransform, Projection, ProjectionError};
