//! Error types for coverage processing.
//!
//! Every failure leaving this crate is a [`WcsError`]; the crate-local
//! errors below describe collaborator failures and convert into it.

use thiserror::Error;
use wcs_common::WcsError;

/// Errors raised by a [`crate::reader::CoverageReader`].
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The reader has no data for this coverage.
    #[error("no data registered for coverage {coverage}")]
    NotFound { coverage: String },

    /// Storage/IO error.
    #[error("I/O error reading {coverage}: {source}")]
    Io {
        coverage: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored raster does not match its description.
    #[error("invalid raster data for {coverage}: {message}")]
    InvalidData { coverage: String, message: String },
}

impl ReaderError {
    /// Create an InvalidData error.
    pub fn invalid_data(coverage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidData {
            coverage: coverage.into(),
            message: message.into(),
        }
    }

    /// Identifier of the coverage that failed to read.
    pub fn coverage(&self) -> &str {
        match self {
            Self::NotFound { coverage }
            | Self::Io { coverage, .. }
            | Self::InvalidData { coverage, .. } => coverage,
        }
    }
}

impl From<ReaderError> for WcsError {
    fn from(err: ReaderError) -> Self {
        WcsError::ReadFailed {
            coverage: err.coverage().to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors raised while loading a coverage catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Failed to read the catalog file.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the catalog file.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A coverage entry is inconsistent.
    #[error("invalid coverage '{id}': {message}")]
    InvalidCoverage { id: String, message: String },

    /// Two entries share an identifier.
    #[error("duplicate coverage identifier: {0}")]
    Duplicate(String),
}

impl CatalogError {
    /// Create an InvalidCoverage error.
    pub fn invalid_coverage(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCoverage {
            id: id.into(),
            message: message.into(),
        }
    }
}

impl From<CatalogError> for WcsError {
    fn from(err: CatalogError) -> Self {
        WcsError::Processing(err.to_string())
    }
}

/// Result type for coverage processing operations.
pub type Result<T> = std::result::Result<T, WcsError>;
