//! Error types for coverage services.

use crate::crs::CrsParseError;
use crate::envelope::EnvelopeParseError;
use crate::grid::GridGeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using WcsError.
pub type WcsResult<T> = Result<T, WcsError>;

/// Primary error type for GetCoverage processing.
#[derive(Debug, Error)]
pub enum WcsError {
    // === Request Errors ===
    #[error("Invalid value for '{locator}': {message}")]
    InvalidParameterValue { locator: String, message: String },

    // === Processing Errors ===
    #[error("No data in requested region")]
    EmptyIntersection,

    #[error("Failed to read coverage '{coverage}': {message}")]
    ReadFailed { coverage: String, message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request timeout")]
    Timeout,

    #[error("Processing failed: {0}")]
    Processing(String),
}

/// OGC exception codes reported by the coverage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExceptionCode {
    InvalidParameterValue,
    NoApplicableCode,
}

impl ExceptionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionCode::InvalidParameterValue => "InvalidParameterValue",
            ExceptionCode::NoApplicableCode => "NoApplicableCode",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-facing exception, safe to serialize into a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionReport {
    pub code: ExceptionCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub message: String,
}

impl WcsError {
    /// Shorthand for an `InvalidParameterValue` error.
    pub fn invalid(locator: impl Into<String>, message: impl Into<String>) -> Self {
        WcsError::InvalidParameterValue {
            locator: locator.into(),
            message: message.into(),
        }
    }

    /// Get the OGC exception code for this error.
    pub fn code(&self) -> ExceptionCode {
        match self {
            WcsError::InvalidParameterValue { .. } => ExceptionCode::InvalidParameterValue,
            _ => ExceptionCode::NoApplicableCode,
        }
    }

    /// The request parameter that caused the error, if any.
    pub fn locator(&self) -> Option<&str> {
        match self {
            WcsError::InvalidParameterValue { locator, .. } => Some(locator),
            _ => None,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WcsError::InvalidParameterValue { .. } => 400,
            WcsError::Cancelled => 503,
            WcsError::Timeout => 504,
            _ => 500,
        }
    }

    /// Build the exception report sent to clients.
    ///
    /// Reader and processing details stay in the logs.
    pub fn to_report(&self) -> ExceptionReport {
        let message = match self {
            WcsError::ReadFailed { coverage, .. } => {
                format!("Failed to read coverage '{}'", coverage)
            }
            WcsError::Processing(_) => "Internal processing error".to_string(),
            WcsError::InvalidParameterValue { message, .. } => message.clone(),
            other => other.to_string(),
        };

        ExceptionReport {
            code: self.code(),
            locator: self.locator().map(str::to_string),
            message,
        }
    }
}

impl From<CrsParseError> for WcsError {
    fn from(err: CrsParseError) -> Self {
        WcsError::invalid("CRS", err.to_string())
    }
}

impl From<EnvelopeParseError> for WcsError {
    fn from(err: EnvelopeParseError) -> Self {
        WcsError::invalid("BoundingBox", err.to_string())
    }
}

impl From<GridGeometryError> for WcsError {
    fn from(err: GridGeometryError) -> Self {
        WcsError::invalid("GridRange", err.to_string())
    }
}
