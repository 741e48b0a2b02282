//! GetCoverage request model.
//!
//! These types are what a protocol front end hands to the processing
//! pipeline once KVP or XML parsing is done.

use crate::envelope::Envelope;
use crate::grid::GridRange;
use serde::{Deserialize, Serialize};

/// A parsed GetCoverage request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub coverage_id: String,
    #[serde(default)]
    pub domain_subset: DomainSubset,
    #[serde(default)]
    pub range_subset: RangeSubset,
    #[serde(default)]
    pub interpolation: Option<String>,
    pub output: OutputSpec,
}

impl QueryRequest {
    /// A request for the whole coverage in its native CRS.
    pub fn new(coverage_id: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            coverage_id: coverage_id.into(),
            domain_subset: DomainSubset::default(),
            range_subset: RangeSubset::default(),
            interpolation: None,
            output: OutputSpec {
                format: format.into(),
                crs: None,
            },
        }
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.domain_subset.envelope = Some(envelope);
        self
    }

    pub fn with_grid(mut self, grid: RequestGrid) -> Self {
        self.domain_subset.grid = Some(grid);
        self
    }

    pub fn with_bands<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.range_subset.axes = vec![AxisSubset::values(
            crate::coverage::RANGE_AXIS_BAND,
            values,
        )];
        self
    }

    pub fn with_interpolation(mut self, method: impl Into<String>) -> Self {
        self.interpolation = Some(method.into());
        self
    }

    pub fn with_output_crs(mut self, crs: impl Into<String>) -> Self {
        self.output.crs = Some(crs.into());
        self
    }
}

/// Requested spatial extent and optional target grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainSubset {
    #[serde(default)]
    pub envelope: Option<Envelope>,
    #[serde(default)]
    pub grid: Option<RequestGrid>,
}

/// Explicit target grid (WCS 1.1 GridOrigin / GridOffsets).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestGrid {
    #[serde(default)]
    pub range: Option<GridRange>,
    /// Corner of the first cell, easting/northing.
    #[serde(default)]
    pub origin: Option<[f64; 2]>,
    /// Cell size per axis; a negative y offset means north-up.
    #[serde(default)]
    pub offsets: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeSubset {
    #[serde(default)]
    pub axes: Vec<AxisSubset>,
}

/// Selection along one range axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSubset {
    pub axis: String,
    pub selection: AxisSelection,
}

impl AxisSubset {
    pub fn values<S: Into<String>>(axis: &str, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            axis: axis.to_string(),
            selection: AxisSelection::Values(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn interval(axis: &str, min: &str, max: &str, step: Option<&str>) -> Self {
        Self {
            axis: axis.to_string(),
            selection: AxisSelection::Interval {
                min: min.to_string(),
                max: max.to_string(),
                step: step.map(str::to_string),
            },
        }
    }
}

/// Key values are kept as strings: band names and 1-based indices share the syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSelection {
    Values(Vec<String>),
    Interval {
        min: String,
        max: String,
        #[serde(default)]
        step: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub format: String,
    /// Target CRS identifier; the native CRS when omitted.
    #[serde(default)]
    pub crs: Option<String>,
}
