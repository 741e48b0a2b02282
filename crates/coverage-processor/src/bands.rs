//! Band (range axis) selection.

use std::collections::HashMap;

use wcs_common::{AxisSelection, AxisSubset, CoverageDescriptor, WcsError};

use crate::error::Result;
use crate::types::Band;

const LOCATOR: &str = "RangeSubset";

/// Maps symbolic band subsets onto 0-based band indices.
#[derive(Debug, Clone)]
pub struct BandSelector {
    names: HashMap<String, usize>,
    count: usize,
}

fn normalize(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

impl BandSelector {
    pub fn new(descriptor: &CoverageDescriptor) -> Self {
        let mut names = HashMap::with_capacity(descriptor.band_count());
        for (index, band) in descriptor.bands.iter().enumerate() {
            // First declaration wins on duplicate names
            names.entry(normalize(&band.name)).or_insert(index);
        }
        Self {
            names,
            count: descriptor.band_count(),
        }
    }

    /// Resolve a subset to indices in output order; all bands when absent.
    pub fn resolve(&self, subset: Option<&AxisSubset>) -> Result<Vec<usize>> {
        let Some(subset) = subset else {
            return Ok((0..self.count).collect());
        };

        match &subset.selection {
            AxisSelection::Values(values) => {
                if values.is_empty() {
                    return Err(WcsError::invalid(LOCATOR, "band subset lists no values"));
                }
                values.iter().map(|v| self.lookup(v)).collect()
            }
            AxisSelection::Interval { min, max, step } => {
                let low = self.lookup(min)?;
                let high = self.lookup(max)?;
                if low > high {
                    return Err(WcsError::invalid(
                        LOCATOR,
                        format!("band interval {}..{} is reversed", min, max),
                    ));
                }
                let step = match step.as_deref().map(str::trim) {
                    None | Some("") => 1,
                    Some(s) => s.parse::<usize>().ok().filter(|&n| n > 0).ok_or_else(|| {
                        WcsError::invalid(
                            LOCATOR,
                            format!("band interval step '{}' is not a positive integer", s),
                        )
                    })?,
                };
                Ok((low..=high).step_by(step).collect())
            }
        }
    }

    /// A band name, else a 1-based index.
    fn lookup(&self, key: &str) -> Result<usize> {
        if let Some(&index) = self.names.get(&normalize(key)) {
            return Ok(index);
        }

        let index: usize = key.trim().parse().map_err(|_| {
            WcsError::invalid(LOCATOR, format!("unknown band '{}'", key))
        })?;
        if index == 0 || index > self.count {
            return Err(WcsError::invalid(
                LOCATOR,
                format!(
                    "band index {} is out of range, the coverage has {} bands",
                    index, self.count
                ),
            ));
        }
        Ok(index - 1)
    }
}

/// Keep `indices` of `bands`, in that order.
pub fn select_bands(bands: Vec<Band>, indices: &[usize]) -> Result<Vec<Band>> {
    if indices.len() == bands.len() && indices.iter().enumerate().all(|(i, &b)| i == b) {
        return Ok(bands);
    }

    indices
        .iter()
        .map(|&i| {
            bands.get(i).cloned().ok_or_else(|| {
                WcsError::Processing(format!(
                    "reader returned {} bands, band {} was selected",
                    bands.len(),
                    i + 1
                ))
            })
        })
        .collect()
}
