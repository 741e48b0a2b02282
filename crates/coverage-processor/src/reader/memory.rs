//! In-memory coverage reader.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{CoverageReader, ReadRequest};
use crate::error::ReaderError;
use crate::types::GridCoverage;

/// Serves canned rasters and counts how often it is asked to.
#[derive(Debug, Default)]
pub struct MemoryCoverageReader {
    coverages: HashMap<String, GridCoverage>,
    delay: Option<Duration>,
    reads: AtomicUsize,
}

impl MemoryCoverageReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster under a coverage identifier.
    pub fn with_coverage(mut self, id: impl Into<String>, coverage: GridCoverage) -> Self {
        self.coverages.insert(id.into(), coverage);
        self
    }

    /// Sleep before answering each read.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of reads started so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoverageReader for MemoryCoverageReader {
    async fn read(
        &self,
        coverage_id: &str,
        _request: &ReadRequest,
    ) -> Result<GridCoverage, ReaderError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        debug!(coverage = %coverage_id, "Reading coverage from memory");

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.coverages
            .get(coverage_id)
            .cloned()
            .ok_or_else(|| ReaderError::NotFound {
                coverage: coverage_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReadHints;
    use crate::types::{Band, InterpolationMethod};
    use wcs_common::{Crs, Envelope, GridGeometry};

    fn request() -> ReadRequest {
        let env = Envelope::new([0.0, 0.0], [1.0, 1.0], Some(Crs::wgs84()));
        ReadRequest {
            grid: GridGeometry::from_envelope(&env, 1, 1).unwrap(),
            envelope: env,
            hints: ReadHints {
                bands: vec![0],
                interpolation: InterpolationMethod::Nearest,
            },
        }
    }

    #[tokio::test]
    async fn test_read_counts() {
        let cov = GridCoverage::new(
            1,
            1,
            vec![Band::new("b", vec![7.0])],
            Envelope::new([0.0, 0.0], [1.0, 1.0], None),
            Crs::wgs84(),
        )
        .unwrap();
        let reader = MemoryCoverageReader::new().with_coverage("one", cov.clone());

        assert_eq!(reader.read_count(), 0);
        assert_eq!(reader.read("one", &request()).await.unwrap(), cov);
        assert!(matches!(
            reader.read("two", &request()).await,
            Err(ReaderError::NotFound { .. })
        ));
        assert_eq!(reader.read_count(), 2);
    }
}
