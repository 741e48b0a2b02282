//! Reader for raw band-sequential float rasters.
//!
//! Each coverage is one file holding `bands * height * width` little-endian
//! `f32` samples: band 0 first, rows top to bottom within a band.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use wcs_common::{CoverageDescriptor, Crs, Envelope};

use super::{CoverageReader, ReadRequest};
use crate::error::ReaderError;
use crate::types::{Band, GridCoverage};

const SAMPLE_BYTES: usize = 4;

/// Layout of one raw raster file.
#[derive(Debug, Clone)]
pub struct RawFileEntry {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub band_names: Vec<String>,
    pub no_data: Vec<Option<f32>>,
    /// Extent of the full raster, easting first.
    pub envelope: Envelope,
    pub crs: Crs,
}

impl RawFileEntry {
    /// Describe a file laid out on a coverage's native grid.
    pub fn from_descriptor(descriptor: &CoverageDescriptor, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: descriptor.grid_geometry.width(),
            height: descriptor.grid_geometry.height(),
            band_names: descriptor.bands.iter().map(|b| b.name.clone()).collect(),
            no_data: (0..descriptor.band_count())
                .map(|i| descriptor.band_no_data(i).map(|v| v as f32))
                .collect(),
            envelope: descriptor.native_envelope.clone(),
            crs: descriptor.native_crs.to_xy(),
        }
    }

    fn expected_len(&self) -> u64 {
        (self.band_names.len() * self.width * self.height * SAMPLE_BYTES) as u64
    }

    /// Rows covering `envelope`, or every row when it does not overlap.
    fn row_window(&self, envelope: &Envelope) -> (usize, usize) {
        let Some(overlap) = self.envelope.intersection(envelope) else {
            return (0, self.height);
        };
        let res_y = self.envelope.height() / self.height as f64;
        let row0 = ((self.envelope.max_y() - overlap.max_y()) / res_y + 1e-6).floor();
        let row1 = ((self.envelope.max_y() - overlap.min_y()) / res_y - 1e-6).ceil();

        let row0 = (row0.max(0.0) as usize).min(self.height - 1);
        let row1 = (row1.max(0.0) as usize).clamp(row0 + 1, self.height);
        (row0, row1)
    }
}

/// Reads raw rasters from the local filesystem.
///
/// Only the rows covering the request envelope are read. The file is
/// opened on each read and closed before the read returns.
#[derive(Debug, Default)]
pub struct RawFileReader {
    entries: HashMap<String, RawFileEntry>,
}

impl RawFileReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, id: impl Into<String>, entry: RawFileEntry) -> Self {
        self.entries.insert(id.into(), entry);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: RawFileEntry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CoverageReader for RawFileReader {
    async fn read(
        &self,
        coverage_id: &str,
        request: &ReadRequest,
    ) -> Result<GridCoverage, ReaderError> {
        let entry = self
            .entries
            .get(coverage_id)
            .cloned()
            .ok_or_else(|| ReaderError::NotFound {
                coverage: coverage_id.to_string(),
            })?;
        let envelope = request.envelope.clone();
        let id = coverage_id.to_string();

        tokio::task::spawn_blocking(move || read_window(&id, &entry, &envelope))
            .await
            .map_err(|e| ReaderError::invalid_data(coverage_id, format!("read task failed: {e}")))?
    }
}

fn read_window(id: &str, entry: &RawFileEntry, envelope: &Envelope) -> Result<GridCoverage, ReaderError> {
    let io_err = |source| ReaderError::Io {
        coverage: id.to_string(),
        source,
    };

    let mut file = File::open(&entry.path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    if len != entry.expected_len() {
        return Err(ReaderError::invalid_data(
            id,
            format!(
                "{} holds {} bytes, expected {} for {} bands of {}x{}",
                entry.path.display(),
                len,
                entry.expected_len(),
                entry.band_names.len(),
                entry.width,
                entry.height
            ),
        ));
    }

    let (row0, row1) = entry.row_window(envelope);
    let rows = row1 - row0;
    debug!(
        coverage = %id,
        row0 = row0,
        rows = rows,
        "Reading raw raster window"
    );

    let mut buf = vec![0u8; rows * entry.width * SAMPLE_BYTES];
    let mut bands = Vec::with_capacity(entry.band_names.len());
    for (index, name) in entry.band_names.iter().enumerate() {
        let offset = ((index * entry.height + row0) * entry.width * SAMPLE_BYTES) as u64;
        file.seek(SeekFrom::Start(offset)).map_err(io_err)?;
        file.read_exact(&mut buf).map_err(io_err)?;

        let data = buf
            .chunks_exact(SAMPLE_BYTES)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        bands.push(Band {
            name: name.clone(),
            data,
            no_data: entry.no_data.get(index).copied().flatten(),
        });
    }

    let res_y = entry.envelope.height() / entry.height as f64;
    let window = Envelope::new(
        [entry.envelope.min_x(), entry.envelope.max_y() - row1 as f64 * res_y],
        [entry.envelope.max_x(), entry.envelope.max_y() - row0 as f64 * res_y],
        Some(entry.crs),
    );

    GridCoverage::new(entry.width, rows, bands, window, entry.crs)
        .map_err(|e| ReaderError::invalid_data(id, e.to_string()))
}

/// Encode bands as a raw band-sequential little-endian file body.
pub fn encode_bands(bands: &[Band]) -> Vec<u8> {
    bands
        .iter()
        .flat_map(|b| b.data.iter().flat_map(|v| v.to_le_bytes()))
        .collect()
}
