//! Writing GetCoverage results to disk.
//!
//! A result becomes two files next to each other: `<prefix>.f32` holding the
//! raw band-sequential samples and `<prefix>.json` describing them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use coverage_processor::{encode_bands, QueryResult, ResolvedFormat};
use serde::Serialize;
use wcs_common::{AffineTransform, GridRange};

/// Sidecar metadata describing a written raster.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageMetadata {
    pub coverage_id: String,
    pub width: usize,
    pub height: usize,
    pub bands: Vec<BandMetadata>,
    /// Output CRS as the client named it.
    pub crs: String,
    /// Raster extent, easting first: [min_x, min_y, max_x, max_y].
    pub envelope: [f64; 4],
    pub grid_range: GridRange,
    pub transform: AffineTransform,
    pub format: ResolvedFormat,
    pub sample_type: &'static str,
    pub byte_order: &'static str,
    pub interleave: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BandMetadata {
    pub name: String,
    pub no_data: Option<f32>,
}

impl CoverageMetadata {
    pub fn from_result(coverage_id: &str, result: &QueryResult) -> Self {
        let coverage = &result.coverage;
        let env = &coverage.envelope;
        Self {
            coverage_id: coverage_id.to_string(),
            width: coverage.width,
            height: coverage.height,
            bands: coverage
                .bands
                .iter()
                .map(|b| BandMetadata {
                    name: b.name.clone(),
                    no_data: b.no_data,
                })
                .collect(),
            crs: result.crs.identifier(),
            envelope: [env.min_x(), env.min_y(), env.max_x(), env.max_y()],
            grid_range: result.grid_geometry.range().clone(),
            transform: *result.grid_geometry.transform(),
            format: result.format.clone(),
            sample_type: "float32",
            byte_order: "little_endian",
            interleave: "band",
        }
    }
}

/// Paths of the files written for one result.
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub data: PathBuf,
    pub metadata: PathBuf,
}

/// Write `result` as `<prefix>.f32` and `<prefix>.json`.
pub fn write_result(prefix: &Path, coverage_id: &str, result: &QueryResult) -> Result<WrittenFiles> {
    if let Some(parent) = prefix.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    let data = prefix.with_extension("f32");
    fs::write(&data, encode_bands(&result.coverage.bands))
        .with_context(|| format!("failed to write {}", data.display()))?;

    let metadata = prefix.with_extension("json");
    let json = serde_json::to_string_pretty(&CoverageMetadata::from_result(coverage_id, result))?;
    fs::write(&metadata, json)
        .with_context(|| format!("failed to write {}", metadata.display()))?;

    Ok(WrittenFiles { data, metadata })
}
