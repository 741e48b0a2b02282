//! Coverage catalog.
//!
//! The catalog hands out read-only [`CoverageDescriptor`]s. Descriptors are
//! loaded once (from code or a YAML file) and shared between requests
//! behind an `Arc`.
//!
//! # YAML layout
//!
//! ```yaml
//! coverages:
//!   - id: world
//!     title: World reflectance
//!     crs: EPSG:4326
//!     envelope: [-180, -90, 180, 90]   # min_x, min_y, max_x, max_y
//!     width: 360
//!     height: 180
//!     bands:
//!       - name: red
//!       - name: nir
//!         no_data: [-9999]
//!     formats: [GeoTIFF, ArcGrid]
//!     native_format: GeoTIFF
//!     crs_list: [EPSG:4326, EPSG:3857]
//!     interpolations: [nearest neighbor, bilinear]
//!     default_interpolation: nearest neighbor
//!     data_path: world.f32             # relative to the catalog file
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use wcs_common::{BandDefinition, CoverageDescriptor, Crs, Envelope, GridGeometry};

use crate::error::CatalogError;
use crate::reader::{RawFileEntry, RawFileReader};

/// Source of coverage descriptions.
pub trait CoverageCatalog: Send + Sync {
    /// Look up a coverage by identifier.
    fn descriptor(&self, id: &str) -> Option<Arc<CoverageDescriptor>>;

    /// Identifiers of every coverage, sorted.
    fn coverage_ids(&self) -> Vec<String>;
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    descriptors: HashMap<String, Arc<CoverageDescriptor>>,
    data_paths: HashMap<String, PathBuf>,
}

// ============================================================================
// YAML Parsing Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct YamlCatalogFile {
    coverages: Vec<YamlCoverage>,
}

#[derive(Debug, Deserialize)]
struct YamlCoverage {
    id: String,
    #[serde(default)]
    title: Option<String>,
    crs: String,
    envelope: [f64; 4],
    width: usize,
    height: usize,
    bands: Vec<YamlBand>,
    #[serde(default)]
    formats: Vec<String>,
    #[serde(default)]
    native_format: Option<String>,
    #[serde(default)]
    crs_list: Vec<String>,
    #[serde(default)]
    interpolations: Vec<String>,
    #[serde(default)]
    default_interpolation: Option<String>,
    #[serde(default)]
    data_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct YamlBand {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    no_data: Vec<f64>,
}

// ============================================================================
// Catalog
// ============================================================================

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from descriptors, rejecting duplicate identifiers.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = CoverageDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.insert(descriptor)?;
        }
        Ok(catalog)
    }

    /// Add a descriptor.
    pub fn insert(&mut self, descriptor: CoverageDescriptor) -> Result<(), CatalogError> {
        if self.descriptors.contains_key(&descriptor.id) {
            return Err(CatalogError::Duplicate(descriptor.id));
        }
        self.descriptors
            .insert(descriptor.id.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Load a catalog file. Relative data paths resolve against its directory.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&contents, path.parent())?;

        info!(
            path = %path.display(),
            coverages = catalog.len(),
            "Coverage catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse a catalog document.
    pub fn from_yaml_str(contents: &str, base_dir: Option<&Path>) -> Result<Self, CatalogError> {
        let yaml: YamlCatalogFile = serde_yaml::from_str(contents)?;
        let mut catalog = Self::new();

        for entry in yaml.coverages {
            let id = entry.id.clone();
            let data_path = entry.data_path.clone().map(|p| match base_dir {
                Some(dir) if p.is_relative() => dir.join(p),
                _ => p,
            });

            let descriptor = Self::build_descriptor(entry)?;
            info!(
                coverage = %id,
                crs = %descriptor.native_crs,
                bands = descriptor.band_count(),
                "Loaded coverage"
            );
            catalog.insert(descriptor)?;
            if let Some(path) = data_path {
                catalog.data_paths.insert(id, path);
            }
        }

        Ok(catalog)
    }

    fn build_descriptor(entry: YamlCoverage) -> Result<CoverageDescriptor, CatalogError> {
        let id = entry.id;
        let crs = Crs::from_identifier(&entry.crs)
            .map_err(|e| CatalogError::invalid_coverage(&id, e.to_string()))?;

        if entry.width == 0 || entry.height == 0 {
            return Err(CatalogError::invalid_coverage(
                &id,
                format!("grid size {}x{} is empty", entry.width, entry.height),
            ));
        }
        if entry.bands.is_empty() {
            return Err(CatalogError::invalid_coverage(&id, "no bands declared"));
        }

        let [min_x, min_y, max_x, max_y] = entry.envelope;
        if !(min_x < max_x && min_y < max_y) {
            return Err(CatalogError::invalid_coverage(
                &id,
                format!("envelope {:?} is empty or inverted", entry.envelope),
            ));
        }
        let envelope = Envelope::from_xy(min_x, min_y, max_x, max_y, Some(crs.to_xy()));
        let grid = GridGeometry::from_envelope(&envelope, entry.width, entry.height)
            .map_err(|e| CatalogError::invalid_coverage(&id, e.to_string()))?;

        for listed in &entry.crs_list {
            if Crs::from_identifier(listed).is_err() {
                warn!(coverage = %id, crs = %listed, "Ignoring unsupported CRS in catalog");
            }
        }

        let bands = entry
            .bands
            .into_iter()
            .map(|b| BandDefinition {
                name: b.name,
                description: b.description.unwrap_or_default(),
                no_data: b.no_data,
            })
            .collect();

        let mut descriptor = CoverageDescriptor::new(id.clone(), crs, grid, bands)
            .with_formats(entry.formats);
        if let Some(title) = entry.title {
            descriptor = descriptor.with_title(title);
        }
        if let Some(native) = entry.native_format {
            descriptor = descriptor.with_native_format(native);
        }
        if !entry.crs_list.is_empty() {
            descriptor = descriptor.with_crs_list(entry.crs_list);
        }
        if !entry.interpolations.is_empty() {
            if let Some(default) = entry.default_interpolation.as_deref() {
                if !entry
                    .interpolations
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(default))
                {
                    warn!(
                        coverage = %id,
                        default = %default,
                        "Default interpolation is not among the supported ones"
                    );
                }
            }
            descriptor = descriptor.with_interpolations(
                entry.interpolations,
                entry.default_interpolation.as_deref(),
            );
        }

        if descriptor.format_candidates().is_empty() {
            warn!(coverage = %id, "Coverage declares no output formats");
        }

        Ok(descriptor)
    }

    /// Data file registered for a coverage, if any.
    pub fn data_path(&self, id: &str) -> Option<&Path> {
        self.data_paths.get(id).map(PathBuf::as_path)
    }

    /// A raw-file reader for every coverage with a data file.
    pub fn raw_file_reader(&self) -> RawFileReader {
        let mut reader = RawFileReader::new();
        for (id, path) in &self.data_paths {
            if let Some(descriptor) = self.descriptors.get(id) {
                reader.insert(id.clone(), RawFileEntry::from_descriptor(descriptor, path));
            }
        }
        reader
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl CoverageCatalog for InMemoryCatalog {
    fn descriptor(&self, id: &str) -> Option<Arc<CoverageDescriptor>> {
        self.descriptors.get(id).cloned()
    }

    fn coverage_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.descriptors.keys().cloned().collect();
        ids.sort();
        ids
    }
}
