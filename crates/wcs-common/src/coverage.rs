//! Coverage capability metadata.

use crate::crs::Crs;
use crate::envelope::Envelope;
use crate::grid::GridGeometry;
use serde::{Deserialize, Serialize};

/// The only range axis a coverage exposes.
pub const RANGE_AXIS_BAND: &str = "Band";

/// One band (sample dimension) of a coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Values that mark missing data.
    #[serde(default)]
    pub no_data: Vec<f64>,
}

impl BandDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            no_data: Vec::new(),
        }
    }

    pub fn with_no_data(mut self, value: f64) -> Self {
        self.no_data.push(value);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Read-only description of what a coverage offers.
///
/// Built once by the catalog and shared between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDescriptor {
    pub id: String,
    pub title: String,
    /// Native extent, easting/longitude first.
    pub native_envelope: Envelope,
    pub native_crs: Crs,
    pub grid_geometry: GridGeometry,
    pub bands: Vec<BandDefinition>,
    /// CRS identifiers accepted on input.
    pub request_crs: Vec<String>,
    /// CRS identifiers offered on output.
    pub response_crs: Vec<String>,
    pub supported_formats: Vec<String>,
    pub native_format: Option<String>,
    pub interpolation_methods: Vec<String>,
    pub default_interpolation: Option<String>,
}

impl CoverageDescriptor {
    /// Create a descriptor whose extent and CRS lists follow its native grid.
    pub fn new(
        id: impl Into<String>,
        native_crs: Crs,
        grid_geometry: GridGeometry,
        bands: Vec<BandDefinition>,
    ) -> Self {
        let id = id.into();
        let native_envelope = grid_geometry.envelope().with_crs(Some(native_crs.to_xy()));
        let native_id = native_crs.identifier();

        Self {
            title: id.clone(),
            id,
            native_envelope,
            native_crs,
            grid_geometry,
            bands,
            request_crs: vec![native_id.clone()],
            response_crs: vec![native_id],
            supported_formats: Vec::new(),
            native_format: None,
            interpolation_methods: vec!["nearest neighbor".to_string()],
            default_interpolation: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_formats<S: Into<String>>(mut self, formats: impl IntoIterator<Item = S>) -> Self {
        self.supported_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_native_format(mut self, format: impl Into<String>) -> Self {
        self.native_format = Some(format.into());
        self
    }

    /// Set both the request and response CRS lists.
    pub fn with_crs_list<S: Into<String>>(mut self, crs: impl IntoIterator<Item = S>) -> Self {
        let list: Vec<String> = crs.into_iter().map(Into::into).collect();
        self.request_crs = list.clone();
        self.response_crs = list;
        self
    }

    pub fn with_interpolations<S: Into<String>>(
        mut self,
        methods: impl IntoIterator<Item = S>,
        default: Option<&str>,
    ) -> Self {
        self.interpolation_methods = methods.into_iter().map(Into::into).collect();
        self.default_interpolation = default.map(str::to_string);
        self
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Names of the range axes this coverage can be subset on.
    pub fn range_axes(&self) -> &'static [&'static str] {
        &[RANGE_AXIS_BAND]
    }

    /// All CRS identifiers the coverage can be requested in or returned in.
    pub fn supported_crs(&self) -> impl Iterator<Item = &str> {
        self.request_crs
            .iter()
            .chain(self.response_crs.iter())
            .map(String::as_str)
    }

    /// Declared formats followed by the native format, without duplicates.
    pub fn format_candidates(&self) -> Vec<&str> {
        let mut candidates: Vec<&str> = self.supported_formats.iter().map(String::as_str).collect();
        if let Some(native) = self.native_format.as_deref() {
            if !candidates.iter().any(|f| f.eq_ignore_ascii_case(native)) {
                candidates.push(native);
            }
        }
        candidates
    }

    /// No-data value of a band, if it declares one.
    pub fn band_no_data(&self, index: usize) -> Option<f64> {
        self.bands.get(index).and_then(|b| b.no_data.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CrsCode;

    fn world() -> CoverageDescriptor {
        let env = Envelope::new([-180.0, -90.0], [180.0, 90.0], Some(Crs::wgs84()));
        let grid = GridGeometry::from_envelope(&env, 360, 180).unwrap();
        CoverageDescriptor::new(
            "world",
            Crs::wgs84(),
            grid,
            vec![
                BandDefinition::new("red"),
                BandDefinition::new("nir").with_no_data(-9999.0),
            ],
        )
    }

    #[test]
    fn test_descriptor_defaults() {
        let desc = world();
        assert_eq!(desc.native_envelope.max_x(), 180.0);
        assert_eq!(desc.request_crs, vec!["EPSG:4326".to_string()]);
        assert_eq!(desc.band_count(), 2);
        assert_eq!(desc.band_no_data(1), Some(-9999.0));
        assert_eq!(desc.band_no_data(0), None);
        assert_eq!(desc.range_axes(), &["Band"]);
    }

    #[test]
    fn test_format_candidates_include_native() {
        let desc = world()
            .with_formats(["GeoTIFF", "ArcGrid"])
            .with_native_format("geotiff");
        assert_eq!(desc.format_candidates(), vec!["GeoTIFF", "ArcGrid"]);

        let desc = desc.with_native_format("NetCDF");
        assert_eq!(desc.format_candidates(), vec!["GeoTIFF", "ArcGrid", "NetCDF"]);
    }

    #[test]
    fn test_supported_crs_is_union() {
        let mut desc = world();
        desc.response_crs.push("EPSG:3857".to_string());
        let all: Vec<&str> = desc.supported_crs().collect();
        assert_eq!(all, vec!["EPSG:4326", "EPSG:4326", "EPSG:3857"]);
        assert_eq!(desc.native_crs.code, CrsCode::Epsg4326);
    }

    #[test]
    fn test_descriptor_serde_roundtrip() {
        let desc = world().with_formats(["GeoTIFF"]);
        let json = serde_json::to_string(&desc).unwrap();
        let back: CoverageDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
