//! Request validation.
//!
//! Everything that can be checked without touching raster data is checked
//! here, in a fixed order, and the first failure is returned. A request
//! that passes comes out as a [`ValidatedQuery`] holding every resolved
//! parameter the rest of the pipeline needs.

use tracing::{debug, warn};
use wcs_common::{
    CoverageDescriptor, Crs, Envelope, GridGeometry, QueryRequest, WcsError, RANGE_AXIS_BAND,
};

use crate::bands::BandSelector;
use crate::config::CoverageProcessorConfig;
use crate::envelope_resolver::EnvelopeResolver;
use crate::error::Result;
use crate::format::{FormatNegotiator, ResolvedFormat};
use crate::grid_builder::{check_request_grid, GridGeometryBuilder};
use crate::types::InterpolationMethod;

/// A request with every parameter resolved against its coverage.
#[derive(Debug, Clone)]
pub struct ValidatedQuery {
    pub coverage_id: String,
    /// Requested area in the native CRS, easting first, not clipped to the
    /// coverage.
    pub envelope: Envelope,
    /// Output grid, in the native CRS.
    pub target_grid: GridGeometry,
    pub native_crs: Crs,
    /// Output CRS in the axis order the client used.
    pub target_crs: Crs,
    pub interpolation: InterpolationMethod,
    pub format: ResolvedFormat,
    /// Band indices in output order.
    pub bands: Vec<usize>,
}

impl ValidatedQuery {
    /// Whether the output CRS differs from the native one.
    pub fn needs_reprojection(&self) -> bool {
        !self.native_crs.same_code(&self.target_crs)
    }
}

/// Checks requests against a coverage description before any I/O.
#[derive(Debug, Clone, Copy)]
pub struct RequestValidator<'a> {
    negotiator: &'a FormatNegotiator,
    config: &'a CoverageProcessorConfig,
}

impl<'a> RequestValidator<'a> {
    pub fn new(negotiator: &'a FormatNegotiator, config: &'a CoverageProcessorConfig) -> Self {
        Self { negotiator, config }
    }

    /// Validate `request` against `descriptor`.
    pub fn validate(
        &self,
        descriptor: &CoverageDescriptor,
        request: &QueryRequest,
    ) -> Result<ValidatedQuery> {
        // Domain subset
        let envelope = match &request.domain_subset.envelope {
            Some(requested) => EnvelopeResolver::new(descriptor).resolve(requested)?,
            None => descriptor.native_envelope.clone(),
        };
        if let Some(grid) = &request.domain_subset.grid {
            check_request_grid(grid)?;
        }

        // Range subset
        let axes = &request.range_subset.axes;
        if axes.len() > 1 {
            return Err(WcsError::invalid(
                "RangeSubset",
                format!("multi-axis range subsets are not supported, got {} axes", axes.len()),
            ));
        }
        let band_subset = axes.first();
        if let Some(subset) = band_subset {
            if !subset.axis.eq_ignore_ascii_case(RANGE_AXIS_BAND) {
                return Err(WcsError::invalid(
                    "RangeSubset",
                    format!(
                        "unknown range axis '{}', expected '{}'",
                        subset.axis, RANGE_AXIS_BAND
                    ),
                ));
            }
        }

        let interpolation = self.resolve_interpolation(descriptor, request.interpolation.as_deref())?;

        let format = self.negotiator.resolve(descriptor, &request.output.format)?;

        let target_crs = resolve_output_crs(descriptor, request.output.crs.as_deref())?;

        let bands = BandSelector::new(descriptor).resolve(band_subset)?;

        let clipped = envelope
            .intersection(&descriptor.native_envelope)
            .unwrap_or_else(|| envelope.clone());
        let target_grid = GridGeometryBuilder.build(
            request.domain_subset.grid.as_ref(),
            &descriptor.grid_geometry,
            &clipped,
        )?;

        let output_values = target_grid
            .range()
            .cell_count()
            .and_then(|cells| cells.checked_mul(bands.len() as u64));
        if output_values.map_or(true, |n| n > self.config.max_output_pixels) {
            return Err(WcsError::invalid(
                "GridOffsets",
                format!(
                    "output of {}x{} cells and {} bands exceeds the limit of {} values",
                    target_grid.width(),
                    target_grid.height(),
                    bands.len(),
                    self.config.max_output_pixels
                ),
            ));
        }

        debug!(
            coverage = %descriptor.id,
            width = target_grid.width(),
            height = target_grid.height(),
            bands = bands.len(),
            crs = %target_crs,
            interpolation = %interpolation,
            format = %format.declared,
            "Request validated"
        );

        Ok(ValidatedQuery {
            coverage_id: descriptor.id.clone(),
            envelope,
            target_grid,
            native_crs: descriptor.native_crs.to_xy(),
            target_crs,
            interpolation,
            format,
            bands,
        })
    }

    fn resolve_interpolation(
        &self,
        descriptor: &CoverageDescriptor,
        requested: Option<&str>,
    ) -> Result<InterpolationMethod> {
        let Some(name) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(descriptor
                .default_interpolation
                .as_deref()
                .and_then(InterpolationMethod::parse)
                .unwrap_or(self.config.default_interpolation));
        };

        let wanted = interpolation_key(name);
        let listed = descriptor
            .interpolation_methods
            .iter()
            .find(|m| interpolation_key(m) == wanted)
            .ok_or_else(|| {
                WcsError::invalid(
                    "RangeSubset",
                    format!(
                        "interpolation '{}' is not supported, expected one of: {}",
                        name,
                        descriptor.interpolation_methods.join(", ")
                    ),
                )
            })?;

        Ok(InterpolationMethod::parse(listed).unwrap_or_else(|| {
            warn!(
                coverage = %descriptor.id,
                interpolation = %listed,
                "No kernel for interpolation, using nearest neighbor"
            );
            InterpolationMethod::Nearest
        }))
    }
}

fn interpolation_key(name: &str) -> String {
    let key = name.trim().to_lowercase();
    if key == "nearest" {
        "nearest neighbor".to_string()
    } else {
        key
    }
}

/// The requested output CRS, or the native CRS when omitted.
fn resolve_output_crs(descriptor: &CoverageDescriptor, requested: Option<&str>) -> Result<Crs> {
    let Some(identifier) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(descriptor.native_crs);
    };

    let crs = Crs::from_identifier(identifier)?;
    let supported = descriptor
        .supported_crs()
        .filter_map(|s| Crs::from_identifier(s).ok())
        .any(|c| c.same_code(&crs));
    if !supported {
        return Err(WcsError::invalid(
            "CRS",
            format!("CRS '{}' is not offered for coverage {}", identifier, descriptor.id),
        ));
    }
    Ok(crs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{self, world_descriptor};
    use wcs_common::{AxisOrder, AxisSubset, CrsCode, ExceptionCode, GridRange, RequestGrid};

    fn validate(request: &QueryRequest) -> Result<ValidatedQuery> {
        validate_with(request, &CoverageProcessorConfig::default())
    }

    fn validate_with(
        request: &QueryRequest,
        config: &CoverageProcessorConfig,
    ) -> Result<ValidatedQuery> {
        let negotiator = FormatNegotiator::default();
        RequestValidator::new(&negotiator, config).validate(&world_descriptor(), request)
    }

    fn centre() -> Envelope {
        fixtures::envelope(fixtures::bbox::CENTRE, Some(Crs::wgs84()))
    }

    fn locator(err: WcsError) -> String {
        assert_eq!(err.code(), ExceptionCode::InvalidParameterValue);
        err.locator().unwrap_or_default().to_string()
    }

    #[test]
    fn test_valid_request() {
        let request = QueryRequest::new("world", "GeoTIFF")
            .with_envelope(centre())
            .with_bands(["2"]);
        let query = validate(&request).unwrap();
        assert_eq!(query.bands, vec![1]);
        assert_eq!((query.target_grid.width(), query.target_grid.height()), (20, 10));
        assert_eq!(query.target_crs, Crs::wgs84());
        assert_eq!(query.interpolation, InterpolationMethod::Nearest);
        assert_eq!(query.format.declared, "GeoTIFF");
        assert!(!query.needs_reprojection());
    }

    #[test]
    fn test_whole_coverage_by_default() {
        let query = validate(&QueryRequest::new("world", "GeoTIFF")).unwrap();
        assert_eq!(query.bands, vec![0, 1]);
        assert_eq!((query.target_grid.width(), query.target_grid.height()), (360, 180));
    }

    #[test]
    fn test_bad_bbox_reported_first() {
        let request = QueryRequest::new("world", "image/webp")
            .with_envelope(fixtures::envelope(fixtures::bbox::INVALID, Some(Crs::wgs84())))
            .with_bands(["7"]);
        assert_eq!(locator(validate(&request).unwrap_err()), "BoundingBox");
    }

    #[test]
    fn test_range_subset_axis() {
        let mut request = QueryRequest::new("world", "GeoTIFF");
        request.range_subset.axes = vec![AxisSubset::values("Time", ["1"])];
        assert_eq!(locator(validate(&request).unwrap_err()), "RangeSubset");

        request.range_subset.axes = vec![
            AxisSubset::values("Band", ["1"]),
            AxisSubset::values("Band", ["2"]),
        ];
        assert_eq!(locator(validate(&request).unwrap_err()), "RangeSubset");

        request.range_subset.axes = vec![AxisSubset::values("band", ["nir"])];
        assert_eq!(validate(&request).unwrap().bands, vec![1]);
    }

    #[test]
    fn test_interpolation() {
        let request = QueryRequest::new("world", "GeoTIFF").with_interpolation("BILINEAR");
        assert_eq!(validate(&request).unwrap().interpolation, InterpolationMethod::Bilinear);

        let request = QueryRequest::new("world", "GeoTIFF").with_interpolation("nearest");
        assert_eq!(validate(&request).unwrap().interpolation, InterpolationMethod::Nearest);

        let request = QueryRequest::new("world", "GeoTIFF").with_interpolation("lanczos");
        assert_eq!(locator(validate(&request).unwrap_err()), "RangeSubset");

        let request = QueryRequest::new("world", "GeoTIFF").with_interpolation("  ");
        assert_eq!(validate(&request).unwrap().interpolation, InterpolationMethod::Nearest);
    }

    #[test]
    fn test_listed_interpolation_without_kernel() {
        let descriptor = world_descriptor().with_interpolations(["nearest neighbor", "average"], None);
        let negotiator = FormatNegotiator::default();
        let config = CoverageProcessorConfig::default();
        let request = QueryRequest::new("world", "GeoTIFF").with_interpolation("average");
        let query = RequestValidator::new(&negotiator, &config)
            .validate(&descriptor, &request)
            .unwrap();
        assert_eq!(query.interpolation, InterpolationMethod::Nearest);
    }

    #[test]
    fn test_format() {
        let request = QueryRequest::new("world", "image/tiff");
        assert_eq!(validate(&request).unwrap().format.declared, "GeoTIFF");

        let request = QueryRequest::new("world", "image/png");
        assert_eq!(locator(validate(&request).unwrap_err()), "format");
    }

    #[test]
    fn test_output_crs() {
        let request = QueryRequest::new("world", "GeoTIFF").with_output_crs("EPSG:3857");
        let query = validate(&request).unwrap();
        assert_eq!(query.target_crs.code, CrsCode::Epsg3857);
        assert!(query.needs_reprojection());

        let request = QueryRequest::new("world", "GeoTIFF")
            .with_output_crs("http://www.opengis.net/def/crs/EPSG/0/4326");
        let query = validate(&request).unwrap();
        assert_eq!(query.target_crs.axis_order, AxisOrder::LatLon);
        assert!(!query.needs_reprojection());

        let request = QueryRequest::new("world", "GeoTIFF").with_output_crs("EPSG:3031");
        assert_eq!(locator(validate(&request).unwrap_err()), "CRS");

        let request = QueryRequest::new("world", "GeoTIFF").with_output_crs("EPSG:27700");
        assert_eq!(locator(validate(&request).unwrap_err()), "CRS");
    }

    #[test]
    fn test_request_grid_checked() {
        let request = QueryRequest::new("world", "GeoTIFF").with_grid(RequestGrid {
            range: Some(GridRange::new(vec![0, 10], vec![10, 0])),
            ..Default::default()
        });
        assert_eq!(locator(validate(&request).unwrap_err()), "GridRange");
    }

    #[test]
    fn test_output_limit() {
        let config = CoverageProcessorConfig::default().with_max_output_pixels(100);
        let request = QueryRequest::new("world", "GeoTIFF").with_envelope(centre());
        // 20 x 10 cells x 2 bands
        assert_eq!(locator(validate_with(&request, &config).unwrap_err()), "GridOffsets");

        let config = CoverageProcessorConfig::default().with_max_output_pixels(400);
        assert!(validate_with(&request, &config).is_ok());
    }

    #[test]
    fn test_oversized_grids_hit_output_limit() {
        let grids = [
            RequestGrid {
                range: Some(GridRange::new(vec![0, 0], vec![1 << 33, 1 << 33])),
                ..Default::default()
            },
            RequestGrid {
                range: Some(GridRange::new(vec![i64::MIN, 0], vec![i64::MAX, 0])),
                ..Default::default()
            },
            RequestGrid {
                offsets: Some([1e-300, 1e-300]),
                ..Default::default()
            },
        ];
        for grid in grids {
            let request = QueryRequest::new("world", "GeoTIFF").with_grid(grid);
            assert_eq!(locator(validate(&request).unwrap_err()), "GridOffsets");
        }
    }

    #[test]
    fn test_disjoint_envelope_passes_validation() {
        let request = QueryRequest::new("world", "GeoTIFF").with_envelope(fixtures::envelope(
            fixtures::bbox::OFF_WORLD,
            Some(Crs::wgs84()),
        ));
        let query = validate(&request).unwrap();
        assert_eq!(query.envelope.min_x(), 200.0);
    }
}
