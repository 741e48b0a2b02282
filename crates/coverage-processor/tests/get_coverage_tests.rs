//! End-to-end GetCoverage tests against in-memory and file-backed readers.

use std::sync::Arc;
use std::time::Duration;

use coverage_processor::{
    encode_bands, Band, CoverageProcessorConfig, CoverageService, GridCoverage, InMemoryCatalog,
    MemoryCoverageReader,
};
use test_utils::fixtures::{
    bbox, crs, descriptor_with_bands, envelope, world_descriptor, NIR_NO_DATA, WORLD_SIZE,
};
use test_utils::{assert_approx_eq, assert_envelope_approx_eq, create_band_stack};
use tokio_util::sync::CancellationToken;
use wcs_common::{
    AxisOrder, AxisSubset, CoverageDescriptor, Crs, CrsCode, Envelope, ExceptionCode,
    QueryRequest, RangeSubset, WcsError, RANGE_AXIS_BAND,
};

// ============================================================================
// Helpers
// ============================================================================

/// The world raster: value = band * 1_000_000 + col * 1000 + row.
fn world_raster() -> GridCoverage {
    let (width, height) = WORLD_SIZE;
    let stack = create_band_stack(width, height, 2);
    GridCoverage::new(
        width,
        height,
        vec![
            Band::new("red", stack[0].clone()),
            Band::new("nir", stack[1].clone()).with_no_data(NIR_NO_DATA as f32),
        ],
        envelope(bbox::GLOBAL, None),
        Crs::wgs84(),
    )
    .unwrap()
}

fn world_reader() -> Arc<MemoryCoverageReader> {
    Arc::new(MemoryCoverageReader::new().with_coverage("world", world_raster()))
}

fn service_with(
    descriptor: CoverageDescriptor,
    reader: Arc<MemoryCoverageReader>,
    config: CoverageProcessorConfig,
) -> CoverageService {
    let catalog = InMemoryCatalog::from_descriptors([descriptor]).unwrap();
    CoverageService::new(Arc::new(catalog), reader, config)
}

fn world_service(reader: Arc<MemoryCoverageReader>) -> CoverageService {
    service_with(world_descriptor(), reader, CoverageProcessorConfig::default())
}

fn centre_request() -> QueryRequest {
    QueryRequest::new("world", "GeoTIFF").with_envelope(envelope(bbox::CENTRE, Some(Crs::wgs84())))
}

// ============================================================================
// Worked scenario
// ============================================================================

#[tokio::test]
async fn test_single_band_subset_by_index() {
    let descriptor = world_descriptor()
        .with_formats(["GeoTIFF"])
        .with_crs_list([crs::EPSG_4326]);
    let service = service_with(descriptor, world_reader(), CoverageProcessorConfig::default());

    let request = centre_request()
        .with_bands(["2"])
        .with_output_crs(crs::EPSG_4326);
    let result = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!((result.coverage.width, result.coverage.height), (20, 10));
    assert_eq!(result.coverage.band_names(), vec!["nir"]);
    assert_eq!(result.coverage.bands[0].no_data, Some(NIR_NO_DATA as f32));
    assert_envelope_approx_eq!(result.coverage.envelope, (-10.0, -5.0, 10.0, 5.0), 1e-9);
    assert_eq!(result.crs, Crs::wgs84());
    assert_eq!(result.format.declared, "GeoTIFF");
    assert_eq!(result.format.mime_type.as_deref(), Some("image/tiff"));

    // Top-left output cell is native column 170, row 85 of the nir band
    assert_eq!(result.coverage.bands[0].data[0], 1_170_085.0);
    assert_eq!(result.grid_geometry.range().low, vec![170, 85]);
}

// ============================================================================
// Envelope handling
// ============================================================================

#[tokio::test]
async fn test_antimeridian_request_is_ten_degrees_wide() {
    let service = world_service(world_reader());
    let request = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope(bbox::PACIFIC, Some(Crs::wgs84())));

    let (_, query) = service.validate(&request).unwrap();
    assert!(query.envelope.is_valid());
    assert_approx_eq!(query.envelope.width(), 10.0, 1e-9);

    let result = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap();
    // Only the part inside the coverage is returned
    assert_eq!((result.coverage.width, result.coverage.height), (5, 20));
}

#[tokio::test]
async fn test_antimeridian_request_on_pacific_centred_coverage() {
    let native = envelope((0.0, -90.0, 360.0, 90.0), Some(Crs::wgs84()));
    let (width, height) = WORLD_SIZE;
    let grid = wcs_common::GridGeometry::from_envelope(&native, width, height).unwrap();
    let descriptor = CoverageDescriptor::new(
        "pacific",
        Crs::wgs84(),
        grid,
        vec![wcs_common::BandDefinition::new("red")],
    )
    .with_formats(["GeoTIFF"]);
    let raster = GridCoverage::new(
        width,
        height,
        vec![Band::new("red", create_band_stack(width, height, 1).remove(0))],
        native,
        Crs::wgs84(),
    )
    .unwrap();
    let reader = Arc::new(MemoryCoverageReader::new().with_coverage("pacific", raster));
    let service = service_with(descriptor, reader, CoverageProcessorConfig::default());

    let request = QueryRequest::new("pacific", "GeoTIFF")
        .with_envelope(envelope(bbox::PACIFIC, Some(Crs::wgs84())));
    let result = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!((result.coverage.width, result.coverage.height), (10, 20));
    assert_envelope_approx_eq!(result.coverage.envelope, (175.0, -10.0, 185.0, 10.0), 1e-9);
    // Columns 175..185 of rows 80..100, continuous across 180
    assert_eq!(result.coverage.bands[0].data[0], 175_080.0);
    assert_eq!(result.coverage.bands[0].data[5], 180_080.0);
    assert_eq!(result.coverage.bands[0].data[199], 184_099.0);
}

#[tokio::test]
async fn test_unaligned_envelope_delivered_at_native_resolution() {
    let service = world_service(world_reader());
    let request = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope((-10.5, -5.25, 10.2, 5.0), Some(Crs::wgs84())))
        .with_bands(["nir"]);

    let (_, query) = service.validate(&request).unwrap();
    let result = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap();

    // Snapped outward to whole native cells
    assert_eq!((result.coverage.width, result.coverage.height), (22, 11));
    assert_eq!(result.coverage.resolution(), (1.0, 1.0));
    assert_envelope_approx_eq!(result.coverage.envelope, (-11.0, -6.0, 11.0, 5.0), 1e-9);
    assert_eq!(result.grid_geometry, query.target_grid);
    assert_eq!(result.grid_geometry.transform().scale_x, 1.0);
    // Native column 169, row 85 copied unchanged
    assert_eq!(result.coverage.bands[0].data[0], 1_169_085.0);
}

#[tokio::test]
async fn test_disjoint_envelope_is_no_applicable_code() {
    let service = world_service(world_reader());
    let request = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope(bbox::OFF_WORLD, Some(Crs::wgs84())));

    let err = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WcsError::EmptyIntersection));
    assert_eq!(err.code(), ExceptionCode::NoApplicableCode);
}

#[tokio::test]
async fn test_inverted_latitude_rejected() {
    let reader = world_reader();
    let service = world_service(reader.clone());
    let request = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope(bbox::INVALID, Some(Crs::wgs84())));

    let err = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.locator(), Some("BoundingBox"));
    assert_eq!(reader.read_count(), 0);
}

#[tokio::test]
async fn test_latitude_first_request_keeps_axis_order() {
    let service = world_service(world_reader());
    let urn = Crs::from_identifier(crs::URN_4326).unwrap();
    let request = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope(bbox::CENTRE, Some(urn)))
        .with_output_crs(crs::URN_4326);

    let result = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!((result.coverage.width, result.coverage.height), (20, 10));
    assert_eq!(result.crs.axis_order, AxisOrder::LatLon);
    // The raster itself is always easting first
    assert_envelope_approx_eq!(result.coverage.envelope, (-10.0, -5.0, 10.0, 5.0), 1e-9);
}

#[tokio::test]
async fn test_crs84_envelope_matches_epsg4326() {
    let service = world_service(world_reader());
    let crs84 = Crs::from_identifier(crs::CRS_84).unwrap();
    let request = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope(bbox::CENTRE, Some(crs84)));
    let cancel = CancellationToken::new();

    let a = service.get_coverage(&request, &cancel).await.unwrap();
    let b = service.get_coverage(&centre_request(), &cancel).await.unwrap();
    assert_eq!(a.coverage, b.coverage);
}

// ============================================================================
// Fail-fast validation
// ============================================================================

#[tokio::test]
async fn test_bad_band_index_fails_before_read() {
    let reader = world_reader();
    let service = world_service(reader.clone());
    let request = centre_request().with_bands(["5"]);

    let err = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ExceptionCode::InvalidParameterValue);
    assert_eq!(err.locator(), Some("RangeSubset"));
    assert_eq!(reader.read_count(), 0);
}

#[tokio::test]
async fn test_band_interval_with_step() {
    let names = ["b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8"];
    let service = service_with(
        descriptor_with_bands(&names[..]),
        Arc::new(MemoryCoverageReader::new()),
        CoverageProcessorConfig::default(),
    );
    let mut request = QueryRequest::new("bands", "GeoTIFF");
    request.range_subset = RangeSubset {
        axes: vec![AxisSubset::interval(RANGE_AXIS_BAND, "1", "7", Some("2"))],
    };

    let (_, query) = service.validate(&request).unwrap();
    assert_eq!(query.bands, vec![0, 2, 4, 6]);
}

#[tokio::test]
async fn test_output_limit_checked_before_read() {
    let reader = world_reader();
    let config = CoverageProcessorConfig {
        max_output_pixels: 100,
        ..Default::default()
    };
    let service = service_with(world_descriptor(), reader.clone(), config);

    let err = service
        .get_coverage(&QueryRequest::new("world", "GeoTIFF"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.locator(), Some("GridOffsets"));
    assert_eq!(reader.read_count(), 0);
}

#[tokio::test]
async fn test_unsupported_output_crs() {
    let service = world_service(world_reader());
    let err = service
        .get_coverage(
            &centre_request().with_output_crs("EPSG:32633"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.locator(), Some("CRS"));
}

// ============================================================================
// Format negotiation
// ============================================================================

#[tokio::test]
async fn test_mime_type_resolves_to_declared_encoder() {
    let service = world_service(world_reader());
    let cancel = CancellationToken::new();

    let by_name = service.get_coverage(&centre_request(), &cancel).await.unwrap();
    let mut by_mime = centre_request();
    by_mime.output.format = "image/tiff".to_string();
    let by_mime = service.get_coverage(&by_mime, &cancel).await.unwrap();

    assert_eq!(by_mime.format.encoder, by_name.format.encoder);
    assert_eq!(by_mime.format.encoder.as_deref(), Some("GeoTIFF"));
    assert_eq!(by_mime.coverage, by_name.coverage);
}

#[tokio::test]
async fn test_undeclared_format_rejected() {
    let service = world_service(world_reader());
    let mut request = centre_request();
    request.output.format = "image/png".to_string();

    let err = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.locator(), Some("format"));
}

// ============================================================================
// Reprojection
// ============================================================================

#[tokio::test]
async fn test_mercator_output_keeps_shape() {
    let service = world_service(world_reader());
    let request = centre_request()
        .with_bands(["red", "nir"])
        .with_interpolation("bilinear")
        .with_output_crs(crs::EPSG_3857);

    let result = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.coverage.crs.code, CrsCode::Epsg3857);
    assert_eq!((result.coverage.width, result.coverage.height), (20, 10));
    assert_eq!(result.coverage.band_count(), 2);
    assert_eq!(result.grid_geometry.crs().map(|c| c.code), Some(CrsCode::Epsg3857));
    assert_approx_eq!(result.coverage.envelope.max_x(), 1_113_194.9, 1.0);
}

#[tokio::test]
async fn test_arctic_cap_to_polar_stereographic() {
    let service = world_service(world_reader());
    let request = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope(bbox::ARCTIC, Some(Crs::wgs84())))
        .with_bands(["red"])
        .with_output_crs(crs::EPSG_3413);

    let result = service
        .get_coverage(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.coverage.crs.code, CrsCode::Epsg3413);
    assert_eq!((result.coverage.width, result.coverage.height), (360, 30));
    assert_eq!(result.coverage.band_count(), 1);
    // The cap is centred on the pole
    assert!(result.coverage.envelope.contains_point(0.0, 0.0));
}

#[tokio::test]
async fn test_scale_and_reproject_same_shape_with_or_without_crop() {
    let service = world_service(world_reader());
    let cancel = CancellationToken::new();

    // Whole coverage: the crop stage has nothing to do
    let grid = wcs_common::RequestGrid {
        range: Some(wcs_common::GridRange::from_size(90, 45)),
        ..Default::default()
    };
    let whole = QueryRequest::new("world", "GeoTIFF")
        .with_grid(grid.clone())
        .with_output_crs(crs::EPSG_3857);
    let cropped = QueryRequest::new("world", "GeoTIFF")
        .with_envelope(envelope((-179.0, -89.0, 179.0, 89.0), Some(Crs::wgs84())))
        .with_grid(grid)
        .with_output_crs(crs::EPSG_3857);

    let a = service.get_coverage(&whole, &cancel).await.unwrap();
    let b = service.get_coverage(&cropped, &cancel).await.unwrap();
    for result in [&a, &b] {
        assert_eq!(result.coverage.crs.code, CrsCode::Epsg3857);
        assert_eq!((result.coverage.width, result.coverage.height), (90, 45));
        assert_eq!(result.coverage.band_count(), 2);
    }
}

// ============================================================================
// Timeouts and cancellation
// ============================================================================

#[tokio::test]
async fn test_slow_read_times_out() {
    let reader = Arc::new(
        MemoryCoverageReader::new()
            .with_coverage("world", world_raster())
            .with_delay(Duration::from_secs(5)),
    );
    let config = CoverageProcessorConfig::default().with_read_timeout(Duration::from_millis(50));
    let service = service_with(world_descriptor(), reader, config);

    let err = service
        .get_coverage(&centre_request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WcsError::Timeout));
    assert_eq!(err.code(), ExceptionCode::NoApplicableCode);
}

#[tokio::test]
async fn test_cancel_during_read() {
    let reader = Arc::new(
        MemoryCoverageReader::new()
            .with_coverage("world", world_raster())
            .with_delay(Duration::from_secs(5)),
    );
    let service = world_service(reader.clone());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = service
        .get_coverage(&centre_request(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, WcsError::Cancelled));
    assert_eq!(reader.read_count(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start_never_reads() {
    let reader = world_reader();
    let service = world_service(reader.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = service
        .get_coverage(&centre_request(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, WcsError::Cancelled));
    assert_eq!(reader.read_count(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_share_service() {
    let service = Arc::new(world_service(world_reader()));
    let requests = [["red"], ["nir"], ["1"], ["2"]];

    let results = futures::future::join_all(requests.iter().map(|bands| {
        let service = service.clone();
        let request = centre_request().with_bands(*bands);
        async move { service.get_coverage(&request, &CancellationToken::new()).await }
    }))
    .await;

    let names: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().coverage.bands[0].name.clone())
        .collect();
    assert_eq!(names, vec!["red", "nir", "red", "nir"]);
    assert_eq!(service.metrics().snapshot().await.requests, 4);
}

// ============================================================================
// File-backed catalog
// ============================================================================

const CATALOG: &str = r#"
coverages:
  - id: world
    crs: EPSG:4326
    envelope: [-180, -90, 180, 90]
    width: 360
    height: 180
    bands:
      - name: red
      - name: nir
        no_data: [-9999]
    formats: [GeoTIFF, ArcGrid]
    native_format: GeoTIFF
    crs_list: [EPSG:4326, EPSG:3857]
    data_path: world.f32
"#;

#[tokio::test]
async fn test_raw_file_reader_matches_memory_reader() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("coverages.yaml");
    std::fs::write(&catalog_path, CATALOG).unwrap();
    std::fs::write(dir.path().join("world.f32"), encode_bands(&world_raster().bands)).unwrap();

    let catalog = InMemoryCatalog::from_yaml_file(&catalog_path).unwrap();
    let file_reader = catalog.raw_file_reader();
    let file_service = CoverageService::new(
        Arc::new(catalog),
        Arc::new(file_reader),
        CoverageProcessorConfig::default(),
    );
    let memory_service = world_service(world_reader());

    let request = centre_request().with_bands(["nir"]);
    let cancel = CancellationToken::new();
    let from_file = file_service.get_coverage(&request, &cancel).await.unwrap();
    let from_memory = memory_service.get_coverage(&request, &cancel).await.unwrap();

    assert_eq!(from_file.coverage, from_memory.coverage);
    assert_eq!(from_file.grid_geometry, from_memory.grid_geometry);
}

#[tokio::test]
async fn test_exception_report_for_unknown_coverage() {
    let service = world_service(world_reader());
    let err = service
        .get_coverage(&QueryRequest::new("mars", "GeoTIFF"), &CancellationToken::new())
        .await
        .unwrap_err();

    let report = serde_json::to_value(err.to_report()).unwrap();
    let text = report.to_string();
    assert!(text.contains("InvalidParameterValue"));
    assert!(text.contains("identifier"));
    assert_eq!(err.http_status_code(), 400);
}

#[test]
fn test_envelope_fixture_is_lon_first() {
    let env: Envelope = envelope(bbox::CENTRE, Some(Crs::wgs84()));
    assert_eq!(env.min_x(), -10.0);
    assert_eq!(env.max_y(), 5.0);
}
