//! Common test fixtures for coverage tests.
//!
//! This module provides pre-defined coverage descriptions that represent
//! common scenarios in coverage retrieval.

use wcs_common::{BandDefinition, CoverageDescriptor, Crs, CrsCode, Envelope, GridGeometry};

/// Common bounding box definitions for testing, as (min_x, min_y, max_x, max_y).
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// A box straddling the prime meridian and the equator
    pub const CENTRE: (f64, f64, f64, f64) = (-10.0, -5.0, 10.0, 5.0);

    /// Crosses antimeridian (Pacific-centric, min > max)
    pub const PACIFIC: (f64, f64, f64, f64) = (175.0, -10.0, -175.0, 10.0);

    /// Arctic cap north of 60N
    pub const ARCTIC: (f64, f64, f64, f64) = (-180.0, 60.0, 180.0, 90.0);

    /// Entirely outside a -180..180 world
    pub const OFF_WORLD: (f64, f64, f64, f64) = (200.0, 0.0, 210.0, 10.0);

    /// Invalid bbox (min > max on latitude)
    pub const INVALID: (f64, f64, f64, f64) = (-10.0, 10.0, 10.0, -10.0);
}

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic, longitude first
    pub const EPSG_4326: &str = "EPSG:4326";

    /// WGS84 geographic, latitude first
    pub const URN_4326: &str = "urn:ogc:def:crs:EPSG::4326";

    /// Web Mercator
    pub const EPSG_3857: &str = "EPSG:3857";

    /// NSIDC north polar stereographic
    pub const EPSG_3413: &str = "EPSG:3413";

    /// OGC longitude-first WGS84
    pub const CRS_84: &str = "CRS:84";
}

/// Identifier of [`world_descriptor`].
pub const WORLD_ID: &str = "world";

/// Grid size of [`world_descriptor`].
pub const WORLD_SIZE: (usize, usize) = (360, 180);

/// No-data value of the `nir` band of [`world_descriptor`].
pub const NIR_NO_DATA: f64 = -9999.0;

/// Envelope from a fixture bbox, easting first.
pub fn envelope(bbox: (f64, f64, f64, f64), crs: Option<Crs>) -> Envelope {
    Envelope::from_xy(bbox.0, bbox.1, bbox.2, bbox.3, crs)
}

/// A 1-degree global coverage in EPSG:4326 with bands `red` and `nir`.
///
/// Declares GeoTIFF and ArcGrid output, the geographic, Mercator and
/// north polar CRSs, and all three interpolation kernels.
pub fn world_descriptor() -> CoverageDescriptor {
    world_descriptor_in(CrsCode::Epsg4326)
}

/// A 360x180 coverage with bands `red` and `nir` over the whole valid
/// extent of `code`.
pub fn world_descriptor_in(code: CrsCode) -> CoverageDescriptor {
    let crs = Crs::new(code);
    let [min_x, min_y, max_x, max_y] = code.valid_extent();
    let env = Envelope::from_xy(min_x, min_y, max_x, max_y, Some(crs));
    let (width, height) = WORLD_SIZE;
    let grid = match GridGeometry::from_envelope(&env, width, height) {
        Ok(grid) => grid,
        Err(e) => panic!("fixture grid is invalid: {e}"),
    };

    CoverageDescriptor::new(
        WORLD_ID,
        crs,
        grid,
        vec![
            BandDefinition::new("red").with_description("Red reflectance"),
            BandDefinition::new("nir")
                .with_description("Near infrared reflectance")
                .with_no_data(NIR_NO_DATA),
        ],
    )
    .with_title("World reflectance")
    .with_formats(["GeoTIFF", "ArcGrid"])
    .with_native_format("GeoTIFF")
    .with_crs_list([
        crs::EPSG_4326,
        crs::URN_4326,
        crs::EPSG_3857,
        crs::EPSG_3413,
    ])
    .with_interpolations(["nearest neighbor", "bilinear", "bicubic"], Some("nearest neighbor"))
}

/// A 10x10 coverage over (-10, -10, 10, 10) in EPSG:4326 with the given bands.
pub fn descriptor_with_bands<S: AsRef<str>>(names: &[S]) -> CoverageDescriptor {
    let env = envelope((-10.0, -10.0, 10.0, 10.0), Some(Crs::wgs84()));
    let grid = match GridGeometry::from_envelope(&env, 10, 10) {
        Ok(grid) => grid,
        Err(e) => panic!("fixture grid is invalid: {e}"),
    };
    CoverageDescriptor::new(
        "bands",
        Crs::wgs84(),
        grid,
        names
            .iter()
            .map(|n| BandDefinition::new(n.as_ref()))
            .collect(),
    )
    .with_formats(["GeoTIFF"])
}
