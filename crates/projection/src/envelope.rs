//! Envelope transformation between CRSs.

use crate::transform::{CrsTransform, Projection, ProjectionError};
use wcs_common::{Crs, CrsCode, Envelope};

/// Points sampled along each edge when a projection bends the boundary.
pub const DENSIFY_SAMPLES: usize = 21;

/// Transform an envelope into another CRS.
///
/// The result is expressed in the target CRS's axis order.
///
/// - Same projection: the axes are reordered positionally, so an inverted
///   (antimeridian crossing) longitude pair stays inverted.
/// - Both CRSs cylindrical: each edge is transformed on its own, which also
///   preserves inversion.
/// - Otherwise: bounding box of the densified boundary.
pub fn transform_envelope(envelope: &Envelope, target: Crs) -> Result<Envelope, ProjectionError> {
    if envelope.dimension() != 2 {
        return Err(ProjectionError::Dimension(envelope.dimension()));
    }
    let source = envelope.crs.ok_or(ProjectionError::MissingCrs)?;
    let xy = envelope.to_xy();
    let transform = CrsTransform::new(source.code, target.code);

    if transform.is_identity() {
        return Ok(Envelope::from_xy(
            xy.min_x(),
            xy.min_y(),
            xy.max_x(),
            xy.max_y(),
            Some(target),
        ));
    }

    if source.code.is_cylindrical() && target.code.is_cylindrical() {
        let (min_x, min_y) = transform.transform(xy.min_x(), xy.min_y())?;
        let (max_x, max_y) = transform.transform(xy.max_x(), xy.max_y())?;
        return Ok(Envelope::from_xy(min_x, min_y, max_x, max_y, Some(target)));
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in densify_boundary(&xy, DENSIFY_SAMPLES) {
        let (tx, ty) = transform.transform(x, y)?;
        min_x = min_x.min(tx);
        max_x = max_x.max(tx);
        min_y = min_y.min(ty);
        max_y = max_y.max(ty);
    }

    // An azimuthal envelope around its pole covers every longitude
    if target.code.is_geographic() {
        if let Some((pole_lat, (px, py))) = Projection::for_code(source.code).pole() {
            if xy.contains_point(px, py) {
                min_x = -180.0;
                max_x = 180.0;
                min_y = min_y.min(pole_lat);
                max_y = max_y.max(pole_lat);
            }
        }
    }

    Ok(Envelope::from_xy(min_x, min_y, max_x, max_y, Some(target)))
}

/// Sample points along the boundary of an XY envelope, corners included.
pub fn densify_boundary(envelope: &Envelope, samples: usize) -> Vec<(f64, f64)> {
    let samples = samples.max(2);
    let (min_x, min_y, max_x, max_y) = (
        envelope.min_x(),
        envelope.min_y(),
        envelope.max_x(),
        envelope.max_y(),
    );

    let mut points = Vec::with_capacity(samples * 4);
    for i in 0..samples {
        let frac = i as f64 / (samples - 1) as f64;
        let x = min_x + frac * (max_x - min_x);
        let y = min_y + frac * (max_y - min_y);
        points.push((x, min_y));
        points.push((x, max_y));
        points.push((min_x, y));
        points.push((max_x, y));
    }
    points
}

/// Clip a geographic XY envelope to the latitudes `target` can project.
///
/// Envelopes in projected CRSs are returned unchanged. Returns None when no
/// part of the envelope is projectable.
pub fn clamp_to_domain(envelope: &Envelope, target: CrsCode) -> Option<Envelope> {
    let is_geographic = envelope.crs.map(|c| c.is_geographic()).unwrap_or(false);
    if !is_geographic {
        return Some(envelope.clone());
    }

    let (south, north) = Projection::for_code(target).latitude_domain();
    let min_y = envelope.min_y().max(south);
    let max_y = envelope.max_y().min(north);
    if min_y >= max_y {
        return None;
    }

    Some(Envelope::from_xy(
        envelope.min_x(),
        min_y,
        envelope.max_x(),
        max_y,
        envelope.crs,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mercator::HALF_WORLD;
    use wcs_common::AxisOrder;

    fn wgs84(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Envelope {
        Envelope::new([min_x, min_y], [max_x, max_y], Some(Crs::wgs84()))
    }

    #[test]
    fn test_same_code_reorders_axes() {
        let env = wgs84(-10.0, -5.0, 10.0, 5.0);
        let urn = Crs::with_authority_order(CrsCode::Epsg4326);
        let out = transform_envelope(&env, urn).unwrap();
        assert_eq!(out.crs.unwrap().axis_order, AxisOrder::LatLon);
        assert_eq!(out.min(0), -5.0);
        assert_eq!(out.max(1), 10.0);
    }

    #[test]
    fn test_same_code_keeps_inversion() {
        let env = Envelope::new([-10.0, 175.0], [10.0, -175.0], Some(Crs::with_authority_order(CrsCode::Epsg4326)));
        let out = transform_envelope(&env, Crs::wgs84()).unwrap();
        assert_eq!(out.min(0), 175.0);
        assert_eq!(out.max(0), -175.0);
    }

    #[test]
    fn test_cylindrical_edges() {
        let env = wgs84(-180.0, -85.0, 180.0, 85.0);
        let out = transform_envelope(&env, Crs::new(CrsCode::Epsg3857)).unwrap();
        assert!((out.min_x() + HALF_WORLD).abs() < 1e-6);
        assert!((out.max_x() - HALF_WORLD).abs() < 1e-6);
        assert!((out.max_y() + out.min_y()).abs() < 1e-6);
    }

    #[test]
    fn test_cylindrical_keeps_inversion() {
        let env = wgs84(175.0, -10.0, -175.0, 10.0);
        let out = transform_envelope(&env, Crs::new(CrsCode::Epsg3857)).unwrap();
        assert!(out.min_x() > out.max_x());
    }

    #[test]
    fn test_pole_latitude_fails_into_mercator() {
        let env = wgs84(-10.0, 0.0, 10.0, 90.0);
        assert!(transform_envelope(&env, Crs::new(CrsCode::Epsg3857)).is_err());
    }

    #[test]
    fn test_polar_envelope_around_pole() {
        let env = Envelope::new(
            [-1_000_000.0, -1_000_000.0],
            [1_000_000.0, 1_000_000.0],
            Some(Crs::new(CrsCode::Epsg3413)),
        );
        let out = transform_envelope(&env, Crs::wgs84()).unwrap();
        assert_eq!(out.min_x(), -180.0);
        assert_eq!(out.max_x(), 180.0);
        assert_eq!(out.max_y(), 90.0);
        assert!(out.min_y() > 75.0 && out.min_y() < 85.0);
    }

    #[test]
    fn test_geographic_to_polar_contains_pole() {
        let env = wgs84(-180.0, 60.0, 180.0, 90.0);
        let out = transform_envelope(&env, Crs::new(CrsCode::Epsg3413)).unwrap();
        assert!(out.contains_point(0.0, 0.0));
        assert!(out.max_x() > 3_000_000.0);
    }

    #[test]
    fn test_densify_includes_corners() {
        let points = densify_boundary(&wgs84(0.0, 0.0, 10.0, 10.0), DENSIFY_SAMPLES);
        assert_eq!(points.len(), DENSIFY_SAMPLES * 4);
        assert!(points.contains(&(0.0, 0.0)));
        assert!(points.contains(&(10.0, 10.0)));
    }

    #[test]
    fn test_clamp_to_domain() {
        let world = wgs84(-180.0, -90.0, 180.0, 90.0);
        let merc = clamp_to_domain(&world, CrsCode::Epsg3857).unwrap();
        assert!(merc.max_y() < 85.06);

        let polar = clamp_to_domain(&world, CrsCode::Epsg3031).unwrap();
        assert_eq!(polar.max_y(), -60.0);

        let tropics = wgs84(-10.0, -20.0, 10.0, 20.0);
        assert!(clamp_to_domain(&tropics, CrsCode::Epsg3413).is_none());
    }
}
