//! Resolution of a requested envelope into the coverage's native CRS.
//!
//! Two corrections happen on the way:
//!
//! - **Axis order**: the request envelope is read in the axis order of its
//!   own CRS (so `urn:ogc:def:crs:EPSG::4326` boxes are latitude first) and
//!   the result is always easting first.
//! - **Antimeridian**: a longitude axis with `min > max` is taken to wrap
//!   around ±180. One bound is shifted by a full revolution, picking the
//!   bound that keeps the box closest to the coverage's own extent.

use projection::transform_envelope;
use tracing::debug;
use wcs_common::{AxisDirection, CoverageDescriptor, Envelope, WcsError};

use crate::error::Result;

const LOCATOR: &str = "BoundingBox";

/// Computes the destination envelope of a request in the native CRS.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeResolver<'a> {
    descriptor: &'a CoverageDescriptor,
}

impl<'a> EnvelopeResolver<'a> {
    pub fn new(descriptor: &'a CoverageDescriptor) -> Self {
        Self { descriptor }
    }

    /// Resolve `request` into the native CRS, easting first.
    ///
    /// An envelope without a CRS is read in the native CRS and its axis order.
    pub fn resolve(&self, request: &Envelope) -> Result<Envelope> {
        if request.dimension() != 2 {
            return Err(WcsError::invalid(
                LOCATOR,
                format!("expected a 2-D envelope, got {} axes", request.dimension()),
            ));
        }
        if request
            .axes
            .iter()
            .any(|a| !a.min.is_finite() || !a.max.is_finite())
        {
            return Err(WcsError::invalid(LOCATOR, "envelope bounds must be finite"));
        }

        let native = self.descriptor.native_crs.to_xy();
        let source = request.crs.unwrap_or(self.descriptor.native_crs);
        let mut envelope = request.clone().with_crs(Some(source));

        if source.is_geographic() {
            let reference = transform_envelope(&self.descriptor.native_envelope, source)
                .ok()
                .map(|e| e.to_xy());
            correct_antimeridian(&mut envelope, reference.as_ref());
        }

        let mut resolved = transform_envelope(&envelope, native)?;

        if !source.is_geographic() && native.is_geographic() {
            correct_antimeridian(&mut resolved, Some(&self.descriptor.native_envelope));
        }

        if !resolved.is_valid() {
            return Err(WcsError::invalid(
                LOCATOR,
                format!(
                    "envelope [{}, {}, {}, {}] has a lower bound above its upper bound",
                    resolved.min_x(),
                    resolved.min_y(),
                    resolved.max_x(),
                    resolved.max_y()
                ),
            ));
        }

        debug!(
            coverage = %self.descriptor.id,
            min_x = resolved.min_x(),
            min_y = resolved.min_y(),
            max_x = resolved.max_x(),
            max_y = resolved.max_y(),
            "Resolved request envelope"
        );
        Ok(resolved)
    }
}

/// Unwrap inverted longitude axes of a geographic envelope in place.
///
/// `reference` is the coverage extent in the same CRS, easting first. When
/// moving the upper bound up a revolution would overshoot it, the lower
/// bound moves down instead.
pub fn correct_antimeridian(envelope: &mut Envelope, reference: Option<&Envelope>) {
    let Some(crs) = envelope.crs else {
        return;
    };
    if !crs.is_geographic() {
        return;
    }

    for (index, axis) in crs.axes().iter().enumerate() {
        if axis.direction != AxisDirection::East {
            continue;
        }
        let Some(extent) = envelope.axes.get_mut(index) else {
            continue;
        };
        if extent.min <= extent.max {
            continue;
        }

        let range = axis.range();
        match reference {
            Some(r) if extent.max + range > r.max_x() => extent.min -= range,
            _ => extent.max += range,
        }
        debug!(
            min = extent.min,
            max = extent.max,
            "Unwrapped envelope crossing the antimeridian"
        );
    }
}
