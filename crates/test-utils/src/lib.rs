//! Shared test utilities for the coverage workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Coverage descriptor fixtures
//! - Band data generators
//! - Approximate equality assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures::world_descriptor};
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of the XY bounds of an envelope.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_envelope_approx_eq;
///
/// assert_envelope_approx_eq!(envelope, (-10.0, -5.0, 10.0, 5.0), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_envelope_approx_eq {
    ($envelope:expr, ($min_x:expr, $min_y:expr, $max_x:expr, $max_y:expr), $epsilon:expr) => {{
        let envelope = &$envelope;
        $crate::assert_approx_eq!(envelope.min_x(), $min_x, $epsilon);
        $crate::assert_approx_eq!(envelope.min_y(), $min_y, $epsilon);
        $crate::assert_approx_eq!(envelope.max_x(), $max_x, $epsilon);
        $crate::assert_approx_eq!(envelope.max_y(), $max_y, $epsilon);
    }};
}
