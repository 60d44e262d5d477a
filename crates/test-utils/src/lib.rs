//! Shared test utilities for the vegetation audit workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic scene, composite and index generators
//! - Scripted composite providers with per-year outcomes
//! - Common coordinates and radii
//! - Approximate-equality assertion macros
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
//! Then import in your integration tests:
//!
//! ```ignore
//! use test_utils::{fixtures, ScriptedProvider, assert_approx_eq};
//! ```

pub mod fixtures;
pub mod generators;
pub mod providers;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use providers::*;

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

/// Approximate equality for optional values; `None` only equals `None`.
///
/// ```ignore
/// assert_opt_approx_eq!(Some(0.6667_f32), Some(2.0 / 3.0), 1e-3);
/// ```
#[macro_export]
macro_rules! assert_opt_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        match ($left, $right) {
            (Some(l), Some(r)) => $crate::assert_approx_eq!(l, r, $epsilon),
            (None, None) => {}
            (l, r) => panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`",
                l, r
            ),
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_opt_approx_eq() {
        assert_opt_approx_eq!(Some(0.5001_f64), Some(0.5_f64), 0.001);
        assert_opt_approx_eq!(None::<f64>, None::<f64>, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_opt_approx_eq_rejects_missing() {
        assert_opt_approx_eq!(Some(0.5_f64), None::<f64>, 0.001);
    }
}
