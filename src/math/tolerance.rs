//! Relative tolerance predicates shared by every geometric routine.
//!
//! All comparisons are scaled by the magnitudes of the operands involved so
//! that results do not change when the input is uniformly scaled.

use crate::error::{InputError, Result};

use super::{Point, DEFAULT_EPSILON};

/// A validated, non-negative relative tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Creates a tolerance from a raw epsilon.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidTolerance` if `eps` is negative, NaN or infinite.
    pub fn new(eps: f64) -> Result<Self> {
        if eps.is_finite() && eps >= 0.0 {
            Ok(Self(eps))
        } else {
            Err(InputError::InvalidTolerance(eps).into())
        }
    }

    /// Returns the raw epsilon.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Converts the relative epsilon into an absolute threshold for a feature of size `size`.
    #[must_use]
    pub fn scaled(self, size: f64) -> f64 {
        self.0 * size.abs()
    }

    /// Returns `true` if `x` is zero relative to `scale`.
    #[must_use]
    pub fn approx_zero(self, x: f64, scale: f64) -> bool {
        x.abs() <= self.scaled(scale)
    }

    /// Returns `true` if `a` and `b` agree relative to the larger of their magnitudes.
    #[must_use]
    pub fn approx_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.0 * a.abs().max(b.abs())
    }

    /// Returns `true` if two points agree relative to the larger of their norms.
    #[must_use]
    pub fn points_approx_eq<const D: usize>(self, a: &Point<D>, b: &Point<D>) -> bool {
        let scale = a.coords.norm().max(b.coords.norm());
        (a - b).norm() <= self.0 * scale
    }

    /// Returns `true` if two points agree within `eps * size` for a known feature size.
    #[must_use]
    pub fn points_close<const D: usize>(self, a: &Point<D>, b: &Point<D>, size: f64) -> bool {
        (a - b).norm() <= self.scaled(size)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_EPSILON)
    }
}

/// Returns `true` if `p0` and `p1` are far enough apart to define a line.
///
/// The separation must exceed `eps` times the larger endpoint norm.
#[must_use]
pub fn is_line_valid<const D: usize>(p0: &Point<D>, p1: &Point<D>, tol: Tolerance) -> bool {
    let scale = p0.coords.norm().max(p1.coords.norm());
    (p1 - p0).norm() > tol.scaled(scale)
}

/// Returns `true` if `[A, B, C, D]` describes a plane `Ax + By + Cz = D`.
///
/// The normal `[A, B, C]` must be non-zero and not vanish relative to `D`.
#[must_use]
pub fn is_plane_valid(coefficients: &[f64; 4], tol: Tolerance) -> bool {
    if coefficients.iter().any(|c| !c.is_finite()) {
        return false;
    }
    let [a, b, c, d] = *coefficients;
    let normal = (a * a + b * b + c * c).sqrt();
    normal > 0.0 && normal > tol.scaled(d)
}
