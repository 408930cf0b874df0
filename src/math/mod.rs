pub mod eigen;
pub mod tolerance;

use crate::error::{InputError, Result};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// Point type of either supported dimension.
pub type Point<const D: usize> = nalgebra::Point<f64, D>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Default relative tolerance used when a caller does not supply one.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Rejects point dimensions other than 2 and 3.
///
/// # Errors
///
/// Returns `InputError::UnsupportedDimension` for any other `D`.
pub fn check_dimension<const D: usize>() -> Result<()> {
    if D == 2 || D == 3 {
        Ok(())
    } else {
        Err(InputError::UnsupportedDimension(D).into())
    }
}

/// Rejects point lists containing NaN or infinite coordinates.
///
/// # Errors
///
/// Returns `InputError::NonFinite` naming `what`.
pub fn check_finite<const D: usize>(points: &[Point<D>], what: &'static str) -> Result<()> {
    if points.iter().all(|p| p.coords.iter().all(|c| c.is_finite())) {
        Ok(())
    } else {
        Err(InputError::NonFinite(what).into())
    }
}

/// Embeds a 2D or 3D point in 3D space (2D points land on `z = 0`).
#[must_use]
pub fn embed_3d<const D: usize>(point: &Point<D>) -> Vector3 {
    let mut v = Vector3::zeros();
    for (dst, src) in v.iter_mut().zip(point.coords.iter()) {
        *dst = *src;
    }
    v
}

/// Reads the first `D` coordinates of an embedded vector back as a point.
#[must_use]
pub fn from_embedded<const D: usize>(v: &Vector3) -> Point<D> {
    Point::from(nalgebra::SVector::<f64, D>::from_fn(|i, _| {
        v.get(i).copied().unwrap_or(0.0)
    }))
}

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
#[inline]
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Largest coordinate-vector norm in a point list (0 for an empty list).
#[must_use]
pub fn max_norm<const D: usize>(points: &[Point<D>]) -> f64 {
    points.iter().map(|p| p.coords.norm()).fold(0.0, f64::max)
}
