use crate::error::{GeometryError, Result};
use crate::math::{Matrix4, Point3, Vector3};

/// Rotation by `angle` radians about the line through `center` along `axis`.
///
/// # Errors
///
/// Returns `GeometryError::ZeroVector` if the axis is zero or not finite.
pub fn rotation_about(angle: f64, axis: &Vector3, center: &Point3) -> Result<Matrix4> {
    let len = axis.norm();
    if !len.is_finite() || len == 0.0 {
        return Err(GeometryError::ZeroVector.into());
    }
    let to_origin = Matrix4::new_translation(&(-center.coords));
    let back = Matrix4::new_translation(&center.coords);
    Ok(back * rodrigues(&(axis / len), angle) * to_origin)
}

/// Rotation about a unit axis through the origin.
#[rustfmt::skip]
#[allow(clippy::many_single_char_names, clippy::suspicious_operation_groupings)]
fn rodrigues(axis: &Vector3, angle: f64) -> Matrix4 {
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    let (x, y, z) = (axis.x, axis.y, axis.z);

    Matrix4::new(
        t * x * x + c,     t * x * y - s * z, t * x * z + s * y, 0.0,
        t * x * y + s * z, t * y * y + c,     t * y * z - s * x, 0.0,
        t * x * z - s * y, t * y * z + s * x, t * z * z + c,     0.0,
        0.0,               0.0,               0.0,               1.0,
    )
}
