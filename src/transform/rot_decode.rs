use std::f64::consts::TAU;

use tracing::debug;

use crate::error::{InputError, Result};
use crate::math::tolerance::Tolerance;
use crate::math::{Matrix3, Matrix4, Point3, Vector3};

use super::rotation::rotation_about;

/// A rigid motion written as a rotation about an axis line followed by a
/// translation along that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationDecomposition {
    /// Rotation angle in radians, in `[0, pi]`.
    pub angle: f64,
    /// Unit rotation axis.
    pub axis: Vector3,
    /// Point of the axis line nearest the origin.
    pub center: Point3,
    /// Translation along the axis.
    pub translation: Vector3,
}

impl RotationDecomposition {
    /// The same motion as a rotation by `2 pi - angle` about the reversed axis.
    #[must_use]
    pub fn long_form(&self) -> Self {
        Self {
            angle: TAU - self.angle,
            axis: -self.axis,
            ..*self
        }
    }

    /// Rebuilds the 4x4 transform.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroVector` if the axis is zero.
    pub fn to_matrix(&self) -> Result<Matrix4> {
        let rotation = rotation_about(self.angle, &self.axis, &self.center)?;
        Ok(Matrix4::new_translation(&self.translation) * rotation)
    }
}

/// Decomposes a rotation-plus-translation matrix.
///
/// The angle comes from an unnormalised quaternion extracted along the
/// largest of the trace and the diagonal entries of the rotation block. A
/// rotation whose quaternion vector part is within tolerance of zero,
/// relative to the whole quaternion, decodes as angle `0` about the `z`
/// axis with the whole offset as translation. Small but real angles are
/// kept.
///
/// # Errors
///
/// Returns `InputError::NotRigidTransform` when the bottom row is not
/// `[0, 0, 0, 1]` or the upper-left block is not a proper rotation.
pub fn rot_decode(matrix: &Matrix4, tol: Tolerance) -> Result<RotationDecomposition> {
    let (rot, offset) = split_rigid(matrix, tol)?;

    let (c_cos, q_im) = quaternion(&rot);
    let c_sin = q_im.norm();
    if c_sin <= tol.scaled(c_sin.hypot(c_cos)) {
        debug!("rot_decode: no rotation");
        return Ok(RotationDecomposition {
            angle: 0.0,
            axis: Vector3::z(),
            center: Point3::origin(),
            translation: offset,
        });
    }

    let angle = 2.0 * c_sin.atan2(c_cos);
    let axis = q_im / c_sin;
    let translation = axis * offset.dot(&axis);
    let across = offset - translation;
    let center = (across + axis.cross(&across) * (c_cos / c_sin)) / 2.0;

    Ok(RotationDecomposition {
        angle,
        axis,
        center: Point3::from(center),
        translation,
    })
}

/// Quaternion `(w, xyz)` of a rotation block, scaled by an unknown positive
/// factor, with `w >= 0`.
///
/// Near the identity the trace branch is used; otherwise the branch of the
/// largest diagonal entry keeps the vector part well conditioned.
fn quaternion(rot: &Matrix3) -> (f64, Vector3) {
    let trace = rot.trace();
    let skew = Vector3::new(
        rot[(2, 1)] - rot[(1, 2)],
        rot[(0, 2)] - rot[(2, 0)],
        rot[(1, 0)] - rot[(0, 1)],
    );
    let largest = (0..3)
        .max_by(|&a, &b| rot[(a, a)].total_cmp(&rot[(b, b)]))
        .unwrap_or(0);
    if trace >= rot[(largest, largest)] {
        return (1.0 + trace, skew);
    }

    let axis_matrix = rot + rot.transpose() - Matrix3::identity() * (trace - 1.0);
    let q_im: Vector3 = axis_matrix.row(largest).transpose();
    let q_re = skew[largest];
    if q_re < 0.0 {
        (-q_re, -q_im)
    } else {
        (q_re, q_im)
    }
}

/// Splits a validated rigid transform into its rotation block and offset.
fn split_rigid(matrix: &Matrix4, tol: Tolerance) -> Result<(Matrix3, Vector3)> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(InputError::NotRigidTransform("non-finite entry".into()).into());
    }
    let bottom = matrix.row(3);
    let expected = [0.0, 0.0, 0.0, 1.0];
    if bottom
        .iter()
        .zip(expected)
        .any(|(got, want)| !tol.approx_zero(got - want, 1.0))
    {
        return Err(InputError::NotRigidTransform(format!(
            "bottom row is {:?}, expected [0, 0, 0, 1]",
            bottom.iter().collect::<Vec<_>>()
        ))
        .into());
    }

    let rot: Matrix3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let det = rot.determinant();
    if !tol.approx_zero(det - 1.0, 1.0) {
        return Err(
            InputError::NotRigidTransform(format!("rotation determinant is {det}")).into(),
        );
    }
    let drift = (rot * rot.transpose() - Matrix3::identity()).norm();
    if !tol.approx_zero(drift, 1.0) {
        return Err(InputError::NotRigidTransform(format!(
            "rotation block is not orthonormal (off by {drift})"
        ))
        .into());
    }

    let offset: Vector3 = matrix.fixed_view::<3, 1>(0, 3).into_owned();
    Ok((rot, offset))
}
