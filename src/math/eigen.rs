//! Closed-form eigen-decomposition of symmetric 3x3 matrices.
//!
//! Eigenvalues use the trigonometric solution of the characteristic cubic;
//! eigenvectors come from the Cayley-Hamilton product of the two other
//! eigen-shifted matrices.

use std::f64::consts::TAU;

use super::tolerance::Tolerance;
use super::{Matrix3, Vector3};

/// Eigenvalues of a symmetric 3x3 matrix, in decreasing order.
///
/// Only the upper triangle of `m` is read.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn symmetric_eigenvalues(m: &Matrix3) -> [f64; 3] {
    let p1 = m[(0, 1)].powi(2) + m[(0, 2)].powi(2) + m[(1, 2)].powi(2);
    let diag = [m[(0, 0)], m[(1, 1)], m[(2, 2)]];
    let scale_sq = diag.iter().map(|d| d * d).sum::<f64>() + 2.0 * p1;

    if p1 <= f64::EPSILON * f64::EPSILON * scale_sq {
        // Already diagonal: the trigonometric branch would divide by ~0.
        let mut evals = diag;
        evals.sort_by(|a, b| b.total_cmp(a));
        return evals;
    }

    let q = (diag[0] + diag[1] + diag[2]) / 3.0;
    let p2 = (diag[0] - q).powi(2) + (diag[1] - q).powi(2) + (diag[2] - q).powi(2) + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();
    if p == 0.0 {
        return [q, q, q];
    }

    let b = (symmetrize(m) - Matrix3::identity() * q) / p;
    let r = (b.determinant() / 2.0).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;

    let e1 = q + 2.0 * p * phi.cos();
    let e3 = q + 2.0 * p * (phi + TAU / 3.0).cos();
    let e2 = 3.0 * q - e1 - e3;
    [e1, e2, e3]
}

/// Unit eigenvector of symmetric `m` for `evals[index]`.
///
/// `evals` must be the three eigenvalues of `m` (any order). Returns `None`
/// when the eigenvalue is repeated and the eigenvector is not unique.
#[must_use]
pub fn symmetric_eigenvector(
    m: &Matrix3,
    evals: &[f64; 3],
    index: usize,
    tol: Tolerance,
) -> Option<Vector3> {
    let sym = symmetrize(m);
    let a = (sym - Matrix3::identity() * evals[(index + 1) % 3])
        * (sym - Matrix3::identity() * evals[(index + 2) % 3]);

    let (best_row, best_norm) = (0..3)
        .map(|k| (k, a.row(k).norm()))
        .fold((0, 0.0), |acc, item| if item.1 > acc.1 { item } else { acc });

    let scale = evals.iter().fold(0.0_f64, |acc, e| acc.max(e.abs()));
    if best_norm <= tol.scaled(scale * scale) || best_norm == 0.0 {
        return None;
    }
    Some(a.row(best_row).transpose() / best_norm)
}

/// Mirrors the upper triangle of `m` into the lower one.
fn symmetrize(m: &Matrix3) -> Matrix3 {
    let upper = m.upper_triangle();
    upper + upper.transpose() - Matrix3::from_diagonal(&m.diagonal())
}
