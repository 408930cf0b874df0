//! Closest-point reduction of 1-, 2- and 3-simplices to the origin.
//!
//! Each routine returns the point of the simplex nearest to the origin
//! together with the smallest sub-simplex (vertex, edge, triangle or the
//! whole tetrahedron) that still contains that point. Degenerate inputs
//! fall back to the lower-dimensional faces.

use crate::math::tolerance::Tolerance;
use crate::math::Vector3;

/// Result of reducing a simplex towards the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexReduction {
    /// Point of the simplex closest to the origin.
    pub closest: Vector3,
    /// Smallest sub-simplex containing `closest`.
    pub simplex: Vec<Vector3>,
}

impl SimplexReduction {
    fn vertex(v: Vector3) -> Self {
        Self {
            closest: v,
            simplex: vec![v],
        }
    }

    fn nearer(self, other: Self) -> Self {
        if other.closest.norm_squared() < self.closest.norm_squared() {
            other
        } else {
            self
        }
    }
}

/// Reduces a simplex of 1 to 4 vertices.
///
/// Longer inputs are reduced using their four most recent vertices; an
/// empty input reduces to an empty simplex at the origin.
#[must_use]
pub fn closest_simplex(simplex: &[Vector3], tol: Tolerance) -> SimplexReduction {
    match *simplex {
        [] => SimplexReduction {
            closest: Vector3::zeros(),
            simplex: Vec::new(),
        },
        [a] => SimplexReduction::vertex(a),
        [a, b] => closest_s1(&a, &b, tol),
        [a, b, c] => closest_s2(&a, &b, &c, tol),
        [a, b, c, d] => closest_s3(&a, &b, &c, &d, tol),
        _ => closest_simplex(&simplex[simplex.len() - 4..], tol),
    }
}

/// Closest point of the segment `[a, b]` to the origin.
#[must_use]
pub fn closest_s1(a: &Vector3, b: &Vector3, tol: Tolerance) -> SimplexReduction {
    let ab = b - a;
    if ab.norm() <= tol.scaled((a.norm() + b.norm()) / 2.0) {
        return SimplexReduction::vertex(*a);
    }
    let t = -a.dot(&ab) / ab.norm_squared();
    if t <= 0.0 {
        SimplexReduction::vertex(*a)
    } else if t >= 1.0 {
        SimplexReduction::vertex(*b)
    } else {
        SimplexReduction {
            closest: a + ab * t,
            simplex: vec![*a, *b],
        }
    }
}

/// Closest point of the triangle `[a, b, c]` to the origin.
///
/// Classifies the origin against the triangle's vertex, edge and face
/// Voronoi regions. A triangle with near-zero area is treated as its
/// nearest edge.
#[must_use]
pub fn closest_s2(a: &Vector3, b: &Vector3, c: &Vector3, tol: Tolerance) -> SimplexReduction {
    let ab = b - a;
    let ac = c - a;
    let longest = ab.norm().max(ac.norm()).max((c - b).norm());
    if ab.cross(&ac).norm() <= tol.scaled(longest * longest) {
        return closest_s1(a, b, tol)
            .nearer(closest_s1(b, c, tol))
            .nearer(closest_s1(c, a, tol));
    }

    let d1 = -ab.dot(a);
    let d2 = -ac.dot(a);
    if d1 <= 0.0 && d2 <= 0.0 {
        return SimplexReduction::vertex(*a);
    }

    let d3 = -ab.dot(b);
    let d4 = -ac.dot(b);
    if d3 >= 0.0 && d4 <= d3 {
        return SimplexReduction::vertex(*b);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return SimplexReduction {
            closest: a + ab * v,
            simplex: vec![*a, *b],
        };
    }

    let d5 = -ab.dot(c);
    let d6 = -ac.dot(c);
    if d6 >= 0.0 && d5 <= d6 {
        return SimplexReduction::vertex(*c);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return SimplexReduction {
            closest: a + ac * w,
            simplex: vec![*a, *c],
        };
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return SimplexReduction {
            closest: b + (c - b) * w,
            simplex: vec![*b, *c],
        };
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    SimplexReduction {
        closest: a + ab * v + ac * w,
        simplex: vec![*a, *b, *c],
    }
}

/// Closest point of the tetrahedron `[a, b, c, d]` to the origin.
///
/// If the origin lies behind all four faces the whole tetrahedron is
/// returned with the origin as closest point. Otherwise every face the
/// origin lies in front of is reduced and the nearest result wins. A flat
/// tetrahedron is treated as its nearest face.
#[must_use]
pub fn closest_s3(
    a: &Vector3,
    b: &Vector3,
    c: &Vector3,
    d: &Vector3,
    tol: Tolerance,
) -> SimplexReduction {
    const FACES: [[usize; 4]; 4] = [[0, 1, 2, 3], [0, 1, 3, 2], [0, 2, 3, 1], [1, 2, 3, 0]];

    let pts = [*a, *b, *c, *d];
    let mut longest = 0.0_f64;
    for i in 0..4 {
        for j in i + 1..4 {
            longest = longest.max((pts[j] - pts[i]).norm());
        }
    }
    let enclosing = || SimplexReduction {
        closest: Vector3::zeros(),
        simplex: pts.to_vec(),
    };

    let volume6 = (b - a).cross(&(c - a)).dot(&(d - a));
    if volume6.abs() <= tol.scaled(longest.powi(3)) {
        return FACES
            .iter()
            .map(|&[i, j, k, _]| closest_s2(&pts[i], &pts[j], &pts[k], tol))
            .reduce(SimplexReduction::nearer)
            .unwrap_or_else(enclosing);
    }

    FACES
        .iter()
        .filter(|&&[i, j, k, opposite]| {
            let mut normal = (pts[j] - pts[i]).cross(&(pts[k] - pts[i]));
            if normal.dot(&(pts[opposite] - pts[i])) > 0.0 {
                normal = -normal;
            }
            -normal.dot(&pts[i]) > tol.scaled(normal.norm() * longest)
        })
        .map(|&[i, j, k, _]| closest_s2(&pts[i], &pts[j], &pts[k], tol))
        .reduce(SimplexReduction::nearer)
        .unwrap_or_else(enclosing)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    #[test]
    fn s1_interior_projection() {
        let r = closest_s1(&v(-1.0, 2.0, 0.0), &v(3.0, 2.0, 0.0), tol());
        assert_relative_eq!(r.closest, v(0.0, 2.0, 0.0), epsilon = 1e-12);
        assert_eq!(r.simplex.len(), 2);
    }

    #[test]
    fn s1_clamps_to_vertex() {
        let r = closest_s1(&v(1.0, 1.0, 0.0), &v(3.0, 1.0, 0.0), tol());
        assert_eq!(r.closest, v(1.0, 1.0, 0.0));
        assert_eq!(r.simplex, vec![v(1.0, 1.0, 0.0)]);

        let r = closest_s1(&v(-3.0, 1.0, 0.0), &v(-1.0, 1.0, 0.0), tol());
        assert_eq!(r.simplex, vec![v(-1.0, 1.0, 0.0)]);
    }

    #[test]
    fn s1_degenerate_segment() {
        let a = v(2.0, 0.0, 0.0);
        let r = closest_s1(&a, &a, tol());
        assert_eq!(r.simplex, vec![a]);
    }

    #[test]
    fn s2_face_region() {
        let r = closest_s2(
            &v(-1.0, -1.0, 2.0),
            &v(3.0, -1.0, 2.0),
            &v(-1.0, 3.0, 2.0),
            tol(),
        );
        assert_relative_eq!(r.closest, v(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_eq!(r.simplex.len(), 3);
    }

    #[test]
    fn s2_edge_region() {
        let r = closest_s2(
            &v(1.0, -1.0, 0.0),
            &v(1.0, 1.0, 0.0),
            &v(3.0, 0.0, 0.0),
            tol(),
        );
        assert_relative_eq!(r.closest, v(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(r.simplex, vec![v(1.0, -1.0, 0.0), v(1.0, 1.0, 0.0)]);
    }

    #[test]
    fn s2_vertex_region() {
        let r = closest_s2(
            &v(1.0, 1.0, 0.0),
            &v(3.0, 1.0, 0.0),
            &v(1.0, 3.0, 0.0),
            tol(),
        );
        assert_eq!(r.simplex, vec![v(1.0, 1.0, 0.0)]);
    }

    #[test]
    fn s2_collinear_falls_back_to_edge() {
        let r = closest_s2(
            &v(-1.0, 1.0, 0.0),
            &v(0.0, 1.0, 0.0),
            &v(1.0, 1.0, 0.0),
            tol(),
        );
        assert_relative_eq!(r.closest, v(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert!(r.simplex.len() <= 2);
    }

    #[test]
    fn s3_origin_inside() {
        let r = closest_s3(
            &v(-1.0, -1.0, -1.0),
            &v(2.0, 0.0, -1.0),
            &v(0.0, 2.0, -1.0),
            &v(0.0, 0.0, 2.0),
            tol(),
        );
        assert_eq!(r.closest, Vector3::zeros());
        assert_eq!(r.simplex.len(), 4);
    }

    #[test]
    fn s3_origin_outside_picks_facing_face() {
        // Tetrahedron above the z = 1 plane; the base faces the origin.
        let r = closest_s3(
            &v(-1.0, -1.0, 1.0),
            &v(2.0, -1.0, 1.0),
            &v(-1.0, 2.0, 1.0),
            &v(0.0, 0.0, 4.0),
            tol(),
        );
        assert_relative_eq!(r.closest, v(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_eq!(r.simplex.len(), 3);
    }

    #[test]
    fn s3_flat_tetrahedron_uses_faces() {
        let r = closest_s3(
            &v(1.0, -1.0, 0.0),
            &v(1.0, 1.0, 0.0),
            &v(3.0, 0.0, 0.0),
            &v(2.0, 0.0, 0.0),
            tol(),
        );
        assert_relative_eq!(r.closest, v(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn dispatch_by_length() {
        let a = v(1.0, 0.0, 0.0);
        assert_eq!(closest_simplex(&[a], tol()).closest, a);
        assert_eq!(closest_simplex(&[], tol()).simplex.len(), 0);
    }
}
