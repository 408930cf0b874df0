use tracing::debug;

use crate::error::{GeometryError, InputError, Result};
use crate::math::eigen::{symmetric_eigenvalues, symmetric_eigenvector};
use crate::math::tolerance::{is_plane_valid, Tolerance};
use crate::math::{check_finite, Matrix3, Point2, Point3, Vector3};

use super::Line3;

/// An oriented plane `normal . x = offset` with a unit normal.
///
/// Equivalent to the normalized coefficient form `[A, B, C, D]` of
/// `Ax + By + Cz = D`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3,
    offset: f64,
}

/// Result of intersecting a plane with a line, ray or segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaneLineIntersection {
    /// The line crosses the plane at a single point.
    Point(Point3),
    /// The line lies in the plane.
    Coincident,
}

impl Plane {
    /// Creates a plane from `[A, B, C, D]` coefficients, normalizing them.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the normal `[A, B, C]` vanishes.
    pub fn from_coefficients(coefficients: [f64; 4], tol: Tolerance) -> Result<Self> {
        if !is_plane_valid(&coefficients, tol) {
            return Err(GeometryError::Degenerate(format!(
                "plane coefficients {coefficients:?} have no normal"
            ))
            .into());
        }
        let [a, b, c, d] = coefficients;
        let normal = Vector3::new(a, b, c);
        let len = normal.norm();
        Ok(Self {
            normal: normal / len,
            offset: d / len,
        })
    }

    /// Creates the plane through `point` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroVector` if the normal is zero or not finite.
    pub fn from_normal(normal: Vector3, point: &Point3) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len == 0.0 {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;
        Ok(Self {
            normal,
            offset: normal.dot(&point.coords),
        })
    }

    /// Plane through three points, oriented by `(b - a) x (c - a)`.
    ///
    /// Returns `None` when the points are collinear.
    #[must_use]
    pub fn from_three_points(a: &Point3, b: &Point3, c: &Point3, tol: Tolerance) -> Option<Self> {
        let ab = b - a;
        let ac = c - a;
        let normal = ab.cross(&ac);
        if normal.norm() <= tol.scaled(ab.norm() * ac.norm()) || normal.norm() == 0.0 {
            debug!("from_three_points: points are collinear");
            return None;
        }
        Self::from_normal(normal, a).ok()
    }

    /// Least-squares plane through a point cloud.
    ///
    /// Three points use the exact three-point plane. Larger sets use the
    /// eigenvector of the smallest eigenvalue of their covariance matrix.
    /// Returns `None` when the points are collinear or coincident.
    ///
    /// # Errors
    ///
    /// Returns an input error for fewer than three points or non-finite coordinates.
    pub fn best_fit(points: &[Point3], tol: Tolerance) -> Result<Option<Self>> {
        check_finite(points, "plane fit")?;
        match points {
            [] | [_] | [_, _] => Err(InputError::TooFewPoints {
                operation: "plane fit",
                needed: 3,
                got: points.len(),
            }
            .into()),
            [a, b, c] => Ok(Self::from_three_points(a, b, c, tol)),
            _ => Ok(PointSpread::new(points).fit(tol)),
        }
    }

    /// Like [`Plane::best_fit`], but also returns `None` when some point lies
    /// off the fitted plane by more than the tolerance.
    ///
    /// # Errors
    ///
    /// See [`Plane::best_fit`].
    pub fn from_points(points: &[Point3], tol: Tolerance) -> Result<Option<Self>> {
        let Some(plane) = Self::best_fit(points, tol)? else {
            return Ok(None);
        };
        let spread = PointSpread::new(points);
        let threshold = tol.scaled(spread.size);
        if points
            .iter()
            .all(|p| plane.signed_distance(p).abs() <= threshold)
        {
            Ok(Some(plane))
        } else {
            debug!("from_points: point cloud is not planar");
            Ok(None)
        }
    }

    /// Returns `true` if all points lie on a common plane.
    ///
    /// Collinear and coincident sets, and sets of at most three points,
    /// are trivially coplanar.
    ///
    /// # Errors
    ///
    /// Returns an input error for non-finite coordinates.
    pub fn are_coplanar(points: &[Point3], tol: Tolerance) -> Result<bool> {
        check_finite(points, "coplanarity test")?;
        if points.len() <= 3 {
            return Ok(true);
        }
        let spread = PointSpread::new(points);
        if spread.is_collinear(tol) {
            return Ok(true);
        }
        Ok(Self::from_points(points, tol)?.is_some())
    }

    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance of the plane from the origin along its normal.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Returns the normalized `[A, B, C, D]` coefficients.
    #[must_use]
    pub fn coefficients(&self) -> [f64; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.offset]
    }

    /// The same plane with its orientation reversed.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Positive on the side the normal points to.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    #[must_use]
    pub fn point_nearest_origin(&self) -> Point3 {
        Point3::from(self.normal * self.offset)
    }

    /// Returns `true` if `point` lies on the plane within tolerance.
    #[must_use]
    pub fn contains_point(&self, point: &Point3, tol: Tolerance) -> bool {
        let scale = point.coords.norm().max(self.offset.abs());
        tol.approx_zero(self.signed_distance(point), scale)
    }

    /// Returns `true` if `point` lies strictly on the normal side.
    #[must_use]
    pub fn is_above(&self, point: &Point3, tol: Tolerance) -> bool {
        let scale = point.coords.norm().max(self.offset.abs());
        self.signed_distance(point) > tol.scaled(scale)
    }

    /// Line shared by two planes, or `None` when they are parallel.
    #[must_use]
    pub fn intersect_plane(&self, other: &Self, tol: Tolerance) -> Option<Line3> {
        let dir = self.normal.cross(&other.normal);
        let len_sq = dir.norm_squared();
        if dir.norm() <= tol.value() || len_sq == 0.0 {
            debug!("intersect_plane: planes are parallel");
            return None;
        }
        let point = Point3::from(
            (other.normal.cross(&dir) * self.offset + dir.cross(&self.normal) * other.offset)
                / len_sq,
        );
        let step = dir / len_sq.sqrt() * (1.0 + point.coords.norm());
        Line3::infinite(point, point + step, tol).ok()
    }

    /// Intersection with a line, ray or segment, honoring its bounds.
    ///
    /// Returns `None` for a parallel line off the plane, or when the
    /// crossing lies outside a bounded end.
    #[must_use]
    pub fn intersect_line(&self, line: &Line3, tol: Tolerance) -> Option<PlaneLineIntersection> {
        let at_start = self.signed_distance(line.start());
        let rate = self.normal.dot(&line.direction());

        if tol.approx_zero(rate, line.length()) {
            let scale = line
                .start()
                .coords
                .norm()
                .max(line.end().coords.norm())
                .max(self.offset.abs());
            return if tol.approx_zero(at_start, scale) {
                Some(PlaneLineIntersection::Coincident)
            } else {
                debug!("intersect_line: line is parallel to the plane");
                None
            };
        }

        let t = -at_start / rate;
        if line.bounds().admits(t, tol.value()) {
            Some(PlaneLineIntersection::Point(line.point_at(t)))
        } else {
            None
        }
    }

    /// A local 2D frame on the plane, anchored at the point nearest the origin.
    #[must_use]
    pub fn frame(&self) -> PlaneFrame {
        PlaneFrame::from_unit_normal(self.point_nearest_origin(), self.normal)
    }
}

/// Point shared by three planes, or `None` when any two are parallel.
#[must_use]
pub fn three_plane_intersection(a: &Plane, b: &Plane, c: &Plane, tol: Tolerance) -> Option<Point3> {
    let bc = b.normal.cross(&c.normal);
    let det = a.normal.dot(&bc);
    if tol.approx_zero(det, 1.0) {
        debug!("three_plane_intersection: planes do not meet in a point");
        return None;
    }
    let coords = (bc * a.offset
        + c.normal.cross(&a.normal) * b.offset
        + a.normal.cross(&b.normal) * c.offset)
        / det;
    Some(Point3::from(coords))
}

/// Centroid, covariance and eigenvalues of a point cloud.
struct PointSpread {
    centroid: Point3,
    covariance: Matrix3,
    evals: [f64; 3],
    /// Largest distance from the centroid.
    size: f64,
}

impl PointSpread {
    #[allow(clippy::cast_precision_loss)]
    fn new(points: &[Point3]) -> Self {
        let n = points.len().max(1) as f64;
        let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let centroid = Point3::from(sum / n);

        let mut covariance = Matrix3::zeros();
        let mut size = 0.0_f64;
        for p in points {
            let d = p - centroid;
            covariance += d * d.transpose();
            size = size.max(d.norm());
        }
        covariance /= n;

        Self {
            centroid,
            covariance,
            evals: symmetric_eigenvalues(&covariance),
            size,
        }
    }

    fn is_collinear(&self, tol: Tolerance) -> bool {
        self.evals[1] <= tol.scaled(self.evals[0])
    }

    fn fit(&self, tol: Tolerance) -> Option<Plane> {
        if self.is_collinear(tol) {
            debug!("best_fit: points are collinear");
            return None;
        }
        let normal = symmetric_eigenvector(&self.covariance, &self.evals, 2, tol)
            .or_else(|| {
                // Smallest eigenvalue is repeated: any direction orthogonal
                // to the dominant axis is a valid normal.
                symmetric_eigenvector(&self.covariance, &self.evals, 0, tol)
                    .map(|axis| perpendicular(&axis))
            })
            .unwrap_or_else(Vector3::z);
        Plane::from_normal(normal, &self.centroid).ok()
    }
}

/// A unit vector orthogonal to unit vector `n`.
fn perpendicular(n: &Vector3) -> Vector3 {
    let reference = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    n.cross(&reference).normalize()
}

/// Orthonormal 2D coordinate frame embedded in a plane.
///
/// `u x v = normal`, so a polygon that is counter-clockwise seen from the
/// normal stays counter-clockwise in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    origin: Point3,
    u: Vector3,
    v: Vector3,
    normal: Vector3,
}

impl PlaneFrame {
    /// Creates a frame with an automatically chosen `u` axis.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroVector` if the normal is zero.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len == 0.0 {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self::from_unit_normal(origin, normal / len))
    }

    /// Creates a frame whose `u` axis is `axis` projected into the plane.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroVector` if the normal is zero or `axis`
    /// is parallel to it.
    pub fn with_axis(origin: Point3, normal: Vector3, axis: Vector3) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len == 0.0 {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;
        let in_plane = axis - normal * normal.dot(&axis);
        let u_len = in_plane.norm();
        if u_len <= f64::EPSILON * axis.norm() || u_len == 0.0 {
            return Err(GeometryError::ZeroVector.into());
        }
        let u = in_plane / u_len;
        Ok(Self {
            origin,
            u,
            v: normal.cross(&u),
            normal,
        })
    }

    fn from_unit_normal(origin: Point3, normal: Vector3) -> Self {
        let u = perpendicular(&normal);
        Self {
            origin,
            u,
            v: normal.cross(&u),
            normal,
        }
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Frame coordinates of the projection of `point`.
    #[must_use]
    pub fn to_2d(&self, point: &Point3) -> Point2 {
        let d = point - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    /// Lifts frame coordinates back into 3D.
    #[must_use]
    pub fn to_3d(&self, point: &Point2) -> Point3 {
        self.origin + self.u * point.x + self.v * point.y
    }

    #[must_use]
    pub fn plane(&self) -> Plane {
        Plane {
            normal: self.normal,
            offset: self.normal.dot(&self.origin.coords),
        }
    }
}
