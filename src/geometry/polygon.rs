//! Area, centroid, orientation and containment queries for polygons.
//!
//! A polygon is a slice of points, implicitly closed (the first point is
//! not repeated at the end). Tolerances are scaled by the diagonal of the
//! polygon's bounding box.

use std::f64::consts::PI;

use tracing::debug;

use crate::error::{GeometryError, InputError, Result};
use crate::math::tolerance::Tolerance;
use crate::math::{
    check_dimension, check_finite, cross_2d, embed_3d, Point, Point2, Point3, Vector2, Vector3,
};

use super::plane::PlaneFrame;

/// Where a point lies relative to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    Outside = -1,
    Boundary = 0,
    Inside = 1,
}

impl Containment {
    /// Returns `-1`, `0` or `1`.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// Returns `true` for `Inside` and `Boundary`.
    #[must_use]
    pub const fn is_covered(self) -> bool {
        !matches!(self, Self::Outside)
    }
}

/// Rule deciding which regions of a self-overlapping polygon are inside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Inside when a ray from the point crosses the boundary an odd number of times.
    #[default]
    EvenOdd,
    /// Inside when the boundary winds around the point a non-zero number of times.
    NonZero,
}

/// Axis-aligned bounding box as `(min, max)` corners, `None` for no points.
#[must_use]
pub fn bounding_box<const D: usize>(points: &[Point<D>]) -> Option<(Point<D>, Point<D>)> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold((*first, *first), |(lo, hi), p| (lo.inf(p), hi.sup(p))),
    )
}

/// Length of the bounding-box diagonal, `0.0` for no points.
#[must_use]
pub fn bounding_diagonal<const D: usize>(points: &[Point<D>]) -> f64 {
    bounding_box(points).map_or(0.0, |(lo, hi)| (hi - lo).norm())
}

/// Classifies `point` against a 2D polygon.
///
/// Points within tolerance of an edge are on the `Boundary`.
///
/// # Errors
///
/// Returns an input error for fewer than three vertices or non-finite input.
pub fn point_in_polygon(
    point: &Point2,
    polygon: &[Point2],
    rule: FillRule,
    tol: Tolerance,
) -> Result<Containment> {
    if polygon.len() < 3 {
        return Err(InputError::TooFewPoints {
            operation: "point in polygon",
            needed: 3,
            got: polygon.len(),
        }
        .into());
    }
    check_finite(polygon, "polygon")?;
    check_finite(std::slice::from_ref(point), "query point")?;

    let Some((lo, hi)) = bounding_box(polygon) else {
        return Ok(Containment::Outside);
    };
    let slack = tol.scaled((hi - lo).norm());
    if point.x < lo.x - slack
        || point.x > hi.x + slack
        || point.y < lo.y - slack
        || point.y > hi.y + slack
    {
        return Ok(Containment::Outside);
    }

    if edges(polygon).any(|(a, b)| edge_distance(point, a, b) <= slack) {
        return Ok(Containment::Boundary);
    }

    let inside = match rule {
        FillRule::EvenOdd => crossing_parity(point, polygon),
        FillRule::NonZero => winding_number(point, polygon) != 0,
    };
    Ok(if inside {
        Containment::Inside
    } else {
        Containment::Outside
    })
}

/// Classifies `point` against a planar 3D polygon.
///
/// Points off the polygon's plane are `Outside`; the rest are classified in
/// the plane's 2D frame.
///
/// # Errors
///
/// Returns an input error for fewer than three vertices, and
/// `GeometryError::Degenerate` for a zero-area polygon.
pub fn point_in_polygon_3d(
    point: &Point3,
    polygon: &[Point3],
    rule: FillRule,
    tol: Tolerance,
) -> Result<Containment> {
    if polygon.len() < 3 {
        return Err(InputError::TooFewPoints {
            operation: "point in polygon",
            needed: 3,
            got: polygon.len(),
        }
        .into());
    }
    check_finite(polygon, "polygon")?;
    let normal = polygon_normal(polygon, tol)
        .ok_or_else(|| GeometryError::Degenerate("polygon has zero area".into()))?;
    let frame = PlaneFrame::new(polygon[0], normal)?;

    let diagonal = bounding_diagonal(polygon);
    if frame.plane().signed_distance(point).abs() > tol.scaled(diagonal) {
        return Ok(Containment::Outside);
    }
    let flat: Vec<Point2> = polygon.iter().map(|p| frame.to_2d(p)).collect();
    point_in_polygon(&frame.to_2d(point), &flat, rule, tol)
}

fn edges<'a, const D: usize>(
    polygon: &'a [Point<D>],
) -> impl Iterator<Item = (&'a Point<D>, &'a Point<D>)> {
    polygon.iter().zip(polygon.iter().cycle().skip(1))
}

fn edge_distance(point: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

fn crossing_parity(point: &Point2, polygon: &[Point2]) -> bool {
    edges(polygon)
        .filter(|(a, b)| (a.y > point.y) != (b.y > point.y))
        .filter(|(a, b)| {
            let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            point.x < x
        })
        .count()
        % 2
        == 1
}

fn winding_number(point: &Point2, polygon: &[Point2]) -> i32 {
    let mut winding = 0;
    for (a, b) in edges(polygon) {
        let side = cross_2d(&(b - a), &(point - a));
        if a.y <= point.y {
            if b.y > point.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Shoelace area; positive for counter-clockwise polygons when `signed`.
#[must_use]
pub fn polygon_area_2d(polygon: &[Point2], signed: bool) -> f64 {
    let twice: f64 = edges(polygon).map(|(a, b)| cross_2d(&a.coords, &b.coords)).sum();
    if signed {
        twice / 2.0
    } else {
        twice.abs() / 2.0
    }
}

/// Area of a planar 3D polygon, or `None` when its vertices are not coplanar.
#[must_use]
pub fn polygon_area_3d(polygon: &[Point3], tol: Tolerance) -> Option<f64> {
    let area = newell_vector(polygon);
    if polygon.len() >= 3 && area.norm() > 0.0 {
        let normal = area.normalize();
        let threshold = tol.scaled(bounding_diagonal(polygon));
        let off_plane = polygon
            .iter()
            .any(|p| normal.dot(&(p - polygon[0])).abs() > threshold);
        if off_plane {
            debug!("polygon_area_3d: polygon is not planar");
            return None;
        }
    }
    Some(area.norm() / 2.0)
}

/// Twice the vector area of a polygon (Newell's method).
///
/// Points along the normal from which the polygon appears counter-clockwise.
fn newell_vector<const D: usize>(polygon: &[Point<D>]) -> Vector3 {
    let Some(first) = polygon.first() else {
        return Vector3::zeros();
    };
    let origin = embed_3d(first);
    edges(polygon)
        .map(|(a, b)| (embed_3d(a) - origin).cross(&(embed_3d(b) - origin)))
        .sum()
}

/// Unit normal from which the polygon appears clockwise.
///
/// Returns `None` for zero-area polygons.
#[must_use]
pub fn polygon_normal<const D: usize>(polygon: &[Point<D>], tol: Tolerance) -> Option<Vector3> {
    let area = newell_vector(polygon);
    let diagonal = bounding_diagonal(polygon);
    if area.norm() <= tol.scaled(diagonal * diagonal) || area.norm() == 0.0 {
        debug!("polygon_normal: polygon has zero area");
        return None;
    }
    Some(-area.normalize())
}

/// Area centroid of a 2D polygon, `None` for zero area.
#[must_use]
pub fn polygon_centroid_2d(polygon: &[Point2], tol: Tolerance) -> Option<Point2> {
    let (area, centroid) = weighted_centroid_2d(polygon)?;
    let diagonal = bounding_diagonal(polygon);
    if tol.approx_zero(area, diagonal * diagonal) {
        return None;
    }
    Some(centroid)
}

/// Signed area and centroid; the centroid is meaningless at zero area.
fn weighted_centroid_2d(polygon: &[Point2]) -> Option<(f64, Point2)> {
    let origin = polygon.first()?.coords;
    let mut twice_area = 0.0;
    let mut moment = Vector2::zeros();
    for (a, b) in edges(polygon) {
        let (a, b) = (a.coords - origin, b.coords - origin);
        let cross = cross_2d(&a, &b);
        twice_area += cross;
        moment += (a + b) * cross;
    }
    if twice_area == 0.0 {
        return Some((0.0, Point2::from(origin)));
    }
    Some((twice_area / 2.0, Point2::from(origin + moment / (3.0 * twice_area))))
}

/// Area centroid of a planar 3D polygon, `None` for zero area.
#[must_use]
pub fn polygon_centroid_3d(polygon: &[Point3], tol: Tolerance) -> Option<Point3> {
    let normal = polygon_normal(polygon, tol)?;
    let frame = PlaneFrame::new(polygon[0], normal).ok()?;
    let flat: Vec<Point2> = polygon.iter().map(|p| frame.to_2d(p)).collect();
    let (_, centroid) = weighted_centroid_2d(&flat)?;
    Some(frame.to_3d(&centroid))
}

/// Centroid of a 2D region bounded by `outer` with `holes` cut out.
///
/// Returns `None` when the remaining area vanishes.
#[must_use]
pub fn polygon_with_holes_centroid(
    outer: &[Point2],
    holes: &[Vec<Point2>],
    tol: Tolerance,
) -> Option<Point2> {
    let (outer_area, outer_centroid) = weighted_centroid_2d(outer)?;
    let mut area = outer_area.abs();
    let mut moment = outer_centroid.coords * area;
    for hole in holes {
        if let Some((hole_area, hole_centroid)) = weighted_centroid_2d(hole) {
            area -= hole_area.abs();
            moment -= hole_centroid.coords * hole_area.abs();
        }
    }
    let diagonal = bounding_diagonal(outer);
    if tol.approx_zero(area, diagonal * diagonal) {
        debug!("polygon_with_holes_centroid: region has zero area");
        return None;
    }
    Some(Point2::from(moment / area))
}

/// Volume centroid of a closed, consistently oriented polygon mesh.
///
/// Faces are vertex index loops and are fanned into triangles.
/// Returns `None` when the enclosed volume vanishes.
///
/// # Errors
///
/// Returns `InputError::IndexOutOfRange` for a bad face index.
pub fn mesh_centroid(
    vertices: &[Point3],
    faces: &[Vec<usize>],
    tol: Tolerance,
) -> Result<Option<Point3>> {
    check_finite(vertices, "mesh vertices")?;
    if let Some(&index) = faces.iter().flatten().find(|&&i| i >= vertices.len()) {
        return Err(InputError::IndexOutOfRange {
            index,
            len: vertices.len(),
        }
        .into());
    }
    let Some((lo, hi)) = bounding_box(vertices) else {
        return Ok(None);
    };
    let reference = Point3::from((lo.coords + hi.coords) / 2.0);

    let mut volume = 0.0;
    let mut moment = Vector3::zeros();
    for face in faces {
        let Some((&first, rest)) = face.split_first() else {
            continue;
        };
        let a = vertices[first] - reference;
        for pair in rest.windows(2) {
            let b = vertices[pair[0]] - reference;
            let c = vertices[pair[1]] - reference;
            let six_volume = a.dot(&b.cross(&c));
            volume += six_volume;
            moment += (a + b + c) * six_volume;
        }
    }

    let size = (hi - lo).norm();
    if tol.approx_zero(volume, size.powi(3)) {
        debug!("mesh_centroid: mesh encloses no volume");
        return Ok(None);
    }
    // Each tetrahedron's centroid is (reference + a + b + c) / 4.
    Ok(Some(reference + moment / (4.0 * volume)))
}

/// Returns `true` if a 2D polygon winds clockwise.
#[must_use]
pub fn is_polygon_clockwise(polygon: &[Point2]) -> bool {
    polygon_area_2d(polygon, true) < 0.0
}

/// The polygon in clockwise order.
#[must_use]
pub fn clockwise_polygon(polygon: &[Point2]) -> Vec<Point2> {
    if is_polygon_clockwise(polygon) {
        polygon.to_vec()
    } else {
        reverse_polygon(polygon)
    }
}

/// The polygon in counter-clockwise order.
#[must_use]
pub fn ccw_polygon(polygon: &[Point2]) -> Vec<Point2> {
    if is_polygon_clockwise(polygon) {
        reverse_polygon(polygon)
    } else {
        polygon.to_vec()
    }
}

#[must_use]
pub fn reverse_polygon<const D: usize>(polygon: &[Point<D>]) -> Vec<Point<D>> {
    polygon.iter().rev().copied().collect()
}

/// Drops consecutive repeated vertices, including a closing copy of the first.
#[must_use]
pub fn deduplicate_polygon<const D: usize>(polygon: &[Point<D>], tol: Tolerance) -> Vec<Point<D>> {
    let size = bounding_diagonal(polygon);
    let mut out: Vec<Point<D>> = Vec::with_capacity(polygon.len());
    for p in polygon {
        if out.last().map_or(true, |last| !tol.points_close(last, p, size)) {
            out.push(*p);
        }
    }
    while out.len() > 1
        && out
            .first()
            .zip(out.last())
            .is_some_and(|(a, b)| tol.points_close(a, b, size))
    {
        out.pop();
    }
    out
}

/// Indices of three points that are not collinear, or `None`.
///
/// Picks the first point, the point farthest from it, and the point
/// farthest from the line through those two.
#[must_use]
pub fn noncollinear_triple<const D: usize>(
    points: &[Point<D>],
    tol: Tolerance,
) -> Option<[usize; 3]> {
    let first = embed_3d(points.first()?);
    let threshold = tol.scaled(bounding_diagonal(points));
    let embedded: Vec<Vector3> = points.iter().map(|p| embed_3d(p) - first).collect();

    let (far, far_dist) = farthest(embedded.iter().map(Vector3::norm))?;
    if far_dist <= threshold {
        return None;
    }
    let axis = embedded[far] / far_dist;
    let (off, off_dist) = farthest(embedded.iter().map(|v| v.cross(&axis).norm()))?;
    if off_dist <= threshold {
        return None;
    }
    Some([0, far, off])
}

fn farthest(distances: impl Iterator<Item = f64>) -> Option<(usize, f64)> {
    distances
        .enumerate()
        .fold(None, |best, (i, d)| match best {
            Some((_, best_d)) if best_d >= d => best,
            _ => Some((i, d)),
        })
}

/// Returns `true` if all points lie on one line (or coincide).
#[must_use]
pub fn is_collinear<const D: usize>(points: &[Point<D>], tol: Tolerance) -> bool {
    noncollinear_triple(points, tol).is_none()
}

/// Returns `true` if the polygon is convex.
///
/// Collinear consecutive vertices are allowed. Polygons that turn the same
/// way at every vertex but wind around more than once (star polygons) are
/// not convex. 3D polygons are tested about their own normal.
///
/// # Errors
///
/// Returns an input error for fewer than three distinct vertices or an
/// unsupported dimension, and `GeometryError::Collinear` when every vertex
/// lies on one line.
pub fn is_polygon_convex<const D: usize>(polygon: &[Point<D>], tol: Tolerance) -> Result<bool> {
    check_dimension::<D>()?;
    check_finite(polygon, "polygon")?;
    let points: Vec<Vector3> = deduplicate_polygon(polygon, tol).iter().map(embed_3d).collect();
    if points.len() < 3 {
        return Err(InputError::TooFewPoints {
            operation: "convexity test",
            needed: 3,
            got: points.len(),
        }
        .into());
    }
    if is_collinear(polygon, tol) {
        return Err(GeometryError::Collinear("convexity test".into()).into());
    }

    let area = newell_vector(polygon);
    if area.norm() == 0.0 {
        return Ok(false);
    }
    let normal = area.normalize();
    let diagonal = bounding_diagonal(polygon);
    let threshold = tol.scaled(diagonal * diagonal);

    let n = points.len();
    let (mut positive, mut negative) = (false, false);
    let mut turning = 0.0;
    for i in 0..n {
        let incoming = points[i] - points[(i + n - 1) % n];
        let outgoing = points[(i + 1) % n] - points[i];
        let turn = normal.dot(&incoming.cross(&outgoing));
        positive |= turn > threshold;
        negative |= turn < -threshold;
        turning += turn.atan2(incoming.dot(&outgoing));
    }
    Ok(!(positive && negative) && turning.abs() < 3.0 * PI)
}
