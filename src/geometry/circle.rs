use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::tolerance::Tolerance;
use crate::math::{Point2, Point3, Vector2, Vector3};

use super::plane::{three_plane_intersection, Plane};
use super::{Bounds, Line2};

/// A circle in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle2 {
    pub center: Point2,
    pub radius: f64,
}

/// A circle in space, lying in the plane through `center` orthogonal to `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle3 {
    pub center: Point3,
    pub radius: f64,
    /// Unit normal of the circle's plane.
    pub normal: Vector3,
}

impl Circle2 {
    /// Creates a circle.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the radius is negative or not finite.
    pub fn new(center: Point2, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeometryError::Degenerate(format!("circle radius {radius}")).into());
        }
        Ok(Self { center, radius })
    }

    /// Point on the circle at polar angle `angle`.
    #[must_use]
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }
}

/// Intersection points of a circle with a line, ray or segment.
///
/// A line at distance `r` from the center (within tolerance) touches the
/// circle in a single point. Candidates beyond a bounded end are dropped.
#[must_use]
pub fn circle_line_intersection(circle: &Circle2, line: &Line2, tol: Tolerance) -> Vec<Point2> {
    let r = circle.radius;
    let foot = line.with_bounds(Bounds::LINE).closest_point(&circle.center);
    let dist = (foot - circle.center).norm();

    if dist > r + tol.scaled(r) {
        return Vec::new();
    }

    let candidates = if (dist - r).abs() <= tol.scaled(r) {
        vec![foot]
    } else {
        let half_chord = (r * r - dist * dist).sqrt();
        let unit = line.direction() / line.length();
        vec![foot - unit * half_chord, foot + unit * half_chord]
    };

    let bounds = line.bounds();
    candidates
        .into_iter()
        .filter(|p| bounds.admits(line.parameter_of(p), tol.value()))
        .collect()
}

/// Points where the tangents from `point` touch the circle.
///
/// Returns `None` when `point` is strictly inside the circle, and the point
/// itself when it lies on the circle.
#[must_use]
pub fn circle_point_tangents(
    circle: &Circle2,
    point: &Point2,
    tol: Tolerance,
) -> Option<Vec<Point2>> {
    let r = circle.radius;
    let offset = point - circle.center;
    let dist = offset.norm();

    if (dist - r).abs() <= tol.scaled(r) {
        return Some(vec![*point]);
    }
    if dist < r {
        debug!("circle_point_tangents: point is inside the circle");
        return None;
    }

    let base = offset.y.atan2(offset.x);
    let spread = (r / dist).acos();
    Some(vec![
        circle.point_at_angle(base + spread),
        circle.point_at_angle(base - spread),
    ])
}

/// Common tangent segments of two circles.
///
/// Each segment runs from its touching point on `first` to its touching
/// point on `second`. External tangents come first, then internal ones.
/// Internal tangents are absent when the circles overlap; there are none
/// when one circle lies inside the other. A tangent collapsing to the
/// circles' contact point is dropped. Returns `None` for concentric
/// circles or when no tangent remains.
#[must_use]
pub fn circle_circle_tangents(
    first: &Circle2,
    second: &Circle2,
    tol: Tolerance,
) -> Option<Vec<[Point2; 2]>> {
    let (r1, r2) = (first.radius, second.radius);
    let between = second.center - first.center;
    let dist = between.norm();
    let size = r1.max(r2).max(first.center.coords.norm()).max(second.center.coords.norm());

    if dist <= tol.scaled(size) {
        debug!("circle_circle_tangents: circles are concentric");
        return None;
    }
    let unit = between / dist;
    let perp = Vector2::new(-unit.y, unit.x);

    // (ratio, side, sign of r2) for the two external then two internal tangents.
    let external = (r2 - r1) / dist;
    let internal = (-r2 - r1) / dist;
    let candidates = [
        (external, -1.0, 1.0),
        (external, 1.0, 1.0),
        (internal, -1.0, -1.0),
        (internal, 1.0, -1.0),
    ];
    let count = if 1.0 - internal * internal >= -tol.value() {
        4
    } else if 1.0 - external * external >= -tol.value() {
        2
    } else {
        0
    };

    let tangents: Vec<[Point2; 2]> = candidates[..count]
        .iter()
        .filter_map(|&(ratio, side, sign)| {
            let sine = (1.0 - ratio * ratio).max(0.0).sqrt();
            let normal = unit * ratio + perp * (side * sine);
            let on_first = first.center - normal * r1;
            let on_second = second.center - normal * (sign * r2);
            if tol.points_close(&on_first, &on_second, size) {
                None
            } else {
                Some([on_first, on_second])
            }
        })
        .collect();

    if tangents.is_empty() {
        debug!("circle_circle_tangents: no tangent lines");
        None
    } else {
        Some(tangents)
    }
}

/// Intersection points of two circles (zero, one or two).
///
/// Returns `None` for concentric circles.
#[must_use]
pub fn circle_circle_intersection(
    first: &Circle2,
    second: &Circle2,
    tol: Tolerance,
) -> Option<Vec<Point2>> {
    let (r1, r2) = (first.radius, second.radius);
    let between = second.center - first.center;
    let dist_sq = between.norm_squared();
    let dist = dist_sq.sqrt();
    let size = r1.max(r2);

    if dist <= tol.scaled(size.max(first.center.coords.norm())) {
        debug!("circle_circle_intersection: circles are concentric");
        return None;
    }
    if dist > r1 + r2 + tol.scaled(size) || dist < (r1 - r2).abs() - tol.scaled(size) {
        return Some(Vec::new());
    }

    // Distance from the first center to the radical line.
    let along = (r1 * r1 - r2 * r2 + dist_sq) / (2.0 * dist);
    let h = (r1 * r1 - along * along).max(0.0).sqrt();
    let unit = between / dist;
    let mid = first.center + unit * along;

    if h <= tol.scaled(size) {
        return Some(vec![mid]);
    }
    let perp = Vector2::new(-unit.y, unit.x);
    Some(vec![mid + perp * h, mid - perp * h])
}

/// Circle through three points of the plane, or `None` when they are collinear.
#[must_use]
pub fn circle_through_points_2d(
    a: &Point2,
    b: &Point2,
    c: &Point2,
    tol: Tolerance,
) -> Option<Circle2> {
    let lift = |p: &Point2| Point3::new(p.x, p.y, 0.0);
    let circle = circle_through_points_3d(&lift(a), &lift(b), &lift(c), tol)?;
    Some(Circle2 {
        center: Point2::new(circle.center.x, circle.center.y),
        radius: circle.radius,
    })
}

/// Circle through three points in space, or `None` when they are collinear.
///
/// The returned normal has a non-negative `z` component.
#[must_use]
pub fn circle_through_points_3d(
    a: &Point3,
    b: &Point3,
    c: &Point3,
    tol: Tolerance,
) -> Option<Circle3> {
    let mut plane = Plane::from_three_points(a, b, c, tol)?;
    if plane.normal().z < 0.0 {
        plane = plane.flipped();
    }
    let bisector = |p: &Point3, q: &Point3| {
        Plane::from_normal(q - p, &Point3::from((p.coords + q.coords) / 2.0)).ok()
    };
    let center = three_plane_intersection(&plane, &bisector(a, b)?, &bisector(a, c)?, tol)?;
    Some(Circle3 {
        center,
        radius: (a - center).norm(),
        normal: *plane.normal(),
    })
}
