use nalgebra::SVector;
use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::tolerance::{is_line_valid, Tolerance};
use crate::math::{check_dimension, cross_2d, embed_3d, from_embedded, Point, Point2, Vector2};
use crate::proximity::{closest_s1, convex_distance};

use super::Bounds;

/// A line, ray or segment through two distinct points.
///
/// The parametric form is `P(t) = start + t * (end - start)`; [`Bounds`]
/// decides whether `t` is limited below by 0 and above by 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line<const D: usize> {
    start: Point<D>,
    end: Point<D>,
    bounds: Bounds,
    tolerance: Tolerance,
}

/// A 2D line, ray or segment.
pub type Line2 = Line<2>;

/// A 3D line, ray or segment.
pub type Line3 = Line<3>;

impl<const D: usize> Line<D> {
    /// Creates a new line through `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension is not 2 or 3, or if the two points
    /// coincide within tolerance. The tolerance is kept for later queries.
    pub fn new(
        start: Point<D>,
        end: Point<D>,
        bounds: impl Into<Bounds>,
        tol: Tolerance,
    ) -> Result<Self> {
        check_dimension::<D>()?;
        if !is_line_valid(&start, &end, tol) {
            return Err(GeometryError::Degenerate(format!(
                "line endpoints {:?} and {:?} coincide",
                start.coords.as_slice(),
                end.coords.as_slice()
            ))
            .into());
        }
        Ok(Self {
            start,
            end,
            bounds: bounds.into(),
            tolerance: tol,
        })
    }

    /// Creates a segment from `start` to `end`.
    ///
    /// # Errors
    ///
    /// See [`Line::new`].
    pub fn segment(start: Point<D>, end: Point<D>, tol: Tolerance) -> Result<Self> {
        Self::new(start, end, Bounds::SEGMENT, tol)
    }

    /// Creates a ray from `start` through `end`.
    ///
    /// # Errors
    ///
    /// See [`Line::new`].
    pub fn ray(start: Point<D>, end: Point<D>, tol: Tolerance) -> Result<Self> {
        Self::new(start, end, Bounds::RAY, tol)
    }

    /// Creates an infinite line through `start` and `end`.
    ///
    /// # Errors
    ///
    /// See [`Line::new`].
    pub fn infinite(start: Point<D>, end: Point<D>, tol: Tolerance) -> Result<Self> {
        Self::new(start, end, Bounds::LINE, tol)
    }

    /// Returns the first defining point.
    #[must_use]
    pub fn start(&self) -> &Point<D> {
        &self.start
    }

    /// Returns the second defining point.
    #[must_use]
    pub fn end(&self) -> &Point<D> {
        &self.end
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Tolerance the line was validated with.
    #[must_use]
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Returns the same points with different bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: impl Into<Bounds>) -> Self {
        self.bounds = bounds.into();
        self
    }

    /// Returns `end - start` (not normalized).
    #[must_use]
    pub fn direction(&self) -> SVector<f64, D> {
        self.end - self.start
    }

    /// Distance between the two defining points.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Evaluates `start + t * (end - start)`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point<D> {
        self.start + self.direction() * t
    }

    /// Parameter of the orthogonal projection of `point` onto the infinite line.
    #[must_use]
    pub fn parameter_of(&self, point: &Point<D>) -> f64 {
        let dir = self.direction();
        (point - self.start).dot(&dir) / dir.norm_squared()
    }

    /// Point of the line, ray or segment closest to `point`.
    ///
    /// Segments share the 1-simplex reduction used by the convex proximity
    /// engine; rays and lines clamp the projection parameter.
    #[must_use]
    pub fn closest_point(&self, point: &Point<D>) -> Point<D> {
        if self.bounds.is_segment() {
            let origin = embed_3d(point);
            let a = embed_3d(&self.start) - origin;
            let b = embed_3d(&self.end) - origin;
            let reduction = closest_s1(&a, &b, self.tolerance);
            return from_embedded::<D>(&(reduction.closest + origin));
        }
        let t = self.bounds.clamp(self.parameter_of(point));
        self.point_at(t)
    }

    /// Distance from `point` to the line, ray or segment.
    #[must_use]
    pub fn distance_to(&self, point: &Point<D>) -> f64 {
        (point - self.closest_point(point)).norm()
    }
}

impl Line<2> {
    /// Unit normal pointing to the left of the line direction.
    #[must_use]
    pub fn left_normal(&self) -> Vector2 {
        let dir = self.direction() / self.length();
        Vector2::new(-dir.y, dir.x)
    }
}

/// Distance from `point` to a line, ray or segment.
#[must_use]
pub fn point_line_distance<const D: usize>(point: &Point<D>, line: &Line<D>) -> f64 {
    line.distance_to(point)
}

/// Unit normal to the left of a 2D line's direction.
#[must_use]
pub fn line_normal_2d(line: &Line2) -> Vector2 {
    line.left_normal()
}

/// Shortest distance between two segments, regardless of their own bounds.
///
/// # Errors
///
/// Propagates input errors from the convex proximity engine.
pub fn segment_distance<const D: usize>(
    first: &Line<D>,
    second: &Line<D>,
    tol: Tolerance,
) -> Result<f64> {
    convex_distance(&[first.start, first.end], &[second.start, second.end], tol)
}

/// Intersection point of two 2D lines, rays or segments.
///
/// Returns `None` when the lines are parallel or coincident, or when the
/// crossing falls outside either operand's bounds. Each operand's bounds
/// are honored independently.
#[must_use]
pub fn line_intersection_2d(first: &Line2, second: &Line2, tol: Tolerance) -> Option<Point2> {
    let d1 = first.direction();
    let d2 = second.direction();
    let denom = cross_2d(&d1, &d2);
    if tol.approx_zero(denom, d1.norm() * d2.norm()) {
        debug!("line_intersection_2d: lines are parallel");
        return None;
    }

    let w = second.start - first.start;
    let t = cross_2d(&w, &d2) / denom;
    let u = cross_2d(&w, &d1) / denom;

    let slack = tol.value();
    if first.bounds.admits(t, slack) && second.bounds.admits(u, slack) {
        Some(first.point_at(t))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Point3;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    #[test]
    fn rejects_coincident_points() {
        assert!(Line2::segment(p(1.0, 1.0), p(1.0, 1.0), tol()).is_err());
    }

    #[test]
    fn segment_distance_perpendicular_and_endpoint() {
        let seg = Line2::segment(p(-10.0, 0.0), p(10.0, 0.0), tol()).unwrap();
        assert_relative_eq!(point_line_distance(&p(3.0, 8.0), &seg), 8.0);
        assert_relative_eq!(point_line_distance(&p(14.0, 3.0), &seg), 5.0);
    }

    #[test]
    fn ray_clamps_only_start() {
        let ray = Line2::ray(p(0.0, 0.0), p(1.0, 0.0), tol()).unwrap();
        assert_relative_eq!(ray.closest_point(&p(-3.0, 4.0)), p(0.0, 0.0));
        assert_relative_eq!(ray.closest_point(&p(30.0, 4.0)), p(30.0, 0.0));
        assert_relative_eq!(ray.distance_to(&p(-3.0, 4.0)), 5.0);
    }

    #[test]
    fn end_bounded_only() {
        let line = Line2::new(p(0.0, 0.0), p(1.0, 0.0), [false, true], tol()).unwrap();
        assert_relative_eq!(line.closest_point(&p(-3.0, 4.0)), p(-3.0, 0.0));
        assert_relative_eq!(line.closest_point(&p(3.0, 4.0)), p(1.0, 0.0));
    }

    #[test]
    fn unbounded_matches_segment_inside_span() {
        let seg = Line2::segment(p(-10.0, 0.0), p(10.0, 0.0), tol()).unwrap();
        let line = seg.with_bounds(Bounds::LINE);
        let q = p(10.0, 3.0);
        assert_relative_eq!(seg.distance_to(&q), line.distance_to(&q), epsilon = 1e-12);
    }

    #[test]
    fn segment_queries_use_its_own_tolerance() {
        let coarse = Tolerance::new(0.01).unwrap();
        let seg = Line2::segment(p(0.0, 0.0), p(1.0, 0.0), coarse).unwrap();
        assert_eq!(seg.tolerance(), coarse);
        assert_eq!(seg.with_bounds(Bounds::RAY).tolerance(), coarse);

        // Seen from far away the unit segment is below the coarse tolerance
        // and collapses to its start point.
        let far = p(1000.5, 0.0);
        assert_relative_eq!(seg.closest_point(&far), p(0.0, 0.0));

        let fine = Line2::segment(p(0.0, 0.0), p(1.0, 0.0), tol()).unwrap();
        assert_relative_eq!(fine.closest_point(&far), p(1.0, 0.0));
    }

    #[test]
    fn closest_point_3d_line() {
        let line = Line3::infinite(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
            tol(),
        )
        .unwrap();
        let q = Point3::new(3.0, 4.0, -7.0);
        assert_relative_eq!(line.closest_point(&q), Point3::new(0.0, 0.0, -7.0));
        assert_relative_eq!(line.distance_to(&q), 5.0);
    }

    #[test]
    fn crossing_lines() {
        let a = Line2::infinite(p(0.0, 0.0), p(10.0, 10.0), tol()).unwrap();
        let b = Line2::infinite(p(0.0, 10.0), p(10.0, 0.0), tol()).unwrap();
        let x = line_intersection_2d(&a, &b, tol()).unwrap();
        assert_relative_eq!(x, p(5.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn shorter_segments_still_cross() {
        let a = Line2::segment(p(2.5, 2.5), p(7.5, 7.5), tol()).unwrap();
        let b = Line2::segment(p(2.5, 7.5), p(7.5, 2.5), tol()).unwrap();
        let x = line_intersection_2d(&a, &b, tol()).unwrap();
        assert_relative_eq!(x, p(5.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn shrunk_segments_miss() {
        let a = Line2::segment(p(0.0, 0.0), p(4.0, 4.0), tol()).unwrap();
        let b = Line2::segment(p(0.0, 10.0), p(10.0, 0.0), tol()).unwrap();
        assert!(line_intersection_2d(&a, &b, tol()).is_none());
    }

    #[test]
    fn mixed_bounds_per_side() {
        // The segment stops short, but the ray through it reaches the crossing.
        let seg = Line2::segment(p(0.0, 0.0), p(4.0, 4.0), tol()).unwrap();
        let ray = seg.with_bounds(Bounds::RAY);
        let b = Line2::segment(p(0.0, 10.0), p(10.0, 0.0), tol()).unwrap();
        assert!(line_intersection_2d(&seg, &b, tol()).is_none());
        let x = line_intersection_2d(&ray, &b, tol()).unwrap();
        assert_relative_eq!(x, p(5.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn segments_touching_at_endpoint() {
        let a = Line2::segment(p(0.0, 0.0), p(5.0, 5.0), tol()).unwrap();
        let b = Line2::segment(p(0.0, 10.0), p(10.0, 0.0), tol()).unwrap();
        assert!(line_intersection_2d(&a, &b, tol()).is_some());
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let a = Line2::infinite(p(0.0, 0.0), p(1.0, 0.0), tol()).unwrap();
        let b = Line2::infinite(p(0.0, 1.0), p(1.0, 1.0), tol()).unwrap();
        assert!(line_intersection_2d(&a, &b, tol()).is_none());
        assert!(line_intersection_2d(&a, &a, tol()).is_none());
    }

    #[test]
    fn distance_between_skew_segments() {
        let a = Line3::segment(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), tol())
            .unwrap();
        let b = Line3::segment(Point3::new(0.5, -1.0, 2.0), Point3::new(0.5, 1.0, 2.0), tol())
            .unwrap();
        assert_relative_eq!(segment_distance(&a, &b, tol()).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn left_normal_of_x_axis() {
        let a = Line2::infinite(p(0.0, 0.0), p(3.0, 0.0), tol()).unwrap();
        assert_relative_eq!(a.left_normal(), Vector2::new(0.0, 1.0));
    }
}
