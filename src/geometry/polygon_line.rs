use tracing::debug;

use crate::error::{GeometryError, InputError, Result};
use crate::math::tolerance::Tolerance;
use crate::math::{check_finite, cross_2d, Point, Point2, Point3};

use super::plane::{Plane, PlaneFrame, PlaneLineIntersection};
use super::polygon::{
    bounding_diagonal, point_in_polygon, point_in_polygon_3d, polygon_normal, Containment,
    FillRule,
};
use super::{Line, Line2, Line3};

/// Default length, in polygon diagonals, used in place of an unbounded end.
pub const DEFAULT_EXTENSION_FACTOR: f64 = 100.0;

/// A connected piece of the intersection of a line and a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineFragment<const D: usize> {
    /// The line only touches the polygon here.
    Point(Point<D>),
    /// The line runs through the polygon between these points.
    Segment(Point<D>, Point<D>),
}

impl<const D: usize> LineFragment<D> {
    fn map<const E: usize>(self, f: impl Fn(&Point<D>) -> Point<E>) -> LineFragment<E> {
        match self {
            Self::Point(p) => LineFragment::Point(f(&p)),
            Self::Segment(a, b) => LineFragment::Segment(f(&a), f(&b)),
        }
    }
}

/// Intersection of a line, ray or segment with a (possibly concave) polygon.
///
/// The result lists the covered pieces of the line in order along it.
/// Unbounded ends are replaced by a finite end placed
/// `extension_factor` polygon diagonals beyond the polygon.
pub struct PolygonLineIntersect<'a, const D: usize> {
    polygon: &'a [Point<D>],
    line: &'a Line<D>,
    fill_rule: FillRule,
    extension_factor: f64,
    tolerance: Tolerance,
}

impl<'a, const D: usize> PolygonLineIntersect<'a, D> {
    #[must_use]
    pub fn new(polygon: &'a [Point<D>], line: &'a Line<D>) -> Self {
        Self {
            polygon,
            line,
            fill_rule: FillRule::default(),
            extension_factor: DEFAULT_EXTENSION_FACTOR,
            tolerance: Tolerance::default(),
        }
    }

    #[must_use]
    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    /// Sets how far, in polygon diagonals, unbounded ends are extended.
    #[must_use]
    pub fn with_extension_factor(mut self, factor: f64) -> Self {
        self.extension_factor = factor;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.polygon.len() < 3 {
            return Err(InputError::TooFewPoints {
                operation: "polygon-line intersection",
                needed: 3,
                got: self.polygon.len(),
            }
            .into());
        }
        check_finite(self.polygon, "polygon")
    }
}

impl PolygonLineIntersect<'_, 2> {
    /// Computes the intersection, `None` when the line misses the polygon.
    ///
    /// # Errors
    ///
    /// Returns an input error for fewer than three vertices or non-finite input.
    pub fn execute(&self) -> Result<Option<Vec<LineFragment<2>>>> {
        self.validate()?;
        let tol = self.tolerance;
        let polygon = self.polygon;
        let diagonal = bounding_diagonal(polygon);
        let (start, end) = self.working_segment(diagonal);
        let dir = end - start;
        let length = dir.norm();
        let at = |t: f64| start + dir * t;
        let param = |p: &Point2| (p - start).dot(&dir) / (length * length);
        // Breakpoints closer than this along the segment are merged.
        let merge_gap = tol.scaled(diagonal) / length;

        let mut breaks = vec![0.0, 1.0];
        for (a, b) in polygon.iter().zip(polygon.iter().cycle().skip(1)) {
            let edge = b - a;
            let offset = a - start;
            let denom = cross_2d(&dir, &edge);
            if tol.approx_zero(denom, length * edge.norm()) {
                // Parallel; an overlapping edge contributes both of its ends.
                if tol.approx_zero(cross_2d(&offset, &dir), length * diagonal.max(edge.norm())) {
                    breaks.extend(
                        [param(a), param(b)]
                            .into_iter()
                            .filter(|t| (0.0..=1.0).contains(t)),
                    );
                }
                continue;
            }
            let t = cross_2d(&offset, &edge) / denom;
            let u = cross_2d(&offset, &dir) / denom;
            let slack = tol.value();
            if (-slack..=1.0 + slack).contains(&t) && (-slack..=1.0 + slack).contains(&u) {
                breaks.push(t.clamp(0.0, 1.0));
            }
        }
        breaks.sort_by(f64::total_cmp);
        breaks.dedup_by(|b, a| *b - *a <= merge_gap);

        let classify = |p: &Point2| point_in_polygon(p, polygon, self.fill_rule, tol);

        let mut spans: Vec<(f64, f64)> = Vec::new();
        for pair in breaks.windows(2) {
            let (t0, t1) = (pair[0], pair[1]);
            if !classify(&at((t0 + t1) / 2.0))?.is_covered() {
                continue;
            }
            match spans.last_mut() {
                Some(last) if last.1 >= t0 => last.1 = t1,
                _ => spans.push((t0, t1)),
            }
        }

        let mut touches = Vec::new();
        for &t in &breaks {
            let covered = spans.iter().any(|&(t0, t1)| t0 <= t && t <= t1);
            if !covered && classify(&at(t))? == Containment::Boundary {
                touches.push(t);
            }
        }

        let mut fragments: Vec<(f64, LineFragment<2>)> = spans
            .into_iter()
            .map(|(t0, t1)| (t0, LineFragment::Segment(at(t0), at(t1))))
            .chain(touches.into_iter().map(|t| (t, LineFragment::Point(at(t)))))
            .collect();
        fragments.sort_by(|a, b| a.0.total_cmp(&b.0));

        if fragments.is_empty() {
            debug!("polygon-line intersection: line misses the polygon");
            return Ok(None);
        }
        Ok(Some(fragments.into_iter().map(|(_, f)| f).collect()))
    }

    /// The line with unbounded ends replaced by finite ones.
    fn working_segment(&self, diagonal: f64) -> (Point2, Point2) {
        let line = self.line;
        let unit = line.direction() / line.length();
        let along: Vec<f64> = self
            .polygon
            .iter()
            .map(|p| (p - line.start()).dot(&unit))
            .collect();
        let lo = along.iter().copied().fold(0.0, f64::min);
        let hi = along.iter().copied().fold(line.length(), f64::max);
        let reach = self.extension_factor * diagonal;

        let bounds = line.bounds();
        let start = if bounds.start {
            *line.start()
        } else {
            line.start() + unit * (lo - reach)
        };
        let end = if bounds.end {
            *line.end()
        } else {
            line.start() + unit * (hi + reach)
        };
        (start, end)
    }
}

impl PolygonLineIntersect<'_, 3> {
    /// Computes the intersection, `None` when the line misses the polygon.
    ///
    /// A line crossing the polygon's plane yields at most one point; a line
    /// lying in the plane is intersected in the plane's 2D frame.
    ///
    /// # Errors
    ///
    /// Returns an input error for fewer than three vertices,
    /// `GeometryError::Degenerate` for a zero-area polygon and
    /// `GeometryError::NonPlanar` for a polygon that is not planar.
    pub fn execute(&self) -> Result<Option<Vec<LineFragment<3>>>> {
        self.validate()?;
        let tol = self.tolerance;
        let polygon = self.polygon;
        let normal = polygon_normal(polygon, tol)
            .ok_or_else(|| GeometryError::Degenerate("polygon has zero area".into()))?;
        let frame = PlaneFrame::new(polygon[0], normal)?;
        let plane: Plane = frame.plane();
        let threshold = tol.scaled(bounding_diagonal(polygon));
        if polygon
            .iter()
            .any(|p| plane.signed_distance(p).abs() > threshold)
        {
            return Err(GeometryError::NonPlanar.into());
        }

        match plane.intersect_line(self.line, tol) {
            None => Ok(None),
            Some(PlaneLineIntersection::Point(p)) => {
                if point_in_polygon_3d(&p, polygon, self.fill_rule, tol)?.is_covered() {
                    Ok(Some(vec![LineFragment::Point(p)]))
                } else {
                    Ok(None)
                }
            }
            Some(PlaneLineIntersection::Coincident) => {
                let flat: Vec<Point2> = polygon.iter().map(|p| frame.to_2d(p)).collect();
                let line = Line2::new(
                    frame.to_2d(self.line.start()),
                    frame.to_2d(self.line.end()),
                    self.line.bounds(),
                    tol,
                )?;
                let fragments = PolygonLineIntersect::new(&flat, &line)
                    .with_fill_rule(self.fill_rule)
                    .with_extension_factor(self.extension_factor)
                    .with_tolerance(tol)
                    .execute()?;
                Ok(fragments.map(|fragments| {
                    fragments
                        .into_iter()
                        .map(|f| f.map(|p: &Point2| -> Point3 { frame.to_3d(p) }))
                        .collect()
                }))
            }
        }
    }
}

/// Intersection of a 3D line with a planar polygon.
///
/// # Errors
///
/// See [`PolygonLineIntersect::execute`].
pub fn polygon_line_intersection_3d(
    polygon: &[Point3],
    line: &Line3,
    tol: Tolerance,
) -> Result<Option<Vec<LineFragment<3>>>> {
    PolygonLineIntersect::new(polygon, line)
        .with_tolerance(tol)
        .execute()
}

/// Intersection of a 2D line with a polygon.
///
/// # Errors
///
/// See [`PolygonLineIntersect::execute`].
pub fn polygon_line_intersection_2d(
    polygon: &[Point2],
    line: &Line2,
    tol: Tolerance,
) -> Result<Option<Vec<LineFragment<2>>>> {
    PolygonLineIntersect::new(polygon, line)
        .with_tolerance(tol)
        .execute()
}
