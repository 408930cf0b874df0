use tracing::debug;

use crate::error::{GeokernError, InputError, Result, TriangulationError};
use crate::geometry::plane::PlaneFrame;
use crate::geometry::polygon::{bounding_diagonal, is_collinear, polygon_area_2d, polygon_normal};
use crate::math::tolerance::Tolerance;
use crate::math::{check_dimension, check_finite, cross_2d, Point, Point2, Point3};

/// Triangulates a polygon given as points, optionally through an index list.
///
/// Triangles are returned as index triples into the original point slice
/// and wind the same way as the polygon. Polygons may touch themselves at
/// vertices or along edges as long as they do not cross.
pub struct Triangulate<'a, const D: usize> {
    points: &'a [Point<D>],
    indices: Option<Vec<usize>>,
    tolerance: Tolerance,
}

/// What remains to do after validating the input.
enum Prepared {
    /// Trivial input, already answered.
    Done(Vec<[usize; 3]>),
    /// Polygon indices left for ear clipping.
    Polygon(Vec<usize>),
}

impl<'a, const D: usize> Triangulate<'a, D> {
    #[must_use]
    pub fn new(points: &'a [Point<D>]) -> Self {
        Self {
            points,
            indices: None,
            tolerance: Tolerance::default(),
        }
    }

    /// Triangulates the polygon `points[indices[0]], points[indices[1]], ...`.
    #[must_use]
    pub fn with_indices(mut self, indices: impl Into<Vec<usize>>) -> Self {
        self.indices = Some(indices.into());
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn prepare(&self) -> Result<Prepared> {
        check_dimension::<D>()?;
        check_finite(self.points, "triangulation input")?;
        let len = self.points.len();
        let mut indices = self
            .indices
            .clone()
            .unwrap_or_else(|| (0..len).collect());
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(InputError::IndexOutOfRange { index, len }.into());
        }
        if indices.len() < 3 {
            return Err(InputError::TooFewPoints {
                operation: "triangulation",
                needed: 3,
                got: indices.len(),
            }
            .into());
        }

        let tol = self.tolerance;
        let polygon: Vec<Point<D>> = indices.iter().map(|&i| self.points[i]).collect();
        let size = bounding_diagonal(&polygon);

        if let [a, b, c] = indices[..] {
            let (pa, pb, pc) = (&self.points[a], &self.points[b], &self.points[c]);
            if tol.points_close(pa, pb, size)
                || tol.points_close(pb, pc, size)
                || tol.points_close(pc, pa, size)
            {
                debug!("triangulate: dropping triangle with coincident vertices");
                return Ok(Prepared::Done(Vec::new()));
            }
            if is_collinear(&polygon, tol) {
                return Err(TriangulationError::Collinear.into());
            }
            return Ok(Prepared::Done(vec![[a, b, c]]));
        }

        drop_repeated(self.points, &mut indices, tol, size);
        if indices.len() < 3 {
            return Err(TriangulationError::Collinear.into());
        }
        Ok(Prepared::Polygon(indices))
    }
}

impl Triangulate<'_, 2> {
    /// Runs the triangulation.
    ///
    /// # Errors
    ///
    /// Returns an input error for a bad index, fewer than three indices or
    /// non-finite input, `TriangulationError::Collinear` when all vertices
    /// lie on one line and `TriangulationError::NoEar` for self-crossing
    /// polygons.
    pub fn execute(&self) -> Result<Vec<[usize; 3]>> {
        let mut indices = match self.prepare()? {
            Prepared::Done(triangles) => return Ok(triangles),
            Prepared::Polygon(indices) => indices,
        };

        let polygon: Vec<Point2> = indices.iter().map(|&i| self.points[i]).collect();
        let area = polygon_area_2d(&polygon, true);
        let size = bounding_diagonal(&polygon);
        if self.tolerance.approx_zero(area, size * size) {
            return Err(zero_area_error(&polygon, self.tolerance));
        }
        let counter_clockwise = area > 0.0;
        if counter_clockwise {
            indices.reverse();
        }

        let mut triangles = EarClipper::new(self.points, self.tolerance).clip(indices)?;
        if counter_clockwise {
            for tri in &mut triangles {
                tri.reverse();
            }
        }
        Ok(triangles)
    }
}

impl Triangulate<'_, 3> {
    /// Runs the triangulation in the plane of the polygon.
    ///
    /// The points are projected onto a frame spanned by the polygon's
    /// normal and the direction between its two farthest-apart vertices.
    ///
    /// # Errors
    ///
    /// As for the 2D case, plus `TriangulationError::NotCoplanar` when the
    /// vertices do not share a plane.
    pub fn execute(&self) -> Result<Vec<[usize; 3]>> {
        let indices = match self.prepare()? {
            Prepared::Done(triangles) => return Ok(triangles),
            Prepared::Polygon(indices) => indices,
        };
        let tol = self.tolerance;
        let polygon: Vec<Point3> = indices.iter().map(|&i| self.points[i]).collect();

        let Some(normal) = polygon_normal(&polygon, tol) else {
            return Err(zero_area_error(&polygon, tol));
        };
        let origin = polygon[0];
        let threshold = tol.scaled(bounding_diagonal(&polygon));
        if polygon
            .iter()
            .any(|p| normal.dot(&(p - origin)).abs() > threshold)
        {
            return Err(TriangulationError::NotCoplanar.into());
        }

        let (from, to) = farthest_pair(&polygon);
        let frame = PlaneFrame::with_axis(from, normal, to - from)?;
        let flat: Vec<Point2> = self.points.iter().map(|p| frame.to_2d(p)).collect();

        Triangulate::new(&flat)
            .with_indices(indices)
            .with_tolerance(tol)
            .execute()
    }
}

/// Triangulates a 2D polygon.
///
/// # Errors
///
/// See [`Triangulate::execute`].
pub fn triangulate_2d(polygon: &[Point2], tol: Tolerance) -> Result<Vec<[usize; 3]>> {
    Triangulate::new(polygon).with_tolerance(tol).execute()
}

/// Triangulates a planar 3D polygon.
///
/// # Errors
///
/// See [`Triangulate::execute`].
pub fn triangulate_3d(polygon: &[Point3], tol: Tolerance) -> Result<Vec<[usize; 3]>> {
    Triangulate::new(polygon).with_tolerance(tol).execute()
}

/// Removes cyclically consecutive indices whose points coincide.
fn drop_repeated<const D: usize>(
    points: &[Point<D>],
    indices: &mut Vec<usize>,
    tol: Tolerance,
    size: f64,
) {
    indices.dedup_by(|b, a| tol.points_close(&points[*a], &points[*b], size));
    while indices.len() > 1 {
        match (indices.first(), indices.last()) {
            (Some(&first), Some(&last))
                if tol.points_close(&points[first], &points[last], size) =>
            {
                indices.pop();
            }
            _ => break,
        }
    }
}

/// Error for a polygon that encloses no area.
fn zero_area_error<const D: usize>(polygon: &[Point<D>], tol: Tolerance) -> GeokernError {
    if is_collinear(polygon, tol) {
        TriangulationError::Collinear.into()
    } else {
        debug!("triangulate: polygon cancels out to zero area");
        TriangulationError::NoEar {
            remaining: polygon.len(),
        }
        .into()
    }
}

/// The two vertices farthest apart.
fn farthest_pair(polygon: &[Point3]) -> (Point3, Point3) {
    let mut best = (polygon[0], polygon[0]);
    let mut best_dist = 0.0;
    for (i, a) in polygon.iter().enumerate() {
        for b in &polygon[i + 1..] {
            let dist = (b - a).norm_squared();
            if dist > best_dist {
                best_dist = dist;
                best = (*a, *b);
            }
        }
    }
    best
}

/// Ear clipping over a clockwise index loop into a 2D point slice.
struct EarClipper<'a> {
    points: &'a [Point2],
    tolerance: Tolerance,
    size: f64,
}

impl<'a> EarClipper<'a> {
    fn new(points: &'a [Point2], tolerance: Tolerance) -> Self {
        Self {
            points,
            tolerance,
            size: bounding_diagonal(points),
        }
    }

    /// `1` for a clockwise triangle, `-1` for counter-clockwise, `0` when flat.
    fn turn(&self, a: usize, b: usize, c: usize) -> i8 {
        let (pa, pb, pc) = (&self.points[a], &self.points[b], &self.points[c]);
        let (cb, ca) = (pb - pc, pa - pc);
        let cross = cross_2d(&cb, &ca);
        if self.tolerance.approx_zero(cross, cb.norm() * ca.norm()) {
            0
        } else if cross > 0.0 {
            1
        } else {
            -1
        }
    }

    fn clip(&self, mut ring: Vec<usize>) -> Result<Vec<[usize; 3]>> {
        if self.is_self_crossing(&ring) {
            return Err(TriangulationError::NoEar {
                remaining: ring.len(),
            }
            .into());
        }
        let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));

        while ring.len() > 3 {
            let n = ring.len();
            let ear = (0..n).find(|&i| self.is_ear(&ring, i));
            if let Some(i) = ear {
                triangles.push([ring[i], ring[(i + 1) % n], ring[(i + 2) % n]]);
                ring.remove((i + 1) % n);
                continue;
            }

            // No ear: drop a vertex whose corner has no area (a collinear
            // point or the tip of a zero-width whisker).
            let flat =
                (0..n).find(|&i| self.turn(ring[i], ring[(i + 1) % n], ring[(i + 2) % n]) == 0);
            let Some(i) = flat else {
                return Err(TriangulationError::NoEar { remaining: n }.into());
            };
            debug!(vertex = ring[(i + 1) % n], "triangulate: discarding degenerate corner");
            ring.remove((i + 1) % n);
            drop_repeated(self.points, &mut ring, self.tolerance, self.size);
        }

        if let [a, b, c] = ring[..] {
            match self.turn(a, b, c) {
                0 => debug!("triangulate: dropping degenerate final triangle"),
                1 => triangles.push([a, b, c]),
                _ => return Err(TriangulationError::NoEar { remaining: 3 }.into()),
            }
        }
        Ok(triangles)
    }

    /// Whether two edges of the ring cross at a point interior to both.
    fn is_self_crossing(&self, ring: &[usize]) -> bool {
        let n = ring.len();
        (0..n).any(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            (i + 2..n).any(|j| self.crosses(a, b, ring[j], ring[(j + 1) % n]))
        })
    }

    /// Proper crossing of segments `ab` and `cd`; touching does not count.
    fn crosses(&self, a: usize, b: usize, c: usize, d: usize) -> bool {
        self.turn(a, b, c) * self.turn(a, b, d) < 0 && self.turn(c, d, a) * self.turn(c, d, b) < 0
    }

    /// Whether the corner at `ring[i + 1]` can be cut off.
    fn is_ear(&self, ring: &[usize], i: usize) -> bool {
        let n = ring.len();
        let (p0, p1, p2) = (ring[i], ring[(i + 1) % n], ring[(i + 2) % n]);
        if self.turn(p0, p1, p2) <= 0 {
            return false;
        }
        if (0..n).any(|j| self.crosses(p0, p2, ring[j], ring[(j + 1) % n])) {
            return false;
        }

        (3..n).map(|k| (i + k) % n).all(|j| {
            let v = ring[j];
            let prev = ring[(j + n - 1) % n];
            let next = ring[(j + 1) % n];
            if self.turn(prev, v, next) > 0 {
                // Convex vertices cannot be the first to enter an ear.
                return true;
            }
            let inside = self.turn(p0, p1, v) > 0
                && self.turn(p1, p2, v) > 0
                && self.turn(p2, p0, v) >= 0;
            let enters_corner = self.coincide(v, p1)
                && [prev, next]
                    .iter()
                    .any(|&q| self.turn(p0, p1, q) > 0 && self.turn(p1, p2, q) > 0);
            !(inside || enters_corner)
        })
    }

    fn coincide(&self, a: usize, b: usize) -> bool {
        self.tolerance
            .points_close(&self.points[a], &self.points[b], self.size)
    }
}
