use tracing::{trace, warn};

use crate::error::{InputError, Result};
use crate::math::tolerance::Tolerance;
use crate::math::{check_dimension, check_finite, embed_3d, Point, Vector3};

use super::simplex::closest_simplex;

/// Distance and collision queries between the convex hulls of two point sets.
///
/// Both queries run the GJK iteration on the Minkowski difference of the
/// two sets. 2D inputs are embedded in the `z = 0` plane.
pub struct ConvexProximity<'a, const D: usize> {
    first: &'a [Point<D>],
    second: &'a [Point<D>],
    tolerance: Tolerance,
    max_iterations: Option<usize>,
}

impl<'a, const D: usize> ConvexProximity<'a, D> {
    /// Creates a new query between the hulls of `first` and `second`.
    #[must_use]
    pub fn new(first: &'a [Point<D>], second: &'a [Point<D>]) -> Self {
        Self {
            first,
            second,
            tolerance: Tolerance::default(),
            max_iterations: None,
        }
    }

    /// Sets the relative tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Caps the number of GJK iterations.
    ///
    /// Defaults to `4 * (n1 + n2) + 32`.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Returns the distance between the two hulls, `0.0` when they touch or overlap.
    ///
    /// # Errors
    ///
    /// Returns an error if either set is empty, the dimension is not 2 or 3,
    /// or a coordinate is not finite.
    pub fn distance(&self) -> Result<f64> {
        let diff = self.minkowski()?;
        let thr = diff.touch_threshold;
        let eps = self.tolerance.value();

        let mut d = diff.first_difference();
        if d.norm() <= thr {
            return Ok(0.0);
        }
        let v = diff.support(&-d);
        d = v;
        let mut simplex = vec![v];
        let mut lower_bound = 0.0_f64;

        for iteration in 0..self.iteration_cap() {
            let upper_bound = d.norm();
            if upper_bound <= thr {
                return Ok(0.0);
            }
            let v = diff.support(&-d);
            lower_bound = lower_bound.max(d.dot(&v) / upper_bound);
            trace!(iteration, upper_bound, lower_bound, "gjk distance step");
            if upper_bound - lower_bound <= eps * upper_bound {
                return Ok(upper_bound);
            }
            simplex.push(v);
            let reduction = closest_simplex(&simplex, self.tolerance);
            d = reduction.closest;
            simplex = reduction.simplex;
        }

        warn!(
            cap = self.iteration_cap(),
            "gjk distance hit its iteration cap; returning current upper bound"
        );
        let upper_bound = d.norm();
        Ok(if upper_bound <= thr { 0.0 } else { upper_bound })
    }

    /// Returns `true` if the two hulls touch or overlap.
    ///
    /// Stops as soon as a separating direction is found.
    ///
    /// # Errors
    ///
    /// Returns an error if either set is empty, the dimension is not 2 or 3,
    /// or a coordinate is not finite.
    pub fn collides(&self) -> Result<bool> {
        let diff = self.minkowski()?;
        let thr = diff.touch_threshold;

        let mut d = diff.first_difference();
        if d.norm() <= thr {
            return Ok(true);
        }
        let v = diff.support(&-d);
        d = v;
        let mut simplex = vec![v];

        for iteration in 0..self.iteration_cap() {
            let d_norm = d.norm();
            if d_norm <= thr {
                return Ok(true);
            }
            let v = diff.support(&-d);
            trace!(iteration, d_norm, "gjk collision step");
            if v.dot(&d) / d_norm > thr {
                return Ok(false);
            }
            simplex.push(v);
            let reduction = closest_simplex(&simplex, self.tolerance);
            if (v - reduction.closest).norm() <= thr {
                return Ok(v.norm() <= thr);
            }
            d = reduction.closest;
            simplex = reduction.simplex;
        }

        warn!(
            cap = self.iteration_cap(),
            "gjk collision hit its iteration cap; deciding from current distance"
        );
        Ok(d.norm() <= thr)
    }

    fn iteration_cap(&self) -> usize {
        self.max_iterations
            .unwrap_or(4 * (self.first.len() + self.second.len()) + 32)
    }

    fn minkowski(&self) -> Result<MinkowskiDifference> {
        check_dimension::<D>()?;
        if self.first.is_empty() || self.second.is_empty() {
            return Err(InputError::TooFewPoints {
                operation: "convex proximity",
                needed: 1,
                got: self.first.len().min(self.second.len()),
            }
            .into());
        }
        check_finite(self.first, "first point set")?;
        check_finite(self.second, "second point set")?;

        let first: Vec<Vector3> = self.first.iter().map(embed_3d).collect();
        let second: Vec<Vector3> = self.second.iter().map(embed_3d).collect();
        let scale = first
            .iter()
            .chain(&second)
            .map(Vector3::norm)
            .fold(0.0_f64, f64::max);
        Ok(MinkowskiDifference {
            first,
            second,
            touch_threshold: self.tolerance.scaled(scale),
        })
    }
}

/// The two embedded point sets whose Minkowski difference GJK walks.
struct MinkowskiDifference {
    first: Vec<Vector3>,
    second: Vec<Vector3>,
    /// Distances at or below this are "touching".
    touch_threshold: f64,
}

impl MinkowskiDifference {
    fn first_difference(&self) -> Vector3 {
        self.first[0] - self.second[0]
    }

    /// Support point of `first - second` in `direction`.
    fn support(&self, direction: &Vector3) -> Vector3 {
        let best = |points: &[Vector3], sign: f64| {
            points
                .iter()
                .copied()
                .fold((f64::NEG_INFINITY, Vector3::zeros()), |(best_dot, best_pt), p| {
                    let dot = sign * p.dot(direction);
                    if dot > best_dot {
                        (dot, p)
                    } else {
                        (best_dot, best_pt)
                    }
                })
                .1
        };
        best(&self.first, 1.0) - best(&self.second, -1.0)
    }
}

/// Distance between the convex hulls of two point sets.
///
/// # Errors
///
/// See [`ConvexProximity::distance`].
pub fn convex_distance<const D: usize>(
    first: &[Point<D>],
    second: &[Point<D>],
    tol: Tolerance,
) -> Result<f64> {
    ConvexProximity::new(first, second).with_tolerance(tol).distance()
}

/// Returns `true` if the convex hulls of two point sets intersect.
///
/// # Errors
///
/// See [`ConvexProximity::collides`].
pub fn convex_collision<const D: usize>(
    first: &[Point<D>],
    second: &[Point<D>],
    tol: Tolerance,
) -> Result<bool> {
    ConvexProximity::new(first, second).with_tolerance(tol).collides()
}
