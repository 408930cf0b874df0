//! Property-based tests for the kernel invariants.
//!
//! Run with: cargo test --test properties
//! Set `RUST_LOG=geokern=debug` to see the kernel's diagnostics.

#![allow(clippy::unwrap_used)]

use std::f64::consts::{PI, TAU};

use geokern::geometry::circle::circle_line_intersection;
use geokern::geometry::polygon::{
    is_polygon_clockwise, point_in_polygon, polygon_area_2d, polygon_area_3d, reverse_polygon,
};
use geokern::geometry::{Circle2, Containment, FillRule, Line2};
use geokern::math::{Matrix4, Point2, Point3, Vector2, Vector3};
use geokern::proximity::{convex_collision, convex_distance};
use geokern::transform::{rot_decode, rotation_about};
use geokern::triangulation::{triangulate_2d, triangulate_3d};
use geokern::Tolerance;
use proptest::prelude::*;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

fn tol() -> Tolerance {
    Tolerance::default()
}

// =============================================================================
// Strategies
// =============================================================================

/// A counter-clockwise polygon that is star-shaped about its generating center.
///
/// Vertex angles strictly increase and no angular gap reaches a half turn,
/// so the center sees every edge and the polygon is simple.
fn arb_star_polygon() -> impl Strategy<Value = Vec<Point2>> {
    (3usize..16).prop_flat_map(|n| {
        (
            prop::collection::vec(0.5..1.0f64, n),
            prop::collection::vec(0.3..2.0f64, n),
            prop::array::uniform2(-10.0..10.0f64),
            0.1..50.0f64,
        )
            .prop_map(|(gaps, radii, [cx, cy], scale)| {
                let total: f64 = gaps.iter().sum();
                let mut angle = 0.0_f64;
                gaps.iter()
                    .zip(&radii)
                    .map(|(gap, r)| {
                        angle += gap / total * TAU;
                        Point2::new(cx + scale * r * angle.cos(), cy + scale * r * angle.sin())
                    })
                    .collect::<Vec<_>>()
            })
    })
}

/// A unit vector away from the degenerate zero direction.
fn arb_unit_vector() -> impl Strategy<Value = Vector3> {
    prop::array::uniform3(-1.0..1.0f64)
        .prop_filter("direction too short", |[x, y, z]| {
            Vector3::new(*x, *y, *z).norm() > 0.1
        })
        .prop_map(|[x, y, z]| Vector3::new(x, y, z).normalize())
}

fn arb_point3(range: f64) -> impl Strategy<Value = Point3> {
    prop::array::uniform3(-range..range).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Points with an octahedron of radius `radius` around `center`, so that
/// `center` lies well inside their hull.
fn arb_hull_around(center: Point3, radius: f64) -> impl Strategy<Value = Vec<Point3>> {
    prop::collection::vec(arb_point3(radius), 0..12).prop_map(move |extra| {
        let mut points: Vec<Point3> = [Vector3::x(), Vector3::y(), Vector3::z()]
            .iter()
            .flat_map(|axis| [center + axis * radius, center - axis * radius])
            .collect();
        points.extend(extra.into_iter().map(|p| center + p.coords));
        points
    })
}

/// Two point sets whose hulls overlap by more than a unit around a shared region.
fn arb_overlapping_hulls() -> impl Strategy<Value = (Vec<Point3>, Vec<Point3>)> {
    (arb_point3(10.0), arb_point3(0.5), arb_point3(0.5)).prop_flat_map(|(center, first, second)| {
        (
            arb_hull_around(center + first.coords, 2.0),
            arb_hull_around(center + second.coords, 3.0),
        )
    })
}

fn triangle_area_2d(points: &[Point2], [a, b, c]: [usize; 3]) -> f64 {
    let (pa, pb, pc) = (points[a], points[b], points[c]);
    ((pb - pa).perp(&(pc - pa))) / 2.0
}

fn assert_matrix_close(a: &Matrix4, b: &Matrix4, scale: f64) -> Result<(), TestCaseError> {
    let diff = (a - b).abs().max();
    prop_assert!(diff <= 1e-9 * scale, "matrices differ by {diff}");
    Ok(())
}

// =============================================================================
// Property Tests: Triangulation
// =============================================================================

proptest! {
    /// Triangle areas add up to the polygon area and keep its winding.
    #[test]
    fn triangulation_preserves_signed_area(polygon in arb_star_polygon(), flip in any::<bool>()) {
        init_tracing();
        let polygon = if flip { reverse_polygon(&polygon) } else { polygon };
        let triangles = triangulate_2d(&polygon, tol()).unwrap();

        prop_assert_eq!(triangles.len(), polygon.len() - 2);
        let total: f64 = triangles.iter().map(|&t| triangle_area_2d(&polygon, t)).sum();
        let expected = polygon_area_2d(&polygon, true);
        prop_assert!((total - expected).abs() <= 1e-7 * expected.abs());
    }

    /// A polygon rotated into an arbitrary plane triangulates to the same area.
    #[test]
    fn triangulation_in_3d_preserves_area(
        polygon in arb_star_polygon(),
        axis in arb_unit_vector(),
        angle in 0.0..TAU,
        offset in arb_point3(20.0),
    ) {
        init_tracing();
        let rotation = rotation_about(angle, &axis, &Point3::origin()).unwrap();
        let lifted: Vec<Point3> = polygon
            .iter()
            .map(|p| rotation.transform_point(&Point3::new(p.x, p.y, 0.0)) + offset.coords)
            .collect();

        let triangles = triangulate_3d(&lifted, tol()).unwrap();
        prop_assert_eq!(triangles.len(), lifted.len() - 2);
        let total: f64 = triangles
            .iter()
            .map(|&[a, b, c]| (lifted[b] - lifted[a]).cross(&(lifted[c] - lifted[a])).norm() / 2.0)
            .sum();
        let expected = polygon_area_3d(&lifted, tol()).unwrap();
        prop_assert!((total - expected).abs() <= 1e-7 * expected);
    }
}

// =============================================================================
// Property Tests: Polygon classification
// =============================================================================

proptest! {
    /// The clockwise test agrees with the sign of the signed area.
    #[test]
    fn clockwise_matches_signed_area(polygon in arb_star_polygon(), flip in any::<bool>()) {
        let polygon = if flip { reverse_polygon(&polygon) } else { polygon };
        prop_assert_eq!(is_polygon_clockwise(&polygon), polygon_area_2d(&polygon, true) < 0.0);
        prop_assert_eq!(is_polygon_clockwise(&polygon), flip);
    }

    /// Every vertex and every edge midpoint is on the boundary.
    #[test]
    fn vertices_and_midpoints_are_boundary(polygon in arb_star_polygon()) {
        let n = polygon.len();
        for i in 0..n {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            let mid = Point2::from((a.coords + b.coords) / 2.0);
            for rule in [FillRule::EvenOdd, FillRule::NonZero] {
                let at_vertex = point_in_polygon(&a, &polygon, rule, tol()).unwrap();
                let at_midpoint = point_in_polygon(&mid, &polygon, rule, tol()).unwrap();
                prop_assert_eq!(at_vertex, Containment::Boundary);
                prop_assert_eq!(at_midpoint, Containment::Boundary);
            }
        }
    }
}

// =============================================================================
// Property Tests: Convex proximity
// =============================================================================

proptest! {
    /// Hulls sharing a deep interior point collide at distance zero.
    #[test]
    fn overlapping_hulls_collide((a, b) in arb_overlapping_hulls()) {
        init_tracing();
        prop_assert_eq!(convex_distance(&a, &b, tol()).unwrap(), 0.0);
        prop_assert!(convex_collision(&a, &b, tol()).unwrap());
    }

    /// Hulls separated along x are apart by at least the gap and never collide.
    #[test]
    fn separated_hulls_do_not_collide(
        a in prop::collection::vec(arb_point3(1.0), 1..12),
        b in prop::collection::vec(arb_point3(1.0), 1..12),
        shift in prop::array::uniform2(-5.0..5.0f64),
    ) {
        let gap = Vector3::new(5.0, shift[0], shift[1]);
        let b: Vec<Point3> = b.iter().map(|p| p + gap).collect();

        let distance = convex_distance(&a, &b, tol()).unwrap();
        prop_assert!(distance >= 3.0 - 1e-9);
        prop_assert!(!convex_collision(&a, &b, tol()).unwrap());
    }

    /// Distance is zero exactly when the 2D hulls collide.
    #[test]
    fn distance_zero_iff_collision_2d(
        a in prop::collection::vec(prop::array::uniform2(-5.0..5.0f64), 1..10),
        b in prop::collection::vec(prop::array::uniform2(-5.0..5.0f64), 1..10),
        shift in -12.0..12.0f64,
    ) {
        let a: Vec<Point2> = a.iter().map(|[x, y]| Point2::new(*x, *y)).collect();
        let b: Vec<Point2> = b.iter().map(|[x, y]| Point2::new(*x + shift, *y)).collect();

        let distance = convex_distance(&a, &b, tol()).unwrap();
        // Skip near-contact cases where the decision sits on the tolerance.
        prop_assume!(distance == 0.0 || distance > 1e-6);
        prop_assert_eq!(distance == 0.0, convex_collision(&a, &b, tol()).unwrap());
    }
}

// =============================================================================
// Property Tests: Rigid transforms
// =============================================================================

proptest! {
    /// Decoding and rebuilding a rigid motion reproduces the matrix.
    #[test]
    fn rot_decode_round_trip(
        axis in arb_unit_vector(),
        angle in prop_oneof![1e-7..1e-2f64, 1e-2..(TAU - 1e-2), (TAU - 1e-2)..(TAU - 1e-7)],
        center in arb_point3(10.0),
        slide in -10.0..10.0f64,
    ) {
        let m = Matrix4::new_translation(&(axis * slide))
            * rotation_about(angle, &axis, &center).unwrap();
        let decoded = rot_decode(&m, tol()).unwrap();

        prop_assert!(decoded.angle >= 0.0 && decoded.angle <= PI + 1e-12);
        let short = angle.min(TAU - angle);
        prop_assert!((decoded.angle - short).abs() <= 1e-6 * short);
        prop_assert!((decoded.axis.norm() - 1.0).abs() <= 1e-12);
        prop_assert!(decoded.center.coords.dot(&decoded.axis).abs() <= 1e-9 * 20.0);
        assert_matrix_close(&decoded.to_matrix().unwrap(), &m, 20.0)?;
        assert_matrix_close(&decoded.long_form().to_matrix().unwrap(), &m, 20.0)?;
    }

    /// Half turns decode to an angle of pi.
    #[test]
    fn rot_decode_half_turn(axis in arb_unit_vector(), center in arb_point3(10.0)) {
        let m = rotation_about(PI, &axis, &center).unwrap();
        let decoded = rot_decode(&m, tol()).unwrap();

        prop_assert!((decoded.angle - PI).abs() <= 1e-7);
        prop_assert!(decoded.axis.dot(&axis).abs() >= 1.0 - 1e-9);
        assert_matrix_close(&decoded.to_matrix().unwrap(), &m, 20.0)?;
    }

    /// Pure translations decode with no rotation.
    #[test]
    fn rot_decode_pure_translation(offset in arb_point3(50.0)) {
        let m = Matrix4::new_translation(&offset.coords);
        let decoded = rot_decode(&m, tol()).unwrap();

        prop_assert_eq!(decoded.angle, 0.0);
        prop_assert_eq!(decoded.translation, offset.coords);
        assert_matrix_close(&decoded.to_matrix().unwrap(), &m, 50.0)?;
    }
}

// =============================================================================
// Property Tests: Circles
// =============================================================================

proptest! {
    /// A line at distance `k * r` from the center meets the circle in
    /// two, one or zero points.
    #[test]
    fn circle_line_intersection_counts(
        center in prop::array::uniform2(-10.0..10.0f64),
        radius in 0.5..5.0f64,
        heading in 0.0..TAU,
        k in prop_oneof![0.0..0.95f64, Just(1.0), 1.05..3.0f64],
    ) {
        let circle = Circle2::new(Point2::new(center[0], center[1]), radius).unwrap();
        let dir = Vector2::new(heading.cos(), heading.sin());
        let normal = Vector2::new(-dir.y, dir.x);
        let foot = circle.center + normal * (k * radius);
        let line = Line2::infinite(foot - dir * 3.0, foot + dir * 4.0, tol()).unwrap();

        let hits = circle_line_intersection(&circle, &line, tol());
        let expected = match k {
            k if k < 1.0 => 2,
            k if k > 1.0 => 0,
            _ => 1,
        };
        prop_assert_eq!(hits.len(), expected);

        let slack = 1e-9 * (radius + circle.center.coords.norm());
        for hit in &hits {
            prop_assert!(((hit - circle.center).norm() - radius).abs() <= slack);
            prop_assert!(line.distance_to(hit) <= slack);
        }
    }
}
