//! Distance and collision between convex hulls of point sets (GJK).

mod gjk;
pub mod simplex;

pub use gjk::{convex_collision, convex_distance, ConvexProximity};
pub use simplex::{closest_s1, closest_s2, closest_s3, closest_simplex, SimplexReduction};
