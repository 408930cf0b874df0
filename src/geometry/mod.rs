pub mod bounds;
pub mod circle;
pub mod line;
pub mod plane;
pub mod polygon;
pub mod polygon_line;

pub use bounds::Bounds;
pub use circle::{Circle2, Circle3};
pub use line::{Line, Line2, Line3};
pub use plane::{Plane, PlaneFrame, PlaneLineIntersection};
pub use polygon::{Containment, FillRule};
pub use polygon_line::{LineFragment, PolygonLineIntersect, DEFAULT_EXTENSION_FACTOR};
