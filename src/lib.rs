pub mod error;
pub mod geometry;
pub mod math;
pub mod proximity;
pub mod transform;
pub mod triangulation;

pub use error::{GeokernError, Result};
pub use math::tolerance::Tolerance;
