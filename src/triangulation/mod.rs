//! Ear-clipping triangulation of simple and self-touching polygons.

mod ear_clip;

pub use ear_clip::{triangulate_2d, triangulate_3d, Triangulate};
