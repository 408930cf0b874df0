//! Rigid transforms: building rotations and decoding them back.

mod rot_decode;
mod rotation;

pub use rot_decode::{rot_decode, RotationDecomposition};
pub use rotation::rotation_about;
