use thiserror::Error;

/// Top-level error type for the geokern geometry kernel.
#[derive(Debug, Error)]
pub enum GeokernError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
}

/// Violations of an operation's input contract.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("{operation} needs at least {needed} points, got {got}")]
    TooFewPoints {
        operation: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("points must be 2D or 3D, got dimension {0}")]
    UnsupportedDimension(usize),

    #[error("boundedness must have 1 or 2 flags, got {0}")]
    MalformedBounds(usize),

    #[error("index {index} is out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("non-finite coordinate in {0}")]
    NonFinite(&'static str),

    #[error("matrix is not a rigid transform: {0}")]
    NotRigidTransform(String),
}

/// Errors related to malformed geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("points are collinear: {0}")]
    Collinear(String),

    #[error("polygon is not planar")]
    NonPlanar,
}

/// Errors reported by the ear-clipping triangulator.
#[derive(Debug, Error)]
pub enum TriangulationError {
    #[error("no valid ear among {remaining} remaining vertices; polygon twists or self-intersects")]
    NoEar { remaining: usize },

    #[error("the polygon vertices are collinear")]
    Collinear,

    #[error("the polygon vertices are not coplanar")]
    NotCoplanar,
}

/// Convenience type alias for results using [`GeokernError`].
pub type Result<T> = std::result::Result<T, GeokernError>;
