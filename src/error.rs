//! Error types for the ray tracer.

use thiserror::Error;

/// Errors raised while building scenes or tracing rays.
///
/// Missed rays and degenerate geometry (parallel rays, tangent hits) are not
/// errors; they produce empty intersection lists instead.
#[derive(Error, Debug)]
pub enum TraceError {
    /// A transform was inverted but its determinant is (nearly) zero.
    #[error("matrix is not invertible (determinant {determinant})")]
    NonInvertible { determinant: f64 },

    /// A functional `replace` named a field that does not exist.
    #[error("unrecognized field `{0}`")]
    UnknownField(String),

    /// A functional `replace` supplied the wrong kind of value.
    #[error("field `{field}` expects {expected}")]
    FieldType { field: String, expected: &'static str },

    /// Groups and CSG nodes are never hit directly, so they have no normal.
    #[error("normals are undefined on groups and CSG nodes")]
    CompositeNormal,

    #[error("invalid scene description: {0}")]
    InvalidScene(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("could not build render thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for tracing operations.
pub type Result<T> = std::result::Result<T, TraceError>;
