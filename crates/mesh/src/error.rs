//! Error types for mesh construction

use thiserror::Error;

/// Geometry that would break the "every index is valid" invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A polygon references a vertex that does not exist
    #[error("polygon vertex index {index} out of range ({len} vertices)")]
    VertexIndex { index: usize, len: usize },

    /// A polygon references a normal that does not exist
    #[error("polygon normal index {index} out of range ({len} normals)")]
    NormalIndex { index: usize, len: usize },

    /// Normal indices must be absent or parallel to vertex indices
    #[error("polygon has {normals} normal indices for {vertices} vertices")]
    NormalCount { vertices: usize, normals: usize },
}

/// Result type for mesh operations
pub type Result<T> = std::result::Result<T, MeshError>;
