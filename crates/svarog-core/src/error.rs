//! Error types for Svarog.
//!
//! This module provides a unified error type for all index and graph
//! operations. Error codes follow the pattern `SVAROG-XXX` for easy debugging.

use thiserror::Error;

/// Result type alias for Svarog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Svarog operations.
///
/// Each variant includes a descriptive error message suitable for end-users.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector dimension mismatch (SVAROG-001).
    ///
    /// Raised before any mutation: a vertex with a wrong-sized vector is
    /// never registered.
    #[error("[SVAROG-001] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Vertex not found (SVAROG-002).
    #[error("[SVAROG-002] Vertex '{0}' not found")]
    VertexNotFound(String),

    /// Unique constraint violation on the external id index (SVAROG-003).
    #[error("[SVAROG-003] Duplicate external id '{0}'")]
    UniqueViolation(String),

    /// Configuration error (SVAROG-004).
    #[error("[SVAROG-004] Configuration error: {0}")]
    Config(String),

    /// Unknown distance function name in a descriptor (SVAROG-005).
    ///
    /// Names are resolved through a registry; an index with an unknown name
    /// does not open.
    #[error("[SVAROG-005] Unknown distance function '{0}'")]
    UnknownDistanceFunction(String),

    /// Unknown distance comparator name in a descriptor (SVAROG-006).
    #[error("[SVAROG-006] Unknown distance comparator '{0}'")]
    UnknownComparator(String),

    /// Storage engine error (SVAROG-007).
    #[error("[SVAROG-007] Storage error: {0}")]
    Storage(String),

    /// Serialization error (SVAROG-008).
    #[error("[SVAROG-008] Serialization error: {0}")]
    Serialization(String),

    /// IO error (SVAROG-009).
    #[error("[SVAROG-009] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (SVAROG-010).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[SVAROG-010] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "SVAROG-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "SVAROG-001",
            Self::VertexNotFound(_) => "SVAROG-002",
            Self::UniqueViolation(_) => "SVAROG-003",
            Self::Config(_) => "SVAROG-004",
            Self::UnknownDistanceFunction(_) => "SVAROG-005",
            Self::UnknownComparator(_) => "SVAROG-006",
            Self::Storage(_) => "SVAROG-007",
            Self::Serialization(_) => "SVAROG-008",
            Self::Io(_) => "SVAROG-009",
            Self::Internal(_) => "SVAROG-010",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Internal errors are the only non-recoverable kind; storage errors can
    /// be retried because graph writes are transactional at batch boundaries.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
