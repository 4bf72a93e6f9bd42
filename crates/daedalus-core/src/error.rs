//! Error types for Daedalus.
//!
//! [`DaedalusError`] covers the *structural* failures of the system: a
//! document that does not have the pipeline shape, a middleware kind that
//! no handler exists for, or an edit that targets a node that is not there.
//!
//! Pipeline validity problems (cycles, ordering) are not errors; they are
//! reported as validation issues. Simulated 401/403/404/429 outcomes are
//! not errors either; they are ordinary simulation results.

use thiserror::Error;

/// Result type alias using [`DaedalusError`].
pub type DaedalusResult<T> = Result<T, DaedalusError>;

/// Standard error type for Daedalus.
///
/// # Example
///
/// ```
/// use daedalus_core::{DaedalusError, MiddlewareKind};
///
/// let err = "Tracing".parse::<MiddlewareKind>().unwrap_err();
/// assert!(matches!(err, DaedalusError::UnknownMiddlewareKind { .. }));
/// ```
#[derive(Error, Debug)]
pub enum DaedalusError {
    /// The document does not have the required pipeline shape.
    #[error("invalid pipeline document: {reason}")]
    InvalidDocument {
        /// Why the document was rejected.
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("pipeline JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A middleware kind was requested that has no handler.
    #[error("unknown middleware kind: {kind}")]
    UnknownMiddlewareKind {
        /// The kind that was requested.
        kind: String,
    },

    /// An edit referenced a node id that does not exist.
    #[error("middleware node not found: {id}")]
    NodeNotFound {
        /// The missing node id.
        id: String,
    },

    /// An edit would introduce a second node with the same id.
    #[error("duplicate middleware node id: {id}")]
    DuplicateNodeId {
        /// The duplicated id.
        id: String,
    },

    /// A middleware configuration value is unusable.
    #[error("invalid middleware configuration for {field}: {reason}")]
    InvalidConfig {
        /// The offending configuration key.
        field: String,
        /// Explanation of the problem.
        reason: String,
    },
}

impl DaedalusError {
    /// Creates an invalid document error.
    #[must_use]
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
        }
    }

    /// Creates an unknown middleware kind error.
    #[must_use]
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownMiddlewareKind { kind: kind.into() }
    }

    /// Creates a node not found error.
    #[must_use]
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Creates a duplicate node id error.
    #[must_use]
    pub fn duplicate_node(id: impl Into<String>) -> Self {
        Self::DuplicateNodeId { id: id.into() }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error means the input document is unusable.
    #[must_use]
    pub const fn is_document_error(&self) -> bool {
        matches!(self, Self::InvalidDocument { .. } | Self::Json(_))
    }
}
