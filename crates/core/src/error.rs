//! Core error taxonomy for the library-arbitration engine

use thiserror::Error;

/// Errors raised anywhere in the engine.
///
/// Propagation policy (spec §7): `Compilation` and `Collaborator` are mostly
/// recoverable at the call site (a bad filter is skipped, a failed enricher
/// degrades gracefully); `PoolStopped` and `Cancelled` short-circuit whatever
/// called them; `Config` is fatal before any work starts.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("configuration error: {field} - {message}")]
    Config { field: String, message: String },

    #[error("filter compilation error in {source_expression:?}: {reason}")]
    Compilation {
        source_expression: String,
        reason: String,
        position: Option<usize>,
    },

    #[error("filter evaluation error for record {record_id}: {reason}")]
    Evaluation { record_id: i64, reason: String },

    #[error("collaborator error: {service} - {message}")]
    Collaborator {
        service: String,
        message: String,
        kind: CollaboratorErrorKind,
    },

    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("worker pool has been stopped")]
    PoolStopped,

    #[error("operation cancelled")]
    Cancelled,

    #[error("filesystem error: {path} - {message}")]
    FileSystem { path: String, message: String },

    #[error("{resource} action failed for {failed} of {requested} records")]
    PartialFailure {
        resource: String,
        requested: usize,
        failed: usize,
    },
}

/// How a collaborator error should be handled by its caller (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorErrorKind {
    /// 401/403 — fatal for that collaborator.
    Authentication,
    /// 404 on a specific lookup — convertible to `NotFound` by the caller.
    NotFound,
    /// Any other 4xx/5xx — a warning; continue with empty data.
    Transient,
}

pub type Result<T> = std::result::Result<T, LibraryError>;

impl LibraryError {
    pub fn compilation(source_expression: impl Into<String>, reason: impl Into<String>) -> Self {
        LibraryError::Compilation {
            source_expression: source_expression.into(),
            reason: reason.into(),
            position: None,
        }
    }

    pub fn collaborator(
        service: impl Into<String>,
        message: impl Into<String>,
        kind: CollaboratorErrorKind,
    ) -> Self {
        LibraryError::Collaborator {
            service: service.into(),
            message: message.into(),
            kind,
        }
    }

    /// True for errors that should short-circuit a batch instead of being
    /// accumulated per-item (cancellation, pool shutdown).
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, LibraryError::Cancelled | LibraryError::PoolStopped)
    }
}
