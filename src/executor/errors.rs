//! Executor error types
//!
//! Error codes:
//! - CMIS_QUERY_INVALID (client fault)
//! - CMIS_QUERY_INTERNAL (translator fault)
//! - CMIS_BACKEND_UNAVAILABLE (search index failure)
//! - CMIS_CONTENT_STORE_FAILED / CMIS_PERMISSION_FAILED / CMIS_LOCK_FAILED
//!   (collaborator failures, propagated unchanged)

use std::fmt;

use thiserror::Error;

use crate::index::IndexError;
use crate::planner::PlannerError;
use crate::query::ParseError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Failure reported by a collaborating service (content store, permissions, locks)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{service}: {message}")]
pub struct ServiceError {
    pub service: String,
    pub message: String,
}

impl ServiceError {
    pub fn new(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Caller-visible failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or ill-typed query
    InvalidQuery,
    /// Translator contract violation
    Internal,
    /// Search index unreachable or failing
    BackendUnavailable,
    /// A collaborating service failed
    Service,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidQuery => "invalid_query",
            ErrorKind::Internal => "internal",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::Service => "service",
        };
        f.write_str(name)
    }
}

/// Errors raised while running a query
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("search backend unavailable: {0}")]
    BackendUnavailable(#[source] IndexError),

    #[error("content store failed: {0}")]
    ContentStore(#[source] ServiceError),

    #[error("permission service failed: {0}")]
    Permission(#[source] ServiceError),

    #[error("lock service failed: {0}")]
    Lock(#[source] ServiceError),

    #[error("invalid query: {0}")]
    Parse(String),
}

impl ExecutorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Planner(PlannerError::InvalidQuery(_)) | ExecutorError::Parse(_) => {
                ErrorKind::InvalidQuery
            }
            ExecutorError::Planner(PlannerError::InternalTranslation(_)) => ErrorKind::Internal,
            ExecutorError::Planner(PlannerError::BackendUnavailable { .. })
            | ExecutorError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            ExecutorError::ContentStore(_)
            | ExecutorError::Permission(_)
            | ExecutorError::Lock(_) => ErrorKind::Service,
        }
    }

    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Planner(err) => err.code(),
            ExecutorError::BackendUnavailable(_) => "CMIS_BACKEND_UNAVAILABLE",
            ExecutorError::ContentStore(_) => "CMIS_CONTENT_STORE_FAILED",
            ExecutorError::Permission(_) => "CMIS_PERMISSION_FAILED",
            ExecutorError::Lock(_) => "CMIS_LOCK_FAILED",
            ExecutorError::Parse(_) => "CMIS_QUERY_INVALID",
        }
    }

    /// Whether the caller caused the failure
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidQuery
    }

    /// Whether retrying the same query may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ExecutorError::BackendUnavailable(source)
            | ExecutorError::Planner(PlannerError::BackendUnavailable { source, .. }) => {
                source.is_retryable()
            }
            _ => false,
        }
    }
}

impl From<ParseError> for ExecutorError {
    fn from(err: ParseError) -> Self {
        match err.offset() {
            Some(offset) => ExecutorError::Parse(format!("{} at offset {}", err.message(), offset)),
            None => ExecutorError::Parse(err.message().to_string()),
        }
    }
}
