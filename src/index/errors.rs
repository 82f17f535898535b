//! Search index error types
//!
//! Error codes:
//! - CMIS_INDEX_UNAVAILABLE
//! - CMIS_INDEX_TIMEOUT
//! - CMIS_INDEX_REJECTED

use std::time::Duration;

use thiserror::Error;

/// Result type for index calls
pub type IndexResult<T> = Result<T, IndexError>;

/// Failure reported by the search backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The backend could not be reached or failed internally
    #[error("search index unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within its deadline
    #[error("search index call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend refused the query it was sent
    #[error("search index rejected query: {0}")]
    Rejected(String),
}

impl IndexError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        IndexError::Unavailable(reason.into())
    }

    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::Unavailable(_) => "CMIS_INDEX_UNAVAILABLE",
            IndexError::Timeout(_) => "CMIS_INDEX_TIMEOUT",
            IndexError::Rejected(_) => "CMIS_INDEX_REJECTED",
        }
    }

    /// Whether the caller may reasonably retry
    pub fn is_retryable(&self) -> bool {
        !matches!(self, IndexError::Rejected(_))
    }
}
