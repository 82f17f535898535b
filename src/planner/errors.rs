//! Planner error types
//!
//! Error codes:
//! - CMIS_QUERY_INVALID (client fault, never retried)
//! - CMIS_QUERY_INTERNAL (translator fault, logged)
//! - CMIS_BACKEND_UNAVAILABLE (index failure while planning)

use thiserror::Error;

use crate::index::IndexError;
use crate::types::PropertyType;

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Errors raised while translating and planning a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// The query is malformed or ill-typed; the message says how to fix it
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The predicate tree contains something the translator cannot handle
    #[error("internal translation error: {0}")]
    InternalTranslation(String),

    /// The search index failed during planning (IN_TREE traversal)
    #[error("search backend unavailable during {context}: {source}")]
    BackendUnavailable {
        context: &'static str,
        #[source]
        source: IndexError,
    },
}

impl PlannerError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        PlannerError::InvalidQuery(reason.into())
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        PlannerError::InternalTranslation(reason.into())
    }

    /// Literal of the wrong category compared against a property
    pub fn type_mismatch(property: &str, declared: PropertyType, found: &str) -> Self {
        PlannerError::InvalidQuery(format!(
            "property '{}' of type {} cannot be compared with a {} literal",
            property, declared, found
        ))
    }

    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::InvalidQuery(_) => "CMIS_QUERY_INVALID",
            PlannerError::InternalTranslation(_) => "CMIS_QUERY_INTERNAL",
            PlannerError::BackendUnavailable { .. } => "CMIS_BACKEND_UNAVAILABLE",
        }
    }

    /// Whether the caller caused the failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, PlannerError::InvalidQuery(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PlannerError::invalid("x").code(), "CMIS_QUERY_INVALID");
        assert_eq!(PlannerError::internal("x").code(), "CMIS_QUERY_INTERNAL");
        let backend = PlannerError::BackendUnavailable {
            context: "IN_TREE traversal",
            source: IndexError::unavailable("down"),
        };
        assert_eq!(backend.code(), "CMIS_BACKEND_UNAVAILABLE");
        assert!(!backend.is_client_error());
    }

    #[test]
    fn test_type_mismatch_names_everything() {
        let err = PlannerError::type_mismatch("cmis:name", PropertyType::String, "numeric");
        let display = err.to_string();
        assert!(display.contains("cmis:name"));
        assert!(display.contains("STRING"));
        assert!(display.contains("numeric"));
        assert!(err.is_client_error());
    }
}
