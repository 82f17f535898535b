//! Type registry error types
//!
//! Raised only while a registry is being built; a published registry is
//! immutable and its lookups cannot fail.

use thiserror::Error;

/// Result type for registry construction
pub type TypeRegistryResult<T> = Result<T, TypeRegistryError>;

/// Errors detected while building a type registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeRegistryError {
    /// Two definitions share an id
    #[error("type '{0}' is defined more than once")]
    DuplicateType(String),

    /// Two definitions share a query name
    #[error("query name '{0}' is used by more than one type")]
    DuplicateQueryName(String),

    /// A type names a parent that was never registered
    #[error("type '{type_id}' has unknown parent '{parent_id}'")]
    UnknownParent { type_id: String, parent_id: String },

    /// A subtype redefines an inherited property
    #[error("type '{type_id}' redefines inherited property '{property_id}'")]
    DuplicateProperty { type_id: String, property_id: String },

    /// Two types declare the same property query name with different data types
    #[error("property query name '{query_name}' is declared as both {first} and {second}")]
    ConflictingPropertyType {
        query_name: String,
        first: String,
        second: String,
    },
}

impl TypeRegistryError {
    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            TypeRegistryError::DuplicateType(_) => "CMIS_TYPE_DUPLICATE",
            TypeRegistryError::DuplicateQueryName(_) => "CMIS_TYPE_DUPLICATE_QUERY_NAME",
            TypeRegistryError::UnknownParent { .. } => "CMIS_TYPE_UNKNOWN_PARENT",
            TypeRegistryError::DuplicateProperty { .. } => "CMIS_TYPE_DUPLICATE_PROPERTY",
            TypeRegistryError::ConflictingPropertyType { .. } => "CMIS_TYPE_CONFLICTING_PROPERTY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TypeRegistryError::UnknownParent {
            type_id: "my:doc".into(),
            parent_id: "my:missing".into(),
        };
        let display = format!("{}", err);
        assert!(display.contains("my:doc"));
        assert!(display.contains("my:missing"));
        assert_eq!(err.code(), "CMIS_TYPE_UNKNOWN_PARENT");
    }
}
