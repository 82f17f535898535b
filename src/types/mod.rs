//! Type metadata subsystem
//!
//! Holds the object type hierarchy and property definitions the query engine
//! type-checks against.
//!
//! # Design Principles
//!
//! - Built once, then published immutable
//! - Passed by reference; no process-wide tables
//! - Property inheritance resolved at build time

mod base;
mod definition;
mod errors;
mod registry;

pub use base::base_type;
pub use definition::{BaseTypeKind, Cardinality, PropertyDefinition, PropertyType, TypeDefinition};
pub use errors::{TypeRegistryError, TypeRegistryResult};
pub use registry::{TypeManager, TypeRegistry, TypeRegistryBuilder};
