//! Type and property definitions of the repository object model
//!
//! Supported property types (CMIS 1.1):
//! - string, html, uri, id: textual values
//! - integer, decimal: numeric values
//! - boolean
//! - datetime: UTC instants
//!
//! Definitions are immutable once a registry has been built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared data type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Html,
    Uri,
    Id,
    Integer,
    Decimal,
    Boolean,
    #[serde(rename = "datetime")]
    DateTime,
    /// A type this engine does not know; comparisons against it are not type-checked
    #[serde(other)]
    Unknown,
}

impl PropertyType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyType::String => "STRING",
            PropertyType::Html => "HTML",
            PropertyType::Uri => "URI",
            PropertyType::Id => "ID",
            PropertyType::Integer => "INTEGER",
            PropertyType::Decimal => "DECIMAL",
            PropertyType::Boolean => "BOOLEAN",
            PropertyType::DateTime => "DATETIME",
            PropertyType::Unknown => "UNKNOWN",
        }
    }

    /// Returns true for the types whose values are free text
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            PropertyType::String | PropertyType::Html | PropertyType::Uri | PropertyType::Id
        )
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Whether a property holds one value or a set of values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    Multi,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Single => "SINGLE",
            Cardinality::Multi => "MULTI",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property definition owned by a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Property id (stable key used in stored objects)
    pub id: String,
    /// Query-facing name
    pub query_name: String,
    /// Declared data type
    pub property_type: PropertyType,
    /// Single or multi valued
    pub cardinality: Cardinality,
    /// Whether the property may appear in SELECT and WHERE
    #[serde(default = "default_true")]
    pub queryable: bool,
    /// Whether the property may appear in ORDER BY
    #[serde(default = "default_true")]
    pub orderable: bool,
}

fn default_true() -> bool {
    true
}

impl PropertyDefinition {
    /// Create a queryable property whose query name equals its id.
    ///
    /// Multi-valued properties are never orderable.
    pub fn new(
        id: impl Into<String>,
        property_type: PropertyType,
        cardinality: Cardinality,
    ) -> Self {
        let id = id.into();
        Self {
            query_name: id.clone(),
            id,
            property_type,
            cardinality,
            queryable: true,
            orderable: cardinality == Cardinality::Single,
        }
    }

    /// Create a single-valued property
    pub fn single(id: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(id, property_type, Cardinality::Single)
    }

    /// Create a multi-valued property
    pub fn multi(id: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(id, property_type, Cardinality::Multi)
    }

    /// Override the query name
    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = query_name.into();
        self
    }

    /// Mark the property as not queryable
    pub fn not_queryable(mut self) -> Self {
        self.queryable = false;
        self
    }

    /// Mark the property as not orderable
    pub fn not_orderable(mut self) -> Self {
        self.orderable = false;
        self
    }

    pub fn is_multi_valued(&self) -> bool {
        self.cardinality == Cardinality::Multi
    }
}

/// The base type every object type ultimately derives from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseTypeKind {
    Document,
    Folder,
    Relationship,
    Policy,
    Item,
    Secondary,
}

impl BaseTypeKind {
    /// Returns the base type id
    pub fn type_id(&self) -> &'static str {
        match self {
            BaseTypeKind::Document => "cmis:document",
            BaseTypeKind::Folder => "cmis:folder",
            BaseTypeKind::Relationship => "cmis:relationship",
            BaseTypeKind::Policy => "cmis:policy",
            BaseTypeKind::Item => "cmis:item",
            BaseTypeKind::Secondary => "cmis:secondary",
        }
    }

    pub fn all() -> [BaseTypeKind; 6] {
        [
            BaseTypeKind::Document,
            BaseTypeKind::Folder,
            BaseTypeKind::Relationship,
            BaseTypeKind::Policy,
            BaseTypeKind::Item,
            BaseTypeKind::Secondary,
        ]
    }
}

/// Object type definition
///
/// `properties` holds the complete property set, inherited ones included,
/// once the type has been published by a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type id (the value stored in the index type discriminator)
    pub id: String,
    /// Query-facing name used in FROM and as a column qualifier
    pub query_name: String,
    /// Base type
    pub base: BaseTypeKind,
    /// Parent type id, `None` for base types
    pub parent_id: Option<String>,
    /// Whether the type may appear in FROM
    #[serde(default = "default_true")]
    pub queryable: bool,
    /// Whether instances show up in queries against an ancestor type
    #[serde(default = "default_true")]
    pub include_in_supertype_query: bool,
    /// Property definitions in declaration order
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl TypeDefinition {
    /// Create a type whose query name equals its id
    pub fn new(id: impl Into<String>, base: BaseTypeKind, parent_id: Option<String>) -> Self {
        let id = id.into();
        Self {
            query_name: id.clone(),
            id,
            base,
            parent_id,
            queryable: true,
            include_in_supertype_query: true,
            properties: Vec::new(),
        }
    }

    /// Create a subtype of `parent_id`
    pub fn subtype(
        id: impl Into<String>,
        base: BaseTypeKind,
        parent_id: impl Into<String>,
    ) -> Self {
        Self::new(id, base, Some(parent_id.into()))
    }

    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = query_name.into();
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn excluded_from_supertype_query(mut self) -> Self {
        self.include_in_supertype_query = false;
        self
    }

    pub fn not_queryable(mut self) -> Self {
        self.queryable = false;
        self
    }

    /// Looks up a property by id
    pub fn property(&self, id: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Looks up a property by query name
    pub fn property_by_query_name(&self, query_name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.query_name == query_name)
    }

    /// Queryable properties in declaration order
    pub fn queryable_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter().filter(|p| p.queryable)
    }

    pub fn is_base_type(&self) -> bool {
        self.parent_id.is_none()
    }
}
