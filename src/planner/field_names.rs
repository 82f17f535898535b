//! Property query name to index field name mapping
//!
//! Protocol-defined properties have fixed field names. Everything else lives
//! in a dynamic namespace chosen by declared type, so custom properties never
//! collide with the fixed names or with query syntax.

use crate::index::fields::{
    BASE_TYPE_FIELD, DYNAMIC_DATE_PREFIX, DYNAMIC_STRING_PREFIX, ID_FIELD, PARENT_FIELD,
    SECONDARY_TYPES_FIELD, TYPE_FIELD,
};
use crate::index::escape_term;
use crate::query::ColumnReference;
use crate::types::{PropertyType, TypeManager};

const STANDARD_FIELDS: &[(&str, &str)] = &[
    ("cmis:objectId", ID_FIELD),
    ("cmis:name", "name"),
    ("cmis:description", "description"),
    ("cmis:objectTypeId", TYPE_FIELD),
    ("cmis:baseTypeId", BASE_TYPE_FIELD),
    ("cmis:secondaryObjectTypeIds", SECONDARY_TYPES_FIELD),
    ("cmis:createdBy", "createdby"),
    ("cmis:creationDate", "created"),
    ("cmis:lastModifiedBy", "modifiedby"),
    ("cmis:lastModificationDate", "modified"),
    ("cmis:changeToken", "changetoken"),
    ("cmis:parentId", PARENT_FIELD),
    ("cmis:path", "path"),
    ("cmis:allowedChildObjectTypeIds", "allowedchildtypes"),
    ("cmis:isImmutable", "immutable"),
    ("cmis:isLatestVersion", "latestversion"),
    ("cmis:isMajorVersion", "majorversion"),
    ("cmis:isLatestMajorVersion", "latestmajorversion"),
    ("cmis:isPrivateWorkingCopy", "pwc"),
    ("cmis:versionLabel", "versionlabel"),
    ("cmis:versionSeriesId", "versionseriesid"),
    ("cmis:isVersionSeriesCheckedOut", "checkedout"),
    ("cmis:versionSeriesCheckedOutBy", "checkedoutby"),
    ("cmis:versionSeriesCheckedOutId", "checkedoutid"),
    ("cmis:checkinComment", "checkincomment"),
    ("cmis:contentStreamLength", "contentlength"),
    ("cmis:contentStreamMimeType", "mimetype"),
    ("cmis:contentStreamFileName", "filename"),
    ("cmis:contentStreamId", "contentstreamid"),
    ("cmis:sourceId", "sourceid"),
    ("cmis:targetId", "targetid"),
    ("cmis:policyText", "policytext"),
];

/// Fixed field name of a protocol-defined property
pub fn standard_field(query_name: &str) -> Option<&'static str> {
    STANDARD_FIELDS
        .iter()
        .find(|(name, _)| *name == query_name)
        .map(|(_, field)| *field)
}

/// Field name in the dynamic namespace for a property of `property_type`
pub fn dynamic_field(query_name: &str, property_type: PropertyType) -> String {
    let prefix = match property_type {
        PropertyType::DateTime => DYNAMIC_DATE_PREFIX,
        _ => DYNAMIC_STRING_PREFIX,
    };
    format!("{}{}", prefix, escape_term(query_name))
}

/// Resolves property query names against the type metadata
pub struct SchemaNameResolver<'a> {
    types: &'a dyn TypeManager,
}

impl<'a> SchemaNameResolver<'a> {
    pub fn new(types: &'a dyn TypeManager) -> Self {
        Self { types }
    }

    /// Maps a property query name to its index field.
    ///
    /// Total: a name the type metadata does not know goes to the dynamic
    /// string namespace.
    pub fn resolve_field_name(&self, query_name: &str) -> String {
        if let Some(field) = standard_field(query_name) {
            return field.to_string();
        }
        let property_type = self
            .types
            .property_by_query_name(query_name)
            .map(|p| p.property_type)
            .unwrap_or(PropertyType::Unknown);
        dynamic_field(query_name, property_type)
    }

    /// Maps a resolved column to its index field, trusting the column's own type
    pub fn resolve_column(&self, column: &ColumnReference) -> String {
        match standard_field(&column.query_name) {
            Some(field) => field.to_string(),
            None => dynamic_field(&column.query_name, column.property_type),
        }
    }
}
