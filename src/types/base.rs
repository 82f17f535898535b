//! Standard base types and their protocol-mandated properties

use super::definition::{BaseTypeKind, PropertyDefinition, PropertyType, TypeDefinition};

/// Properties every object carries
fn common_properties() -> Vec<PropertyDefinition> {
    use PropertyType::*;
    vec![
        PropertyDefinition::single("cmis:objectId", Id),
        PropertyDefinition::single("cmis:name", String),
        PropertyDefinition::single("cmis:description", String),
        PropertyDefinition::single("cmis:objectTypeId", Id),
        PropertyDefinition::single("cmis:baseTypeId", Id),
        PropertyDefinition::multi("cmis:secondaryObjectTypeIds", Id),
        PropertyDefinition::single("cmis:createdBy", String),
        PropertyDefinition::single("cmis:creationDate", DateTime),
        PropertyDefinition::single("cmis:lastModifiedBy", String),
        PropertyDefinition::single("cmis:lastModificationDate", DateTime),
        PropertyDefinition::single("cmis:changeToken", String).not_queryable(),
    ]
}

fn document_properties() -> Vec<PropertyDefinition> {
    use PropertyType::*;
    vec![
        PropertyDefinition::single("cmis:isImmutable", Boolean),
        PropertyDefinition::single("cmis:isLatestVersion", Boolean),
        PropertyDefinition::single("cmis:isMajorVersion", Boolean),
        PropertyDefinition::single("cmis:isLatestMajorVersion", Boolean),
        PropertyDefinition::single("cmis:isPrivateWorkingCopy", Boolean),
        PropertyDefinition::single("cmis:versionLabel", String),
        PropertyDefinition::single("cmis:versionSeriesId", Id),
        PropertyDefinition::single("cmis:isVersionSeriesCheckedOut", Boolean),
        PropertyDefinition::single("cmis:versionSeriesCheckedOutBy", String),
        PropertyDefinition::single("cmis:versionSeriesCheckedOutId", Id),
        PropertyDefinition::single("cmis:checkinComment", String),
        PropertyDefinition::single("cmis:contentStreamLength", Integer),
        PropertyDefinition::single("cmis:contentStreamMimeType", String),
        PropertyDefinition::single("cmis:contentStreamFileName", String),
        PropertyDefinition::single("cmis:contentStreamId", Id),
    ]
}

fn folder_properties() -> Vec<PropertyDefinition> {
    use PropertyType::*;
    vec![
        PropertyDefinition::single("cmis:parentId", Id),
        PropertyDefinition::single("cmis:path", String),
        PropertyDefinition::multi("cmis:allowedChildObjectTypeIds", Id),
    ]
}

fn relationship_properties() -> Vec<PropertyDefinition> {
    vec![
        PropertyDefinition::single("cmis:sourceId", PropertyType::Id),
        PropertyDefinition::single("cmis:targetId", PropertyType::Id),
    ]
}

fn policy_properties() -> Vec<PropertyDefinition> {
    vec![PropertyDefinition::single("cmis:policyText", PropertyType::String)]
}

/// Builds the definition of a base type with its standard properties
pub fn base_type(kind: BaseTypeKind) -> TypeDefinition {
    let mut def = TypeDefinition::new(kind.type_id(), kind, None);
    let specific = match kind {
        BaseTypeKind::Document => document_properties(),
        BaseTypeKind::Folder => folder_properties(),
        BaseTypeKind::Relationship => relationship_properties(),
        BaseTypeKind::Policy => policy_properties(),
        BaseTypeKind::Item | BaseTypeKind::Secondary => Vec::new(),
    };

    // Secondary types only contribute their own properties to an object
    if kind != BaseTypeKind::Secondary {
        def.properties = common_properties();
    }
    def.properties.extend(specific);
    if kind == BaseTypeKind::Secondary {
        def.queryable = false;
    }
    def
}
