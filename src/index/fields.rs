//! Read-side index schema: the field names the index stores objects under

/// Object id
pub const ID_FIELD: &str = "id";
/// Object type id (the type discriminator)
pub const TYPE_FIELD: &str = "objecttype";
/// Base type id
pub const BASE_TYPE_FIELD: &str = "basetype";
/// Ids of the secondary types applied to the object
pub const SECONDARY_TYPES_FIELD: &str = "secondarytypes";
/// Id of the parent folder
pub const PARENT_FIELD: &str = "parentid";
/// Analyzed full-text content
pub const FULLTEXT_FIELD: &str = "text";
/// Prefix of dynamic fields holding datetime values
pub const DYNAMIC_DATE_PREFIX: &str = "dyn_dt_";
/// Prefix of dynamic fields holding every other value type
pub const DYNAMIC_STRING_PREFIX: &str = "dyn_s_";
