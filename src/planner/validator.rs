//! Literal/property type compatibility
//!
//! | Property type | Literal |
//! |---|---|
//! | STRING, HTML, URI, ID | string |
//! | INTEGER, DECIMAL | numeric |
//! | BOOLEAN | boolean |
//! | DATETIME | timestamp |
//! | anything else | any |
//!
//! No implicit widening: a numeric literal never matches a STRING property.

use super::errors::{PlannerError, PlannerResult};
use super::literal::LiteralCategory;
use crate::types::PropertyType;

/// Literal category a property type requires, `None` when any is accepted
pub fn required_category(property_type: PropertyType) -> Option<LiteralCategory> {
    match property_type {
        PropertyType::String | PropertyType::Html | PropertyType::Uri | PropertyType::Id => {
            Some(LiteralCategory::String)
        }
        PropertyType::Integer | PropertyType::Decimal => Some(LiteralCategory::Numeric),
        PropertyType::Boolean => Some(LiteralCategory::Boolean),
        PropertyType::DateTime => Some(LiteralCategory::Timestamp),
        PropertyType::Unknown => None,
    }
}

/// Checks that a literal of `category` may be compared with `property_name`
pub fn validate(
    property_type: PropertyType,
    category: LiteralCategory,
    property_name: &str,
) -> PlannerResult<()> {
    match required_category(property_type) {
        Some(required) if required != category => Err(PlannerError::type_mismatch(
            property_name,
            property_type,
            category.as_str(),
        )),
        _ => Ok(()),
    }
}
