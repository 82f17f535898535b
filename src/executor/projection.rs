//! Result row projection
//!
//! Unset properties are materialized as `Null`; a selected column is never
//! left out of a row.

use serde_json::Value;

use super::result::{ProjectedProperty, QueryResultItem};
use super::services::ContentObject;
use crate::planner::{ProjectedColumn, Projection};
use crate::types::{PropertyDefinition, TypeManager};

/// Builds result rows for one plan
pub struct Projector<'a> {
    types: &'a dyn TypeManager,
    primary_type_id: &'a str,
    projection: &'a Projection,
    relevance_function: &'a str,
}

impl<'a> Projector<'a> {
    pub fn new(
        types: &'a dyn TypeManager,
        primary_type_id: &'a str,
        projection: &'a Projection,
        relevance_function: &'a str,
    ) -> Self {
        Self {
            types,
            primary_type_id,
            projection,
            relevance_function,
        }
    }

    /// Projects `object`; `score` feeds the relevance pseudo-column
    pub fn project(&self, object: ContentObject, score: f32) -> QueryResultItem {
        let mut properties = Vec::new();

        if self.projection.select_all {
            for definition in self.select_all_properties(&object) {
                properties.push(ProjectedProperty {
                    query_name: definition.query_name.clone(),
                    alias: definition.query_name.clone(),
                    value: property_value(&object, &definition.id),
                });
            }
        }

        for column in &self.projection.columns {
            properties.push(match column {
                ProjectedColumn::Property {
                    alias,
                    query_name,
                    property_id,
                } => ProjectedProperty {
                    query_name: query_name.clone(),
                    alias: alias.clone(),
                    value: property_value(&object, property_id),
                },
                ProjectedColumn::Score { alias } => ProjectedProperty {
                    query_name: self.relevance_function.to_string(),
                    alias: alias.clone(),
                    value: Value::from(f64::from(score)),
                },
            });
        }

        QueryResultItem { object, properties }
    }

    /// Queryable properties of the primary type, then of each secondary type
    /// the object carries, without repeats
    fn select_all_properties(&self, object: &ContentObject) -> Vec<&'a PropertyDefinition> {
        let mut selected: Vec<&'a PropertyDefinition> = Vec::new();
        let type_ids = std::iter::once(self.primary_type_id)
            .chain(object.secondary_type_ids.iter().map(String::as_str));
        for type_id in type_ids {
            let Some(definition) = self.types.type_by_id(type_id) else {
                continue;
            };
            for property in definition.queryable_properties() {
                if !selected.iter().any(|p| p.query_name == property.query_name) {
                    selected.push(property);
                }
            }
        }
        selected
    }
}

fn property_value(object: &ContentObject, property_id: &str) -> Value {
    object.property(property_id).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BaseTypeKind, PropertyType, TypeDefinition, TypeRegistry, TypeRegistryBuilder,
    };
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let mut builder = TypeRegistryBuilder::with_base_types();
        builder
            .register(
                TypeDefinition::subtype("acme:tagged", BaseTypeKind::Secondary, "cmis:secondary")
                    .with_property(PropertyDefinition::multi("acme:tags", PropertyType::String)),
            )
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_select_all_includes_unset_as_null() {
        let types = registry();
        let projection = Projection {
            select_all: true,
            columns: Vec::new(),
        };
        let projector = Projector::new(&types, "cmis:document", &projection, "SCORE");
        let item = projector.project(
            ContentObject::new("d1", "cmis:document").with_property("cmis:name", json!("a")),
            1.0,
        );

        assert_eq!(item.get("cmis:name"), Some(&json!("a")));
        assert!(item.has_column("cmis:description"));
        assert_eq!(item.get("cmis:description"), Some(&Value::Null));
        // Not queryable
        assert!(!item.has_column("cmis:changeToken"));
    }

    #[test]
    fn test_select_all_adds_secondary_properties() {
        let types = registry();
        let projection = Projection {
            select_all: true,
            columns: Vec::new(),
        };
        let projector = Projector::new(&types, "cmis:document", &projection, "SCORE");

        let plain = projector.project(ContentObject::new("d1", "cmis:document"), 1.0);
        assert!(!plain.has_column("acme:tags"));

        let tagged = projector.project(
            ContentObject::new("d2", "cmis:document")
                .with_secondary_type("acme:tagged")
                .with_property("acme:tags", json!(["x", "y"])),
            1.0,
        );
        assert_eq!(tagged.get("acme:tags"), Some(&json!(["x", "y"])));
    }

    #[test]
    fn test_explicit_columns_and_score() {
        let types = registry();
        let projection = Projection {
            select_all: false,
            columns: vec![
                ProjectedColumn::Property {
                    alias: "title".into(),
                    query_name: "cmis:name".into(),
                    property_id: "cmis:name".into(),
                },
                ProjectedColumn::Property {
                    alias: "d".into(),
                    query_name: "cmis:description".into(),
                    property_id: "cmis:description".into(),
                },
                ProjectedColumn::Score {
                    alias: "rel".into(),
                },
            ],
        };
        let projector = Projector::new(&types, "cmis:document", &projection, "SCORE");
        let item = projector.project(
            ContentObject::new("d1", "cmis:document").with_property("cmis:name", json!("a")),
            2.5,
        );

        let aliases: Vec<_> = item.properties.iter().map(|p| p.alias.as_str()).collect();
        assert_eq!(aliases, vec!["title", "d", "rel"]);
        assert_eq!(item.get("title"), Some(&json!("a")));
        assert_eq!(item.get("d"), Some(&Value::Null));
        assert_eq!(item.get("rel"), Some(&json!(2.5)));
    }
}
