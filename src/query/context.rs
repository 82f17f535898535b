//! Parsed query context handed from the parser to the engine

use std::collections::HashMap;

use super::ast::{ColumnToken, PredicateNode, SourcePosition};
use super::errors::ParseResult;
use crate::types::{Cardinality, PropertyDefinition, PropertyType, TypeDefinition};

/// Metadata the parser resolved for a column token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    /// Property id
    pub property_id: String,
    /// Property query name
    pub query_name: String,
    /// Id of the type that defines the property
    pub type_id: String,
    /// Declared type
    pub property_type: PropertyType,
    /// Declared cardinality
    pub cardinality: Cardinality,
    /// Whether ORDER BY is permitted on the property
    pub orderable: bool,
}

impl ColumnReference {
    /// Builds a reference from the owning type and the property definition
    pub fn from_definition(owner: &TypeDefinition, property: &PropertyDefinition) -> Self {
        Self {
            property_id: property.id.clone(),
            query_name: property.query_name.clone(),
            type_id: owner.id.clone(),
            property_type: property.property_type,
            cardinality: property.cardinality,
            orderable: property.orderable,
        }
    }
}

/// A `SELECT` column with its output alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedColumn {
    pub alias: String,
    pub query_name: String,
}

/// A `SELECT` function such as `SCORE() AS relevance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFunction {
    pub alias: String,
    pub function: String,
}

/// One ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBySpec {
    /// Alias, property query name, or function alias
    pub selector: String,
    pub ascending: bool,
}

/// Everything the parser extracted from a query statement
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// WHERE clause, if any
    pub predicate: Option<PredicateNode>,
    /// Column metadata by token position
    pub columns: HashMap<SourcePosition, ColumnReference>,
    /// `SELECT *`
    pub select_all: bool,
    /// Explicit select columns in statement order
    pub selected_properties: Vec<SelectedColumn>,
    /// Select functions in statement order
    pub selected_functions: Vec<SelectedFunction>,
    /// ORDER BY entries in statement order
    pub order_by: Vec<OrderBySpec>,
    /// Type id named in FROM
    pub primary_type_id: String,
    /// Table alias given in FROM
    pub primary_alias: Option<String>,
    /// Secondary types joined to the primary type
    pub secondary_type_ids: Vec<String>,
}

impl ParsedQuery {
    /// Creates a query over the given primary type
    pub fn new(primary_type_id: impl Into<String>) -> Self {
        Self {
            predicate: None,
            columns: HashMap::new(),
            select_all: false,
            selected_properties: Vec::new(),
            selected_functions: Vec::new(),
            order_by: Vec::new(),
            primary_type_id: primary_type_id.into(),
            primary_alias: None,
            secondary_type_ids: Vec::new(),
        }
    }

    /// Selects every property
    pub fn select_all(mut self) -> Self {
        self.select_all = true;
        self
    }

    /// Selects a property under an alias
    pub fn select(mut self, alias: impl Into<String>, query_name: impl Into<String>) -> Self {
        self.selected_properties.push(SelectedColumn {
            alias: alias.into(),
            query_name: query_name.into(),
        });
        self
    }

    /// Selects a function under an alias
    pub fn select_function(mut self, alias: impl Into<String>, function: impl Into<String>) -> Self {
        self.selected_functions.push(SelectedFunction {
            alias: alias.into(),
            function: function.into(),
        });
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.primary_alias = Some(alias.into());
        self
    }

    pub fn with_secondary_type(mut self, type_id: impl Into<String>) -> Self {
        self.secondary_type_ids.push(type_id.into());
        self
    }

    pub fn with_predicate(mut self, predicate: PredicateNode) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn order_by(mut self, selector: impl Into<String>, ascending: bool) -> Self {
        self.order_by.push(OrderBySpec {
            selector: selector.into(),
            ascending,
        });
        self
    }

    /// Registers column metadata at the next free position and returns the token.
    pub fn bind_column(&mut self, reference: ColumnReference) -> ColumnToken {
        let position = SourcePosition(self.columns.len());
        let token = ColumnToken::new(reference.query_name.clone(), position);
        self.columns.insert(position, reference);
        token
    }

    /// Looks up column metadata by token position
    pub fn column_reference(&self, position: SourcePosition) -> Option<&ColumnReference> {
        self.columns.get(&position)
    }

    /// Whether `qualifier` names the FROM table
    pub fn is_primary_qualifier(&self, qualifier: &str, primary_query_name: &str) -> bool {
        self.primary_alias.as_deref() == Some(qualifier) || qualifier == primary_query_name
    }
}

/// Turns query text into a [`ParsedQuery`]
pub trait QueryParser: Send + Sync {
    fn parse(&self, statement: &str) -> ParseResult<ParsedQuery>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{base_type, BaseTypeKind};

    #[test]
    fn test_bind_column_assigns_positions() {
        let doc = base_type(BaseTypeKind::Document);
        let mut query = ParsedQuery::new("cmis:document");

        let name = query.bind_column(ColumnReference::from_definition(
            &doc,
            doc.property("cmis:name").unwrap(),
        ));
        let created = query.bind_column(ColumnReference::from_definition(
            &doc,
            doc.property("cmis:creationDate").unwrap(),
        ));

        assert_ne!(name.position, created.position);
        assert_eq!(
            query.column_reference(created.position).unwrap().property_type,
            PropertyType::DateTime
        );
    }

    #[test]
    fn test_primary_qualifier() {
        let query = ParsedQuery::new("cmis:document").with_alias("d");
        assert!(query.is_primary_qualifier("d", "cmis:document"));
        assert!(query.is_primary_qualifier("cmis:document", "cmis:document"));
        assert!(!query.is_primary_qualifier("f", "cmis:document"));
    }
}
