//! Result types for query execution

use serde::Serialize;
use serde_json::Value;

use super::services::ContentObject;

/// One output column of a result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedProperty {
    /// Property query name, or the function name for pseudo-columns
    pub query_name: String,
    /// Output name
    pub alias: String,
    /// `Null` when the property is unset
    pub value: Value,
}

/// A single object in the result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResultItem {
    /// The hydrated object
    pub object: ContentObject,
    /// Projected columns in output order
    pub properties: Vec<ProjectedProperty>,
}

impl QueryResultItem {
    /// Returns the object id
    pub fn id(&self) -> &str {
        &self.object.id
    }

    /// Value of the column with output name `alias`
    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|p| p.alias == alias)
            .map(|p| &p.value)
    }

    /// Whether the row carries a column named `alias`, set or not
    pub fn has_column(&self, alias: &str) -> bool {
        self.properties.iter().any(|p| p.alias == alias)
    }
}

/// One page of query results
///
/// `total_matches` is the index's raw count. Permission filtering can make
/// `items` shorter than the window without changing the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    /// Readable objects in backend order
    pub items: Vec<QueryResultItem>,
    /// Window size the backend was asked for
    pub requested_max_items: usize,
    /// Window offset the backend was asked for
    pub skip: usize,
    /// Raw backend match count
    pub total_matches: usize,
    /// More raw matches exist past this window
    pub has_more_items: bool,
}

impl ResultPage {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of the returned objects in order
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(QueryResultItem::id).collect()
    }
}
