//! Search backend interface

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use super::errors::IndexResult;
use super::query::BackendQuery;

/// One sort key in backend syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    /// Sort by an index field
    Field { name: String, ascending: bool },
    /// Sort by relevance score
    Score { ascending: bool },
}

impl SortField {
    pub fn field(name: impl Into<String>, ascending: bool) -> Self {
        SortField::Field {
            name: name.into(),
            ascending,
        }
    }

    pub fn is_ascending(&self) -> bool {
        match self {
            SortField::Field { ascending, .. } | SortField::Score { ascending } => *ascending,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_ascending() { "asc" } else { "desc" };
        match self {
            SortField::Field { name, .. } => write!(f, "{} {}", name, direction),
            SortField::Score { .. } => write!(f, "score {}", direction),
        }
    }
}

/// A single paginated search call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub filter: BackendQuery,
    pub sort: Vec<SortField>,
    pub skip: usize,
    pub limit: usize,
    /// Deadline for the call, if the caller imposes one
    pub timeout: Option<Duration>,
}

/// A matched object id with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Ids for the requested window plus the total match count
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    /// Hits in backend order, at most `limit` of them
    pub hits: Vec<SearchHit>,
    /// Matches across all windows
    pub total_matches: usize,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total_matches: 0,
        }
    }
}

/// Secondary search index holding denormalized object fields
pub trait SearchIndex: Send + Sync {
    /// Runs a filtered, sorted, paginated search
    fn search(&self, request: &SearchRequest) -> IndexResult<SearchResponse>;

    /// Ids of all folders whose parent id is one of `parent_ids`
    fn child_folder_ids(
        &self,
        parent_ids: &BTreeSet<String>,
        timeout: Option<Duration>,
    ) -> IndexResult<BTreeSet<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_display() {
        assert_eq!(SortField::field("name", true).to_string(), "name asc");
        assert_eq!(
            SortField::Score { ascending: false }.to_string(),
            "score desc"
        );
    }
}
