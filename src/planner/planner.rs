//! Query planner
//!
//! Turns a [`ParsedQuery`] into an immutable [`QueryPlan`]:
//!
//! 1. Resolve the FROM type and its joined secondary types
//! 2. Build the type scope from the descendant closure
//! 3. Translate the WHERE clause
//! 4. Translate ORDER BY to backend sort keys
//! 5. Resolve the SELECT list to a projection
//! 6. Apply pagination defaults
//!
//! The only I/O is the folder traversal behind IN_TREE.

use std::time::Duration;

use tracing::debug;

use super::errors::{PlannerError, PlannerResult};
use super::explain::ExplainPlan;
use super::field_names::SchemaNameResolver;
use super::folder_tree::FolderTreeResolver;
use super::translator::PredicateTranslator;
use crate::config::QueryConfig;
use crate::index::fields::TYPE_FIELD;
use crate::index::{BackendQuery, IndexValue, SearchIndex, SortField};
use crate::query::{ColumnReference, ParsedQuery};
use crate::types::{Cardinality, PropertyDefinition, TypeDefinition, TypeManager};

/// A column of the result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectedColumn {
    /// A property under its output alias
    Property {
        alias: String,
        query_name: String,
        property_id: String,
    },
    /// The relevance score under its output alias
    Score { alias: String },
}

impl ProjectedColumn {
    pub fn alias(&self) -> &str {
        match self {
            ProjectedColumn::Property { alias, .. } | ProjectedColumn::Score { alias } => alias,
        }
    }
}

/// What the result assembler puts in each row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    /// `SELECT *`: every queryable property of the primary type and the
    /// object's secondary types
    pub select_all: bool,
    /// Explicit columns in statement order, functions last
    pub columns: Vec<ProjectedColumn>,
}

/// Immutable, fully translated query
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Translated WHERE clause (`MatchAll` when absent)
    pub filter: BackendQuery,
    /// Discriminator filter over the included types
    pub type_scope: BackendQuery,
    /// Backend sort keys in ORDER BY order
    pub sort: Vec<SortField>,
    pub skip: usize,
    pub limit: usize,
    /// Primary type followed by included descendants
    pub included_type_ids: Vec<String>,
    pub primary_type_id: String,
    pub projection: Projection,
    /// IN_TREE traversals cut short by the depth bound
    pub truncated_traversals: usize,
    /// Deadline for the search call
    pub timeout: Option<Duration>,
}

impl QueryPlan {
    /// The filter sent to the index: WHERE clause AND type scope
    pub fn combined_filter(&self) -> BackendQuery {
        match &self.filter {
            BackendQuery::MatchAll => self.type_scope.clone(),
            filter => filter.clone().and(self.type_scope.clone()),
        }
    }

    /// Human-readable plan summary
    pub fn explain(&self) -> ExplainPlan {
        ExplainPlan::from_plan(self)
    }
}

/// Plans queries against one repository's type metadata and index
pub struct QueryPlanner<'a> {
    types: &'a dyn TypeManager,
    index: &'a dyn SearchIndex,
    config: &'a QueryConfig,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(
        types: &'a dyn TypeManager,
        index: &'a dyn SearchIndex,
        config: &'a QueryConfig,
    ) -> Self {
        Self {
            types,
            index,
            config,
        }
    }

    /// Plans `query` for the window `skip`/`max_items`, defaulting either from config
    pub fn plan(
        &self,
        query: &ParsedQuery,
        skip: Option<usize>,
        max_items: Option<usize>,
    ) -> PlannerResult<QueryPlan> {
        let primary = self
            .types
            .type_by_id(&query.primary_type_id)
            .ok_or_else(|| {
                PlannerError::invalid(format!("unknown type '{}'", query.primary_type_id))
            })?;
        if !primary.queryable {
            return Err(PlannerError::invalid(format!(
                "type '{}' is not queryable",
                primary.id
            )));
        }
        let secondaries = query
            .secondary_type_ids
            .iter()
            .map(|id| {
                self.types
                    .type_by_id(id)
                    .ok_or_else(|| PlannerError::invalid(format!("unknown type '{}'", id)))
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        let included_type_ids = self.included_types(primary);
        let type_scope = BackendQuery::any_of(
            included_type_ids
                .iter()
                .map(|id| BackendQuery::term(TYPE_FIELD, IndexValue::text(id.clone())))
                .collect(),
        );

        let folders = FolderTreeResolver::new(
            self.index,
            self.config.max_tree_depth,
            self.config.tree_failure_policy,
        )
        .with_timeout(self.config.backend_timeout());
        let translator =
            PredicateTranslator::new(query, self.types, primary, &included_type_ids, folders);
        let filter = match &query.predicate {
            Some(predicate) => translator.translate(predicate)?,
            None => BackendQuery::MatchAll,
        };
        let truncated_traversals = translator.truncated_traversals();

        let sort = self.translate_sort(query, primary, &secondaries)?;
        let projection = self.resolve_projection(query, primary, &secondaries)?;

        let plan = QueryPlan {
            filter,
            type_scope,
            sort,
            skip: skip.unwrap_or(self.config.default_skip_count),
            limit: max_items.unwrap_or(self.config.default_max_items),
            included_type_ids,
            primary_type_id: primary.id.clone(),
            projection,
            truncated_traversals,
            timeout: self.config.backend_timeout(),
        };
        debug!(
            primary_type = %plan.primary_type_id,
            types = plan.included_type_ids.len(),
            nodes = plan.filter.node_count(),
            filter = %plan.combined_filter(),
            "query planned"
        );
        Ok(plan)
    }

    /// The primary type plus every descendant that opts into supertype queries
    fn included_types(&self, primary: &TypeDefinition) -> Vec<String> {
        std::iter::once(primary.id.clone())
            .chain(
                self.types
                    .type_descendants(&primary.id)
                    .into_iter()
                    .filter(|t| t.include_in_supertype_query)
                    .map(|t| t.id.clone()),
            )
            .collect()
    }

    fn translate_sort(
        &self,
        query: &ParsedQuery,
        primary: &TypeDefinition,
        secondaries: &[&TypeDefinition],
    ) -> PlannerResult<Vec<SortField>> {
        let names = SchemaNameResolver::new(self.types);
        query
            .order_by
            .iter()
            .map(|spec| {
                let relevance = query.selected_functions.iter().any(|f| {
                    f.alias == spec.selector && self.config.is_relevance_function(&f.function)
                });
                if relevance || self.config.is_relevance_function(&spec.selector) {
                    return Ok(SortField::Score {
                        ascending: spec.ascending,
                    });
                }

                let query_name = query
                    .selected_properties
                    .iter()
                    .find(|c| c.alias == spec.selector)
                    .map(|c| c.query_name.as_str())
                    .unwrap_or(&spec.selector);
                let (owner, property) = find_property(primary, secondaries, query_name)
                    .ok_or_else(|| {
                        PlannerError::invalid(format!(
                            "ORDER BY references unknown column '{}'",
                            spec.selector
                        ))
                    })?;
                if !property.orderable || property.cardinality == Cardinality::Multi {
                    return Err(PlannerError::invalid(format!(
                        "property '{}' is not orderable",
                        property.query_name
                    )));
                }
                let column = ColumnReference::from_definition(owner, property);
                Ok(SortField::field(names.resolve_column(&column), spec.ascending))
            })
            .collect()
    }

    fn resolve_projection(
        &self,
        query: &ParsedQuery,
        primary: &TypeDefinition,
        secondaries: &[&TypeDefinition],
    ) -> PlannerResult<Projection> {
        let mut projection = Projection {
            select_all: query.select_all,
            columns: Vec::new(),
        };
        for selected in &query.selected_properties {
            if selected.query_name == "*" {
                projection.select_all = true;
                continue;
            }
            let (_, property) = find_property(primary, secondaries, &selected.query_name)
                .ok_or_else(|| {
                    PlannerError::invalid(format!("unknown column '{}'", selected.query_name))
                })?;
            projection.columns.push(ProjectedColumn::Property {
                alias: selected.alias.clone(),
                query_name: property.query_name.clone(),
                property_id: property.id.clone(),
            });
        }
        for function in &query.selected_functions {
            if !self.config.is_relevance_function(&function.function) {
                return Err(PlannerError::invalid(format!(
                    "unsupported function '{}'",
                    function.function
                )));
            }
            projection.columns.push(ProjectedColumn::Score {
                alias: function.alias.clone(),
            });
        }
        Ok(projection)
    }
}

/// Finds a queryable property on the primary type or a joined secondary type
fn find_property<'t>(
    primary: &'t TypeDefinition,
    secondaries: &[&'t TypeDefinition],
    query_name: &str,
) -> Option<(&'t TypeDefinition, &'t PropertyDefinition)> {
    std::iter::once(primary)
        .chain(secondaries.iter().copied())
        .find_map(|t| {
            t.property_by_query_name(query_name)
                .filter(|p| p.queryable)
                .map(|p| (t, p))
        })
}
