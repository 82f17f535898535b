//! Predicate translation
//!
//! One exhaustive match over [`PredicateNode`]. Every operator returns a
//! fresh [`BackendQuery`]; the caller composes the results.
//!
//! Negated forms (NOT, `<>`, NOT LIKE, NOT IN, NOT ANY IN, IS NULL) are
//! anchored on `MatchAll` through [`BackendQuery::negate`].

use std::cell::Cell;
use std::ops::Bound;

use super::errors::{PlannerError, PlannerResult};
use super::field_names::SchemaNameResolver;
use super::folder_tree::FolderTreeResolver;
use super::fulltext::translate_fulltext;
use super::literal::{eval_literal, string_body, LiteralValue};
use super::pattern::{has_wildcard, translate_like_pattern};
use super::validator::validate;
use crate::index::fields::{PARENT_FIELD, SECONDARY_TYPES_FIELD, TYPE_FIELD};
use crate::index::{unescape_term, BackendQuery, IndexValue};
use crate::query::{
    ColumnReference, ComparisonOp, LiteralToken, Operand, ParsedQuery, PredicateNode,
};
use crate::types::{Cardinality, TypeDefinition, TypeManager};

/// Translates a parsed WHERE clause into the backend query algebra
pub struct PredicateTranslator<'a> {
    query: &'a ParsedQuery,
    types: &'a dyn TypeManager,
    primary: &'a TypeDefinition,
    included_type_ids: &'a [String],
    names: SchemaNameResolver<'a>,
    folders: FolderTreeResolver<'a>,
    truncated_traversals: Cell<usize>,
}

impl<'a> PredicateTranslator<'a> {
    pub fn new(
        query: &'a ParsedQuery,
        types: &'a dyn TypeManager,
        primary: &'a TypeDefinition,
        included_type_ids: &'a [String],
        folders: FolderTreeResolver<'a>,
    ) -> Self {
        Self {
            query,
            types,
            primary,
            included_type_ids,
            names: SchemaNameResolver::new(types),
            folders,
            truncated_traversals: Cell::new(0),
        }
    }

    /// IN_TREE traversals cut short by the depth bound so far
    pub fn truncated_traversals(&self) -> usize {
        self.truncated_traversals.get()
    }

    /// Translates `node` and everything below it
    pub fn translate(&self, node: &PredicateNode) -> PlannerResult<BackendQuery> {
        match node {
            // Both sides are always translated so either can fail the query
            PredicateNode::And(left, right) => {
                let left = self.translate(left)?;
                let right = self.translate(right)?;
                Ok(BackendQuery::all_of(vec![left, right]))
            }
            PredicateNode::Or(left, right) => {
                let left = self.translate(left)?;
                let right = self.translate(right)?;
                Ok(BackendQuery::any_of(vec![left, right]))
            }
            PredicateNode::Not(child) => Ok(BackendQuery::negate(self.translate(child)?)),

            PredicateNode::Comparison { op, column, value } => {
                self.translate_comparison(*op, column, value)
            }
            PredicateNode::Like {
                column,
                pattern,
                negated,
            } => negate_if(*negated, self.translate_like(column, pattern)?),
            PredicateNode::In {
                column,
                values,
                negated,
            } => {
                let column = self.column(column)?;
                negate_if(*negated, self.translate_membership(column, values)?)
            }
            PredicateNode::AnyIn {
                column,
                values,
                negated,
            } => {
                let column = self.multi_valued_column(column, "ANY ... IN")?;
                negate_if(*negated, self.translate_membership(column, values)?)
            }
            PredicateNode::EqAny { value, column } => {
                let column = self.multi_valued_column(column, "= ANY")?;
                self.translate_equality(column, value)
            }
            PredicateNode::IsNull { column, negated } => {
                let column = self.column(column)?;
                let exists = BackendQuery::exists(self.names.resolve_column(column));
                if *negated {
                    Ok(exists)
                } else {
                    Ok(BackendQuery::negate(exists))
                }
            }
            PredicateNode::InFolder { qualifier, folder } => {
                let folder_id = folder_id(folder, "IN_FOLDER")?;
                let query = BackendQuery::term(PARENT_FIELD, IndexValue::Text(folder_id));
                self.qualify(qualifier.as_deref(), query)
            }
            PredicateNode::InTree { qualifier, folder } => {
                let folder_id = folder_id(folder, "IN_TREE")?;
                let tree = self.folders.resolve_descendants(&folder_id)?;
                if tree.truncated {
                    self.truncated_traversals
                        .set(self.truncated_traversals.get() + 1);
                }
                let query = BackendQuery::any_of(
                    tree.ids
                        .into_iter()
                        .map(|id| BackendQuery::term(PARENT_FIELD, IndexValue::Text(id)))
                        .collect(),
                );
                self.qualify(qualifier.as_deref(), query)
            }
            PredicateNode::Contains {
                qualifier,
                expression,
            } => self.qualify(qualifier.as_deref(), translate_fulltext(expression)?),
        }
    }

    fn translate_comparison(
        &self,
        op: ComparisonOp,
        column: &Operand,
        value: &Operand,
    ) -> PlannerResult<BackendQuery> {
        let column = self.column(column)?;
        match op {
            ComparisonOp::Eq => self.translate_equality(column, value),
            ComparisonOp::Neq => Ok(BackendQuery::negate(
                self.translate_equality(column, value)?,
            )),
            ComparisonOp::Gt | ComparisonOp::Gteq | ComparisonOp::Lt | ComparisonOp::Lteq => {
                let bound = self.scalar(column, value, op.symbol())?;
                let (lower, upper) = match op {
                    ComparisonOp::Gt => (Bound::Excluded(bound), Bound::Unbounded),
                    ComparisonOp::Gteq => (Bound::Included(bound), Bound::Unbounded),
                    ComparisonOp::Lt => (Bound::Unbounded, Bound::Excluded(bound)),
                    _ => (Bound::Unbounded, Bound::Included(bound)),
                };
                Ok(BackendQuery::Range {
                    field: self.names.resolve_column(column),
                    lower,
                    upper,
                })
            }
        }
    }

    fn translate_equality(
        &self,
        column: &ColumnReference,
        value: &Operand,
    ) -> PlannerResult<BackendQuery> {
        let value = self.scalar(column, value, "=")?;
        Ok(BackendQuery::term(self.names.resolve_column(column), value))
    }

    fn translate_like(&self, column: &Operand, pattern: &Operand) -> PlannerResult<BackendQuery> {
        let column = self.column(column)?;
        let raw = match pattern {
            Operand::Literal(LiteralToken::String(raw)) => raw,
            _ => {
                return Err(PlannerError::invalid(format!(
                    "LIKE on '{}' requires a string literal pattern",
                    column.query_name
                )))
            }
        };
        if !column.property_type.is_textual() {
            return Err(PlannerError::invalid(format!(
                "LIKE requires a STRING, HTML, URI or ID property; '{}' is {}",
                column.query_name, column.property_type
            )));
        }
        if column.cardinality != Cardinality::Single {
            return Err(PlannerError::invalid(format!(
                "LIKE requires a single-valued property; '{}' is multi-valued",
                column.query_name
            )));
        }

        let field = self.names.resolve_column(column);
        let pattern = translate_like_pattern(&string_body(raw)?);
        if has_wildcard(&pattern) {
            Ok(BackendQuery::Wildcard { field, pattern })
        } else {
            Ok(BackendQuery::term(
                field,
                IndexValue::Text(unescape_term(&pattern)),
            ))
        }
    }

    fn translate_membership(
        &self,
        column: &ColumnReference,
        values: &Operand,
    ) -> PlannerResult<BackendQuery> {
        let field = self.names.resolve_column(column);
        let list = eval_literal(values)?;
        let terms = list
            .elements()
            .iter()
            .map(|element| {
                validate(column.property_type, element.category(), &column.query_name)?;
                let value = index_value(element, &column.query_name)?;
                Ok(BackendQuery::term(field.clone(), value))
            })
            .collect::<PlannerResult<Vec<_>>>()?;
        Ok(BackendQuery::any_of(terms))
    }

    /// Evaluates and type-checks a scalar literal compared against `column`
    fn scalar(
        &self,
        column: &ColumnReference,
        value: &Operand,
        operator: &str,
    ) -> PlannerResult<IndexValue> {
        let value = eval_literal(value)?;
        if let LiteralValue::List(_) = value {
            return Err(PlannerError::invalid(format!(
                "operator {} on '{}' takes a single value, not a list",
                operator, column.query_name
            )));
        }
        validate(column.property_type, value.category(), &column.query_name)?;
        index_value(&value, &column.query_name)
    }

    fn column(&self, operand: &Operand) -> PlannerResult<&'a ColumnReference> {
        match operand {
            Operand::Column(token) => {
                if let Some(qualifier) = &token.qualifier {
                    self.qualified_type(qualifier)?;
                }
                self.query.column_reference(token.position).ok_or_else(|| {
                    PlannerError::invalid(format!("unknown column '{}'", token.name))
                })
            }
            Operand::Function(name) => Err(PlannerError::invalid(format!(
                "function {} cannot be used in a predicate",
                name
            ))),
            Operand::Literal(_) => Err(PlannerError::internal(
                "expected a column operand, found a literal",
            )),
        }
    }

    fn multi_valued_column(
        &self,
        operand: &Operand,
        operator: &str,
    ) -> PlannerResult<&'a ColumnReference> {
        let column = self.column(operand)?;
        if column.cardinality != Cardinality::Multi {
            return Err(PlannerError::invalid(format!(
                "{} requires a multi-valued property; '{}' is single-valued",
                operator, column.query_name
            )));
        }
        Ok(column)
    }

    /// Resolves a table qualifier to the primary type or a joined secondary type
    fn qualified_type(&self, qualifier: &str) -> PlannerResult<(&'a TypeDefinition, bool)> {
        if self
            .query
            .is_primary_qualifier(qualifier, &self.primary.query_name)
        {
            return Ok((self.primary, true));
        }
        self.types
            .type_by_query_name(qualifier)
            .filter(|t| self.query.secondary_type_ids.iter().any(|id| *id == t.id))
            .map(|t| (t, false))
            .ok_or_else(|| PlannerError::invalid(format!("unknown qualifier '{}'", qualifier)))
    }

    /// ANDs `query` with the discriminator of the qualified type.
    ///
    /// The primary qualifier covers every type the FROM clause includes, so
    /// subtypes that opt into supertype queries still match.
    fn qualify(&self, qualifier: Option<&str>, query: BackendQuery) -> PlannerResult<BackendQuery> {
        let Some(qualifier) = qualifier else {
            return Ok(query);
        };
        let (definition, primary) = self.qualified_type(qualifier)?;
        let discriminator = if primary {
            BackendQuery::any_of(
                self.included_type_ids
                    .iter()
                    .map(|id| BackendQuery::term(TYPE_FIELD, IndexValue::text(id.clone())))
                    .collect(),
            )
        } else {
            BackendQuery::term(
                SECONDARY_TYPES_FIELD,
                IndexValue::text(definition.id.clone()),
            )
        };
        Ok(query.and(discriminator))
    }
}

fn negate_if(negated: bool, query: BackendQuery) -> PlannerResult<BackendQuery> {
    if negated {
        Ok(BackendQuery::negate(query))
    } else {
        Ok(query)
    }
}

fn index_value(value: &LiteralValue, property: &str) -> PlannerResult<IndexValue> {
    value.to_index_value().ok_or_else(|| {
        PlannerError::invalid(format!("nested list compared against '{}'", property))
    })
}

/// Folder id from a string literal or a one-element list
fn folder_id(operand: &Operand, operator: &str) -> PlannerResult<String> {
    let value = eval_literal(operand)?;
    let id = match value {
        LiteralValue::String(id) => id,
        LiteralValue::List(mut items) if items.len() == 1 => match items.pop() {
            Some(LiteralValue::String(id)) => id,
            _ => {
                return Err(PlannerError::invalid(format!(
                    "{} requires a folder id string",
                    operator
                )))
            }
        },
        _ => {
            return Err(PlannerError::invalid(format!(
                "{} requires a folder id string",
                operator
            )))
        }
    };
    if id.trim().is_empty() {
        return Err(PlannerError::invalid(format!(
            "{} requires a non-empty folder id",
            operator
        )));
    }
    Ok(id)
}
