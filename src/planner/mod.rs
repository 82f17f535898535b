//! Query translation and planning
//!
//! Turns a parsed query into an immutable [`QueryPlan`] over the backend
//! query algebra.
//!
//! # Design Principles
//!
//! - Pure: translation reads type metadata only; IN_TREE is the one index call
//! - Typed: every literal is checked against the property it is compared with
//! - Exhaustive: one match arm per predicate operator
//! - Explicit: negation is always anchored on `MatchAll`
//!
//! # Translation Order
//!
//! 1. Literal evaluation and type validation
//! 2. Field name resolution
//! 3. Operator translation (LIKE patterns, full text, folder trees)
//! 4. Type scope, sort and projection

mod errors;
mod explain;
mod field_names;
mod folder_tree;
mod fulltext;
mod literal;
mod pattern;
mod planner;
mod translator;
mod validator;

pub use errors::{PlannerError, PlannerResult};
pub use explain::ExplainPlan;
pub use field_names::{dynamic_field, standard_field, SchemaNameResolver};
pub use folder_tree::{FolderTree, FolderTreeResolver};
pub use fulltext::translate_fulltext;
pub use literal::{eval_literal, eval_token, LiteralCategory, LiteralValue};
pub use pattern::translate_like_pattern;
pub use planner::{ProjectedColumn, Projection, QueryPlan, QueryPlanner};
pub use translator::PredicateTranslator;
pub use validator::{required_category, validate};
