//! Parsed query model
//!
//! The query language parser lives outside this crate. It hands the engine a
//! [`ParsedQuery`]: the predicate tree, column metadata keyed by token
//! position, the SELECT list, ORDER BY, and the FROM type.

mod ast;
mod context;
mod errors;

pub use ast::{
    ColumnToken, ComparisonOp, FullTextNode, LiteralToken, Operand, PredicateNode, SourcePosition,
};
pub use context::{
    ColumnReference, OrderBySpec, ParsedQuery, QueryParser, SelectedColumn, SelectedFunction,
};
pub use errors::{ParseError, ParseResult};
