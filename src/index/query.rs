//! Backend query algebra
//!
//! The translator's only output type. Field names are stored in the index's
//! query syntax (reserved characters already escaped); term and phrase values
//! are stored raw and escaped when the query is rendered.
//!
//! Rendering follows the Lucene query syntax:
//!
//! | Expression | Rendered |
//! |---|---|
//! | `Term` | `field:value` |
//! | `Range` | `field:[lo TO hi}` with `*` for an open end |
//! | `Wildcard` | `field:pa?tern*` |
//! | `Phrase` | `field:"some words"` |
//! | `Boolean` | `(+must should -must_not)` |
//! | `MatchAll` / `MatchNone` | `*:*` / `-*:*` |

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

use chrono::{DateTime, SecondsFormat, Utc};

/// Characters with a meaning in the index query syntax
const RESERVED: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&',
    '/',
];

/// Escapes every reserved character and whitespace with a backslash
pub fn escape_term(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Reverses [`escape_term`]
pub fn unescape_term(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// A typed value as stored in, or compared against, the index
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl IndexValue {
    pub fn text(value: impl Into<String>) -> Self {
        IndexValue::Text(value.into())
    }

    /// Orders two values of compatible kinds; `None` when they cannot be compared
    pub fn compare(&self, other: &IndexValue) -> Option<Ordering> {
        match (self, other) {
            (IndexValue::Boolean(a), IndexValue::Boolean(b)) => Some(a.cmp(b)),
            (IndexValue::Integer(a), IndexValue::Integer(b)) => Some(a.cmp(b)),
            (IndexValue::Integer(a), IndexValue::Decimal(b)) => (*a as f64).partial_cmp(b),
            (IndexValue::Decimal(a), IndexValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (IndexValue::Decimal(a), IndexValue::Decimal(b)) => a.partial_cmp(b),
            (IndexValue::Text(a), IndexValue::Text(b)) => Some(a.cmp(b)),
            (IndexValue::Timestamp(a), IndexValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// The value as the index would spell it, unescaped
    pub fn to_raw_string(&self) -> String {
        match self {
            IndexValue::Boolean(b) => b.to_string(),
            IndexValue::Integer(i) => i.to_string(),
            IndexValue::Decimal(d) => d.to_string(),
            IndexValue::Text(s) => s.clone(),
            IndexValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_term(&self.to_raw_string()))
    }
}

/// How a clause participates in a boolean query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

impl Occur {
    fn prefix(&self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

/// One clause of a boolean query
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub occur: Occur,
    pub query: BackendQuery,
}

impl Clause {
    pub fn must(query: BackendQuery) -> Self {
        Self {
            occur: Occur::Must,
            query,
        }
    }

    pub fn should(query: BackendQuery) -> Self {
        Self {
            occur: Occur::Should,
            query,
        }
    }

    pub fn must_not(query: BackendQuery) -> Self {
        Self {
            occur: Occur::MustNot,
            query,
        }
    }
}

/// Query expression accepted by the search index
#[derive(Debug, Clone, PartialEq)]
pub enum BackendQuery {
    /// Boolean composition; a query with only `MustNot` clauses matches nothing
    Boolean(Vec<Clause>),
    /// Exact value of a field
    Term { field: String, value: IndexValue },
    /// Field value within bounds; both ends unbounded means "has any value"
    Range {
        field: String,
        lower: Bound<IndexValue>,
        upper: Bound<IndexValue>,
    },
    /// Pattern in index wildcard syntax (`*`, `?`, `\` escapes)
    Wildcard { field: String, pattern: String },
    /// Consecutive analyzed terms of a full-text field
    Phrase { field: String, text: String },
    MatchAll,
    MatchNone,
}

impl BackendQuery {
    pub fn term(field: impl Into<String>, value: IndexValue) -> Self {
        BackendQuery::Term {
            field: field.into(),
            value,
        }
    }

    /// Every query must match
    pub fn all_of(queries: Vec<BackendQuery>) -> Self {
        if queries.is_empty() {
            return BackendQuery::MatchAll;
        }
        BackendQuery::Boolean(queries.into_iter().map(Clause::must).collect())
    }

    /// At least one query must match
    pub fn any_of(queries: Vec<BackendQuery>) -> Self {
        if queries.is_empty() {
            return BackendQuery::MatchNone;
        }
        BackendQuery::Boolean(queries.into_iter().map(Clause::should).collect())
    }

    /// Everything except what `query` matches.
    ///
    /// The exclusion is anchored on `MatchAll`; a lone `MustNot` clause would
    /// match nothing.
    pub fn negate(query: BackendQuery) -> Self {
        BackendQuery::Boolean(vec![
            Clause::must(BackendQuery::MatchAll),
            Clause::must_not(query),
        ])
    }

    /// Field has at least one indexed value
    pub fn exists(field: impl Into<String>) -> Self {
        BackendQuery::Range {
            field: field.into(),
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Conjunction of two queries
    pub fn and(self, other: BackendQuery) -> Self {
        BackendQuery::all_of(vec![self, other])
    }

    /// Number of nodes in the expression tree
    pub fn node_count(&self) -> usize {
        match self {
            BackendQuery::Boolean(clauses) => {
                1 + clauses.iter().map(|c| c.query.node_count()).sum::<usize>()
            }
            _ => 1,
        }
    }
}

fn write_bound(
    f: &mut fmt::Formatter<'_>,
    bound: &Bound<IndexValue>,
    inclusive: char,
    exclusive: char,
    lower: bool,
) -> fmt::Result {
    match (bound, lower) {
        (Bound::Included(v), true) => write!(f, "{}{}", inclusive, v),
        (Bound::Excluded(v), true) => write!(f, "{}{}", exclusive, v),
        (Bound::Unbounded, true) => write!(f, "{}*", inclusive),
        (Bound::Included(v), false) => write!(f, "{}{}", v, inclusive),
        (Bound::Excluded(v), false) => write!(f, "{}{}", v, exclusive),
        (Bound::Unbounded, false) => write!(f, "*{}", inclusive),
    }
}

impl fmt::Display for BackendQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendQuery::Boolean(clauses) => {
                f.write_str("(")?;
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}{}", clause.occur.prefix(), clause.query)?;
                }
                f.write_str(")")
            }
            BackendQuery::Term { field, value } => write!(f, "{}:{}", field, value),
            BackendQuery::Range {
                field,
                lower,
                upper,
            } => {
                write!(f, "{}:", field)?;
                write_bound(f, lower, '[', '{', true)?;
                f.write_str(" TO ")?;
                write_bound(f, upper, ']', '}', false)
            }
            BackendQuery::Wildcard { field, pattern } => write!(f, "{}:{}", field, pattern),
            BackendQuery::Phrase { field, text } => {
                let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "{}:\"{}\"", field, escaped)
            }
            BackendQuery::MatchAll => f.write_str("*:*"),
            BackendQuery::MatchNone => f.write_str("-*:*"),
        }
    }
}
