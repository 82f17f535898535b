//! Literal evaluation
//!
//! Turns raw literal tokens into typed values:
//! - booleans are case-insensitive `TRUE` / `FALSE`
//! - numerics are decimal when they contain `.`, `e` or `E`, integer otherwise
//! - strings lose their quotes and escapes
//! - timestamps lose the `TIMESTAMP` marker and quotes and are parsed to UTC
//! - lists evaluate element by element, keeping order

use std::fmt;
use std::num::IntErrorKind;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use super::errors::{PlannerError, PlannerResult};
use crate::index::IndexValue;
use crate::query::{LiteralToken, Operand};

/// Syntactic category of a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralCategory {
    Boolean,
    Numeric,
    String,
    Timestamp,
    List,
}

impl LiteralCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralCategory::Boolean => "boolean",
            LiteralCategory::Numeric => "numeric",
            LiteralCategory::String => "string",
            LiteralCategory::Timestamp => "timestamp",
            LiteralCategory::List => "list",
        }
    }
}

impl fmt::Display for LiteralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An evaluated literal
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    List(Vec<LiteralValue>),
}

impl LiteralValue {
    pub fn category(&self) -> LiteralCategory {
        match self {
            LiteralValue::Boolean(_) => LiteralCategory::Boolean,
            LiteralValue::Integer(_) | LiteralValue::Decimal(_) => LiteralCategory::Numeric,
            LiteralValue::String(_) => LiteralCategory::String,
            LiteralValue::Timestamp(_) => LiteralCategory::Timestamp,
            LiteralValue::List(_) => LiteralCategory::List,
        }
    }

    /// Converts a scalar to the index representation; lists have none
    pub fn to_index_value(&self) -> Option<IndexValue> {
        match self {
            LiteralValue::Boolean(b) => Some(IndexValue::Boolean(*b)),
            LiteralValue::Integer(i) => Some(IndexValue::Integer(*i)),
            LiteralValue::Decimal(d) => Some(IndexValue::Decimal(*d)),
            LiteralValue::String(s) => Some(IndexValue::Text(s.clone())),
            LiteralValue::Timestamp(ts) => Some(IndexValue::Timestamp(*ts)),
            LiteralValue::List(_) => None,
        }
    }

    /// Elements of a list, or the scalar itself as a one-element slice
    pub fn elements(&self) -> &[LiteralValue] {
        match self {
            LiteralValue::List(items) => items,
            scalar => std::slice::from_ref(scalar),
        }
    }
}

/// Evaluates an operand that must be a literal.
///
/// Columns or functions reaching this point mean the translator was handed a
/// tree the parser should never produce.
pub fn eval_literal(operand: &Operand) -> PlannerResult<LiteralValue> {
    match operand {
        Operand::Literal(token) => eval_token(token),
        other => Err(PlannerError::internal(format!(
            "expected a literal operand, found a {}",
            other.kind()
        ))),
    }
}

/// Evaluates a literal token
pub fn eval_token(token: &LiteralToken) -> PlannerResult<LiteralValue> {
    match token {
        LiteralToken::Boolean(raw) => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(LiteralValue::Boolean(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(LiteralValue::Boolean(false))
            } else {
                Err(PlannerError::internal(format!(
                    "boolean token '{}' is neither TRUE nor FALSE",
                    raw
                )))
            }
        }
        LiteralToken::Numeric(raw) => eval_numeric(raw),
        LiteralToken::String(raw) => Ok(LiteralValue::String(unescape_string(&string_body(raw)?))),
        LiteralToken::Timestamp(raw) => eval_timestamp(raw),
        LiteralToken::List(items) => items
            .iter()
            .map(eval_token)
            .collect::<PlannerResult<Vec<_>>>()
            .map(LiteralValue::List),
    }
}

fn eval_numeric(raw: &str) -> PlannerResult<LiteralValue> {
    let text = raw.trim();
    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(LiteralValue::Decimal)
            .ok_or_else(|| PlannerError::invalid(format!("malformed decimal literal '{}'", raw)))
    } else {
        text.parse::<i64>()
            .map(LiteralValue::Integer)
            .map_err(|err| match err.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    PlannerError::invalid(format!("integer literal '{}' is out of range", raw))
                }
                _ => PlannerError::invalid(format!("malformed integer literal '{}'", raw)),
            })
    }
}

/// Strips the surrounding quotes of a string token and collapses doubled quotes.
///
/// Backslash escapes are left in place so LIKE patterns can interpret `\%` and `\_`.
pub fn string_body(raw: &str) -> PlannerResult<String> {
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(|| {
            PlannerError::internal(format!("string token {} is not single-quoted", raw))
        })?;
    Ok(inner.replace("''", "'"))
}

/// Resolves backslash escapes: `\'`, `\\` and any other `\x` become `x`
pub fn unescape_string(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*TIMESTAMP\s*'([^']*)'\s*$").expect("timestamp pattern is valid")
    })
}

fn eval_timestamp(raw: &str) -> PlannerResult<LiteralValue> {
    let inner = timestamp_pattern()
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| PlannerError::internal(format!("malformed timestamp token {}", raw)))?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(inner) {
        return Ok(LiteralValue::Timestamp(parsed.with_timezone(&Utc)));
    }
    // Zone-less timestamps are taken as UTC
    NaiveDateTime::parse_from_str(inner, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| LiteralValue::Timestamp(naive.and_utc()))
        .map_err(|_| PlannerError::invalid(format!("malformed timestamp literal '{}'", inner)))
}
