//! CONTAINS sub-translator
//!
//! The full-text grammar is small: conjunction, disjunction, exclusion,
//! words and quoted phrases. Terms are lower-cased the way the index
//! analyzes the full-text field.

use super::errors::{PlannerError, PlannerResult};
use crate::index::fields::FULLTEXT_FIELD;
use crate::index::{BackendQuery, Clause, IndexValue};
use crate::query::FullTextNode;

/// Translates a full-text expression to a query over the full-text field
pub fn translate_fulltext(node: &FullTextNode) -> PlannerResult<BackendQuery> {
    match node {
        FullTextNode::And(children) => Ok(BackendQuery::all_of(translate_all(children)?)),
        FullTextNode::Or(children) => Ok(BackendQuery::any_of(translate_all(children)?)),
        FullTextNode::Minus(children) => {
            let mut clauses = vec![Clause::must(BackendQuery::MatchAll)];
            clauses.extend(translate_all(children)?.into_iter().map(Clause::must_not));
            Ok(BackendQuery::Boolean(clauses))
        }
        FullTextNode::Word(word) => {
            let word = normalize(word);
            if word.is_empty() {
                return Err(PlannerError::invalid("CONTAINS word is empty"));
            }
            Ok(BackendQuery::term(FULLTEXT_FIELD, IndexValue::Text(word)))
        }
        FullTextNode::Phrase(raw) => {
            let text = normalize(strip_delimiters(raw));
            if text.is_empty() {
                return Err(PlannerError::invalid("CONTAINS phrase is empty"));
            }
            Ok(BackendQuery::Phrase {
                field: FULLTEXT_FIELD.to_string(),
                text,
            })
        }
    }
}

fn translate_all(children: &[FullTextNode]) -> PlannerResult<Vec<BackendQuery>> {
    children.iter().map(translate_fulltext).collect()
}

fn strip_delimiters(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.trim().chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out.to_lowercase()
}
