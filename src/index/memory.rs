//! In-memory search index
//!
//! Evaluates the backend query algebra directly against documents held in a
//! `BTreeMap`, giving deterministic id order before sorting. Used to embed the
//! engine without an external index and to exercise it in tests.
//!
//! Boolean semantics match the Lucene family:
//! - any matching `MustNot` clause excludes the document
//! - every `Must` clause has to match
//! - without `Must` clauses at least one `Should` clause has to match
//! - a query made only of `MustNot` clauses matches nothing

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use super::errors::{IndexError, IndexResult};
use super::fields::{BASE_TYPE_FIELD, FULLTEXT_FIELD, ID_FIELD, PARENT_FIELD};
use super::query::{unescape_term, BackendQuery, IndexValue, Occur};
use super::search::{SearchHit, SearchIndex, SearchRequest, SearchResponse, SortField};

/// A document as stored in the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub id: String,
    fields: BTreeMap<String, Vec<IndexValue>>,
}

impl IndexedDocument {
    /// Creates a document with its id field populated
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut fields = BTreeMap::new();
        fields.insert(ID_FIELD.to_string(), vec![IndexValue::Text(id.clone())]);
        Self { id, fields }
    }

    /// Appends a value to a field (unescaped field name)
    pub fn with_value(mut self, field: impl Into<String>, value: IndexValue) -> Self {
        self.fields.entry(field.into()).or_default().push(value);
        self
    }

    /// Appends a text value to a field
    pub fn with_text(self, field: impl Into<String>, value: &str) -> Self {
        self.with_value(field, IndexValue::text(value))
    }

    /// Values of a field, empty when unset
    pub fn values(&self, field: &str) -> &[IndexValue] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Lower-cased alphanumeric tokens, as an analyzer would produce
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PatternToken {
    Literal(char),
    AnyOne,
    AnyMany,
}

fn parse_pattern(pattern: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    tokens.push(PatternToken::Literal(next));
                }
            }
            '*' => tokens.push(PatternToken::AnyMany),
            '?' => tokens.push(PatternToken::AnyOne),
            other => tokens.push(PatternToken::Literal(other)),
        }
    }
    tokens
}

fn wildcard_matches(pattern: &[PatternToken], text: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    // matched[j] = pattern prefix so far matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;

    for token in pattern {
        let mut next = vec![false; text.len() + 1];
        match token {
            PatternToken::AnyMany => {
                let mut reachable = false;
                for j in 0..=text.len() {
                    reachable |= matched[j];
                    next[j] = reachable;
                }
            }
            PatternToken::AnyOne => {
                for j in 0..text.len() {
                    next[j + 1] = matched[j];
                }
            }
            PatternToken::Literal(c) => {
                for j in 0..text.len() {
                    next[j + 1] = matched[j] && text[j] == *c;
                }
            }
        }
        matched = next;
    }

    matched[text.len()]
}

fn within_bounds(value: &IndexValue, lower: &Bound<IndexValue>, upper: &Bound<IndexValue>) -> bool {
    let lower_ok = match lower {
        Bound::Unbounded => true,
        Bound::Included(b) => matches!(
            value.compare(b),
            Some(CmpOrdering::Greater | CmpOrdering::Equal)
        ),
        Bound::Excluded(b) => value.compare(b) == Some(CmpOrdering::Greater),
    };
    let upper_ok = match upper {
        Bound::Unbounded => true,
        Bound::Included(b) => matches!(
            value.compare(b),
            Some(CmpOrdering::Less | CmpOrdering::Equal)
        ),
        Bound::Excluded(b) => value.compare(b) == Some(CmpOrdering::Less),
    };
    lower_ok && upper_ok
}

fn phrase_in(tokens: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() {
        return false;
    }
    tokens.windows(phrase.len()).any(|w| w == phrase)
}

/// Evaluates a query against one document
fn matches(query: &BackendQuery, doc: &IndexedDocument) -> bool {
    match query {
        BackendQuery::MatchAll => true,
        BackendQuery::MatchNone => false,
        BackendQuery::Boolean(clauses) => {
            let mut has_must = false;
            let mut has_should = false;
            let mut any_should = false;
            for clause in clauses {
                let hit = matches(&clause.query, doc);
                match clause.occur {
                    Occur::MustNot if hit => return false,
                    Occur::MustNot => {}
                    Occur::Must if !hit => return false,
                    Occur::Must => has_must = true,
                    Occur::Should => {
                        has_should = true;
                        any_should |= hit;
                    }
                }
            }
            if has_must {
                true
            } else {
                has_should && any_should
            }
        }
        BackendQuery::Term { field, value } => {
            let field = unescape_term(field);
            let values = doc.values(&field);
            if field == FULLTEXT_FIELD {
                // A needle the analyzer splits matches as a phrase
                let needle = tokenize(&value.to_raw_string());
                return values
                    .iter()
                    .any(|v| phrase_in(&tokenize(&v.to_raw_string()), &needle));
            }
            values
                .iter()
                .any(|v| v.compare(value) == Some(CmpOrdering::Equal))
        }
        BackendQuery::Range {
            field,
            lower,
            upper,
        } => doc
            .values(&unescape_term(field))
            .iter()
            .any(|v| within_bounds(v, lower, upper)),
        BackendQuery::Wildcard { field, pattern } => {
            let tokens = parse_pattern(pattern);
            doc.values(&unescape_term(field))
                .iter()
                .any(|v| wildcard_matches(&tokens, &v.to_raw_string()))
        }
        BackendQuery::Phrase { field, text } => {
            let phrase = tokenize(text);
            doc.values(&unescape_term(field))
                .iter()
                .any(|v| phrase_in(&tokenize(&v.to_raw_string()), &phrase))
        }
    }
}

/// Relevance: one point per match, plus one per full-text term occurrence
fn score(query: &BackendQuery, doc: &IndexedDocument) -> f32 {
    fn fulltext_hits(query: &BackendQuery, doc: &IndexedDocument) -> usize {
        match query {
            BackendQuery::Boolean(clauses) => clauses
                .iter()
                .filter(|c| c.occur != Occur::MustNot)
                .map(|c| fulltext_hits(&c.query, doc))
                .sum(),
            BackendQuery::Term { field, value } if unescape_term(field) == FULLTEXT_FIELD => {
                let needle = tokenize(&value.to_raw_string());
                if needle.is_empty() {
                    return 0;
                }
                doc.values(FULLTEXT_FIELD)
                    .iter()
                    .map(|v| {
                        tokenize(&v.to_raw_string())
                            .windows(needle.len())
                            .filter(|w| *w == needle.as_slice())
                            .count()
                    })
                    .sum()
            }
            BackendQuery::Phrase { field, .. } if unescape_term(field) == FULLTEXT_FIELD => {
                usize::from(matches(query, doc))
            }
            _ => 0,
        }
    }
    1.0 + fulltext_hits(query, doc) as f32
}

fn compare_field(a: &IndexedDocument, b: &IndexedDocument, field: &str) -> CmpOrdering {
    match (a.values(field).first(), b.values(field).first()) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(x), Some(y)) => x.compare(y).unwrap_or(CmpOrdering::Equal),
    }
}

/// Search index held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryIndex {
    documents: RwLock<BTreeMap<String, IndexedDocument>>,
    unavailable: AtomicBool,
    fail_after: RwLock<Option<usize>>,
    calls: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a document
    pub fn insert(&self, document: IndexedDocument) {
        self.documents.write().insert(document.id.clone(), document);
    }

    /// Removes a document, returning whether it was present
    pub fn remove(&self, id: &str) -> bool {
        self.documents.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Makes every subsequent call fail with [`IndexError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Lets `calls` more calls succeed, then fails every call after them
    pub fn fail_after(&self, calls: usize) {
        self.calls.store(0, Ordering::SeqCst);
        *self.fail_after.write() = Some(calls);
    }

    /// Calls served since creation or the last [`fail_after`](Self::fail_after)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> IndexResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::unavailable("memory index switched off"));
        }
        let served = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.fail_after.read() {
            if served >= limit {
                return Err(IndexError::unavailable(format!(
                    "memory index failing after {} calls",
                    limit
                )));
            }
        }
        Ok(())
    }
}

impl SearchIndex for MemoryIndex {
    fn search(&self, request: &SearchRequest) -> IndexResult<SearchResponse> {
        self.begin_call()?;
        let documents = self.documents.read();

        let mut hits: Vec<(&IndexedDocument, f32)> = documents
            .values()
            .filter(|doc| matches(&request.filter, doc))
            .map(|doc| (doc, score(&request.filter, doc)))
            .collect();

        // Stable sort keeps id order as the final tiebreak
        hits.sort_by(|(a, a_score), (b, b_score)| {
            for key in &request.sort {
                let ordering = match key {
                    SortField::Field { name, .. } => compare_field(a, b, &unescape_term(name)),
                    SortField::Score { .. } => {
                        a_score.partial_cmp(b_score).unwrap_or(CmpOrdering::Equal)
                    }
                };
                let ordering = if key.is_ascending() {
                    ordering
                } else {
                    ordering.reverse()
                };
                if ordering != CmpOrdering::Equal {
                    return ordering;
                }
            }
            CmpOrdering::Equal
        });

        let total_matches = hits.len();
        let window = hits
            .into_iter()
            .skip(request.skip)
            .take(request.limit)
            .map(|(doc, score)| SearchHit::new(doc.id.clone(), score))
            .collect();

        Ok(SearchResponse {
            hits: window,
            total_matches,
        })
    }

    fn child_folder_ids(
        &self,
        parent_ids: &BTreeSet<String>,
        _timeout: Option<Duration>,
    ) -> IndexResult<BTreeSet<String>> {
        self.begin_call()?;
        let folder = IndexValue::text("cmis:folder");
        let documents = self.documents.read();

        Ok(documents
            .values()
            .filter(|doc| doc.values(BASE_TYPE_FIELD).contains(&folder))
            .filter(|doc| {
                doc.values(PARENT_FIELD).iter().any(|p| match p {
                    IndexValue::Text(id) => parent_ids.contains(id),
                    _ => false,
                })
            })
            .map(|doc| doc.id.clone())
            .collect())
    }
}
