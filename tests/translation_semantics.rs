//! Translation Semantics Tests
//!
//! Predicate trees planned end to end against the shared repository:
//! - Equalities become required clauses
//! - LIKE is restricted to single-valued text properties
//! - Literals are type-checked against their property
//! - Type scope and ordering follow the type hierarchy
//! - Negation and qualifiers select the expected documents when executed

mod common;

use cmis_query::index::{BackendQuery, Clause, IndexValue, Occur, SortField};
use cmis_query::planner::{
    translate_like_pattern, LiteralCategory, PlannerError, QueryPlan, QueryPlanner,
};
use cmis_query::query::{
    ComparisonOp, FullTextNode, LiteralToken, Operand, ParsedQuery, PredicateNode,
};
use cmis_query::types::PropertyType;
use cmis_query::QueryConfig;
use common::{column, reader, Repository, DOC_TYPE};
use proptest::prelude::*;

fn plan(repo: &Repository, query: &ParsedQuery) -> Result<QueryPlan, PlannerError> {
    let config = QueryConfig::default();
    QueryPlanner::new(repo.types.as_ref(), repo.index.as_ref(), &config).plan(query, None, None)
}

// =============================================================================
// Boolean Structure
// =============================================================================

#[test]
fn test_and_of_equalities_is_two_must_clauses() {
    let repo = Repository::new();
    let mut query = ParsedQuery::new(DOC_TYPE);
    let name = column(repo.types.as_ref(), &mut query, DOC_TYPE, "cmis:name");
    let type_id = column(repo.types.as_ref(), &mut query, DOC_TYPE, "cmis:objectTypeId");
    let query = query.with_predicate(PredicateNode::and(
        PredicateNode::eq(name, LiteralToken::quoted("foo")),
        PredicateNode::eq(type_id, LiteralToken::quoted("cmis:document")),
    ));

    let plan = plan(&repo, &query).unwrap();
    match &plan.filter {
        BackendQuery::Boolean(clauses) => {
            assert_eq!(clauses.len(), 2);
            assert!(clauses.iter().all(|c| c.occur == Occur::Must));
            assert_eq!(
                clauses[0],
                Clause::must(BackendQuery::term("name", IndexValue::text("foo")))
            );
        }
        other => panic!("expected boolean, got {}", other),
    }
}

#[test]
fn test_not_is_anchored_on_match_all() {
    let repo = Repository::new();
    let mut query = ParsedQuery::new(DOC_TYPE);
    let name = column(repo.types.as_ref(), &mut query, DOC_TYPE, "cmis:name");
    let query = query.with_predicate(PredicateNode::not(PredicateNode::eq(
        name,
        LiteralToken::quoted("x"),
    )));

    let plan = plan(&repo, &query).unwrap();
    assert_eq!(plan.filter.to_string(), "(+*:* -name:x)");
}

#[test]
fn test_not_returns_every_other_document() {
    let repo = Repository::new();
    repo.add_folder("f1", "root");
    repo.add_document("d-x", "x", "f1");
    repo.add_document("d-y", "y", "f1");
    repo.add_document("d-z", "z other", "f2");

    let mut query = ParsedQuery::new(DOC_TYPE);
    let name = column(repo.types.as_ref(), &mut query, DOC_TYPE, "cmis:name");
    repo.parser.script(
        "not x",
        query.with_predicate(PredicateNode::not(PredicateNode::eq(
            name,
            LiteralToken::quoted("x"),
        ))),
    );

    let page = repo
        .engine(QueryConfig::default())
        .execute_query("not x", &reader("alice"), None, None)
        .unwrap();
    let mut ids = page.ids();
    ids.sort_unstable();
    // the folder is outside the type scope
    assert_eq!(ids, vec!["d-y", "d-z"]);
    assert_eq!(page.total_matches, 2);
}

#[test]
fn test_absent_where_clause_only_scopes_types() {
    let repo = Repository::new();
    let plan = plan(&repo, &ParsedQuery::new(DOC_TYPE).select_all()).unwrap();
    assert_eq!(plan.filter, BackendQuery::MatchAll);
    assert_eq!(plan.combined_filter(), plan.type_scope);
    assert_eq!(plan.included_type_ids, vec![DOC_TYPE.to_string()]);
}

#[test]
fn test_supertype_query_includes_subtypes() {
    let repo = Repository::new();
    let plan = plan(&repo, &ParsedQuery::new("cmis:document")).unwrap();
    assert_eq!(
        plan.included_type_ids,
        vec!["cmis:document".to_string(), DOC_TYPE.to_string()]
    );
    assert_eq!(
        plan.type_scope.to_string(),
        r"(objecttype:cmis\:document objecttype:acme\:doc)"
    );
}

#[test]
fn test_qualified_in_folder_keeps_included_subtypes() {
    let repo = Repository::new();
    repo.add_folder("f1", "root");
    repo.add_document("d1", "report", "f1");
    repo.add_document("d2", "memo", "f2");

    repo.parser.script(
        "plain",
        ParsedQuery::new("cmis:document")
            .with_alias("d")
            .with_predicate(PredicateNode::in_folder("f1")),
    );
    repo.parser.script(
        "qualified",
        ParsedQuery::new("cmis:document")
            .with_alias("d")
            .with_predicate(PredicateNode::InFolder {
                qualifier: Some("d".into()),
                folder: Operand::Literal(LiteralToken::quoted("f1")),
            }),
    );

    let engine = repo.engine(QueryConfig::default());
    for statement in ["plain", "qualified"] {
        let page = engine
            .execute_query(statement, &reader("alice"), None, None)
            .unwrap();
        assert_eq!(page.ids(), vec!["d1"], "{}", statement);
        assert_eq!(page.total_matches, 1);
    }
}

// =============================================================================
// LIKE
// =============================================================================

#[test]
fn test_like_prefix_on_single_valued_string() {
    let repo = Repository::new();
    let mut query = ParsedQuery::new(DOC_TYPE);
    let name = column(repo.types.as_ref(), &mut query, DOC_TYPE, "cmis:name");
    let query = query.with_predicate(PredicateNode::like(name, "report%"));

    let plan = plan(&repo, &query).unwrap();
    assert_eq!(
        plan.filter,
        BackendQuery::Wildcard {
            field: "name".into(),
            pattern: "report*".into(),
        }
    );
}

#[test]
fn test_unknown_escape_agrees_between_equality_and_like() {
    let repo = Repository::new();
    let mut equal = ParsedQuery::new(DOC_TYPE);
    let name = column(repo.types.as_ref(), &mut equal, DOC_TYPE, "cmis:name");
    let equal = equal.with_predicate(PredicateNode::eq(name, LiteralToken::quoted(r"a\b")));

    let mut like = ParsedQuery::new(DOC_TYPE);
    let name = column(repo.types.as_ref(), &mut like, DOC_TYPE, "cmis:name");
    let like = like.with_predicate(PredicateNode::like(name, r"a\b"));

    let expected = BackendQuery::term("name", IndexValue::text("ab"));
    assert_eq!(plan(&repo, &equal).unwrap().filter, expected);
    assert_eq!(plan(&repo, &like).unwrap().filter, expected);
}

#[test]
fn test_like_on_multi_valued_rejected() {
    let repo = Repository::new();
    let mut query = ParsedQuery::new(DOC_TYPE);
    let tags = column(repo.types.as_ref(), &mut query, DOC_TYPE, "acme:tags");
    let query = query.with_predicate(PredicateNode::like(tags, "report%"));

    let err = plan(&repo, &query).unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(err.code(), "CMIS_QUERY_INVALID");
}

// =============================================================================
// Literal Typing
// =============================================================================

#[test]
fn test_integer_property_rejects_string_literal() {
    let repo = Repository::new();
    let mut query = ParsedQuery::new(DOC_TYPE);
    let pages = column(repo.types.as_ref(), &mut query, DOC_TYPE, "acme:pages");
    let query = query.with_predicate(PredicateNode::eq(pages, LiteralToken::quoted("ten")));

    let err = plan(&repo, &query).unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("INTEGER"));
}

#[test]
fn test_open_range_on_integer() {
    let repo = Repository::new();
    let mut query = ParsedQuery::new(DOC_TYPE);
    let pages = column(repo.types.as_ref(), &mut query, DOC_TYPE, "acme:pages");
    let query = query.with_predicate(PredicateNode::compare(
        ComparisonOp::Gt,
        pages,
        LiteralToken::number("10"),
    ));

    let plan = plan(&repo, &query).unwrap();
    assert_eq!(plan.filter.to_string(), r"dyn_s_acme\:pages:{10 TO *]");
}

#[test]
fn test_required_categories() {
    use cmis_query::planner::required_category;
    assert_eq!(
        required_category(PropertyType::DateTime),
        Some(LiteralCategory::Timestamp)
    );
    assert_eq!(
        required_category(PropertyType::Id),
        Some(LiteralCategory::String)
    );
    assert_eq!(
        required_category(PropertyType::Decimal),
        Some(LiteralCategory::Numeric)
    );
}

// =============================================================================
// Full Text and Ordering
// =============================================================================

#[test]
fn test_contains_and_minus() {
    let repo = Repository::new();
    let query = ParsedQuery::new(DOC_TYPE).with_predicate(PredicateNode::contains(
        FullTextNode::And(vec![
            FullTextNode::Word("Budget".into()),
            FullTextNode::Minus(vec![FullTextNode::Word("draft".into())]),
        ]),
    ));

    let plan = plan(&repo, &query).unwrap();
    assert_eq!(plan.filter.to_string(), "(+text:budget +(+*:* -text:draft))");
}

#[test]
fn test_order_by_relevance_and_property() {
    let repo = Repository::new();
    let query = ParsedQuery::new(DOC_TYPE)
        .select("n", "cmis:name")
        .select_function("rank", "SCORE")
        .order_by("rank", false)
        .order_by("n", true);

    let plan = plan(&repo, &query).unwrap();
    assert_eq!(
        plan.sort,
        vec![
            SortField::Score { ascending: false },
            SortField::Field {
                name: "name".into(),
                ascending: true
            },
        ]
    );
}

#[test]
fn test_order_by_multi_valued_rejected() {
    let repo = Repository::new();
    let query = ParsedQuery::new(DOC_TYPE).order_by("acme:tags", true);
    assert!(plan(&repo, &query).unwrap_err().is_client_error());
}

// =============================================================================
// Pattern Properties
// =============================================================================

proptest! {
    /// A LIKE without wildcards plans to an exact term of the same text
    #[test]
    fn prop_like_without_wildcards_is_exact(text in "[a-zA-Z0-9]{1,16}") {
        let repo = Repository::new();
        let mut query = ParsedQuery::new(DOC_TYPE);
        let name = column(repo.types.as_ref(), &mut query, DOC_TYPE, "cmis:name");
        let query = query.with_predicate(PredicateNode::like(name, &text));

        let plan = plan(&repo, &query).unwrap();
        prop_assert_eq!(plan.filter, BackendQuery::term("name", IndexValue::text(text.clone())));
        prop_assert_eq!(translate_like_pattern(&text), text);
    }

    /// A trailing `%` always ends the pattern in the multi-char wildcard
    #[test]
    fn prop_trailing_percent_is_prefix(text in "[a-z]{1,12}") {
        let pattern = translate_like_pattern(&format!("{}%", text));
        prop_assert!(pattern.ends_with('*'));
        prop_assert_eq!(&pattern[..pattern.len() - 1], text.as_str());
    }
}
