//! Folder Tree Traversal Tests
//!
//! IN_TREE expansion over the index's parent links:
//! - Depth bound limits descent and is reported
//! - Cycles terminate
//! - Index failures follow the configured policy

mod common;

use std::collections::BTreeSet;

use cmis_query::planner::{FolderTreeResolver, QueryPlanner};
use cmis_query::query::{ParsedQuery, PredicateNode};
use cmis_query::{QueryConfig, TreeFailurePolicy};
use common::{reader, Repository, DOC_TYPE};

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// root -> A -> B -> C
fn chain() -> Repository {
    let repo = Repository::new();
    repo.add_folder("A", "root");
    repo.add_folder("B", "A");
    repo.add_folder("C", "B");
    repo
}

// =============================================================================
// Depth Bound
// =============================================================================

#[test]
fn test_depth_two_stops_above_c() {
    let repo = chain();
    let tree = FolderTreeResolver::new(repo.index.as_ref(), 2, TreeFailurePolicy::FailQuery)
        .resolve_descendants("root")
        .unwrap();

    assert_eq!(tree.ids, ids(&["root", "A", "B"]));
    assert!(tree.truncated);
    assert!(!tree.partial);
}

#[test]
fn test_deep_enough_bound_is_not_truncated() {
    let repo = chain();
    let tree = FolderTreeResolver::new(repo.index.as_ref(), 10, TreeFailurePolicy::FailQuery)
        .resolve_descendants("root")
        .unwrap();

    assert_eq!(tree.ids, ids(&["root", "A", "B", "C"]));
    assert!(!tree.truncated);
}

#[test]
fn test_tree_exactly_at_bound_is_not_truncated() {
    let repo = Repository::new();
    repo.add_folder("A", "root");
    repo.add_folder("B", "A");
    repo.add_document("d-b", "bottom", "B");
    repo.parser.script(
        "tree",
        ParsedQuery::new(DOC_TYPE).with_predicate(PredicateNode::in_tree("root")),
    );

    let tree = FolderTreeResolver::new(repo.index.as_ref(), 2, TreeFailurePolicy::FailQuery)
        .resolve_descendants("root")
        .unwrap();
    assert_eq!(tree.ids, ids(&["root", "A", "B"]));
    assert!(!tree.truncated);

    let engine = repo.engine(QueryConfig::default().with_max_tree_depth(2));
    let page = engine
        .execute_query("tree", &reader("alice"), None, None)
        .unwrap();
    assert_eq!(page.ids(), vec!["d-b"]);
    assert_eq!(engine.metrics().snapshot().traversals_truncated, 0);
}

#[test]
fn test_truncation_reported_in_plan() {
    let repo = chain();
    let config = QueryConfig::default().with_max_tree_depth(2);
    let query = ParsedQuery::new(DOC_TYPE).with_predicate(PredicateNode::in_tree("root"));

    let plan = QueryPlanner::new(repo.types.as_ref(), repo.index.as_ref(), &config)
        .plan(&query, None, None)
        .unwrap();
    assert_eq!(plan.truncated_traversals, 1);
    assert_eq!(
        plan.filter.to_string(),
        "(parentid:A parentid:B parentid:root)"
    );
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn test_cycle_terminates() {
    let repo = Repository::new();
    repo.add_folder("A", "root");
    repo.add_folder("B", "A");
    // corrupt index: root listed as a child of B
    repo.add_folder("root", "B");

    let tree = FolderTreeResolver::new(repo.index.as_ref(), 50, TreeFailurePolicy::FailQuery)
        .resolve_descendants("root")
        .unwrap();
    assert_eq!(tree.ids, ids(&["root", "A", "B"]));
    assert!(!tree.truncated);
}

// =============================================================================
// Failure Policies
// =============================================================================

#[test]
fn test_fail_query_policy() {
    let repo = chain();
    repo.index.fail_after(1);

    let err = FolderTreeResolver::new(repo.index.as_ref(), 10, TreeFailurePolicy::FailQuery)
        .resolve_descendants("root")
        .unwrap_err();
    assert_eq!(err.code(), "CMIS_BACKEND_UNAVAILABLE");
}

#[test]
fn test_return_partial_policy() {
    let repo = chain();
    repo.index.fail_after(1);

    let tree = FolderTreeResolver::new(repo.index.as_ref(), 10, TreeFailurePolicy::ReturnPartial)
        .resolve_descendants("root")
        .unwrap();
    assert_eq!(tree.ids, ids(&["root", "A"]));
    assert!(tree.partial);
}

#[test]
fn test_documents_found_through_tree() {
    let repo = chain();
    repo.add_document("d-top", "top", "root");
    repo.add_document("d-deep", "deep", "C");
    repo.add_document("d-elsewhere", "elsewhere", "other");
    let query = ParsedQuery::new(DOC_TYPE)
        .select_all()
        .with_predicate(PredicateNode::in_tree("root"));
    repo.parser.script("tree", query);

    let engine = repo.engine(QueryConfig::default());
    let page = engine
        .execute_query("tree", &reader("alice"), None, None)
        .unwrap();
    assert_eq!(page.ids(), vec!["d-deep", "d-top"]);
    assert_eq!(engine.metrics().snapshot().traversals_truncated, 0);
}
