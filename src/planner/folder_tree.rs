//! IN_TREE descendant resolution
//!
//! Breadth-first over the folder hierarchy, one index call per level:
//!
//! ```text
//! level 0: {root}
//! level n: folders whose parent is in level n-1, not yet visited
//! ```
//!
//! Stops on an empty level or after `max_depth` levels below the root. The
//! depth bound is lossy by contract: folders below it are silently left out.
//! A walk is reported truncated only when the level past the bound is
//! non-empty, so a tree exactly `max_depth` deep is complete.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, warn};

use super::errors::{PlannerError, PlannerResult};
use crate::config::TreeFailurePolicy;
use crate::index::SearchIndex;

/// Folder ids collected for an IN_TREE predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderTree {
    /// Root and every descendant reached, root included
    pub ids: BTreeSet<String>,
    /// The depth bound stopped the walk while folders were still being found
    pub truncated: bool,
    /// An index failure cut the walk short under `ReturnPartial`
    pub partial: bool,
}

/// Walks the folder hierarchy through the search index
pub struct FolderTreeResolver<'a> {
    index: &'a dyn SearchIndex,
    max_depth: usize,
    policy: TreeFailurePolicy,
    timeout: Option<Duration>,
}

impl<'a> FolderTreeResolver<'a> {
    pub fn new(index: &'a dyn SearchIndex, max_depth: usize, policy: TreeFailurePolicy) -> Self {
        Self {
            index,
            max_depth,
            policy,
            timeout: None,
        }
    }

    /// Bounds each per-level index call
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Collects `root` and its descendants down to the depth bound
    pub fn resolve_descendants(&self, root: &str) -> PlannerResult<FolderTree> {
        let mut visited = BTreeSet::from([root.to_string()]);
        let mut frontier = visited.clone();
        let mut depth = 0;

        while !frontier.is_empty() {
            let children = match self.index.child_folder_ids(&frontier, self.timeout) {
                Ok(children) => children,
                Err(source) => match self.policy {
                    TreeFailurePolicy::FailQuery => {
                        return Err(PlannerError::BackendUnavailable {
                            context: "IN_TREE traversal",
                            source,
                        })
                    }
                    TreeFailurePolicy::ReturnPartial => {
                        warn!(
                            root,
                            depth,
                            collected = visited.len(),
                            error = %source,
                            "IN_TREE traversal failed, using partial folder set"
                        );
                        return Ok(FolderTree {
                            ids: visited,
                            truncated: false,
                            partial: true,
                        });
                    }
                },
            };

            let unvisited: BTreeSet<String> = children
                .into_iter()
                .filter(|id| !visited.contains(id))
                .collect();

            // At the bound the level is only looked at, never collected
            if depth >= self.max_depth {
                if unvisited.is_empty() {
                    break;
                }
                warn!(
                    root,
                    max_depth = self.max_depth,
                    collected = visited.len(),
                    "IN_TREE traversal truncated at depth bound"
                );
                return Ok(FolderTree {
                    ids: visited,
                    truncated: true,
                    partial: false,
                });
            }

            visited.extend(unvisited.iter().cloned());
            frontier = unvisited;
            depth += 1;
            debug!(root, depth, found = frontier.len(), "IN_TREE level expanded");
        }

        Ok(FolderTree {
            ids: visited,
            truncated: false,
            partial: false,
        })
    }
}
