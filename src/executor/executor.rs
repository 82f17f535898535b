//! Query executor
//!
//! Runs a [`QueryPlan`] against the collaborators, in strict order:
//! 1. Search the index for the plan's window
//! 2. Hydrate each hit from the content store, dropping ids the store lacks
//! 3. Read-lock the hydrated objects as one batch
//! 4. Filter by the principal's read permission
//! 5. Project the survivors
//! 6. Release the locks as one batch
//! 7. Assemble the page from the raw backend count

use std::collections::HashMap;

use tracing::{debug, warn};

use super::errors::{ExecutorError, ExecutorResult};
use super::locks::LockGuard;
use super::projection::Projector;
use super::result::ResultPage;
use super::services::{ContentObject, ContentStore, LockService, PermissionService, Principal};
use crate::index::{SearchIndex, SearchRequest};
use crate::observability::QueryMetrics;
use crate::planner::QueryPlan;
use crate::types::TypeManager;

/// Executes plans against the index and the authoritative services
pub struct QueryExecutor<'a> {
    types: &'a dyn TypeManager,
    index: &'a dyn SearchIndex,
    content: &'a dyn ContentStore,
    permissions: &'a dyn PermissionService,
    locks: &'a dyn LockService,
    metrics: Option<&'a QueryMetrics>,
    relevance_function: &'a str,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(
        types: &'a dyn TypeManager,
        index: &'a dyn SearchIndex,
        content: &'a dyn ContentStore,
        permissions: &'a dyn PermissionService,
        locks: &'a dyn LockService,
    ) -> Self {
        Self {
            types,
            index,
            content,
            permissions,
            locks,
            metrics: None,
            relevance_function: "SCORE",
        }
    }

    /// Records divergence and permission counters into `metrics`
    pub fn with_metrics(mut self, metrics: &'a QueryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Name reported for the relevance pseudo-column
    pub fn with_relevance_function(mut self, name: &'a str) -> Self {
        self.relevance_function = name;
        self
    }

    /// Executes `plan` on behalf of `principal`
    pub fn execute(&self, plan: &QueryPlan, principal: &Principal) -> ExecutorResult<ResultPage> {
        let request = SearchRequest {
            filter: plan.combined_filter(),
            sort: plan.sort.clone(),
            skip: plan.skip,
            limit: plan.limit,
            timeout: plan.timeout,
        };
        let response = self
            .index
            .search(&request)
            .map_err(ExecutorError::BackendUnavailable)?;
        let window = response.hits.len();
        debug!(
            hits = window,
            total = response.total_matches,
            "index search complete"
        );

        let mut scores = HashMap::with_capacity(window);
        let mut objects = Vec::with_capacity(window);
        let mut divergent = 0u64;
        for hit in response.hits {
            match self
                .content
                .get_by_id(&hit.id)
                .map_err(ExecutorError::ContentStore)?
            {
                Some(object) => {
                    scores.insert(object.id.clone(), hit.score);
                    objects.push(object);
                }
                None => {
                    divergent += 1;
                    warn!(id = %hit.id, "index hit missing from content store, dropped");
                }
            }
        }
        if let Some(metrics) = self.metrics {
            metrics.add_divergent_ids(divergent);
        }

        let guard = LockGuard::acquire(self.locks, &objects)?;
        let hydrated = objects.len();
        let readable: Vec<ContentObject> = self
            .permissions
            .filter_readable(principal, objects)
            .map_err(ExecutorError::Permission)?;
        let rejected = hydrated.saturating_sub(readable.len());
        if let Some(metrics) = self.metrics {
            metrics.add_permission_rejections(rejected as u64);
        }

        let projector = Projector::new(
            self.types,
            &plan.primary_type_id,
            &plan.projection,
            self.relevance_function,
        );
        let items = readable
            .into_iter()
            .map(|object| {
                let score = scores.get(&object.id).copied().unwrap_or(0.0);
                projector.project(object, score)
            })
            .collect::<Vec<_>>();
        guard.release()?;

        debug!(
            hydrated,
            divergent,
            rejected,
            returned = items.len(),
            "result page assembled"
        );
        Ok(ResultPage {
            items,
            requested_max_items: plan.limit,
            skip: plan.skip,
            total_matches: response.total_matches,
            has_more_items: plan.skip + window < response.total_matches,
        })
    }
}
