//! Query engine entry point
//!
//! `execute_query(statement, principal, skip, max_items)` runs
//! parse, plan and execute as one sequential unit of work inside a
//! `cmis_query` span, and keeps the engine's counters.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::{ConfigResult, QueryConfig};
use crate::executor::{
    ContentStore, ErrorKind, ExecutorError, ExecutorResult, LockService, PermissionService,
    Principal, QueryExecutor, ResultPage,
};
use crate::index::SearchIndex;
use crate::observability::QueryMetrics;
use crate::planner::{ExplainPlan, PlannerError, QueryPlanner};
use crate::query::{ParsedQuery, QueryParser};
use crate::types::TypeManager;

/// The collaborators one repository's engine works with
#[derive(Clone)]
pub struct QueryServices {
    pub parser: Arc<dyn QueryParser>,
    pub types: Arc<dyn TypeManager>,
    pub index: Arc<dyn SearchIndex>,
    pub content: Arc<dyn ContentStore>,
    pub permissions: Arc<dyn PermissionService>,
    pub locks: Arc<dyn LockService>,
}

/// Translates and runs queries for one repository
pub struct QueryEngine {
    services: QueryServices,
    config: QueryConfig,
    metrics: QueryMetrics,
}

impl QueryEngine {
    /// Creates an engine after validating `config`
    pub fn new(services: QueryServices, config: QueryConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            services,
            config,
            metrics: QueryMetrics::new(),
        })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    /// Parses and runs `statement` for `principal`
    pub fn execute_query(
        &self,
        statement: &str,
        principal: &Principal,
        skip: Option<usize>,
        max_items: Option<usize>,
    ) -> ExecutorResult<ResultPage> {
        let query_id = Uuid::new_v4();
        let span = info_span!("cmis_query", query_id = %query_id, principal = %principal.id);
        let _entered = span.enter();

        let started = Instant::now();
        let result = self
            .services
            .parser
            .parse(statement)
            .map_err(ExecutorError::from)
            .and_then(|query| self.run(&query, principal, skip, max_items));
        self.record(&result, started);
        result
    }

    /// Runs an already parsed query for `principal`
    pub fn execute_parsed(
        &self,
        query: &ParsedQuery,
        principal: &Principal,
        skip: Option<usize>,
        max_items: Option<usize>,
    ) -> ExecutorResult<ResultPage> {
        let query_id = Uuid::new_v4();
        let span = info_span!("cmis_query", query_id = %query_id, principal = %principal.id);
        let _entered = span.enter();

        let started = Instant::now();
        let result = self.run(query, principal, skip, max_items);
        self.record(&result, started);
        result
    }

    /// Plans `statement` without running it
    pub fn explain_query(&self, statement: &str) -> ExplainPlan {
        let planned = self
            .services
            .parser
            .parse(statement)
            .map_err(|err| PlannerError::invalid(err.to_string()))
            .and_then(|query| self.planner().plan(&query, None, None));
        match planned {
            Ok(plan) => plan.explain(),
            Err(err) => ExplainPlan::from_error(&err),
        }
    }

    fn planner(&self) -> QueryPlanner<'_> {
        QueryPlanner::new(
            self.services.types.as_ref(),
            self.services.index.as_ref(),
            &self.config,
        )
    }

    fn run(
        &self,
        query: &ParsedQuery,
        principal: &Principal,
        skip: Option<usize>,
        max_items: Option<usize>,
    ) -> ExecutorResult<ResultPage> {
        let plan = self.planner().plan(query, skip, max_items)?;
        self.metrics
            .add_truncated_traversals(plan.truncated_traversals as u64);

        QueryExecutor::new(
            self.services.types.as_ref(),
            self.services.index.as_ref(),
            self.services.content.as_ref(),
            self.services.permissions.as_ref(),
            self.services.locks.as_ref(),
        )
        .with_metrics(&self.metrics)
        .with_relevance_function(&self.config.relevance_function)
        .execute(&plan, principal)
    }

    fn record(&self, result: &ExecutorResult<ResultPage>, started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(page) => {
                self.metrics.increment_queries_executed();
                info!(
                    returned = page.len(),
                    total = page.total_matches,
                    has_more = page.has_more_items,
                    elapsed_ms,
                    "query complete"
                );
            }
            Err(err) => match err.kind() {
                ErrorKind::InvalidQuery => {
                    self.metrics.increment_queries_rejected();
                    info!(code = err.code(), error = %err, elapsed_ms, "query rejected");
                }
                ErrorKind::Internal => {
                    self.metrics.increment_queries_failed();
                    error!(code = err.code(), error = %err, elapsed_ms, "query translation fault");
                }
                ErrorKind::BackendUnavailable | ErrorKind::Service => {
                    self.metrics.increment_queries_failed();
                    warn!(
                        code = err.code(),
                        error = %err,
                        retryable = err.is_retryable(),
                        elapsed_ms,
                        "query failed"
                    );
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{AllowAll, MemoryContentStore, MemoryLockService};
    use crate::index::MemoryIndex;
    use crate::query::{ParseError, ParseResult};
    use crate::types::TypeRegistryBuilder;

    /// Accepts only `SELECT * FROM <type>`
    struct StarParser;

    impl QueryParser for StarParser {
        fn parse(&self, statement: &str) -> ParseResult<ParsedQuery> {
            statement
                .strip_prefix("SELECT * FROM ")
                .map(|type_id| ParsedQuery::new(type_id.trim()).select_all())
                .ok_or_else(|| ParseError::at(0, "expected SELECT * FROM"))
        }
    }

    fn engine() -> QueryEngine {
        let services = QueryServices {
            parser: Arc::new(StarParser),
            types: Arc::new(TypeRegistryBuilder::with_base_types().build().unwrap()),
            index: Arc::new(MemoryIndex::new()),
            content: Arc::new(MemoryContentStore::new()),
            permissions: Arc::new(AllowAll),
            locks: Arc::new(MemoryLockService::new()),
        };
        QueryEngine::new(services, QueryConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let services = engine().services.clone();
        let config = QueryConfig::default().with_max_tree_depth(0);
        assert!(QueryEngine::new(services, config).is_err());
    }

    #[test]
    fn test_metrics_classify_outcomes() {
        let engine = engine();
        let alice = Principal::new("alice");

        engine
            .execute_query("SELECT * FROM cmis:document", &alice, None, None)
            .unwrap();
        let parse = engine
            .execute_query("DELETE EVERYTHING", &alice, None, None)
            .unwrap_err();
        assert!(parse.is_client_error());
        let unknown = engine
            .execute_query("SELECT * FROM acme:nothing", &alice, None, None)
            .unwrap_err();
        assert!(unknown.is_client_error());

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.queries_executed, 1);
        assert_eq!(snapshot.queries_rejected, 2);
        assert_eq!(snapshot.queries_failed, 0);
    }

    #[test]
    fn test_explain_query() {
        let engine = engine();
        let accepted = engine.explain_query("SELECT * FROM cmis:folder");
        assert!(accepted.accepted);
        assert_eq!(accepted.columns, vec!["*"]);

        let rejected = engine.explain_query("nonsense");
        assert!(!rejected.accepted);
        assert_eq!(rejected.rejection_code.as_deref(), Some("CMIS_QUERY_INVALID"));
    }
}
