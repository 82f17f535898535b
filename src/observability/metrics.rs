//! Query engine counters
//!
//! - Counters only, monotonic
//! - Reset only when the engine is constructed
//! - Relaxed atomics; values are exact once the writers are done

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Operational counters for one query engine
#[derive(Debug, Default)]
pub struct QueryMetrics {
    /// Queries that returned a page
    queries_executed: AtomicU64,
    /// Queries refused as invalid
    queries_rejected: AtomicU64,
    /// Queries that hit a server-side failure
    queries_failed: AtomicU64,
    /// Index hits missing from the content store
    divergent_ids_dropped: AtomicU64,
    /// Objects removed by the permission filter
    permission_rejections: AtomicU64,
    /// IN_TREE traversals cut short by the depth bound
    traversals_truncated: AtomicU64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_divergent_ids(&self, count: u64) {
        self.divergent_ids_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_permission_rejections(&self, count: u64) {
        self.permission_rejections.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_truncated_traversals(&self, count: u64) {
        self.traversals_truncated.fetch_add(count, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            divergent_ids_dropped: self.divergent_ids_dropped.load(Ordering::Relaxed),
            permission_rejections: self.permission_rejections.load(Ordering::Relaxed),
            traversals_truncated: self.traversals_truncated.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        self.snapshot().to_json()
    }
}

/// A point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub queries_failed: u64,
    pub divergent_ids_dropped: u64,
    pub permission_rejections: u64,
    pub traversals_truncated: u64,
}

impl MetricsSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
