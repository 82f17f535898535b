//! Observability for the query engine
//!
//! - Structured logging through `tracing`; every query runs inside a
//!   `cmis_query` span carrying its query id
//! - Counters in [`QueryMetrics`]
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads

mod metrics;

pub use metrics::{MetricsSnapshot, QueryMetrics};

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `filter` (e.g. `"cmis_query=debug"`).
///
/// `RUST_LOG` wins over `filter` when set. Returns false when a global
/// subscriber is already installed.
pub fn init_tracing(filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
