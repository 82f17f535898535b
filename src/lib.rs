//! cmis-query - query translation and execution for a CMIS content repository
//!
//! Translates parsed CMIS queries into a search index's query algebra, runs
//! them, and reconciles the hits with the authoritative content store,
//! permissions and locks.

pub mod config;
pub mod engine;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;
pub mod query;
pub mod types;

pub use config::{QueryConfig, TreeFailurePolicy};
pub use engine::{QueryEngine, QueryServices};
pub use executor::{ExecutorError, Principal, ResultPage};
