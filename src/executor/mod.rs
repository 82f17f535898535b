//! Query execution and result assembly
//!
//! Consumes a [`QueryPlan`](crate::planner::QueryPlan) and produces a
//! permission-filtered, projected [`ResultPage`].
//!
//! # Execution Flow (strict order)
//!
//! 1. Search the index with the plan's filter, sort and window
//! 2. Hydrate hits from the content store; missing ids are dropped with a warning
//! 3. Acquire read locks on the hydrated objects (one batch)
//! 4. Filter by read permission
//! 5. Project the selected columns, unset properties as `Null`
//! 6. Release the locks (one batch, on every exit path)
//! 7. Report the raw backend total and `has_more_items` from the raw window
//!
//! # Invariants
//!
//! - The index is never trusted for object content
//! - Locks taken are released exactly once
//! - Collaborator errors propagate unchanged

mod errors;
mod executor;
mod locks;
mod projection;
mod result;
mod services;

pub use errors::{ErrorKind, ExecutorError, ExecutorResult, ServiceError};
pub use executor::QueryExecutor;
pub use locks::LockGuard;
pub use projection::Projector;
pub use result::{ProjectedProperty, QueryResultItem, ResultPage};
pub use services::{
    AclPermissionService, AllowAll, ContentObject, ContentStore, LockService,
    MemoryContentStore, MemoryLockService, PermissionService, Principal, ReadLock,
    ServiceResult,
};
