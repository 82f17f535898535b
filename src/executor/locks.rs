//! Scoped read locks
//!
//! Locks are taken as one batch and released as one batch when the guard
//! drops, whichever way the pipeline exits.

use tracing::warn;

use super::errors::{ExecutorError, ExecutorResult, ServiceError};
use super::services::{ContentObject, LockService, ReadLock};

/// Holds a batch of read locks until dropped
pub struct LockGuard<'a> {
    service: &'a dyn LockService,
    locks: Vec<ReadLock>,
    released: bool,
}

impl<'a> LockGuard<'a> {
    /// Locks every object in one call
    pub fn acquire(service: &'a dyn LockService, objects: &[ContentObject]) -> ExecutorResult<Self> {
        let locks = service.read_locks(objects);
        if !locks.is_empty() {
            service.bulk_lock(&locks).map_err(ExecutorError::Lock)?;
        }
        Ok(Self {
            service,
            locks,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Releases the batch now, reporting failure to the caller
    pub fn release(mut self) -> ExecutorResult<()> {
        self.released = true;
        self.unlock().map_err(ExecutorError::Lock)
    }

    fn unlock(&self) -> Result<(), ServiceError> {
        if self.locks.is_empty() {
            return Ok(());
        }
        self.service.bulk_unlock(&self.locks)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.unlock() {
            warn!(locks = self.locks.len(), error = %err, "failed to release read locks");
        }
    }
}
