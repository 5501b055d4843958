//! The process-wide planning lock (§4.6 "Acquire planning lock (single
//! concurrent full-cycle planner process-wide; attempts beyond that return
//! `BUSY`)"). Incremental batches (§4.6 "Incremental batch mode") do not
//! hold this lock — only a full cycle does.

use glidepath_core::error::GlidepathError;
use tokio::sync::{Mutex, OwnedMutexGuard};

use std::sync::Arc;

/// Advisory, process-wide mutual exclusion for full planning cycles.
/// Backed by a real `tokio::sync::Mutex` rather than a `bool` flag, so the
/// guard itself enforces release on drop (including on panic unwind).
#[derive(Debug, Clone)]
pub struct PlanningLock {
    inner: Arc<Mutex<()>>,
}

/// Held for the duration of one full cycle; dropping it releases the lock.
#[derive(Debug)]
pub struct PlanningLockGuard(#[allow(dead_code)] OwnedMutexGuard<()>);

impl Default for PlanningLock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanningLock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(())),
        }
    }

    /// Returns `Err(GlidepathError::Busy)` immediately if another full
    /// cycle already holds the lock; never blocks.
    pub fn try_acquire(&self) -> Result<PlanningLockGuard, GlidepathError> {
        self.inner
            .clone()
            .try_lock_owned()
            .map(PlanningLockGuard)
            .map_err(|_| GlidepathError::Busy)
    }
}
