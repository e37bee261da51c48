//! Serialization primitives for reconciliation.
//!
//! - [`OrgLocks`]: one async mutex per organization URI, held across the
//!   read-decide-write section so the on-demand path and the sweep never
//!   interleave on the same organization. Entries live only while held.
//! - [`SweepGuard`]: at most one sweep per process; later starts are skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct OrgLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Exclusive access to one organization. The table entry is removed on
/// release when nobody else holds or waits for it.
pub struct OrgLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    organization_uri: String,
}

impl OrgLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one organization.
    pub async fn lock(&self, organization_uri: &str) -> OrgLockGuard {
        let mutex = self
            .inner
            .entry(organization_uri.to_string())
            .or_default()
            .clone();
        let guard = mutex.lock_owned().await;
        OrgLockGuard {
            guard: Some(guard),
            locks: self.inner.clone(),
            organization_uri: organization_uri.to_string(),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.len()
    }
}

impl Drop for OrgLockGuard {
    fn drop(&mut self) {
        // release first so our own Arc no longer counts
        drop(self.guard.take());
        self.locks
            .remove_if(&self.organization_uri, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[derive(Clone, Default)]
pub struct SweepGuard {
    running: Arc<AtomicBool>,
}

/// Held for the duration of a sweep; releases the guard on drop.
#[must_use]
pub struct SweepPermit {
    running: Arc<AtomicBool>,
}

impl SweepGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` when a sweep is already running.
    pub fn try_start(&self) -> Option<SweepPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepPermit {
                running: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for SweepPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
