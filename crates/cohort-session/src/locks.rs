//! Per-user admission locks.
//!
//! Admission for a given user must be linearizable, but a global lock
//! would serialize unrelated traffic. A keyed registry of Tokio mutexes
//! gives each user their own lock; events for different users never
//! contend.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use cohort_core::error::AppError;
use cohort_core::result::AppResult;

/// Registry of per-user admission locks.
#[derive(Debug, Default)]
pub struct UserLocks {
    /// One mutex per user with in-flight or recent admissions.
    inner: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl UserLocks {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the admission lock for `user_id`, waiting at most
    /// `timeout`.
    ///
    /// Timing out is reported as a lock-timeout error, distinct from any
    /// quota decision, and leaves no state behind.
    pub async fn acquire(
        &self,
        user_id: Uuid,
        timeout: Duration,
    ) -> AppResult<OwnedMutexGuard<()>> {
        let lock = self
            .inner
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                AppError::lock_timeout(format!(
                    "Admission lock for user {user_id} not acquired within {timeout:?}"
                ))
            })
    }

    /// Drops registry entries whose lock is currently uncontended.
    ///
    /// A strong count of one means only the registry holds the mutex:
    /// no guard is alive and no acquirer is waiting.
    pub fn prune(&self) {
        self.inner.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of users currently tracked in the registry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
