//! Stale activity cleanup.
//!
//! Freshness filtering in the active-IP view is the correctness
//! mechanism; this sweep only bounds storage growth by deleting rows
//! that aged out of the window. Periodic scheduling is the host's
//! concern.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use cohort_activity::ActivityStore;
use cohort_core::config::session::SessionConfig;
use cohort_core::events::{DomainEvent, SessionEvent};
use cohort_core::result::AppResult;

use crate::locks::UserLocks;

/// Handles one cleanup cycle over the activity store.
#[derive(Debug, Clone)]
pub struct ActivityCleanup {
    /// Activity snapshot store.
    store: Arc<dyn ActivityStore>,
    /// Per-user admission locks, pruned alongside the store sweep.
    locks: Arc<UserLocks>,
    /// Quota settings (for the freshness window).
    settings: Arc<RwLock<SessionConfig>>,
    /// Event channel shared with the coordinator.
    events: broadcast::Sender<DomainEvent>,
}

impl ActivityCleanup {
    /// Creates a new cleanup handler.
    pub fn new(
        store: Arc<dyn ActivityStore>,
        locks: Arc<UserLocks>,
        settings: Arc<RwLock<SessionConfig>>,
        events: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            store,
            locks,
            settings,
            events,
        }
    }

    /// Runs one cleanup cycle, deleting all rows older than the
    /// freshness window and pruning idle lock entries.
    ///
    /// Returns the number of rows removed.
    pub async fn run_cleanup(&self) -> AppResult<u64> {
        let window = self.settings.read().await.freshness_window();
        let cutoff = Utc::now() - window;

        let removed = self.store.purge_stale(cutoff).await?;
        self.locks.prune();

        if removed > 0 {
            info!(removed, "Activity cleanup completed");
            let _ = self
                .events
                .send(DomainEvent::new(SessionEvent::ActivityPurged { removed }));
        }

        Ok(removed)
    }
}
