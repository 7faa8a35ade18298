//! Session admission coordinator.
//!
//! The transactional boundary of the quota engine: serializes concurrent
//! admission decisions per user so the read-decide-write sequence is
//! atomic with respect to other admissions for the same user.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use cohort_activity::ActivityStore;
use cohort_core::config::session::SessionConfig;
use cohort_core::events::{DomainEvent, SessionEvent};
use cohort_core::result::AppResult;
use cohort_core::types::{ActiveIpInfo, ActivityContext, UpsertOutcome};

use crate::cleanup::ActivityCleanup;
use crate::locks::UserLocks;
use crate::policy::{Decision, decide};
use crate::view::build_view;

/// Eviction reason recorded on quota-driven evictions.
const QUOTA_EVICTION_REASON: &str = "active_ip_quota";

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Verdict returned to the caller for one activity event.
///
/// `admitted == false` is a quota decision, not an error; infrastructure
/// failures surface as `AppError` instead.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdmissionResult {
    /// Whether the activity event was admitted.
    pub admitted: bool,
    /// The IP evicted to make room, for the caller to invalidate
    /// externally-held sessions bound to it.
    pub evicted_ip: Option<String>,
}

impl AdmissionResult {
    fn admitted() -> Self {
        Self {
            admitted: true,
            evicted_ip: None,
        }
    }

    fn denied() -> Self {
        Self {
            admitted: false,
            evicted_ip: None,
        }
    }
}

/// Coordinates quota decisions over the activity store.
///
/// Holds one lock per user; activity events for different users proceed
/// fully in parallel. Quota settings are snapshotted once per call, so a
/// reload between calls is always observed atomically within a decision.
#[derive(Debug, Clone)]
pub struct AdmissionCoordinator {
    /// Activity snapshot store.
    store: Arc<dyn ActivityStore>,
    /// Per-user admission locks.
    locks: Arc<UserLocks>,
    /// Quota settings, reloadable between calls.
    settings: Arc<RwLock<SessionConfig>>,
    /// Eviction/admission event channel for external subscribers.
    events: broadcast::Sender<DomainEvent>,
}

impl AdmissionCoordinator {
    /// Creates a new admission coordinator.
    pub fn new(store: Arc<dyn ActivityStore>, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            locks: Arc::new(UserLocks::new()),
            settings: Arc::new(RwLock::new(config)),
            events,
        }
    }

    /// Subscribes to admission and eviction events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Replaces the quota settings. In-flight admissions keep the
    /// snapshot they started with.
    pub async fn update_settings(&self, config: SessionConfig) {
        *self.settings.write().await = config;
    }

    /// Builds the cleanup handler sharing this coordinator's store,
    /// locks, and settings.
    pub fn cleanup(&self) -> ActivityCleanup {
        ActivityCleanup::new(
            Arc::clone(&self.store),
            Arc::clone(&self.locks),
            Arc::clone(&self.settings),
            self.events.clone(),
        )
    }

    /// Processes one activity event using the configured lock timeout.
    pub async fn admit(
        &self,
        user_id: Uuid,
        ip: IpAddr,
        seen_at: DateTime<Utc>,
        context: &ActivityContext,
    ) -> AppResult<AdmissionResult> {
        let timeout = self.settings.read().await.lock_timeout();
        self.admit_with_timeout(user_id, ip, seen_at, context, timeout)
            .await
    }

    /// Processes one activity event, waiting at most `timeout` for the
    /// per-user admission lock.
    ///
    /// The store is mutated at most once per call, only under the lock,
    /// and never on `Deny`, timeout, or stale events. A failed store
    /// write is retried once while the lock is still held; if the retry
    /// also fails, the error propagates and nothing is reported admitted.
    pub async fn admit_with_timeout(
        &self,
        user_id: Uuid,
        ip: IpAddr,
        seen_at: DateTime<Utc>,
        context: &ActivityContext,
        timeout: Duration,
    ) -> AppResult<AdmissionResult> {
        let config = self.settings.read().await.clone();
        let _guard = self.locks.acquire(user_id, timeout).await?;

        let candidate = ip.to_string();

        // Reordered events must not move last-seen backwards. Checked
        // against the stored row rather than the windowed view, so a row
        // that aged out of the window still shields against regression.
        if let Some(stored) = self.store.last_seen(user_id, &candidate).await? {
            if stored > seen_at {
                debug!(
                    user_id = %user_id,
                    ip = %candidate,
                    stored = %stored,
                    event = %seen_at,
                    "Discarding stale activity event"
                );
                return Ok(AdmissionResult::admitted());
            }
        }

        let rows = self
            .store
            .list_active(user_id, config.freshness_window())
            .await?;
        let view = build_view(&rows, Some(&candidate));

        match decide(&view, &candidate, config.max_active_ips, config.evict_policy) {
            Decision::Admit => {
                let outcome = self
                    .upsert_with_retry(user_id, &candidate, seen_at, context)
                    .await?;

                if outcome == UpsertOutcome::Inserted {
                    self.emit(SessionEvent::IpAdmitted {
                        user_id,
                        ip: candidate.clone(),
                    });
                    info!(user_id = %user_id, ip = %candidate, "New IP admitted");
                }

                Ok(AdmissionResult::admitted())
            }
            Decision::AdmitWithEviction { evicted_ip } => {
                // Evict first so a failed candidate write cannot leave
                // the user over quota.
                self.remove_with_retry(user_id, &evicted_ip).await?;
                self.upsert_with_retry(user_id, &candidate, seen_at, context)
                    .await?;

                info!(
                    user_id = %user_id,
                    ip = %candidate,
                    evicted_ip = %evicted_ip,
                    "New IP admitted, least-recently-active IP evicted"
                );

                self.emit(SessionEvent::IpEvicted {
                    user_id,
                    ip: evicted_ip.clone(),
                    reason: QUOTA_EVICTION_REASON.to_string(),
                });
                self.emit(SessionEvent::IpAdmitted {
                    user_id,
                    ip: candidate,
                });

                Ok(AdmissionResult {
                    admitted: true,
                    evicted_ip: Some(evicted_ip),
                })
            }
            Decision::Deny => {
                info!(
                    user_id = %user_id,
                    ip = %candidate,
                    quota = config.max_active_ips,
                    "Activity denied: active-IP quota saturated"
                );
                Ok(AdmissionResult::denied())
            }
        }
    }

    /// Removes the activity record for (user, ip) by explicit request
    /// (logout, administrative action). Returns whether a record existed.
    pub async fn revoke(&self, user_id: Uuid, ip: &str) -> AppResult<bool> {
        let timeout = self.settings.read().await.lock_timeout();
        let _guard = self.locks.acquire(user_id, timeout).await?;

        let removed = self.remove_with_retry(user_id, ip).await?;

        if removed {
            info!(user_id = %user_id, ip = %ip, "Activity record revoked");
            self.emit(SessionEvent::IpRevoked {
                user_id,
                ip: ip.to_string(),
            });
        }

        Ok(removed)
    }

    /// Read-only view of the user's currently active IPs, most recent
    /// first. Does not take the admission lock.
    pub async fn list_active_ips(&self, user_id: Uuid) -> AppResult<Vec<ActiveIpInfo>> {
        let window = self.settings.read().await.freshness_window();
        let rows = self.store.list_active(user_id, window).await?;
        Ok(build_view(&rows, None))
    }

    async fn upsert_with_retry(
        &self,
        user_id: Uuid,
        ip: &str,
        seen_at: DateTime<Utc>,
        context: &ActivityContext,
    ) -> AppResult<UpsertOutcome> {
        match self.store.upsert(user_id, ip, seen_at, context).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(
                    user_id = %user_id,
                    ip = %ip,
                    error = %err,
                    "Activity upsert failed, retrying once"
                );
                self.store.upsert(user_id, ip, seen_at, context).await
            }
        }
    }

    async fn remove_with_retry(&self, user_id: Uuid, ip: &str) -> AppResult<bool> {
        match self.store.remove(user_id, ip).await {
            Ok(removed) => Ok(removed),
            Err(err) => {
                warn!(
                    user_id = %user_id,
                    ip = %ip,
                    error = %err,
                    "Activity removal failed, retrying once"
                );
                self.store.remove(user_id, ip).await
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Send only fails when no subscriber is attached.
        let _ = self.events.send(DomainEvent::new(event));
    }
}
