//! In-memory activity store using a Tokio mutex for single-node deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use cohort_core::result::AppResult;
use cohort_core::types::{ActivityContext, IpActivity, UpsertOutcome};

use crate::store::ActivityStore;

/// One stored last-seen entry. The IP is the map key.
#[derive(Debug, Clone)]
struct Entry {
    last_seen: DateTime<Utc>,
    user_agent: Option<String>,
    browser: Option<String>,
    device: Option<String>,
}

impl Entry {
    fn to_activity(&self, user_id: Uuid, ip: &str) -> IpActivity {
        IpActivity {
            user_id,
            ip: ip.to_string(),
            last_seen: self.last_seen,
            user_agent: self.user_agent.clone(),
            browser: self.browser.clone(),
            device: self.device.clone(),
        }
    }
}

/// In-memory activity store using a Tokio mutex for thread safety.
///
/// Suitable for single-node deployments only.
#[derive(Debug, Clone, Default)]
pub struct MemoryActivityStore {
    /// Per-user last-seen rows keyed by IP string.
    state: Arc<Mutex<HashMap<Uuid, HashMap<String, Entry>>>>,
}

impl MemoryActivityStore {
    /// Creates a new empty in-memory activity store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn upsert(
        &self,
        user_id: Uuid,
        ip: &str,
        seen_at: DateTime<Utc>,
        context: &ActivityContext,
    ) -> AppResult<UpsertOutcome> {
        let mut state = self.state.lock().await;
        let rows = state.entry(user_id).or_default();

        let outcome = match rows.get(ip) {
            Some(existing) if existing.last_seen > seen_at => {
                return Ok(UpsertOutcome::Stale);
            }
            Some(_) => UpsertOutcome::Refreshed,
            None => UpsertOutcome::Inserted,
        };

        rows.insert(
            ip.to_string(),
            Entry {
                last_seen: seen_at,
                user_agent: context.user_agent.clone(),
                browser: context.browser.clone(),
                device: context.device.clone(),
            },
        );

        Ok(outcome)
    }

    async fn list_active(&self, user_id: Uuid, window: Duration) -> AppResult<Vec<IpActivity>> {
        let state = self.state.lock().await;
        let now = Utc::now();

        let mut rows: Vec<IpActivity> = state
            .get(&user_id)
            .map(|rows| {
                rows.iter()
                    .map(|(ip, entry)| entry.to_activity(user_id, ip))
                    .filter(|row| row.is_fresh(now, window))
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| b.last_seen.cmp(&a.last_seen).then_with(|| a.ip.cmp(&b.ip)));

        Ok(rows)
    }

    async fn last_seen(&self, user_id: Uuid, ip: &str) -> AppResult<Option<DateTime<Utc>>> {
        let state = self.state.lock().await;
        Ok(state
            .get(&user_id)
            .and_then(|rows| rows.get(ip))
            .map(|entry| entry.last_seen))
    }

    async fn remove(&self, user_id: Uuid, ip: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;

        let Some(rows) = state.get_mut(&user_id) else {
            return Ok(false);
        };

        let removed = rows.remove(ip).is_some();
        if rows.is_empty() {
            state.remove(&user_id);
        }

        Ok(removed)
    }

    async fn purge_stale(&self, older_than: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut removed = 0u64;

        state.retain(|_, rows| {
            rows.retain(|_, entry| {
                let keep = entry.last_seen >= older_than;
                if !keep {
                    removed += 1;
                }
                keep
            });
            !rows.is_empty()
        });

        if removed > 0 {
            debug!(removed, "Purged stale activity rows");
        }

        Ok(removed)
    }
}
