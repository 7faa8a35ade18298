//! Activity store trait and provider dispatch.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use cohort_core::config::store::ActivityStoreConfig;
use cohort_core::error::AppError;
use cohort_core::result::AppResult;
use cohort_core::types::{ActivityContext, IpActivity, UpsertOutcome};

use crate::memory::MemoryActivityStore;
#[cfg(feature = "redis-store")]
use crate::redis::RedisActivityStore;

/// Durable mapping from (user, ip) to last-seen activity.
///
/// Implementations must be thread-safe and must never move a row's
/// `last_seen` backwards. All operations are idempotent with respect to
/// the (user, ip) key; backend failures surface as storage errors, never
/// as partial success.
#[async_trait]
pub trait ActivityStore: Send + Sync + std::fmt::Debug {
    /// Creates or refreshes the last-seen row for (user, ip).
    ///
    /// An event whose `seen_at` predates the stored timestamp reports
    /// [`UpsertOutcome::Stale`] and leaves the row untouched.
    async fn upsert(
        &self,
        user_id: Uuid,
        ip: &str,
        seen_at: DateTime<Utc>,
        context: &ActivityContext,
    ) -> AppResult<UpsertOutcome>;

    /// Returns the rows whose `last_seen` falls within `window`, sorted
    /// by `last_seen` descending, ties broken by ascending IP string.
    async fn list_active(&self, user_id: Uuid, window: Duration) -> AppResult<Vec<IpActivity>>;

    /// Returns the stored `last_seen` for (user, ip), aged-out rows
    /// included.
    async fn last_seen(&self, user_id: Uuid, ip: &str) -> AppResult<Option<DateTime<Utc>>>;

    /// Removes the row for (user, ip). Returns `true` if a row existed.
    async fn remove(&self, user_id: Uuid, ip: &str) -> AppResult<bool>;

    /// Bulk-deletes rows last seen before `older_than`, across all users.
    /// Returns the number of rows removed.
    async fn purge_stale(&self, older_than: DateTime<Utc>) -> AppResult<u64>;
}

/// Dispatcher for activity store providers.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub enum ActivityStoreDispatch {
    /// In-memory store (single node).
    Memory(MemoryActivityStore),
    /// Redis-based store (multi-node).
    #[cfg(feature = "redis-store")]
    Redis(RedisActivityStore),
}

impl ActivityStoreDispatch {
    /// Create an activity store from configuration.
    pub async fn new(config: &ActivityStoreConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "memory" => {
                info!("Initializing in-memory activity store");
                Ok(Self::Memory(MemoryActivityStore::new()))
            }
            #[cfg(feature = "redis-store")]
            "redis" => {
                info!("Initializing Redis activity store");
                let store = RedisActivityStore::connect(&config.redis).await?;
                Ok(Self::Redis(store))
            }
            other => Err(AppError::configuration(format!(
                "Unknown activity store provider: '{other}'. Supported: memory, redis"
            ))),
        }
    }
}

#[async_trait]
impl ActivityStore for ActivityStoreDispatch {
    async fn upsert(
        &self,
        user_id: Uuid,
        ip: &str,
        seen_at: DateTime<Utc>,
        context: &ActivityContext,
    ) -> AppResult<UpsertOutcome> {
        match self {
            Self::Memory(inner) => inner.upsert(user_id, ip, seen_at, context).await,
            #[cfg(feature = "redis-store")]
            Self::Redis(inner) => inner.upsert(user_id, ip, seen_at, context).await,
        }
    }

    async fn list_active(&self, user_id: Uuid, window: Duration) -> AppResult<Vec<IpActivity>> {
        match self {
            Self::Memory(inner) => inner.list_active(user_id, window).await,
            #[cfg(feature = "redis-store")]
            Self::Redis(inner) => inner.list_active(user_id, window).await,
        }
    }

    async fn last_seen(&self, user_id: Uuid, ip: &str) -> AppResult<Option<DateTime<Utc>>> {
        match self {
            Self::Memory(inner) => inner.last_seen(user_id, ip).await,
            #[cfg(feature = "redis-store")]
            Self::Redis(inner) => inner.last_seen(user_id, ip).await,
        }
    }

    async fn remove(&self, user_id: Uuid, ip: &str) -> AppResult<bool> {
        match self {
            Self::Memory(inner) => inner.remove(user_id, ip).await,
            #[cfg(feature = "redis-store")]
            Self::Redis(inner) => inner.remove(user_id, ip).await,
        }
    }

    async fn purge_stale(&self, older_than: DateTime<Utc>) -> AppResult<u64> {
        match self {
            Self::Memory(inner) => inner.purge_stale(older_than).await,
            #[cfg(feature = "redis-store")]
            Self::Redis(inner) => inner.purge_stale(older_than).await,
        }
    }
}
