//! Concurrent session / active-IP quota configuration.

use serde::{Deserialize, Serialize};

/// Active-IP quota enforcement configuration.
///
/// Read once per admission call, so a configuration reload between calls
/// is always observed atomically within a single decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of simultaneously active IPs per user.
    #[serde(default = "default_max_active_ips")]
    pub max_active_ips: u32,
    /// Policy applied when a new IP arrives and the quota is saturated.
    #[serde(default)]
    pub evict_policy: EvictPolicy,
    /// Minutes after which an IP's last-seen record no longer counts
    /// toward the active set.
    #[serde(default = "default_freshness_window")]
    pub freshness_window_minutes: u64,
    /// Default timeout in milliseconds for acquiring the per-user
    /// admission lock.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// Interval for the stale activity cleanup sweep in minutes.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_active_ips: default_max_active_ips(),
            evict_policy: EvictPolicy::default(),
            freshness_window_minutes: default_freshness_window(),
            lock_timeout_ms: default_lock_timeout(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

impl SessionConfig {
    /// The freshness window as a `chrono::Duration`.
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.freshness_window_minutes as i64)
    }

    /// The default admission lock timeout as a `std::time::Duration`.
    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Policy applied when a user's active-IP quota is saturated and a new IP
/// attempts to establish activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictPolicy {
    /// Deny the new IP.
    DenyNew,
    /// Evict the least-recently-active IP to make room.
    EvictOldest,
}

impl Default for EvictPolicy {
    fn default() -> Self {
        Self::DenyNew
    }
}

impl std::fmt::Display for EvictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvictPolicy::DenyNew => write!(f, "deny_new"),
            EvictPolicy::EvictOldest => write!(f, "evict_oldest"),
        }
    }
}

fn default_max_active_ips() -> u32 {
    3
}

fn default_freshness_window() -> u64 {
    30
}

fn default_lock_timeout() -> u64 {
    5000
}

fn default_cleanup_interval() -> u64 {
    15
}
