//! Activity tracking value types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One IP's activity record as observed at decision time.
///
/// `is_current` marks the IP associated with the activity event being
/// processed right now. It is not necessarily the most recent entry by
/// timestamp; the flag disambiguates same-timestamp races.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveIpInfo {
    /// The originating IP address.
    pub ip: String,
    /// When activity from this IP was last observed.
    pub last_seen: DateTime<Utc>,
    /// Whether this IP belongs to the activity event under decision.
    pub is_current: bool,
}

/// One persisted last-seen row, unique on (user_id, ip).
///
/// Upserted on every activity event for the pair; removed only by
/// eviction, explicit revocation, or the cleanup sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpActivity {
    /// The user this record belongs to.
    pub user_id: Uuid,
    /// The originating IP address.
    pub ip: String,
    /// When activity from this (user, ip) pair was last observed.
    /// Monotonically non-decreasing.
    pub last_seen: DateTime<Utc>,
    /// Raw user agent string from the last activity event.
    pub user_agent: Option<String>,
    /// Parsed browser name, if the caller resolved one.
    pub browser: Option<String>,
    /// Device class (desktop, mobile, tablet, ...).
    pub device: Option<String>,
}

impl IpActivity {
    /// Whether this record still counts toward the active set.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.last_seen) <= window
    }

    /// Project this row into the decision-time view.
    pub fn to_active_info(&self, is_current: bool) -> ActiveIpInfo {
        ActiveIpInfo {
            ip: self.ip.clone(),
            last_seen: self.last_seen,
            is_current,
        }
    }
}

/// Transient per-event request metadata carried alongside an activity
/// event. Never persisted directly; used to populate the last-seen row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityContext {
    /// Raw user agent string.
    pub user_agent: Option<String>,
    /// Parsed browser name.
    pub browser: Option<String>,
    /// Device class.
    pub device: Option<String>,
}

/// Outcome of an activity store upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    /// A new (user, ip) row was created.
    Inserted,
    /// An existing row's timestamp and metadata were refreshed.
    Refreshed,
    /// The event's timestamp predates the stored one; the row was left
    /// untouched.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(last_seen: DateTime<Utc>) -> IpActivity {
        IpActivity {
            user_id: Uuid::nil(),
            ip: "10.0.0.1".to_string(),
            last_seen,
            user_agent: None,
            browser: None,
            device: None,
        }
    }

    #[test]
    fn test_freshness_boundary() {
        let now = Utc::now();
        let window = Duration::minutes(30);

        assert!(row(now).is_fresh(now, window));
        assert!(row(now - Duration::minutes(30)).is_fresh(now, window));
        assert!(!row(now - Duration::minutes(31)).is_fresh(now, window));
    }

    #[test]
    fn test_to_active_info() {
        let now = Utc::now();
        let info = row(now).to_active_info(true);
        assert_eq!(info.ip, "10.0.0.1");
        assert_eq!(info.last_seen, now);
        assert!(info.is_current);
    }
}
