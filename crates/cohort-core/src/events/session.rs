//! Session admission and eviction events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to active-IP admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A new IP was admitted for a user.
    IpAdmitted {
        /// The user ID.
        user_id: Uuid,
        /// The admitted IP address.
        ip: String,
    },
    /// An IP was evicted to satisfy the active-IP quota.
    ///
    /// Subscribers holding sessions bound to the evicted IP are expected
    /// to invalidate them.
    IpEvicted {
        /// The user ID.
        user_id: Uuid,
        /// The evicted IP address.
        ip: String,
        /// Why the IP was evicted.
        reason: String,
    },
    /// An IP's activity record was removed by an explicit revocation
    /// (logout, administrative action).
    IpRevoked {
        /// The user ID.
        user_id: Uuid,
        /// The revoked IP address.
        ip: String,
    },
    /// The cleanup sweep removed aged-out activity records.
    ActivityPurged {
        /// How many records were removed.
        removed: u64,
    },
}
