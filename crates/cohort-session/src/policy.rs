//! Quota policy engine.
//!
//! A single pure function over the decision-time view. All I/O and
//! locking live in the admission coordinator; nothing here can fail.

use cohort_core::config::session::EvictPolicy;
use cohort_core::types::ActiveIpInfo;

/// Outcome of a quota decision for one candidate IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The candidate is already active, or the quota has room.
    Admit,
    /// The candidate is new and the quota is saturated; evict the named
    /// IP to make room.
    AdmitWithEviction {
        /// The least-recently-active IP, ties broken by smallest IP string.
        evicted_ip: String,
    },
    /// The candidate is new, the quota is saturated, and the policy
    /// denies new IPs.
    Deny,
}

/// Decides whether `candidate` may establish activity given the current
/// active-IP view.
///
/// An already-active candidate is always admitted without counting toward
/// the quota check; repeat activity from an active IP must never evict or
/// deny — a user's only session would otherwise evict itself. Eviction
/// picks the entry with the smallest `last_seen`, ties broken by the
/// lexicographically smallest IP string, so the outcome is reproducible
/// when timestamps collide. A quota of zero denies every new IP under
/// both policies.
pub fn decide(
    active: &[ActiveIpInfo],
    candidate: &str,
    quota: u32,
    policy: EvictPolicy,
) -> Decision {
    if active.iter().any(|info| info.ip == candidate) {
        return Decision::Admit;
    }

    // A zero quota admits nothing new; eviction cannot make room.
    if quota == 0 {
        return Decision::Deny;
    }

    if (active.len() as u32) < quota {
        return Decision::Admit;
    }

    match policy {
        EvictPolicy::DenyNew => Decision::Deny,
        EvictPolicy::EvictOldest => {
            let victim = active
                .iter()
                .filter(|info| !info.is_current)
                .min_by(|a, b| a.last_seen.cmp(&b.last_seen).then_with(|| a.ip.cmp(&b.ip)));

            match victim {
                Some(victim) => Decision::AdmitWithEviction {
                    evicted_ip: victim.ip.clone(),
                },
                // Saturated with nothing evictable; denying preserves the
                // quota rather than admitting past it.
                None => Decision::Deny,
            }
        }
    }
}
