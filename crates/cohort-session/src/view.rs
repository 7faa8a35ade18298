//! Decision-time view over stored activity rows.

use cohort_core::types::{ActiveIpInfo, IpActivity};

/// Projects store rows into the ordered active-IP view, marking the
/// candidate IP of the in-flight activity event as current.
///
/// Rows are re-sorted by `last_seen` descending with ties broken by
/// ascending IP string, so the view's ordering does not depend on the
/// store backend.
pub fn build_view(rows: &[IpActivity], candidate: Option<&str>) -> Vec<ActiveIpInfo> {
    let mut view: Vec<ActiveIpInfo> = rows
        .iter()
        .map(|row| row.to_active_info(candidate.is_some_and(|ip| ip == row.ip)))
        .collect();

    view.sort_by(|a, b| b.last_seen.cmp(&a.last_seen).then_with(|| a.ip.cmp(&b.ip)));
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn row(ip: &str, t: i64) -> IpActivity {
        IpActivity {
            user_id: Uuid::nil(),
            ip: ip.to_string(),
            last_seen: Utc.timestamp_opt(t, 0).unwrap(),
            user_agent: None,
            browser: None,
            device: None,
        }
    }

    #[test]
    fn test_ordering_is_recency_then_ip() {
        let rows = vec![row("b", 100), row("c", 200), row("a", 100)];
        let view = build_view(&rows, None);
        let ips: Vec<&str> = view.iter().map(|info| info.ip.as_str()).collect();
        assert_eq!(ips, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_candidate_is_marked_current() {
        let rows = vec![row("a", 100), row("b", 100)];
        let view = build_view(&rows, Some("b"));
        assert!(!view.iter().find(|i| i.ip == "a").unwrap().is_current);
        assert!(view.iter().find(|i| i.ip == "b").unwrap().is_current);
    }
}
