//! Integration tests for admission coordination over the in-memory store.

mod helpers;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use cohort_activity::ActivityStore;
use cohort_core::config::session::EvictPolicy;
use cohort_core::events::SessionEvent;

use helpers::{config, coordinator, ctx, ip};

#[tokio::test]
async fn quota_invariant_holds_after_every_admit() {
    let (_, coord) = coordinator(config(2, EvictPolicy::EvictOldest));
    let user = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(5);

    for (i, addr) in ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"]
        .iter()
        .enumerate()
    {
        let result = coord
            .admit(user, ip(addr), base + Duration::seconds(i as i64), &ctx())
            .await
            .unwrap();
        assert!(result.admitted);

        let active = coord.list_active_ips(user).await.unwrap();
        assert!(
            active.len() <= 2,
            "active-IP count {} exceeds quota after admitting {addr}",
            active.len()
        );
    }

    // The two most recent IPs survive
    let active = coord.list_active_ips(user).await.unwrap();
    let ips: Vec<&str> = active.iter().map(|i| i.ip.as_str()).collect();
    assert_eq!(ips, vec!["10.0.0.5", "10.0.0.4"]);
}

#[tokio::test]
async fn self_refresh_never_evicts_or_denies() {
    for policy in [EvictPolicy::DenyNew, EvictPolicy::EvictOldest] {
        let (_, coord) = coordinator(config(1, policy));
        let user = Uuid::new_v4();
        let base = Utc::now() - Duration::minutes(5);

        let first = coord.admit(user, ip("10.0.0.1"), base, &ctx()).await.unwrap();
        assert!(first.admitted);

        for i in 1..5 {
            let again = coord
                .admit(user, ip("10.0.0.1"), base + Duration::seconds(i), &ctx())
                .await
                .unwrap();
            assert!(again.admitted, "repeat activity denied under {policy}");
            assert_eq!(again.evicted_ip, None, "repeat activity evicted under {policy}");
        }

        assert_eq!(coord.list_active_ips(user).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn evicts_least_recently_active_ip() {
    let (store, coord) = coordinator(config(2, EvictPolicy::EvictOldest));
    let user = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(5);

    store
        .upsert(user, "1.1.1.1", base + Duration::seconds(100), &ctx())
        .await
        .unwrap();
    store
        .upsert(user, "2.2.2.2", base + Duration::seconds(50), &ctx())
        .await
        .unwrap();

    let result = coord
        .admit(user, ip("3.3.3.3"), base + Duration::seconds(200), &ctx())
        .await
        .unwrap();

    assert!(result.admitted);
    assert_eq!(result.evicted_ip.as_deref(), Some("2.2.2.2"));
    assert_eq!(store.last_seen(user, "2.2.2.2").await.unwrap(), None);
}

#[tokio::test]
async fn timestamp_tie_evicts_smallest_ip_string() {
    let base = Utc::now() - Duration::minutes(5);

    for _ in 0..10 {
        let (_, coord) = coordinator(config(2, EvictPolicy::EvictOldest));
        let user = Uuid::new_v4();

        coord.admit(user, ip("2.2.2.2"), base, &ctx()).await.unwrap();
        coord.admit(user, ip("1.1.1.1"), base, &ctx()).await.unwrap();

        let result = coord
            .admit(user, ip("3.3.3.3"), base + Duration::seconds(1), &ctx())
            .await
            .unwrap();
        assert_eq!(result.evicted_ip.as_deref(), Some("1.1.1.1"));
    }
}

#[tokio::test]
async fn deny_policy_leaves_store_unchanged() {
    let (store, coord) = coordinator(config(1, EvictPolicy::DenyNew));
    let user = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(5);

    coord.admit(user, ip("10.0.0.1"), base, &ctx()).await.unwrap();
    let before = coord.list_active_ips(user).await.unwrap();

    let result = coord
        .admit(user, ip("10.0.0.2"), base + Duration::seconds(1), &ctx())
        .await
        .unwrap();

    assert!(!result.admitted);
    assert_eq!(result.evicted_ip, None);
    assert_eq!(coord.list_active_ips(user).await.unwrap(), before);
    assert_eq!(store.last_seen(user, "10.0.0.2").await.unwrap(), None);
}

#[tokio::test]
async fn stale_event_is_discarded_without_regressing() {
    let (store, coord) = coordinator(config(3, EvictPolicy::DenyNew));
    let user = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(5);
    let newer = base + Duration::seconds(200);

    coord.admit(user, ip("10.0.0.1"), newer, &ctx()).await.unwrap();

    let stale = coord
        .admit(user, ip("10.0.0.1"), base + Duration::seconds(150), &ctx())
        .await
        .unwrap();

    // Discarded, not failed, and last-seen did not move backwards
    assert!(stale.admitted);
    assert_eq!(stale.evicted_ip, None);
    assert_eq!(store.last_seen(user, "10.0.0.1").await.unwrap(), Some(newer));
}

#[tokio::test]
async fn eviction_event_reaches_subscribers() {
    let (_, coord) = coordinator(config(1, EvictPolicy::EvictOldest));
    let user = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(5);
    let mut events = coord.subscribe();

    coord.admit(user, ip("10.0.0.1"), base, &ctx()).await.unwrap();
    coord
        .admit(user, ip("10.0.0.2"), base + Duration::seconds(1), &ctx())
        .await
        .unwrap();

    let mut evicted = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::IpEvicted { ip, reason, .. } = event.payload {
            evicted = Some((ip, reason));
        }
    }

    let (ip, reason) = evicted.expect("eviction event not emitted");
    assert_eq!(ip, "10.0.0.1");
    assert_eq!(reason, "active_ip_quota");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_users_admit_in_parallel() {
    let (_, coord) = coordinator(config(1, EvictPolicy::DenyNew));
    let coord = Arc::new(coord);
    let base = Utc::now() - Duration::minutes(5);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let coord = Arc::clone(&coord);
        handles.push(tokio::spawn(async move {
            let user = Uuid::new_v4();
            let result = coord.admit(user, ip("10.0.0.1"), base, &ctx()).await.unwrap();
            (user, result)
        }));
    }

    for handle in handles {
        let (user, result) = handle.await.unwrap();
        assert!(result.admitted);
        assert_eq!(coord.list_active_ips(user).await.unwrap().len(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_user_concurrent_admits_leave_one_active_ip() {
    let (_, coord) = coordinator(config(1, EvictPolicy::EvictOldest));
    let coord = Arc::new(coord);
    let user = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(5);

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let coord = Arc::clone(&coord);
        handles.push(tokio::spawn(async move {
            coord
                .admit(
                    user,
                    ip(&format!("10.0.0.{}", i + 1)),
                    base + Duration::milliseconds(i as i64),
                    &ctx(),
                )
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.admitted);
    }

    // Exactly one IP survives with quota 1, no double-eviction
    let active = coord.list_active_ips(user).await.unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn revoke_removes_record_and_emits_event() {
    let (store, coord) = coordinator(config(3, EvictPolicy::DenyNew));
    let user = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(5);
    let mut events = coord.subscribe();

    coord.admit(user, ip("10.0.0.1"), base, &ctx()).await.unwrap();
    assert!(coord.revoke(user, "10.0.0.1").await.unwrap());
    assert!(!coord.revoke(user, "10.0.0.1").await.unwrap());
    assert_eq!(store.last_seen(user, "10.0.0.1").await.unwrap(), None);

    let mut revoked = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event.payload, SessionEvent::IpRevoked { .. }) {
            revoked = true;
        }
    }
    assert!(revoked);
}

#[tokio::test]
async fn cleanup_purges_aged_rows() {
    let (store, coord) = coordinator(config(3, EvictPolicy::DenyNew));
    let user = Uuid::new_v4();
    let now = Utc::now();

    store
        .upsert(user, "10.0.0.1", now - Duration::hours(2), &ctx())
        .await
        .unwrap();
    store.upsert(user, "10.0.0.2", now, &ctx()).await.unwrap();

    let removed = coord.cleanup().run_cleanup().await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(store.last_seen(user, "10.0.0.1").await.unwrap(), None);
    assert!(store.last_seen(user, "10.0.0.2").await.unwrap().is_some());
}
