//! Shared helpers for admission integration tests. Each test target uses
//! a subset of these.
#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;

use cohort_activity::MemoryActivityStore;
use cohort_core::config::session::{EvictPolicy, SessionConfig};
use cohort_core::types::ActivityContext;
use cohort_session::AdmissionCoordinator;

/// Initializes test tracing output once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Builds a session config with a wide freshness window.
pub fn config(quota: u32, policy: EvictPolicy) -> SessionConfig {
    SessionConfig {
        max_active_ips: quota,
        evict_policy: policy,
        freshness_window_minutes: 60,
        lock_timeout_ms: 1000,
        cleanup_interval_minutes: 15,
    }
}

/// Builds a coordinator over a fresh in-memory store, returning both so
/// tests can seed and inspect the store directly.
pub fn coordinator(config: SessionConfig) -> (Arc<MemoryActivityStore>, AdmissionCoordinator) {
    init_tracing();
    let store = Arc::new(MemoryActivityStore::new());
    let coordinator = AdmissionCoordinator::new(store.clone(), config);
    (store, coordinator)
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("test IP should parse")
}

pub fn ctx() -> ActivityContext {
    ActivityContext {
        user_agent: Some("Mozilla/5.0 (integration test)".to_string()),
        browser: Some("Firefox".to_string()),
        device: Some("desktop".to_string()),
    }
}
