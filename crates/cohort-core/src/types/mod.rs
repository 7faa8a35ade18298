//! Shared value types for the session core.

pub mod activity;

pub use activity::{ActiveIpInfo, ActivityContext, IpActivity, UpsertOutcome};
