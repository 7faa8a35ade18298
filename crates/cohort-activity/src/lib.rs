//! # cohort-activity
//!
//! Durable mapping from (user, ip) to last-seen activity. Provides the
//! [`ActivityStore`] contract, an in-memory implementation for single-node
//! deployments, and a Redis implementation (feature `redis-store`) for
//! multi-node deployments.

pub mod keys;
pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis;
pub mod store;

pub use memory::MemoryActivityStore;
#[cfg(feature = "redis-store")]
pub use redis::RedisActivityStore;
pub use store::{ActivityStore, ActivityStoreDispatch};
