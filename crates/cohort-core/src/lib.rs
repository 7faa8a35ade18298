//! # cohort-core
//!
//! Core crate for the Cohort concurrent-session subsystem. Contains
//! configuration schemas, shared value types, domain events, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Cohort crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
