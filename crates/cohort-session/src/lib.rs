//! # cohort-session
//!
//! Active-IP quota enforcement: the pure quota policy engine, the
//! decision-time view over stored activity, per-user admission locks,
//! and the admission coordinator that ties them together over an
//! [`cohort_activity::ActivityStore`].

pub mod admission;
pub mod cleanup;
pub mod locks;
pub mod policy;
pub mod view;

pub use admission::{AdmissionCoordinator, AdmissionResult};
pub use cleanup::ActivityCleanup;
pub use locks::UserLocks;
pub use policy::{Decision, decide};
