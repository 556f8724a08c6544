//! Collection orchestration
//!
//! This module drives a run across every configured target:
//! - Per-target cycle (login, fetch, append, checkpoint)
//! - Per-target error isolation
//! - Summary and reporting

pub mod coordinator;
pub mod summary;

pub use coordinator::CollectCoordinator;
pub use summary::{FailureStage, RunSummary, TargetFailure, TargetOutcome, TargetResult};
