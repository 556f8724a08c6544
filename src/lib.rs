// fbaudit - FlashBlade audit-log collector
// Copyright (c) 2025 fbaudit Contributors
// Licensed under the MIT License

//! # fbaudit - FlashBlade audit-log collector
//!
//! fbaudit polls the management API of one or more FlashBlade arrays for
//! audit-log entries and appends them as CSV rows to a file watched by a
//! log-analysis system. It is meant to run from cron: each run resumes from
//! the last record fetched by the previous one.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (collection, CSV output, checkpoints)
//! - [`adapters`] - External integrations (FlashBlade REST API)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration store and target enumeration
//! - [`logging`] - Run log setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fbaudit::config::ConfigStore;
//! use fbaudit::core::collect::CollectCoordinator;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ConfigStore::load("fbaudit.toml")?;
//!     let mut coordinator = CollectCoordinator::new(store)?;
//!
//!     let summary = coordinator.execute().await;
//!     println!("Appended {} records", summary.records_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Incremental Collection
//!
//! Each target's last record `name` is written back into the configuration
//! file after its rows are flushed, and sent as the `start` marker on the
//! next run. Delivery is at-least-once: a crash between writing rows and
//! saving the marker re-appends those rows next time.
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`]. Pre-flight configuration errors
//! abort the run; everything that happens to a single target is isolated to
//! that target and reported in the [`core::collect::RunSummary`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
