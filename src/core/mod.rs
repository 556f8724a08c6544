//! Core business logic for fbaudit.
//!
//! # Modules
//!
//! - [`collect`] - Run orchestration and per-target error isolation
//! - [`output`] - CSV layouts and the append-only sink
//! - [`state`] - Sequence marker checkpoints kept in the config file
//!
//! # Collection Workflow
//!
//! For every target, in order:
//!
//! 1. **Resolve**: Read the target's address, token, marker and output file
//! 2. **Login**: Exchange the API token for a session token
//! 3. **Fetch**: Array identity (multi-array only), then audit records after the marker
//! 4. **Append**: Write CSV rows, with a header when one is owed
//! 5. **Checkpoint**: Store the last record's name and rewrite the config file
//!
//! A failure in any step skips the target and is reported in the summary.
//!
//! # Example
//!
//! ```rust,no_run
//! use fbaudit::config::ConfigStore;
//! use fbaudit::core::collect::CollectCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ConfigStore::load("fbaudit.toml")?;
//! let mut coordinator = CollectCoordinator::new(store)?;
//!
//! let summary = coordinator.execute().await;
//! println!("Succeeded: {}", summary.succeeded());
//! println!("Failed: {}", summary.failed());
//! # Ok(())
//! # }
//! ```

pub mod collect;
pub mod output;
pub mod state;
