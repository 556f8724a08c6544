//! Configuration management for fbaudit.
//!
//! The configuration file is both the run's settings and its state: the
//! sequence marker of every target is written back into it after each
//! successful collection.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fbaudit::config::{plan_run, ConfigStore};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ConfigStore::load("fbaudit.toml")?;
//! let plan = plan_run(&store)?;
//!
//! for target in &plan.targets {
//!     println!("{} (#{})", target.name, target.index);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! Use `${VAR_NAME}` syntax to keep API tokens out of the file:
//!
//! ```toml
//! [FlashBlade-1]
//! array_address = "https://10.20.10.21"
//! api-token = "${FB1_API_TOKEN}"
//! ```
//!
//! A `.env` file in the working directory is loaded at startup.

pub mod secret;
pub mod store;
pub mod targets;

// Re-export commonly used types
pub use secret::{secret_string, SecretString, SecretValue};
pub use store::ConfigStore;
pub use targets::{
    log_file_path, plan_run, resolve_target, CheckpointKey, HttpSettings, RunMode, RunPlan,
    SharedSink, TargetConfig, TargetSection,
};
