//! State management for incremental collection
//!
//! Each target's last fetched record name is kept in the configuration file
//! and used as the `start` marker of the next run.

pub mod manager;

pub use manager::StateManager;
