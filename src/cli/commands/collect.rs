//! Collect command implementation
//!
//! Loads the configuration, sets up the run log and collects every target.

use crate::cli::{EXIT_FATAL, EXIT_SUCCESS};
use crate::config::targets::DEFAULT_LOG_FILE;
use crate::config::{log_file_path, ConfigStore, RunMode};
use crate::core::collect::CollectCoordinator;
use crate::domain::{FbAuditError, Result};
use crate::logging::{init_logging, LogStyle};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for a collection run
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Path to the configuration file
    #[arg(value_name = "CONF_FILE")]
    pub config: PathBuf,
}

impl CollectArgs {
    /// Execute a collection run
    ///
    /// Returns the process exit code. The run log is flushed before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns an error only when the run log cannot be set up; every other
    /// failure is written to the run log and reported through the exit code.
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let loaded = ConfigStore::load(&self.config);

        let (log_path, style) = match &loaded {
            Ok(store) => (
                log_file_path(store),
                LogStyle::for_mode(RunMode::detect(store)),
            ),
            Err(_) => (PathBuf::from(DEFAULT_LOG_FILE), LogStyle::Leveled),
        };

        let guard = init_logging(&log_path, style)
            .with_context(|| format!("Failed to set up run log {}", log_path.display()))?;

        let exit_code = run(loaded).await;

        drop(guard);
        Ok(exit_code)
    }
}

async fn run(loaded: Result<ConfigStore>) -> i32 {
    tracing::info!("Run started");

    let store = match loaded {
        Ok(store) => store,
        Err(e) => return fatal(&e),
    };

    let mut coordinator = match CollectCoordinator::new(store) {
        Ok(coordinator) => coordinator,
        Err(e) => return fatal(&e),
    };

    let summary = coordinator.execute().await;
    summary.log_summary();

    tracing::info!("Run completed");
    EXIT_SUCCESS
}

fn fatal(error: &FbAuditError) -> i32 {
    tracing::error!("{error}");
    tracing::error!("Run failed");
    EXIT_FATAL
}
