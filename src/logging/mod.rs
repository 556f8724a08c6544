//! Logging and observability
//!
//! This module provides the run log:
//! - Append-only, timestamped lines in the configured log file
//! - Level column in multi-array mode, none in legacy mode
//! - Console output on stderr, filtered by `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use fbaudit::logging::{init_logging, LogStyle};
//!
//! let _guard = init_logging("./audit-fb.log".as_ref(), LogStyle::Leveled)
//!     .expect("Failed to initialize logging");
//!
//! tracing::info!("Run started");
//! tracing::error!(array = "FlashBlade-2", "Login failed");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LogStyle, LoggingGuard, RunLogFormat, TIMESTAMP_FORMAT};

/// Log a target that was skipped because one of its steps failed
///
/// # Example
///
/// ```no_run
/// use fbaudit::log_target_failure;
/// use fbaudit::core::collect::{FailureStage, TargetFailure};
///
/// let failure = TargetFailure::new("FlashBlade-2", FailureStage::Authentication, "401");
/// log_target_failure!(&failure);
/// ```
#[macro_export]
macro_rules! log_target_failure {
    ($failure:expr) => {
        tracing::error!(
            array = %$failure.target,
            stage = %$failure.stage,
            error = %$failure.message,
            "Skipping target"
        );
    };
}

/// Log the number of records appended for a target
///
/// # Example
///
/// ```no_run
/// use fbaudit::log_entries_loaded;
///
/// log_entries_loaded!("FlashBlade-1", 3, "a3");
/// ```
#[macro_export]
macro_rules! log_entries_loaded {
    ($target:expr, $count:expr, $marker:expr) => {
        tracing::info!(
            array = %$target,
            last = %$marker,
            "Loaded {} entries",
            $count
        );
    };
}
