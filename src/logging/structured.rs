//! Run log setup using tracing
//!
//! Every run appends timestamped lines to the run log file. The line layout
//! depends on the configuration layout in use:
//!
//! ```text
//! 2026-10-19 06:00:01: Run started                 (legacy)
//! 2026-10-19 06:00:01:  INFO: Run started          (multi-array)
//! ```
//!
//! Structured fields are appended after the message as `key=value`.
//! A second, human-oriented layer writes to stderr, filtered by `RUST_LOG`.

use crate::config::RunMode;
use crate::domain::{FbAuditError, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Timestamp layout shared with the CSV `date_time` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Only this crate's INFO and above reach the run log
const RUN_LOG_FILTER: &str = "fbaudit=info";

/// Console default when `RUST_LOG` is unset
const CONSOLE_FILTER: &str = "fbaudit=warn";

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Create a new logging guard
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// Line layout of the run log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// `<timestamp>: <message>`
    Plain,
    /// `<timestamp>: <level>: <message>`
    Leveled,
}

impl LogStyle {
    /// Legacy configs keep the level-less layout
    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Legacy => Self::Plain,
            RunMode::MultiArray => Self::Leveled,
        }
    }
}

/// Event formatter producing run log lines
#[derive(Debug, Clone, Copy)]
pub struct RunLogFormat {
    style: LogStyle,
}

impl RunLogFormat {
    /// Formatter for the given layout
    pub fn new(style: LogStyle) -> Self {
        Self { style }
    }
}

impl<S, N> FormatEvent<S, N> for RunLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);

        match self.style {
            LogStyle::Plain => write!(writer, "{timestamp}: ")?,
            LogStyle::Leveled => write!(
                writer,
                "{timestamp}: {:>5}: ",
                event.metadata().level().as_str()
            )?,
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize the logging system
///
/// Opens (or creates) `log_file` in append mode and installs the global
/// subscriber.
///
/// # Returns
///
/// A `LoggingGuard` that must be kept alive until the run ends; dropping it
/// flushes pending lines.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
///
/// # Example
///
/// ```no_run
/// use fbaudit::logging::{init_logging, LogStyle};
///
/// let _guard = init_logging("./audit-fb.log".as_ref(), LogStyle::Leveled)
///     .expect("Failed to initialize logging");
/// tracing::info!("Run started");
/// ```
pub fn init_logging(log_file: &Path, style: LogStyle) -> Result<LoggingGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| {
            FbAuditError::Logging(format!(
                "Failed to open log file {}: {}",
                log_file.display(),
                e
            ))
        })?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(RunLogFormat::new(style))
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new(RUN_LOG_FILTER));

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_FILTER));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| FbAuditError::Logging(format!("Failed to install subscriber: {e}")))?;

    Ok(LoggingGuard::new(Some(guard)))
}
