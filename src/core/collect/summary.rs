//! Run summary and reporting
//!
//! This module defines structures for tracking per-target results of a run.

use crate::domain::SequenceMarker;
use std::fmt;
use std::time::Duration;

/// Step of a target cycle that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Missing or invalid per-target settings
    Configuration,
    /// Login rejected or unreachable
    Authentication,
    /// Array identity or audit records could not be fetched
    Fetch,
    /// CSV file could not be opened or written
    Output,
    /// Marker could not be stored
    Checkpoint,
}

impl FailureStage {
    /// Lowercase name used in log lines
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::Fetch => "fetch",
            Self::Output => "output",
            Self::Checkpoint => "checkpoint",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    /// Section name of the target
    pub target: String,

    /// Step that failed
    pub stage: FailureStage,

    /// Error message
    pub message: String,
}

impl TargetFailure {
    /// Create a new target failure
    pub fn new(target: impl Into<String>, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.target, self.stage, self.message)
    }
}

/// A target that completed its cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Records were appended and the marker advanced
    Collected {
        /// Section name of the target
        target: String,
        /// Number of rows appended
        records: usize,
        /// Marker now stored for the target
        marker: SequenceMarker,
    },
    /// The array had nothing after the stored marker
    NoNewEntries {
        /// Section name of the target
        target: String,
    },
}

impl TargetOutcome {
    /// Number of rows appended
    pub fn records(&self) -> usize {
        match self {
            Self::Collected { records, .. } => *records,
            Self::NoNewEntries { .. } => 0,
        }
    }
}

/// Result of one target cycle
pub type TargetResult = std::result::Result<TargetOutcome, TargetFailure>;

/// Summary of a collection run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Per-target results, in processing order
    pub outcomes: Vec<TargetResult>,

    /// Duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record one target's result
    pub fn record(&mut self, result: TargetResult) {
        self.outcomes.push(result);
    }

    /// Targets that appended records
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| matches!(r, Ok(TargetOutcome::Collected { .. })))
            .count()
    }

    /// Targets with nothing new
    pub fn empty(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| matches!(r, Ok(TargetOutcome::NoNewEntries { .. })))
            .count()
    }

    /// Targets that were skipped because of an error
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|r| r.is_err()).count()
    }

    /// Failures, in processing order
    pub fn failures(&self) -> impl Iterator<Item = &TargetFailure> {
        self.outcomes.iter().filter_map(|r| r.as_ref().err())
    }

    /// Rows appended across all targets
    pub fn records_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(TargetOutcome::records)
            .sum()
    }

    /// Check if every target completed
    pub fn is_successful(&self) -> bool {
        self.failed() == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            succeeded = self.succeeded(),
            no_new_entries = self.empty(),
            failed = self.failed(),
            records_written = self.records_written(),
            duration_ms = self.duration.as_millis() as u64,
            "Run summary"
        );

        if !self.is_successful() {
            tracing::warn!(
                failed = self.failed(),
                "Some targets were skipped"
            );
        }
    }
}
