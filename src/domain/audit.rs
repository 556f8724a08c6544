//! Audit domain models
//!
//! An [`AuditRecord`] is one administrative event logged by a FlashBlade.
//! In multi-array runs every record is annotated with the
//! [`ArrayIdentity`] of the array it came from.

use super::ids::SequenceMarker;
use chrono::{DateTime, Local, TimeZone};

/// Placeholder written when a record carries no user agent
pub const NO_USER_AGENT: &str = "No_user_agent";

/// One audit-log entry fetched from an array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Event time in epoch milliseconds
    pub time_ms: i64,

    /// User that issued the command
    pub user: String,

    /// Command name
    pub command: String,

    /// Subcommand name
    pub subcommand: String,

    /// Raw argument string, written verbatim
    pub arguments: String,

    /// Source IP address
    pub ip_address: String,

    /// Channel the command came through (CLI, GUI, REST...)
    pub user_interface: String,

    /// HTTP user agent, when the array recorded one
    pub user_agent: Option<String>,

    /// Opaque sequence identifier, becomes the next checkpoint
    pub name: String,
}

impl AuditRecord {
    /// Event time in the local timezone, truncated to whole seconds
    ///
    /// Returns `None` when the timestamp is outside chrono's range.
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        let secs = self.time_ms.div_euclid(1000);
        Local.timestamp_opt(secs, 0).single()
    }

    /// User agent, or [`NO_USER_AGENT`] when absent
    pub fn user_agent_or_placeholder(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(NO_USER_AGENT)
    }

    /// Marker to store once this record has been written
    pub fn sequence_marker(&self) -> SequenceMarker {
        SequenceMarker::new(self.name.clone())
    }
}

/// Array metadata attached to every record in multi-array mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArrayIdentity {
    /// Array name
    pub name: String,

    /// Array id
    pub id: String,

    /// Purity//FB version
    pub version: String,
}
