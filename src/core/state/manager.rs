//! State manager for checkpoint persistence
//!
//! Checkpoints live in the configuration file itself: after a target's rows
//! are flushed, its marker key is updated and the whole file is rewritten.

use crate::config::{CheckpointKey, ConfigStore};
use crate::domain::{FbAuditError, Result, SequenceMarker};

/// State manager for sequence markers
///
/// Owns the configuration store for the duration of a run so that every
/// checkpoint is written against the same in-memory view.
#[derive(Debug)]
pub struct StateManager {
    store: ConfigStore,
}

impl StateManager {
    /// Create a state manager over a loaded store
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    /// The store as currently held in memory
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Store `marker` under `key` and rewrite the configuration file
    ///
    /// # Arguments
    ///
    /// * `target` - Target name, used for logging
    /// * `key` - Location of the marker
    /// * `marker` - Name of the last record written
    ///
    /// # Errors
    ///
    /// Returns a checkpoint error if the store cannot be updated or saved.
    pub fn checkpoint(
        &mut self,
        target: &str,
        key: &CheckpointKey,
        marker: &SequenceMarker,
    ) -> Result<()> {
        tracing::debug!(
            array = %target,
            section = %key.section,
            key = %key.key,
            marker = %marker,
            "Checkpointing target"
        );

        self.store
            .set(&key.section, &key.key, marker.as_str())
            .map_err(|e| FbAuditError::Checkpoint(format!("{target}: {e}")))?;

        self.store.save().map_err(|e| match e {
            FbAuditError::Checkpoint(message) => {
                FbAuditError::Checkpoint(format!("{target}: {message}"))
            }
            other => FbAuditError::Checkpoint(format!("{target}: {other}")),
        })
    }
}
