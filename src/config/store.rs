//! Sectioned key-value configuration store
//!
//! The configuration file is a TOML document whose top-level tables are
//! sections. Every scalar inside a section is exposed as a string, so
//! `fbcount = 2` and `fbcount = "2"` read the same way.
//!
//! The store is loaded once per run, mutated in memory when a checkpoint is
//! taken and then written back in full to the file it came from.
//!
//! Values may reference environment variables as `${VAR_NAME}`. References
//! are resolved on read only; the raw text is what gets saved. Sections and
//! keys are saved in the order they were read, new ones last.

use crate::domain::errors::FbAuditError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use toml::{Table, Value};

/// In-memory view of the configuration file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    table: Table,
}

impl ConfigStore {
    /// Loads the store from a TOML file
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file does not exist, cannot be
    /// read, or is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fbaudit::config::ConfigStore;
    ///
    /// let store = ConfigStore::load("fbaudit.toml").expect("config");
    /// let count = store.get("default", "fbcount").expect("resolvable");
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FbAuditError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            FbAuditError::Configuration(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(path, &contents)
    }

    /// Builds a store from TOML text, bound to `path` for later saves
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self> {
        let table: Table = toml::from_str(contents)?;
        Ok(Self {
            path: path.into(),
            table,
        })
    }

    /// Path the store was loaded from and will be saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Does a section with this name exist
    pub fn has_section(&self, section: &str) -> bool {
        matches!(self.table.get(section), Some(Value::Table(_)))
    }

    /// Does `key` exist in `section` with a scalar value
    pub fn has(&self, section: &str, key: &str) -> bool {
        self.raw(section, key).is_some()
    }

    /// Returns the value of `key` in `section`, with `${VAR}` references resolved
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the value references an environment
    /// variable that is not set.
    pub fn get(&self, section: &str, key: &str) -> Result<Option<String>> {
        match self.raw(section, key) {
            Some(raw) => substitute_env_vars(&raw).map(Some).map_err(|missing| {
                FbAuditError::Configuration(format!(
                    "[{section}] {key} references unset environment variables: {}",
                    missing.join(", ")
                ))
            }),
            None => Ok(None),
        }
    }

    /// Returns the value of `key` in `section` exactly as stored
    ///
    /// No `${VAR}` substitution. Checkpoint markers are opaque and read
    /// through here.
    pub fn get_raw(&self, section: &str, key: &str) -> Option<String> {
        self.raw(section, key)
    }

    /// Returns the value of `key` in `section`, or `default` when absent
    pub fn get_or(&self, section: &str, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get(section, key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Sets a string value, creating the section if it does not exist
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `section` names a top-level key that
    /// is not a table.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) -> Result<()> {
        let entry = self
            .table
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));

        match entry {
            Value::Table(section_table) => {
                section_table.insert(key.to_string(), Value::String(value.into()));
                Ok(())
            }
            _ => Err(FbAuditError::Configuration(format!(
                "'{section}' is not a section and cannot hold '{key}'"
            ))),
        }
    }

    /// Writes the whole store back to its file
    ///
    /// # Errors
    ///
    /// Returns a checkpoint error if serialization or the write fails.
    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string(&self.table)
            .map_err(|e| FbAuditError::Serialization(format!("Failed to render TOML: {e}")))?;

        fs::write(&self.path, contents).map_err(|e| {
            FbAuditError::Checkpoint(format!(
                "Failed to write configuration file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn raw(&self, section: &str, key: &str) -> Option<String> {
        let section_table = self.table.get(section)?.as_table()?;
        match section_table.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Datetime(d) => Some(d.to_string()),
            Value::Array(_) | Value::Table(_) => None,
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Returns the names of every unset variable on failure.
fn substitute_env_vars(input: &str) -> std::result::Result<String, Vec<String>> {
    let mut missing_vars = Vec::new();

    let resolved = env_var_pattern().replace_all(input, |caps: &regex::Captures<'_>| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                if !missing_vars.iter().any(|v| v == var_name) {
                    missing_vars.push(var_name.to_string());
                }
                String::new()
            }
        }
    });

    if missing_vars.is_empty() {
        Ok(resolved.into_owned())
    } else {
        Err(missing_vars)
    }
}
