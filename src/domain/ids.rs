//! Domain identifier types
//!
//! Newtype wrappers that keep sequence markers from being mixed up with
//! other strings read out of the configuration store.

use std::fmt;

/// Sequence marker of the last audit record fetched for a target
///
/// The marker is the opaque `name` of an audit record. It is sent back to the
/// array verbatim as the `start` query parameter. `"0"` is the initial
/// marker and means "from the beginning".
///
/// # Examples
///
/// ```
/// use fbaudit::domain::ids::SequenceMarker;
///
/// let marker = SequenceMarker::initial();
/// assert!(marker.is_initial());
///
/// let marker = SequenceMarker::new("a3");
/// assert_eq!(marker.as_str(), "a3");
/// assert!(!marker.is_initial());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceMarker(String);

impl SequenceMarker {
    /// Marker value used before anything has been fetched
    pub const INITIAL: &'static str = "0";

    /// Creates a marker from a stored value
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    /// The "from the beginning" marker
    pub fn initial() -> Self {
        Self(Self::INITIAL.to_string())
    }

    /// Builds a marker from an optional stored value, defaulting to the initial marker
    pub fn from_stored(value: Option<String>) -> Self {
        value.map_or_else(Self::initial, Self::new)
    }

    /// True when no record has ever been checkpointed for the target
    pub fn is_initial(&self) -> bool {
        self.0 == Self::INITIAL
    }

    /// Returns the marker as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SequenceMarker {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for SequenceMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SequenceMarker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
