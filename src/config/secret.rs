//! Secure credential handling using the secrecy crate
//!
//! API tokens read from the configuration store and session tokens returned
//! by an array's login call are held in [`SecretString`]. Memory is zeroed on
//! drop and `Debug` output is redacted, so a token never ends up in the run
//! log by accident.
//!
//! # Example
//!
//! ```rust
//! use fbaudit::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("T-12345".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "T-12345");
//!
//! // Debug output is redacted
//! assert!(!format!("{token:?}").contains("T-12345"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Type alias for a secret string
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
