//! Domain error types
//!
//! This module defines the error hierarchy for fbaudit.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main fbaudit error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum FbAuditError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// FlashBlade management API errors
    #[error("Array API error: {0}")]
    ArrayApi(#[from] ArrayApiError),

    /// CSV output errors
    #[error("Output error: {0}")]
    Output(String),

    /// Checkpoint persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Logging setup errors
    #[error("Logging error: {0}")]
    Logging(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// FlashBlade management API errors
///
/// Errors that occur when talking to an array's REST API.
/// These errors don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum ArrayApiError {
    /// Failed to reach the array
    #[error("Failed to connect to array: {0}")]
    ConnectionFailed(String),

    /// Login was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Login succeeded but no session token came back
    #[error("Login response did not include an x-auth-token header")]
    MissingSessionToken,

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Body could not be decoded or lacked a required key
    #[error("Invalid response from array: {0}")]
    InvalidResponse(String),
}

impl ArrayApiError {
    /// Classifies a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            Self::ServerError { status, message }
        } else {
            Self::ClientError { status, message }
        }
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FbAuditError {
    fn from(err: toml::de::Error) -> Self {
        FbAuditError::Configuration(format!("TOML parse error: {err}"))
    }
}
