//! Audit API trait definition
//!
//! This module defines the `AuditApi` trait that abstracts the management
//! API of an array. The collector only depends on this trait, so it can run
//! against the real REST client or an in-memory fake.

use crate::config::SecretString;
use crate::domain::{ArrayIdentity, AuditRecord, Result, SequenceMarker};
use async_trait::async_trait;
use secrecy::ExposeSecret;

/// Short-lived session credential returned by a login call
///
/// Scoped to one target and one run; never persisted.
#[derive(Debug, Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wraps a token taken from the `x-auth-token` response header
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }

    /// Header value to send on authenticated calls
    pub fn header_value(&self) -> &str {
        self.0.expose_secret().as_ref()
    }
}

/// Trait for array management APIs that expose an audit log
#[async_trait]
pub trait AuditApi: Send + Sync {
    /// Exchanges a long-lived API token for a session token
    ///
    /// # Errors
    ///
    /// Returns an error if the array is unreachable, rejects the login, or
    /// does not return a session token.
    async fn authenticate(&self, base_url: &str, api_token: &SecretString)
        -> Result<SessionToken>;

    /// Fetches the array's name, id and version
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an
    /// undecodable/empty response.
    async fn array_identity(&self, base_url: &str, session: &SessionToken)
        -> Result<ArrayIdentity>;

    /// Fetches one page of audit records starting at `marker`
    ///
    /// The marker is sent verbatim; whether the record it names is included
    /// again is up to the array.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an
    /// undecodable response.
    async fn audits_since(
        &self,
        base_url: &str,
        session: &SessionToken,
        marker: &SequenceMarker,
    ) -> Result<Vec<AuditRecord>>;
}
