//! FlashBlade REST client
//!
//! Implements [`AuditApi`] against the Purity//FB REST API 1.9:
//!
//! - `POST {base}/api/login` with an `api-token` header returns an
//!   `x-auth-token` session header
//! - `GET {base}/api/1.9/arrays` returns the array identity
//! - `GET {base}/api/1.9/audits?start=<marker>` returns audit records

use super::api::{AuditApi, SessionToken};
use super::models::{ArrayItem, AuditItem, ItemsResponse};
use crate::config::{secret_string, HttpSettings, SecretString};
use crate::domain::{ArrayApiError, ArrayIdentity, AuditRecord, FbAuditError, Result, SequenceMarker};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// REST API version used for data endpoints
pub const API_VERSION: &str = "1.9";

const API_TOKEN_HEADER: &str = "api-token";
const SESSION_HEADER: &str = "x-auth-token";
const USER_AGENT: &str = concat!("fbaudit/", env!("CARGO_PKG_VERSION"));

/// HTTP client for FlashBlade management APIs
///
/// One client is built per run and shared by every target. Certificate
/// verification is off unless the configuration turns it on, matching how
/// arrays ship with self-signed certificates.
///
/// # Example
///
/// ```no_run
/// use fbaudit::adapters::flashblade::{AuditApi, FlashBladeClient};
/// use fbaudit::config::{secret_string, HttpSettings};
/// use fbaudit::domain::SequenceMarker;
///
/// # async fn example() -> fbaudit::domain::Result<()> {
/// let client = FlashBladeClient::new(&HttpSettings::default())?;
/// let base = "https://10.20.10.21";
///
/// let session = client.authenticate(base, &secret_string("T-xxxx".to_string())).await?;
/// let records = client.audits_since(base, &session, &SequenceMarker::initial()).await?;
/// println!("{} records", records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FlashBladeClient {
    client: Client,
}

impl FlashBladeClient {
    /// Build the HTTP client with timeout and TLS settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TLS backend cannot be initialized.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT);

        if !settings.verify_tls {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            FbAuditError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client })
    }

    /// Send a request and turn transport failures and non-2xx statuses into errors
    async fn send(request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ArrayApiError::Timeout(format!("{what}: {e}"))
            } else {
                ArrayApiError::ConnectionFailed(format!("{what}: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArrayApiError::from_status(
                status.as_u16(),
                format!("{what} failed: {}", body.trim()),
            )
            .into());
        }

        Ok(response)
    }

    /// GET a list endpoint and decode its `items`
    async fn get_items<T: DeserializeOwned>(
        &self,
        url: &str,
        session: &SessionToken,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<Vec<T>> {
        let request = self
            .client
            .get(url)
            .header(SESSION_HEADER, session.header_value())
            .query(query);

        let response = Self::send(request, what).await?;
        let body = response.text().await.map_err(|e| {
            ArrayApiError::InvalidResponse(format!("{what}: failed to read body: {e}"))
        })?;

        let envelope: ItemsResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ArrayApiError::InvalidResponse(format!("{what}: {e}")))?;

        Ok(envelope.items)
    }
}

#[async_trait]
impl AuditApi for FlashBladeClient {
    async fn authenticate(
        &self,
        base_url: &str,
        api_token: &SecretString,
    ) -> Result<SessionToken> {
        let url = format!("{base_url}/api/login");
        tracing::debug!(url = %url, "Logging in");

        let request = self
            .client
            .post(&url)
            .header(API_TOKEN_HEADER, api_token.expose_secret().as_ref());

        let response = Self::send(request, "login")
            .await
            .map_err(|e| -> FbAuditError {
                match e {
                    FbAuditError::ArrayApi(ArrayApiError::ClientError { status, message }) => {
                        ArrayApiError::AuthenticationFailed(format!("{status} - {message}")).into()
                    }
                    other => other,
                }
            })?;

        let token = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ArrayApiError::MissingSessionToken)?;

        Ok(SessionToken::new(secret_string(token.to_string())))
    }

    async fn array_identity(
        &self,
        base_url: &str,
        session: &SessionToken,
    ) -> Result<ArrayIdentity> {
        let url = format!("{base_url}/api/{API_VERSION}/arrays");
        let items: Vec<ArrayItem> = self.get_items(&url, session, &[], "arrays").await?;

        items
            .into_iter()
            .next()
            .map(ArrayIdentity::from)
            .ok_or_else(|| {
                ArrayApiError::InvalidResponse("arrays: response contained no items".to_string())
                    .into()
            })
    }

    async fn audits_since(
        &self,
        base_url: &str,
        session: &SessionToken,
        marker: &SequenceMarker,
    ) -> Result<Vec<AuditRecord>> {
        let url = format!("{base_url}/api/{API_VERSION}/audits");
        tracing::debug!(url = %url, start = %marker, "Fetching audit records");

        let items: Vec<AuditItem> = self
            .get_items(&url, session, &[("start", marker.as_str())], "audits")
            .await?;

        Ok(items.into_iter().map(AuditRecord::from).collect())
    }
}
