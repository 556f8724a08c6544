//! FlashBlade REST API models
//!
//! Response structures for the `/api/1.9` endpoints. These models are
//! separate from the domain models and only handle deserialization.
//!
//! Purity returns most audit fields as strings, but older releases are known
//! to send numbers or `null` for some of them. String-typed fields therefore
//! accept any JSON scalar and render it as text (`null` becomes empty).

use crate::domain::{ArrayIdentity, AuditRecord};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Envelope shared by the list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsResponse<T> {
    /// Returned items; the key is required
    pub items: Vec<T>,
}

/// One entry of `GET /api/1.9/arrays`
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayItem {
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,

    #[serde(deserialize_with = "scalar_string")]
    pub id: String,

    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
}

impl From<ArrayItem> for ArrayIdentity {
    fn from(item: ArrayItem) -> Self {
        Self {
            name: item.name,
            id: item.id,
            version: item.version,
        }
    }
}

/// One entry of `GET /api/1.9/audits`
#[derive(Debug, Clone, Deserialize)]
pub struct AuditItem {
    /// Epoch milliseconds
    #[serde(deserialize_with = "epoch_millis")]
    pub time: i64,

    #[serde(deserialize_with = "scalar_string")]
    pub user: String,

    #[serde(deserialize_with = "scalar_string")]
    pub command: String,

    #[serde(deserialize_with = "scalar_string")]
    pub subcommand: String,

    #[serde(deserialize_with = "scalar_string")]
    pub arguments: String,

    #[serde(deserialize_with = "scalar_string")]
    pub ip_address: String,

    #[serde(deserialize_with = "scalar_string")]
    pub user_interface: String,

    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub user_agent: Option<String>,

    /// Sequence identifier
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,
}

impl From<AuditItem> for AuditRecord {
    fn from(item: AuditItem) -> Self {
        Self {
            time_ms: item.time,
            user: item.user,
            command: item.command,
            subcommand: item.subcommand,
            arguments: item.arguments,
            ip_address: item.ip_address,
            user_interface: item.user_interface,
            user_agent: item.user_agent,
            name: item.name,
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_to_string(Value::deserialize(deserializer)?)
        .ok_or_else(|| de::Error::custom("expected a string, number, boolean or null"))
}

fn optional_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        other => scalar_to_string(other)
            .map(Some)
            .ok_or_else(|| de::Error::custom("expected a string, number, boolean or null")),
    }
}

fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_i64()
        .or_else(|| number.as_f64().map(|f| f.floor() as i64))
        .ok_or_else(|| de::Error::custom(format!("time {number} is out of range")))
}
