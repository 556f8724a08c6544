//! FlashBlade adapter implementation
//!
//! This module provides the integration with FlashBlade management APIs:
//! the `AuditApi` trait, the reqwest-based client, and API models.

mod api;
pub mod client;
pub mod models;

pub use api::{AuditApi, SessionToken};
pub use client::FlashBladeClient;
pub use models::{ArrayItem, AuditItem, ItemsResponse};
