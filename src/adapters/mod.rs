//! External system integrations for fbaudit.
//!
//! - [`flashblade`] - FlashBlade management REST API (login, arrays, audits)
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind a trait
//! ([`flashblade::AuditApi`]) so the collector can be tested with in-memory
//! implementations.

pub mod flashblade;
