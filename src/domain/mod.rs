//! Domain models and types for fbaudit.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Audit models** ([`AuditRecord`], [`ArrayIdentity`])
//! - **Checkpoint marker** ([`SequenceMarker`])
//! - **Error types** ([`FbAuditError`], [`ArrayApiError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, FbAuditError>`]:
//!
//! ```rust
//! use fbaudit::domain::{FbAuditError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(FbAuditError::Configuration("FlashBlade-2 section is missing".to_string()))
//! }
//! ```

pub mod audit;
pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use audit::{ArrayIdentity, AuditRecord, NO_USER_AGENT};
pub use errors::{ArrayApiError, FbAuditError};
pub use ids::SequenceMarker;
pub use result::Result;
