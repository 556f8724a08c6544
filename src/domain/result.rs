//! Result type alias for fbaudit

use super::errors::FbAuditError;

/// Result type alias for fbaudit operations
///
/// # Examples
///
/// ```
/// use fbaudit::domain::result::Result;
/// use fbaudit::domain::errors::FbAuditError;
///
/// fn example_function() -> Result<String> {
///     Ok("a1".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(FbAuditError::Configuration("missing fbcount".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, FbAuditError>;
