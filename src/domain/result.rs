//! Result type alias for resend

use super::errors::ResendError;

/// Result type alias for resend operations
///
/// # Examples
///
/// ```
/// use resend::domain::result::Result;
/// use resend::domain::errors::ResendError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ResendError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ResendError>;
