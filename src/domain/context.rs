//! Error context extension trait
//!
//! `.context()` / `.with_context()` for `Result<T, E>` where `E` converts into
//! [`ResendError`], so library code can add context without switching to
//! `anyhow`.
//!
//! # Examples
//!
//! ```rust
//! use resend::domain::Result;
//! use resend::domain::context::ResultExt;
//!
//! fn read_query(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read query file {path}"))
//! }
//! ```

use crate::domain::errors::ResendError;
use crate::domain::result::Result;

/// Adds context to an error while keeping it a [`ResendError`]
pub trait ResultExt<T> {
    /// Prefixes the error with `context`
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Like [`ResultExt::context`], but only builds the context on error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ResendError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// I/O errors keep their variant so callers can still tell them apart
fn wrap(error: ResendError, context: impl std::fmt::Display) -> ResendError {
    match error {
        ResendError::Io(message) => ResendError::Io(format!("{context}: {message}")),
        other => ResendError::Other(format!("{context}: {other}")),
    }
}
