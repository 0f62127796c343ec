//! Domain models and types for resend.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`], [`TargetName`])
//! - **Record models** ([`Record`], [`BusinessKeys`], [`ReplayRecord`])
//! - **Error types** ([`ResendError`], [`SearchError`], [`DispatchError`])
//! - **Result type alias** ([`Result`])
//! - **Error context** ([`context::ResultExt`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ResendError>`]:
//!
//! ```rust
//! use resend::domain::{ResendError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = resend::config::load_config("resend.toml")?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

pub use errors::{DispatchError, ResendError, SearchError};
pub use ids::{RecordId, TargetName};
pub use record::{BusinessKeys, Record, ReplayRecord};
pub use result::Result;
