//! Configuration management for resend.
//!
//! `resend.toml` supports:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `RESEND_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`SearchConfig`] - search backend, paging and filter matching
//! - [`ReplayConfig`] - batch pacing, request timeout, record field names, header names
//! - `targets` - operator-maintained replay target table (name -> URL)
//! - [`LoggingConfig`] - local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [search]
//! url = "https://search.example.org:9200/messages-*/_search"
//! token = "${RESEND_SEARCH_TOKEN}"
//! match_mode = "exact"
//!
//! [replay]
//! batch_size = 10
//! batch_delay_ms = 1000
//!
//! [targets]
//! lab = "http://ie01.example.org:8080/lab/inbound"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, HeaderNames, LoggingConfig, MatchMode, ReplayConfig, ResendConfig,
    SearchConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
