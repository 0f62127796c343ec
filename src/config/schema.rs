//! Configuration schema types
//!
//! This module defines the configuration structure that maps to `resend.toml`.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How record filters are matched against the search index
///
/// Exact matching targets the `<field>.keyword` sub-field, analyzed matching
/// runs a phrase match against the text field itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// `term` query on `<field>.keyword`
    #[default]
    Exact,
    /// `match_phrase` query on `<field>`
    Analyzed,
}

/// Main resend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Search backend configuration
    pub search: SearchConfig,

    /// Replay loop and request settings
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Operator-maintained replay target table (name -> URL)
    #[serde(default)]
    pub targets: BTreeMap<String, String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ResendConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.search.validate()?;
        self.replay.validate()?;

        for (name, url) in &self.targets {
            if name.trim().is_empty() {
                return Err("targets cannot contain an empty name".to_string());
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!(
                    "targets.{name} must start with http:// or https://, got '{url}'"
                ));
            }
        }

        self.logging.validate()?;
        Ok(())
    }

    /// Resolves a target name against the target table
    pub fn target_url(&self, name: &str) -> Option<&str> {
        self.targets.get(name.trim()).map(String::as_str)
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Search backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Full search URL including the index pattern, e.g.
    /// `https://search.example.org:9200/messages-*/_search`
    pub url: String,

    /// Authorization scheme prefix placed before the token
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Token for the authorization header (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Scroll keep-alive duration in backend syntax (e.g. `5m`)
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,

    /// Hits per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Timeout in seconds for each page request
    #[serde(default = "default_search_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Field holding the record timestamp; used for the range filter and sort
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,

    /// Filter matching strategy
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Field the `query` action groups its report by
    #[serde(default = "default_group_field")]
    pub group_field: String,
}

impl SearchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("search.url cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("search.url must start with http:// or https://".to_string());
        }

        if self.keep_alive.trim().is_empty() {
            return Err("search.keep_alive cannot be empty".to_string());
        }

        if !(1..=10_000).contains(&self.page_size) {
            return Err(format!(
                "search.page_size must be between 1 and 10000, got {}",
                self.page_size
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("search.timeout_seconds must be > 0".to_string());
        }

        if self.timestamp_field.trim().is_empty() {
            return Err("search.timestamp_field cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200/messages-*/_search".to_string(),
            auth_scheme: default_auth_scheme(),
            token: None,
            keep_alive: default_keep_alive(),
            page_size: default_page_size(),
            timeout_seconds: default_search_timeout_seconds(),
            tls_verify: true,
            timestamp_field: default_timestamp_field(),
            match_mode: MatchMode::default(),
            group_field: default_group_field(),
        }
    }
}

/// Replay loop and outbound request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Records per batch before the inter-batch delay
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Inter-batch delay in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Poll interval while paused or waiting, in milliseconds
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,

    /// Timeout in seconds for each replay call
    #[serde(default = "default_replay_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification for replay targets
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Fixed marker sent in the source-host header
    #[serde(default = "default_source_host")]
    pub source_host: String,

    /// Record field holding the payload text
    #[serde(default = "default_payload_field")]
    pub payload_field: String,

    /// Record field holding the original message identifier
    #[serde(default = "default_message_id_field")]
    pub message_id_field: String,

    /// Record field holding the embedded provenance document
    #[serde(default = "default_provenance_field")]
    pub provenance_field: String,

    /// Process state used when a record carries no provenance document
    #[serde(default = "default_fallback_state")]
    pub fallback_state: String,

    /// Outbound header names
    #[serde(default)]
    pub headers: HeaderNames,
}

impl ReplayConfig {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("replay.batch_size must be > 0".to_string());
        }

        if self.pause_poll_ms == 0 || self.pause_poll_ms > 5_000 {
            return Err(format!(
                "replay.pause_poll_ms must be between 1 and 5000, got {}",
                self.pause_poll_ms
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("replay.timeout_seconds must be > 0".to_string());
        }

        if self.payload_field.trim().is_empty() {
            return Err("replay.payload_field cannot be empty".to_string());
        }

        self.headers.validate()
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            pause_poll_ms: default_pause_poll_ms(),
            timeout_seconds: default_replay_timeout_seconds(),
            tls_verify: true,
            source_host: default_source_host(),
            payload_field: default_payload_field(),
            message_id_field: default_message_id_field(),
            provenance_field: default_provenance_field(),
            fallback_state: default_fallback_state(),
            headers: HeaderNames::default(),
        }
    }
}

/// Names of the headers attached to every replay call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderNames {
    #[serde(default = "default_provenance_header")]
    pub provenance: String,

    #[serde(default = "default_business_keys_header")]
    pub business_keys: String,

    #[serde(default = "default_source_host_header")]
    pub source_host: String,

    #[serde(default = "default_message_id_header")]
    pub message_id: String,

    /// Reserved for downstream grouping; always sent empty
    #[serde(default = "default_group_id_header")]
    pub group_id: String,

    /// Reserved for downstream grouping; always sent empty
    #[serde(default = "default_group_sequence_header")]
    pub group_sequence: String,
}

impl HeaderNames {
    fn validate(&self) -> Result<(), String> {
        let names = [
            &self.provenance,
            &self.business_keys,
            &self.source_host,
            &self.message_id,
            &self.group_id,
            &self.group_sequence,
        ];
        for name in names {
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
                return Err(format!(
                    "replay.headers: '{name}' is not a valid header name"
                ));
            }
        }
        Ok(())
    }
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            provenance: default_provenance_header(),
            business_keys: default_business_keys_header(),
            source_host: default_source_host_header(),
            message_id: default_message_id_header(),
            group_id: default_group_id_header(),
            group_sequence: default_group_sequence_header(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_auth_scheme() -> String {
    "Bearer".to_string()
}

fn default_keep_alive() -> String {
    "5m".to_string()
}

fn default_page_size() -> usize {
    1000
}

fn default_search_timeout_seconds() -> u64 {
    60
}

fn default_timestamp_field() -> String {
    "@timestamp".to_string()
}

fn default_group_field() -> String {
    "ScenarioName".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_pause_poll_ms() -> u64 {
    250
}

fn default_replay_timeout_seconds() -> u64 {
    30
}

fn default_source_host() -> String {
    "resend".to_string()
}

fn default_payload_field() -> String {
    "Payload".to_string()
}

fn default_message_id_field() -> String {
    "MessageId".to_string()
}

fn default_provenance_field() -> String {
    "Provenance".to_string()
}

fn default_fallback_state() -> String {
    "Resent".to_string()
}

fn default_provenance_header() -> String {
    "X-Provenance".to_string()
}

fn default_business_keys_header() -> String {
    "X-Business-Keys".to_string()
}

fn default_source_host_header() -> String {
    "X-Source-Host".to_string()
}

fn default_message_id_header() -> String {
    "X-Message-Id".to_string()
}

fn default_group_id_header() -> String {
    "X-Group-Id".to_string()
}

fn default_group_sequence_header() -> String {
    "X-Group-Sequence".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
