//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{MatchMode, ResendConfig};
use super::secret::secret_string;
use crate::domain::errors::ResendError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ResendConfig`]
/// 4. Applies environment variable overrides (`RESEND_*` prefix)
/// 5. Validates the configuration
///
/// # Examples
///
/// ```no_run
/// use resend::config::loader::load_config;
///
/// let config = load_config("resend.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ResendConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ResendError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ResendError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ResendConfig = toml::from_str(&contents)
        .map_err(|e| ResendError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ResendError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left alone. Every referenced variable that is not set is
/// reported in a single error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ResendError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(ResendError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the `RESEND_*` prefix
///
/// Variables follow `RESEND_<SECTION>_<KEY>`, e.g. `RESEND_SEARCH_URL`.
fn apply_env_overrides(config: &mut ResendConfig) {
    if let Ok(val) = std::env::var("RESEND_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Search overrides
    if let Ok(val) = std::env::var("RESEND_SEARCH_URL") {
        config.search.url = val;
    }
    if let Ok(val) = std::env::var("RESEND_SEARCH_TOKEN") {
        config.search.token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("RESEND_SEARCH_AUTH_SCHEME") {
        config.search.auth_scheme = val;
    }
    if let Ok(val) = std::env::var("RESEND_SEARCH_KEEP_ALIVE") {
        config.search.keep_alive = val;
    }
    if let Ok(val) = std::env::var("RESEND_SEARCH_PAGE_SIZE") {
        if let Ok(size) = val.parse() {
            config.search.page_size = size;
        }
    }
    if let Ok(val) = std::env::var("RESEND_SEARCH_TLS_VERIFY") {
        config.search.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("RESEND_SEARCH_MATCH_MODE") {
        match val.to_lowercase().as_str() {
            "exact" => config.search.match_mode = MatchMode::Exact,
            "analyzed" => config.search.match_mode = MatchMode::Analyzed,
            other => tracing::warn!(value = %other, "Ignoring unknown RESEND_SEARCH_MATCH_MODE"),
        }
    }

    // Replay overrides
    if let Ok(val) = std::env::var("RESEND_REPLAY_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.replay.batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("RESEND_REPLAY_BATCH_DELAY_MS") {
        if let Ok(delay) = val.parse() {
            config.replay.batch_delay_ms = delay;
        }
    }
    if let Ok(val) = std::env::var("RESEND_REPLAY_SOURCE_HOST") {
        config.replay.source_host = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("RESEND_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("RESEND_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
