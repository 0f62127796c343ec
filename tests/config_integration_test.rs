//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables share ENV_MUTEX so they do
//! not interfere with each other.

use resend::config::{load_config, MatchMode};
use resend::domain::ResendError;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("RESEND_APPLICATION_LOG_LEVEL");
    std::env::remove_var("RESEND_SEARCH_URL");
    std::env::remove_var("RESEND_SEARCH_PAGE_SIZE");
    std::env::remove_var("RESEND_SEARCH_MATCH_MODE");
    std::env::remove_var("RESEND_REPLAY_BATCH_SIZE");
    std::env::remove_var("RESEND_REPLAY_BATCH_DELAY_MS");
    std::env::remove_var("TEST_RESEND_SEARCH_TOKEN");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let toml_content = r#"
[application]
log_level = "debug"

[search]
url = "https://search.example.org:9200/messages-*/_search"
auth_scheme = "ApiKey"
token = "tok-123"
keep_alive = "5m"
page_size = 250
timeout_seconds = 45
tls_verify = false
timestamp_field = "ReceiveTimestamp"
match_mode = "analyzed"
group_field = "ScenarioName"

[replay]
batch_size = 20
batch_delay_ms = 500
pause_poll_ms = 100
timeout_seconds = 15
source_host = "replay-host"
payload_field = "Body"
message_id_field = "MsgId"

[replay.headers]
provenance = "X-Origin"

[targets]
ie-test = "https://ie-test.example.org:8443/replay"
ie-prod = "https://ie-prod.example.org:8443/replay"

[logging]
local_enabled = false
local_path = "/tmp/resend"
local_rotation = "hourly"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");

    assert_eq!(config.search.auth_scheme, "ApiKey");
    assert_eq!(
        config.search.token.as_ref().unwrap().expose_secret().as_ref(),
        "tok-123"
    );
    assert_eq!(config.search.keep_alive, "5m");
    assert_eq!(config.search.page_size, 250);
    assert_eq!(config.search.timeout_seconds, 45);
    assert!(!config.search.tls_verify);
    assert_eq!(config.search.timestamp_field, "ReceiveTimestamp");
    assert_eq!(config.search.match_mode, MatchMode::Analyzed);
    assert_eq!(config.search.group_field, "ScenarioName");

    assert_eq!(config.replay.batch_size, 20);
    assert_eq!(config.replay.batch_delay_ms, 500);
    assert_eq!(config.replay.pause_poll_ms, 100);
    assert_eq!(config.replay.source_host, "replay-host");
    assert_eq!(config.replay.payload_field, "Body");
    assert_eq!(config.replay.message_id_field, "MsgId");
    assert_eq!(config.replay.headers.provenance, "X-Origin");
    assert_eq!(config.replay.headers.business_keys, "X-Business-Keys");

    assert_eq!(config.targets.len(), 2);
    assert_eq!(
        config.target_url(" ie-prod "),
        Some("https://ie-prod.example.org:8443/replay")
    );
    assert_eq!(config.target_url("ie-dev"), None);

    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[search]
url = "http://localhost:9200/messages-*/_search"
"#,
    );
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(config.search.token.is_none());
    assert_eq!(config.search.page_size, 1000);
    assert_eq!(config.search.match_mode, MatchMode::Exact);
    assert_eq!(config.replay.batch_size, 10);
    assert_eq!(config.replay.batch_delay_ms, 1000);
    assert_eq!(config.replay.headers.message_id, "X-Message-Id");
    assert!(config.targets.is_empty());
}

#[test]
fn test_env_var_substitution() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_RESEND_SEARCH_TOKEN", "from-env");

    let temp_file = write_config(
        r#"
[search]
url = "https://search.example.org/messages/_search"
token = "${TEST_RESEND_SEARCH_TOKEN}"
"#,
    );
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(
        config.search.token.as_ref().unwrap().expose_secret().as_ref(),
        "from-env"
    );
    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[search]
url = "https://search.example.org/messages/_search"
token = "${TEST_RESEND_SEARCH_TOKEN}"
"#,
    );
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(matches!(err, ResendError::Configuration(_)));
    assert!(err.to_string().contains("TEST_RESEND_SEARCH_TOKEN"));
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("RESEND_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("RESEND_SEARCH_URL", "https://other.example.org/_search");
    std::env::set_var("RESEND_SEARCH_PAGE_SIZE", "50");
    std::env::set_var("RESEND_SEARCH_MATCH_MODE", "Analyzed");
    std::env::set_var("RESEND_REPLAY_BATCH_SIZE", "3");
    std::env::set_var("RESEND_REPLAY_BATCH_DELAY_MS", "0");

    let temp_file = write_config(
        r#"
[search]
url = "https://search.example.org/messages/_search"
page_size = 500

[replay]
batch_size = 25
"#,
    );
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.search.url, "https://other.example.org/_search");
    assert_eq!(config.search.page_size, 50);
    assert_eq!(config.search.match_mode, MatchMode::Analyzed);
    assert_eq!(config.replay.batch_size, 3);
    assert_eq!(config.replay.batch_delay_ms, 0);

    cleanup_env_vars();
}

#[test]
fn test_env_override_is_validated() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("RESEND_SEARCH_PAGE_SIZE", "0");

    let temp_file = write_config(
        r#"
[search]
url = "https://search.example.org/messages/_search"
"#,
    );
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("search.page_size"));

    cleanup_env_vars();
}

#[test]
fn test_invalid_configs_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        (
            "[search]\nurl = \"ftp://search.example.org\"\n",
            "search.url",
        ),
        (
            "[search]\nurl = \"http://localhost:9200/_search\"\n\n[replay]\npause_poll_ms = 0\n",
            "replay.pause_poll_ms",
        ),
        (
            "[search]\nurl = \"http://localhost:9200/_search\"\n\n[targets]\nbroken = \"ie01:8080\"\n",
            "targets.broken",
        ),
        (
            "[search]\nurl = \"http://localhost:9200/_search\"\n\n[application]\nlog_level = \"loud\"\n",
            "log_level",
        ),
    ];

    for (content, expected) in cases {
        let temp_file = write_config(content);
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in '{err}'"
        );
    }
}

#[test]
fn test_malformed_toml() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config("[search\nurl = ");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}
