//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the resend configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Search URL: {}", config.search.url);
        println!(
            "  Search Token: {}",
            if config.search.token.is_some() {
                "set"
            } else {
                "not set"
            }
        );
        println!("  Page Size: {}", config.search.page_size);
        println!("  Match Mode: {:?}", config.search.match_mode);
        println!("  Batch Size: {}", config.replay.batch_size);
        println!("  Batch Delay: {} ms", config.replay.batch_delay_ms);
        if config.targets.is_empty() {
            println!("  Targets: none");
        } else {
            println!("  Targets:");
            for (name, url) in &config.targets {
                println!("    {name} -> {url}");
            }
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::init::SAMPLE_CONFIG;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_sample_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("/nonexistent/resend.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
