//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for resend using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// resend - retrieve and replay integration platform messages
#[derive(Parser, Debug)]
#[command(name = "resend")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "resend.toml", env = "RESEND_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RESEND_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve matching messages and query, test or send them
    Replay(commands::replay::ReplayArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::replay::Action;

    #[test]
    fn test_cli_parse_replay() {
        let cli = Cli::parse_from([
            "resend",
            "replay",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-02",
            "--filter",
            "ScenarioName=ADT",
            "--filter",
            "BK.PatientId=P-1",
            "--action",
            "send",
            "--target",
            "ie-test",
            "--clean-envelope",
            "--new-ids",
        ]);
        assert_eq!(cli.config, "resend.toml");
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay command");
        };
        assert_eq!(args.filters.len(), 2);
        assert_eq!(args.action, Action::Send);
        assert_eq!(args.target.as_deref(), Some("ie-test"));
        assert!(args.clean_envelope);
        assert!(args.new_ids);
        assert!(!args.step);
    }

    #[test]
    fn test_cli_replay_defaults_to_query() {
        let cli = Cli::parse_from(["resend", "replay", "--from", "a", "--to", "b"]);
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay command");
        };
        assert_eq!(args.action, Action::Query);
        assert!(args.filters.is_empty());
    }

    #[test]
    fn test_cli_parse_with_config_and_log_level() {
        let cli = Cli::parse_from([
            "resend",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "validate-config",
        ]);
        assert_eq!(cli.config, "custom.toml");
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["resend", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_rejects_unknown_action() {
        let parsed = Cli::try_parse_from([
            "resend", "replay", "--from", "a", "--to", "b", "--action", "delete",
        ]);
        assert!(parsed.is_err());
    }
}
