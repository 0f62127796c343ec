// resend - Integration Platform Message Replay Tool
// Copyright (c) 2025 resend Contributors
// Licensed under the MIT License

use clap::Parser;
use resend::cli::{Cli, Commands};
use resend::config::{load_config, LoggingConfig};
use resend::core::replay::signal::spawn_interrupt_listener;
use resend::core::replay::{ChannelSignal, Interrupt};
use resend::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Optional .env; a missing file is ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; the command
    // reports a broken config itself
    let (file_level, logging_config) = match load_config(&cli.config) {
        Ok(config) => (Some(config.application.log_level), config.logging),
        Err(_) => (None, LoggingConfig::default()),
    };
    let log_level = cli
        .log_level
        .clone()
        .or(file_level)
        .unwrap_or_else(|| "info".to_string());
    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "resend starting");

    // Ctrl+C / SIGTERM raise the interrupt flag and stop the replay loop
    let (control_tx, control) = ChannelSignal::channel();
    let (interrupt_tx, interrupt) = Interrupt::channel();
    spawn_interrupt_listener(control_tx.clone(), interrupt_tx);

    let exit_code = match &cli.command {
        Commands::Replay(args) => {
            args.execute(&cli.config, control_tx, control, interrupt)
                .await
        }
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    };

    let exit_code = match exit_code {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    drop(guard);
    process::exit(exit_code);
}
