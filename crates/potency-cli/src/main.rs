//! Potency CLI - Main entry point

use clap::Parser;
use potency_cli::{Cli, Commands, ConfigCommand};
use potency_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use potency_pipeline::error::EXIT_OK;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Console logging to stderr: warnings by default, debug with --verbose
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("potency")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().merge_env() {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {}", e);
            log_config
        },
    };

    // The CLI keeps working without logging
    let guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    // Execute command
    let code = match execute_command(&cli).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            e.exit_code()
        },
    };

    // Flush buffered log lines before exiting
    drop(guard);
    process::exit(code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> potency_cli::Result<()> {
    match &cli.command {
        Commands::Predict(args) => potency_cli::commands::predict::run(args, cli.verbose).await,
        Commands::Config { command } => match command {
            ConfigCommand::Show => potency_cli::commands::config::show().await,
        },
    }
}
