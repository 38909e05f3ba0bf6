//! CLI runner for common setup.
//!
//! Encapsulates config loading, logging initialization and the Ctrl+C
//! handler so the render commands share one lifecycle.

use std::path::Path;

use tilegen::config::ConfigFile;
use tilegen::logging::{init_logging, LoggingGuard};
use tilegen::CancellationToken;
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Cancelled by Ctrl+C
    cancel: CancellationToken,
}

impl CliRunner {
    /// Load config, initialize logging and install the interrupt handler.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file; defaults to ~/.tilegen/config.ini
    /// * `verbose` - Mirror log output to stdout
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let cancel = CancellationToken::new();
        let handler_token = cancel.clone();
        ctrlc::set_handler(move || {
            if handler_token.is_cancelled() {
                // Second interrupt: stop waiting for in-flight tiles.
                std::process::exit(130);
            }
            eprintln!();
            eprintln!("Interrupt received, finishing in-flight tiles...");
            handler_token.cancel();
        })
        .map_err(|e| CliError::SignalHandler(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            cancel,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Token cancelled on Ctrl+C.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tilegen v{}", tilegen::VERSION);
        info!("tilegen CLI: {} command", command);
        info!(log = %self.logging_guard.path().display(), "Logging initialized");
    }
}
