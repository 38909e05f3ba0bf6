//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilegen::config::{ConfigFileError, ZoneFileError};
use tilegen::pyramid::PyramidError;

/// Exit code when tiles failed or the run was interrupted.
pub const EXIT_INCOMPLETE: i32 = 1;

/// Exit code for configuration and argument errors.
pub const EXIT_USAGE: i32 = 2;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Invalid argument or setting
    Config(String),
    /// Failed to load or save config.ini
    ConfigFile(ConfigFileError),
    /// Failed to load a zone file
    ZoneFile(ZoneFileError),
    /// Failed to install the Ctrl+C handler
    SignalHandler(String),
    /// A pyramid run stopped
    Pyramid(PyramidError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::ConfigFile(_) | CliError::ZoneFile(_) => EXIT_USAGE,
            CliError::Pyramid(PyramidError::Coord(_))
            | CliError::Pyramid(PyramidError::InvalidRegion(_)) => EXIT_USAGE,
            CliError::LoggingInit(_) | CliError::SignalHandler(_) | CliError::Pyramid(_) => {
                EXIT_INCOMPLETE
            }
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::ConfigFile(_) => {
                eprintln!();
                eprintln!(
                    "Check {} or regenerate it with: tilegen init --force",
                    tilegen::config::config_file_path().display()
                );
            }
            CliError::Pyramid(PyramidError::NoWorkers { .. }) => {
                eprintln!();
                eprintln!("Every renderer failed to start; see the log file for details.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::ZoneFile(e) => write!(f, "{}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Pyramid(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::ZoneFile(e) => Some(e),
            CliError::Pyramid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ZoneFileError> for CliError {
    fn from(e: ZoneFileError) -> Self {
        CliError::ZoneFile(e)
    }
}

impl From<PyramidError> for CliError {
    fn from(e: PyramidError) -> Self {
        CliError::Pyramid(e)
    }
}
