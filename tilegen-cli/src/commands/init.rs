//! Init command - write the default configuration file.

use std::path::{Path, PathBuf};

use tilegen::config::{config_file_path, ConfigFile};

use super::common::RunStatus;
use crate::error::CliError;

/// Write the default config to `path`; refuses to overwrite unless `force`.
///
/// Returns whether the file was written.
fn write_default(path: &Path, force: bool) -> Result<bool, CliError> {
    if path.exists() && !force {
        return Ok(false);
    }
    ConfigFile::default().save_to(path)?;
    Ok(true)
}

/// Run the init command.
pub fn run(force: bool, config: Option<PathBuf>) -> Result<RunStatus, CliError> {
    let path = config.unwrap_or_else(config_file_path);

    if !write_default(&path, force)? {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(RunStatus::Complete);
    }

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize rendering defaults.");
    println!("CLI arguments override config file values when specified.");
    Ok(RunStatus::Complete)
}
