//! Configuration file handling for ~/.tilegen/config.ini.
//!
//! Parsing lives in [`super::parser`], serialization in [`super::writer`].

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write the file
    #[error("Failed to write config file {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create the config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilegen/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|source| ConfigFileError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Get the path to the config directory (~/.tilegen).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilegen")
}

/// Get the path to the config file (~/.tilegen/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid::DEFAULT_QUEUE_CAPACITY;
    use crate::tile::{EmptyTilePolicy, RowScheme};

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.render.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.render.output_dir, PathBuf::from("./tiles"));
        assert_eq!(config.render.row_scheme(), RowScheme::Xyz);
        assert_eq!(config.render.empty_tile_policy(), EmptyTilePolicy::Calibrated);
        assert_eq!(config.render.buffer_size, 128);
        assert!(config.render.threads >= 1);
        assert_eq!(config.logging.file, "tilegen.log");
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp_dir.path().join("nonexistent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.ini");

        let mut config = ConfigFile::default();
        config.render.threads = 3;
        config.render.tms = true;
        config.render.empty_tile_bytes = Some(103);
        config.render.output_dir = PathBuf::from("/srv/tiles");
        config.style.spacing_degrees = 5.0;
        config.style.line_color = [255, 0, 0, 128];
        config.logging.directory = PathBuf::from("/var/log/tilegen");

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_path_is_under_config_directory() {
        assert!(config_file_path().starts_with(config_directory()));
        assert!(config_directory().ends_with(".tilegen"));
    }
}
