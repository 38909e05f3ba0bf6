//! User configuration and zone files.
//!
//! [`ConfigFile`] holds run defaults read from `~/.tilegen/config.ini`;
//! [`ZoneFile`] lists the regions a batch run renders.
//!
//! # Example
//!
//! ```
//! use tilegen::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.render.queue_capacity, 32);
//! ```

mod file;
mod parser;
mod settings;
mod writer;
mod zones;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, LoggingSettings, RenderSettings, DEFAULT_LOG_FILE, DEFAULT_OUTPUT_DIR};
pub use zones::{Zone, ZoneFile, ZoneFileError};
