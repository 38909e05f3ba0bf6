//! Settings structs mirroring the sections of `config.ini`.

use std::path::PathBuf;

use crate::pyramid::{default_worker_count, DEFAULT_QUEUE_CAPACITY};
use crate::render::{GraticuleStyle, MIN_BUFFER_SIZE};
use crate::tile::{EmptyTilePolicy, RowScheme};

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./tiles";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilegen.log";

/// `[render]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub threads: usize,
    pub queue_capacity: usize,
    pub output_dir: PathBuf,
    pub tms: bool,
    pub buffer_size: u32,
    /// Overrides the calibrated blank-tile size when set.
    pub empty_tile_bytes: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            threads: default_worker_count(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tms: false,
            buffer_size: MIN_BUFFER_SIZE,
            empty_tile_bytes: None,
        }
    }
}

impl RenderSettings {
    pub fn row_scheme(&self) -> RowScheme {
        if self.tms {
            RowScheme::Tms
        } else {
            RowScheme::Xyz
        }
    }

    pub fn empty_tile_policy(&self) -> EmptyTilePolicy {
        match self.empty_tile_bytes {
            Some(bytes) => EmptyTilePolicy::Bytes(bytes),
            None => EmptyTilePolicy::Calibrated,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::file::config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// The full configuration file.
///
/// `[style]` maps directly onto [`GraticuleStyle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub render: RenderSettings,
    pub style: GraticuleStyle,
    pub logging: LoggingSettings,
}
