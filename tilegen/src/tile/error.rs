//! Errors raised while resolving a single tile.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::CoordError;
use crate::render::RenderError;

/// Failure resolving one tile. Never fatal to the run.
#[derive(Debug, Error)]
pub enum TileError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("projection error: {0}")]
    Projection(#[from] CoordError),

    #[error("failed to encode tile: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TileError::Io {
            path: path.into(),
            source,
        }
    }
}
