//! Tile tasks and their on-disk representation.
//!
//! - [`TileTask`] / [`WorkItem`]: what travels through the render queue
//! - [`TileLayout`] / [`RowScheme`]: where a tile lands on disk
//! - [`TileEncoder`] / [`EmptyTilePolicy`]: how a render becomes a file, and
//!   how blank renders are recognised

mod encoder;
mod error;
mod layout;
mod request;

pub use encoder::{file_size, remove_tile, write_atomic, EmptyTilePolicy, TileEncoder};
pub use error::TileError;
pub use layout::{ensure_dir, RowScheme, TileLayout, TILE_EXTENSION};
pub use request::{TileTask, WorkItem};
