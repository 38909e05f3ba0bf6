//! Renderer collaborator contract.
//!
//! Cartographic rendering is delegated to an external engine. This module
//! defines the seam between the pyramid workers and that engine:
//!
//! ```text
//! ┌────────────────────┐   create() once per worker   ┌──────────────────┐
//! │  RendererFactory   │ ───────────────────────────▶ │   TileRenderer   │
//! │  (Send + Sync,     │                              │  (owned by one   │
//! │   shared)          │                              │   worker thread) │
//! └────────────────────┘                              └──────────────────┘
//! ```
//!
//! A renderer is constructed inside the worker thread that uses it and is
//! never moved to another thread, so implementations need not be `Send`.
//! Engines whose map/style state is not thread-safe can therefore be used
//! directly.

mod graticule;
mod srs;

pub use graticule::{
    GraticuleRenderer, GraticuleRendererFactory, GraticuleStyle, MIN_SPACING_DEGREES,
};
pub use srs::{LonLat, MapProjection, SphericalMercator, EARTH_RADIUS, MERCATOR_MAX_LAT};

use image::RgbaImage;
use thiserror::Error;

use crate::coord::{TileIndex, TILE_SIZE};

/// Margin, in pixels, rendered around every tile to avoid clipping symbols
/// and line decorations at tile edges.
pub const MIN_BUFFER_SIZE: u32 = 128;

/// Errors raised by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer could not be constructed (style load failure, etc.).
    #[error("renderer initialisation failed: {0}")]
    Init(String),

    /// Rendering a particular tile failed.
    #[error("rendering tile {tile} failed: {reason}")]
    Failed { tile: TileIndex, reason: String },

    /// The renderer panicked while rendering a tile.
    #[error("renderer panicked on tile {tile}: {message}")]
    Panicked { tile: TileIndex, message: String },

    /// The returned image does not match the requested size.
    #[error("renderer returned {actual_width}x{actual_height} for tile {tile}, expected {width}x{height}")]
    SizeMismatch {
        tile: TileIndex,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// A rectangle in the renderer's native projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl NativeBounds {
    /// Build from two opposite corners in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grow by `pixels` on every side, given the output size in pixels.
    pub fn buffered(&self, pixels: u32, width: u32, height: u32) -> Self {
        let dx = self.width() / width as f64 * pixels as f64;
        let dy = self.height() / height as f64 * pixels as f64;
        Self {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

/// Everything a renderer needs to draw one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Tile being rendered, for diagnostics.
    pub tile: TileIndex,
    /// Tile extent in the renderer's native projection.
    pub bounds: NativeBounds,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Extra margin in pixels the renderer should draw beyond the edges.
    pub buffer_size: u32,
}

impl RenderRequest {
    /// A standard 256×256 request.
    pub fn tile(tile: TileIndex, bounds: NativeBounds, buffer_size: u32) -> Self {
        Self {
            tile,
            bounds,
            width: TILE_SIZE,
            height: TILE_SIZE,
            buffer_size: buffer_size.max(MIN_BUFFER_SIZE),
        }
    }
}

/// Draws map data for a viewport into an RGBA buffer.
pub trait TileRenderer {
    /// Native projection of this renderer's map.
    fn projection(&self) -> &dyn MapProjection;

    /// Render the requested viewport.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the engine fails for this viewport. The
    /// worker records the tile as failed and moves on.
    fn render(&mut self, request: &RenderRequest) -> Result<RgbaImage, RenderError>;
}

/// Builds one renderer per worker.
///
/// The factory itself is shared across threads; the renderers it produces
/// are not.
pub trait RendererFactory: Send + Sync {
    type Renderer: TileRenderer;

    /// Construct a fresh renderer with its own style/map state.
    fn create(&self) -> Result<Self::Renderer, RenderError>;
}
