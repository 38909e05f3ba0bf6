//! Tilegen - slippy-map raster tile pyramid generation
//!
//! This library renders every tile covering a geographic bounding box over a
//! range of zoom levels into a `<region>/<z>/<x>/<y>.png` directory tree,
//! using a pool of worker threads that each own a renderer.
//!
//! # Modules
//!
//! - [`coord`]: bounding boxes, zoom ranges, tile indices and the spherical
//!   Mercator projection table
//! - [`render`]: the renderer contract and the built-in graticule renderer
//! - [`tile`]: output layout, PNG encoding and atomic tile writes
//! - [`pyramid`]: planning, the bounded work queue and the worker pool
//! - [`config`]: `config.ini` and zone files
//! - [`logging`]: tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tilegen::coord::{BoundingBox, ZoomRange};
//! use tilegen::pyramid::{PyramidConfig, PyramidRenderer};
//! use tilegen::render::GraticuleRendererFactory;
//!
//! let config = PyramidConfig::new(
//!     BoundingBox::new(-90.0, 40.0, -89.0, 41.0).unwrap(),
//!     ZoomRange::new(0, 12).unwrap(),
//!     Path::new("./tiles"),
//!     "midwest",
//! );
//!
//! let summary = PyramidRenderer::new(config, GraticuleRendererFactory::default())
//!     .run()
//!     .unwrap();
//! println!("{}", summary);
//! ```

pub mod config;
pub mod coord;
pub mod logging;
pub mod pyramid;
pub mod render;
pub mod tile;

pub use tokio_util::sync::CancellationToken;

/// Library version, from Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
