//! Built-in graticule renderer.
//!
//! Draws meridians and parallels at a fixed spacing with `tiny-skia`. Tiles
//! that no line crosses stay fully transparent, which is what the pyramid's
//! empty-tile detection keys on. Useful on its own for reference overlays,
//! and as the renderer the CLI ships with.

use image::RgbaImage;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::srs::{MapProjection, SphericalMercator, MERCATOR_MAX_LAT};
use super::{RenderError, RenderRequest, RendererFactory, TileRenderer};

/// Smallest accepted line spacing, in degrees.
pub const MIN_SPACING_DEGREES: f64 = 1e-4;

/// Lines per axis above which a tile draws only every n-th line.
const MAX_LINES_PER_AXIS: f64 = 512.0;

/// Visual parameters for [`GraticuleRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraticuleStyle {
    /// Distance between adjacent lines, in degrees.
    pub spacing_degrees: f64,
    /// Line colour as RGBA.
    pub line_color: [u8; 4],
    /// Line width in pixels.
    pub line_width: f32,
    /// Background colour as RGBA. Transparent by default.
    pub background: [u8; 4],
}

impl Default for GraticuleStyle {
    fn default() -> Self {
        Self {
            spacing_degrees: 10.0,
            line_color: [40, 40, 40, 255],
            line_width: 1.0,
            background: [0, 0, 0, 0],
        }
    }
}

impl GraticuleStyle {
    fn validate(&self) -> Result<(), RenderError> {
        if !self.spacing_degrees.is_finite() || self.spacing_degrees < MIN_SPACING_DEGREES {
            return Err(RenderError::Init(format!(
                "graticule spacing must be at least {} degrees, got {}",
                MIN_SPACING_DEGREES, self.spacing_degrees
            )));
        }
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(RenderError::Init(format!(
                "line width must be positive, got {}",
                self.line_width
            )));
        }
        Ok(())
    }
}

/// Renders a lon/lat grid in spherical Mercator.
#[derive(Debug)]
pub struct GraticuleRenderer {
    style: GraticuleStyle,
    projection: SphericalMercator,
}

impl GraticuleRenderer {
    /// Create a renderer with the given style.
    pub fn new(style: GraticuleStyle) -> Result<Self, RenderError> {
        style.validate()?;
        Ok(Self {
            style,
            projection: SphericalMercator,
        })
    }

    pub fn style(&self) -> &GraticuleStyle {
        &self.style
    }
}

/// Multiples of `spacing` within `lo..=hi`.
///
/// When the span holds more than [`MAX_LINES_PER_AXIS`] lines, only every
/// n-th multiple is kept so a low-zoom tile never draws an unbounded grid.
fn grid_values(lo: f64, hi: f64, spacing: f64) -> impl Iterator<Item = f64> {
    let lines = ((hi - lo) / spacing).max(0.0);
    let spacing = if lines > MAX_LINES_PER_AXIS {
        spacing * (lines / MAX_LINES_PER_AXIS).ceil()
    } else {
        spacing
    };
    let first = (lo / spacing).ceil() as i64;
    let last = (hi / spacing).floor() as i64;
    (first..=last).map(move |i| i as f64 * spacing)
}

impl TileRenderer for GraticuleRenderer {
    fn projection(&self) -> &dyn MapProjection {
        &self.projection
    }

    fn render(&mut self, request: &RenderRequest) -> Result<RgbaImage, RenderError> {
        let (width, height) = (request.width, request.height);
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| RenderError::Failed {
            tile: request.tile,
            reason: format!("cannot allocate {}x{} canvas", width, height),
        })?;

        let [r, g, b, a] = self.style.background;
        if a > 0 {
            pixmap.fill(Color::from_rgba8(r, g, b, a));
        }

        let bounds = request.bounds;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(RenderError::Failed {
                tile: request.tile,
                reason: "degenerate viewport".to_string(),
            });
        }

        // Lines are collected over the buffered viewport so strokes centred
        // just outside the tile still reach into it.
        let view = bounds.buffered(request.buffer_size, width, height);
        let (west, south) = self.projection.inverse(view.min_x, view.min_y);
        let (east, north) = self.projection.inverse(view.max_x, view.max_y);

        let scale_x = width as f64 / bounds.width();
        let scale_y = height as f64 / bounds.height();
        let margin = request.buffer_size as f32;

        let spacing = self.style.spacing_degrees;
        let mut builder = PathBuilder::new();

        for lon in grid_values(west.max(-180.0), east.min(180.0), spacing) {
            let (x, _) = self.projection.forward(lon, 0.0);
            let px = ((x - bounds.min_x) * scale_x) as f32;
            builder.move_to(px, -margin);
            builder.line_to(px, height as f32 + margin);
        }

        for lat in grid_values(
            south.max(-MERCATOR_MAX_LAT),
            north.min(MERCATOR_MAX_LAT),
            spacing,
        ) {
            let (_, y) = self.projection.forward(0.0, lat);
            let py = ((bounds.max_y - y) * scale_y) as f32;
            builder.move_to(-margin, py);
            builder.line_to(width as f32 + margin, py);
        }

        if let Some(path) = builder.finish() {
            let mut paint = Paint::default();
            let [r, g, b, a] = self.style.line_color;
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;

            let stroke = Stroke {
                width: self.style.line_width,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        RgbaImage::from_raw(width, height, rgba).ok_or_else(|| RenderError::Failed {
            tile: request.tile,
            reason: "pixel buffer size mismatch".to_string(),
        })
    }
}

/// Creates a [`GraticuleRenderer`] per worker from a shared style.
#[derive(Debug, Clone, Default)]
pub struct GraticuleRendererFactory {
    style: GraticuleStyle,
}

impl GraticuleRendererFactory {
    pub fn new(style: GraticuleStyle) -> Self {
        Self { style }
    }
}

impl RendererFactory for GraticuleRendererFactory {
    type Renderer = GraticuleRenderer;

    fn create(&self) -> Result<Self::Renderer, RenderError> {
        GraticuleRenderer::new(self.style.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{ProjectionTable, TileIndex};
    use crate::render::NativeBounds;

    fn request_for(tile: TileIndex, renderer: &GraticuleRenderer) -> RenderRequest {
        let table = ProjectionTable::new(tile.z as usize + 1);
        let bbox = table.tile_bounds(&tile).unwrap();
        let proj = renderer.projection();
        let bounds = NativeBounds::from_corners(
            proj.forward(bbox.west(), bbox.south()),
            proj.forward(bbox.east(), bbox.north()),
        );
        RenderRequest::tile(tile, bounds, 128)
    }

    fn opaque_pixels(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_world_tile_has_lines() {
        let mut renderer = GraticuleRenderer::new(GraticuleStyle::default()).unwrap();
        let request = request_for(TileIndex::new(0, 0, 0), &renderer);
        let image = renderer.render(&request).unwrap();

        assert_eq!(image.dimensions(), (256, 256));
        assert!(opaque_pixels(&image) > 0);
    }

    #[test]
    fn test_tile_between_lines_is_transparent() {
        // A zoom-12 tile near 5.1°E 5.1°N sits well inside a 10° cell.
        let mut renderer = GraticuleRenderer::new(GraticuleStyle::default()).unwrap();
        let table = ProjectionTable::new(13);
        let (x, y) = table.forward(5.1, 5.1, 12).unwrap().tile();
        let tile = TileIndex::new(12, x as u32, y as u32);

        let request = request_for(tile, &renderer);
        let image = renderer.render(&request).unwrap();
        assert_eq!(opaque_pixels(&image), 0);
    }

    #[test]
    fn test_background_fills_canvas() {
        let style = GraticuleStyle {
            background: [255, 255, 255, 255],
            ..Default::default()
        };
        let mut renderer = GraticuleRenderer::new(style).unwrap();
        let request = request_for(TileIndex::new(3, 4, 3), &renderer);
        let image = renderer.render(&request).unwrap();
        assert_eq!(opaque_pixels(&image), 256 * 256);
    }

    #[test]
    fn test_invalid_style_rejected() {
        let style = GraticuleStyle {
            spacing_degrees: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            GraticuleRenderer::new(style),
            Err(RenderError::Init(_))
        ));

        let factory = GraticuleRendererFactory::new(GraticuleStyle {
            line_width: -1.0,
            ..Default::default()
        });
        assert!(factory.create().is_err());
    }

    #[test]
    fn test_grid_values() {
        let values: Vec<_> = grid_values(-25.0, 12.0, 10.0).collect();
        assert_eq!(values, vec![-20.0, -10.0, 0.0, 10.0]);
        assert_eq!(grid_values(1.0, 9.0, 10.0).count(), 0);
    }

    #[test]
    fn test_dense_grid_is_thinned() {
        let values: Vec<_> = grid_values(-180.0, 180.0, MIN_SPACING_DEGREES).collect();
        assert!(values.len() <= MAX_LINES_PER_AXIS as usize + 1);
        assert!(values.len() > 100);
        // Thinned lines stay on multiples of the configured spacing.
        for v in values {
            let steps = v / MIN_SPACING_DEGREES;
            assert!((steps - steps.round()).abs() < 1e-6, "{} off grid", v);
        }
    }

    #[test]
    fn test_spacing_below_minimum_rejected() {
        let style = GraticuleStyle {
            spacing_degrees: 1e-7,
            ..Default::default()
        };
        assert!(matches!(
            GraticuleRenderer::new(style),
            Err(RenderError::Init(_))
        ));
    }

    #[test]
    fn test_world_tile_at_minimum_spacing_renders() {
        let style = GraticuleStyle {
            spacing_degrees: MIN_SPACING_DEGREES,
            ..Default::default()
        };
        let mut renderer = GraticuleRenderer::new(style).unwrap();
        let request = request_for(TileIndex::new(0, 0, 0), &renderer);
        let image = renderer.render(&request).unwrap();
        assert!(opaque_pixels(&image) > 0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut a = GraticuleRenderer::new(GraticuleStyle::default()).unwrap();
        let mut b = GraticuleRenderer::new(GraticuleStyle::default()).unwrap();
        let request = request_for(TileIndex::new(2, 1, 1), &a);
        assert_eq!(a.render(&request).unwrap(), b.render(&request).unwrap());
    }
}
