//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let render = &config.render;
    let style = &config.style;
    let empty_tile_bytes = render
        .empty_tile_bytes
        .map(|b| b.to_string())
        .unwrap_or_default();

    format!(
        r#"[render]
; Number of render worker threads (default: number of CPU cores)
threads = {}
; Capacity of the queue between the planner and the workers (default: 32)
queue_capacity = {}
; Root directory; tiles go to <output_dir>/<region>/<z>/<x>/<y>.png
output_dir = {}
; Write rows in TMS order (origin bottom-left) instead of XYZ (origin top-left)
tms = {}
; Margin in pixels rendered around each tile (minimum 128)
buffer_size = {}
; Encoded size in bytes that marks a tile as empty.
; Leave blank to measure it from a transparent tile at startup.
empty_tile_bytes = {}

[style]
; Graticule line spacing in degrees
spacing = {}
; Line colour as #RRGGBB or #RRGGBBAA
line_color = {}
; Line width in pixels
line_width = {}
; Background colour; fully transparent tiles are treated as empty
background = {}

[logging]
; Directory for log files
directory = {}
; Log file name
file = {}
"#,
        render.threads,
        render.queue_capacity,
        path_to_string(&render.output_dir),
        render.tms,
        render.buffer_size,
        empty_tile_bytes,
        style.spacing_degrees,
        format_color(style.line_color),
        style.line_width,
        format_color(style.background),
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn format_color([r, g, b, a]: [u8; 4]) -> String {
    format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_section() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("[render]"));
        assert!(text.contains("[style]"));
        assert!(text.contains("[logging]"));
        assert!(text.contains("queue_capacity = 32"));
        assert!(text.contains("tms = false"));
        assert!(text.contains("empty_tile_bytes = \n"));
    }

    #[test]
    fn test_format_color() {
        assert_eq!(format_color([255, 0, 16, 128]), "#ff001080");
    }
}
