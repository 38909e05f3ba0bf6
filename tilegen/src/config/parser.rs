//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::render::{MIN_BUFFER_SIZE, MIN_SPACING_DEGREES};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        let render = &mut config.render;
        if let Some(v) = number::<usize>(section, "render", "threads")? {
            if v == 0 {
                return Err(invalid("render", "threads", "0", "must be at least 1"));
            }
            render.threads = v;
        }
        if let Some(v) = number::<usize>(section, "render", "queue_capacity")? {
            if v == 0 {
                return Err(invalid("render", "queue_capacity", "0", "must be at least 1"));
            }
            render.queue_capacity = v;
        }
        if let Some(v) = non_empty(section, "output_dir") {
            render.output_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "tms") {
            render.tms = parse_bool(v).ok_or_else(|| {
                invalid("render", "tms", v, "must be true or false")
            })?;
        }
        if let Some(v) = number::<u32>(section, "render", "buffer_size")? {
            if v < MIN_BUFFER_SIZE {
                return Err(invalid(
                    "render",
                    "buffer_size",
                    &v.to_string(),
                    &format!("must be at least {}", MIN_BUFFER_SIZE),
                ));
            }
            render.buffer_size = v;
        }
        if let Some(v) = number::<u64>(section, "render", "empty_tile_bytes")? {
            render.empty_tile_bytes = Some(v);
        }
    }

    // [style] section
    if let Some(section) = ini.section(Some("style")) {
        let style = &mut config.style;
        if let Some(v) = number::<f64>(section, "style", "spacing")? {
            if !v.is_finite() || v < MIN_SPACING_DEGREES {
                return Err(invalid(
                    "style",
                    "spacing",
                    &v.to_string(),
                    &format!("must be at least {} degrees", MIN_SPACING_DEGREES),
                ));
            }
            style.spacing_degrees = v;
        }
        if let Some(v) = non_empty(section, "line_color") {
            style.line_color = parse_color(v).ok_or_else(|| {
                invalid("style", "line_color", v, "expected #RRGGBB or #RRGGBBAA")
            })?;
        }
        if let Some(v) = number::<f32>(section, "style", "line_width")? {
            if !v.is_finite() || v <= 0.0 {
                return Err(invalid("style", "line_width", &v.to_string(), "must be positive"));
            }
            style.line_width = v;
        }
        if let Some(v) = non_empty(section, "background") {
            style.background = parse_color(v).ok_or_else(|| {
                invalid("style", "background", v, "expected #RRGGBB or #RRGGBBAA")
            })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

pub(super) fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Trimmed value of `key`, or `None` when missing or blank.
fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn number<T: FromStr>(
    section: &Properties,
    name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError> {
    match non_empty(section, key) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| invalid(name, key, v, "must be a number")),
    }
}

pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA`; alpha defaults to opaque.
pub(super) fn parse_color(value: &str) -> Option<[u8; 4]> {
    let hex = value.trim().strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}

/// Expand a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{EmptyTilePolicy, RowScheme};

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_render_section() {
        let config = parse(
            "[render]\nthreads = 6\nqueue_capacity = 64\noutput_dir = /data/tiles\n\
             tms = yes\nbuffer_size = 256\nempty_tile_bytes = 103\n",
        )
        .unwrap();

        assert_eq!(config.render.threads, 6);
        assert_eq!(config.render.queue_capacity, 64);
        assert_eq!(config.render.output_dir, PathBuf::from("/data/tiles"));
        assert_eq!(config.render.row_scheme(), RowScheme::Tms);
        assert_eq!(config.render.buffer_size, 256);
        assert_eq!(config.render.empty_tile_policy(), EmptyTilePolicy::Bytes(103));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse("[render]\nempty_tile_bytes =\noutput_dir =\n").unwrap();
        assert_eq!(config.render.empty_tile_bytes, None);
        assert_eq!(config.render.output_dir, PathBuf::from("./tiles"));
    }

    #[test]
    fn test_style_section() {
        let config = parse(
            "[style]\nspacing = 2.5\nline_color = #ff000080\nline_width = 1.5\nbackground = #FFFFFF\n",
        )
        .unwrap();
        assert_eq!(config.style.spacing_degrees, 2.5);
        assert_eq!(config.style.line_color, [255, 0, 0, 128]);
        assert_eq!(config.style.line_width, 1.5);
        assert_eq!(config.style.background, [255, 255, 255, 255]);
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let cases = [
            ("[render]\nthreads = many\n", "threads"),
            ("[render]\nthreads = 0\n", "threads"),
            ("[render]\ntms = maybe\n", "tms"),
            ("[render]\nbuffer_size = 64\n", "buffer_size"),
            ("[style]\nspacing = -1\n", "spacing"),
            ("[style]\nspacing = 0.0000001\n", "spacing"),
            ("[style]\nline_color = red\n", "line_color"),
        ];
        for (text, expected_key) in cases {
            match parse(text) {
                Err(ConfigFileError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("{:?}: expected InvalidValue, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#102030"), Some([16, 32, 48, 255]));
        assert_eq!(parse_color(" #10203040 "), Some([16, 32, 48, 64]));
        assert_eq!(parse_color("102030"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zz0000"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/tiles"), home.join("tiles"));
        }
    }
}
