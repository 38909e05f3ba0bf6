//! Zone files: named regions to render in a batch.
//!
//! Each INI section describes a region:
//!
//! ```ini
//! [ie-ireland]
//! bbox = -9.80334,51.44582,-9.23,51.48221
//! bbox = -9.23,51.48221,-9.81639,51.48666
//! zooms = 0-11,13,15,17
//!
//! [is-iceland]
//! bbox = -25.0,63.0,-13.0,67.0
//! min_zoom = 0
//! max_zoom = 10
//! enabled = false
//! ```
//!
//! A region is the union of its boxes. `bbox` may repeat, and a section
//! that repeats an earlier name adds its boxes to that region; its zoom
//! levels and `enabled` flag must then agree with the first section. Box
//! corners may come in either order, so outline segments running east to
//! west still cover the tiles they touch.
//!
//! `zooms` takes a comma-separated list of single levels and inclusive
//! ranges; `min_zoom`/`max_zoom` is shorthand for a single range.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

use super::parser::parse_bool;
use crate::coord::{BoundingBox, ZoomRange};

/// Zone file errors.
#[derive(Debug, Error)]
pub enum ZoneFileError {
    #[error("Failed to read zone file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Zone '{zone}' is missing required key '{key}'")]
    MissingKey { zone: String, key: String },

    #[error("Invalid zone value: {zone}.{key} = '{value}' - {reason}")]
    InvalidValue {
        zone: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// One region from a zone file.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    name: String,
    bboxes: Vec<BoundingBox>,
    zooms: Vec<ZoomRange>,
    enabled: bool,
}

impl Zone {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boxes making up the region, in file order. All render into the
    /// same region directory.
    pub fn bboxes(&self) -> &[BoundingBox] {
        &self.bboxes
    }

    /// Zoom ranges in file order. Each becomes its own pyramid run.
    pub fn zoom_ranges(&self) -> &[ZoomRange] {
        &self.zooms
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn from_section(name: &str, section: &Properties) -> Result<Self, ZoneFileError> {
        let invalid = |key: &str, value: &str, reason: String| ZoneFileError::InvalidValue {
            zone: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };
        let get = |key: &str| section.get(key).map(str::trim).filter(|v| !v.is_empty());

        let bboxes = section
            .get_all("bbox")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|text| {
                BoundingBox::parse_corners(text).map_err(|e| invalid("bbox", text, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if bboxes.is_empty() {
            return Err(ZoneFileError::MissingKey {
                zone: name.to_string(),
                key: "bbox".to_string(),
            });
        }

        let zooms = match (get("zooms"), get("min_zoom"), get("max_zoom")) {
            (Some(list), None, None) => parse_zoom_list(list)
                .map_err(|reason| invalid("zooms", list, reason))?,
            (Some(list), _, _) => {
                return Err(invalid(
                    "zooms",
                    list,
                    "use either zooms or min_zoom/max_zoom, not both".to_string(),
                ))
            }
            (None, Some(min), Some(max)) => {
                let min_level = parse_level(min).map_err(|r| invalid("min_zoom", min, r))?;
                let max_level = parse_level(max).map_err(|r| invalid("max_zoom", max, r))?;
                let range = ZoomRange::new(min_level, max_level)
                    .map_err(|e| invalid("max_zoom", max, e.to_string()))?;
                vec![range]
            }
            (None, None, _) => {
                return Err(ZoneFileError::MissingKey {
                    zone: name.to_string(),
                    key: "min_zoom".to_string(),
                })
            }
            (None, Some(_), None) => {
                return Err(ZoneFileError::MissingKey {
                    zone: name.to_string(),
                    key: "max_zoom".to_string(),
                })
            }
        };

        let enabled = match get("enabled") {
            None => true,
            Some(v) => {
                parse_bool(v).ok_or_else(|| invalid("enabled", v, "must be true or false".to_string()))?
            }
        };

        Ok(Self {
            name: name.to_string(),
            bboxes,
            zooms,
            enabled,
        })
    }

    /// Add the boxes of a repeated section with the same name.
    fn absorb(&mut self, other: Zone) -> Result<(), ZoneFileError> {
        let mismatch = |key: &str, value: String| ZoneFileError::InvalidValue {
            zone: self.name.clone(),
            key: key.to_string(),
            value,
            reason: format!("differs from an earlier [{}] section", self.name),
        };

        if other.zooms != self.zooms {
            let listed = other
                .zooms
                .iter()
                .map(ZoomRange::to_string)
                .collect::<Vec<_>>()
                .join(",");
            return Err(mismatch("zooms", listed));
        }
        if other.enabled != self.enabled {
            return Err(mismatch("enabled", other.enabled.to_string()));
        }

        self.bboxes.extend(other.bboxes);
        Ok(())
    }
}

fn parse_level(text: &str) -> Result<u8, String> {
    text.trim()
        .parse()
        .map_err(|_| "must be a zoom level between 0 and 30".to_string())
}

/// Parse `0-11,13,15,17` into ranges.
fn parse_zoom_list(text: &str) -> Result<Vec<ZoomRange>, String> {
    let ranges = text
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| ZoomRange::from_str(part).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    if ranges.is_empty() {
        return Err("no zoom levels given".to_string());
    }
    Ok(ranges)
}

/// A parsed zone file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneFile {
    zones: Vec<Zone>,
}

impl ZoneFile {
    /// Load a zone file. Keys outside any section are ignored.
    pub fn load(path: &Path) -> Result<Self, ZoneFileError> {
        let ini = Ini::load_from_file(path).map_err(|source| ZoneFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ZoneFileError> {
        let mut zones: Vec<Zone> = Vec::new();
        for (name, section) in ini.iter() {
            let Some(name) = name else { continue };
            let zone = Zone::from_section(name, section)?;
            match zones.iter_mut().find(|z| z.name == zone.name) {
                Some(existing) => existing.absorb(zone)?,
                None => zones.push(zone),
            }
        }
        Ok(Self { zones })
    }

    /// All zones in file order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Zones not marked `enabled = false`.
    pub fn enabled(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| z.is_enabled())
    }

    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }
}

impl FromStr for ZoneFile {
    type Err = ZoneFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ini = Ini::load_from_str(s).map_err(|e| ZoneFileError::Read {
            path: PathBuf::from("<string>"),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }
}
