//! On-disk tile layout: `<root>/<region>/<z>/<x>/<y>.png`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::coord::TileIndex;

/// File extension of rendered tiles.
pub const TILE_EXTENSION: &str = "png";

/// Row addressing used for the `<y>` path component.
///
/// Only the filename changes between schemes; the rendered content of a
/// tile is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowScheme {
    /// Row 0 at the north edge (slippy-map / XYZ).
    #[default]
    Xyz,
    /// Row 0 at the south edge (OSGeo TMS): `y_out = 2^z - 1 - y`.
    Tms,
}

impl RowScheme {
    /// Row component written to disk for `tile`.
    pub fn output_row(&self, tile: &TileIndex) -> u32 {
        match self {
            RowScheme::Xyz => tile.y,
            RowScheme::Tms => tile.tms_row(),
        }
    }
}

impl fmt::Display for RowScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowScheme::Xyz => write!(f, "xyz"),
            RowScheme::Tms => write!(f, "tms"),
        }
    }
}

impl FromStr for RowScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xyz" => Ok(RowScheme::Xyz),
            "tms" => Ok(RowScheme::Tms),
            other => Err(format!("unknown row scheme '{}', expected xyz or tms", other)),
        }
    }
}

/// Path builder for one region's tile tree.
#[derive(Debug, Clone)]
pub struct TileLayout {
    region_dir: PathBuf,
    scheme: RowScheme,
}

impl TileLayout {
    pub fn new(root: &Path, region: &str, scheme: RowScheme) -> Self {
        Self {
            region_dir: root.join(region),
            scheme,
        }
    }

    pub fn region_dir(&self) -> &Path {
        &self.region_dir
    }

    pub fn scheme(&self) -> RowScheme {
        self.scheme
    }

    /// `<root>/<region>/<z>`
    pub fn zoom_dir(&self, zoom: u8) -> PathBuf {
        self.region_dir.join(zoom.to_string())
    }

    /// `<root>/<region>/<z>/<x>`
    pub fn column_dir(&self, zoom: u8, x: u32) -> PathBuf {
        self.zoom_dir(zoom).join(x.to_string())
    }

    /// `<root>/<region>/<z>/<x>/<y_out>.png`
    pub fn tile_path(&self, tile: &TileIndex) -> PathBuf {
        self.column_dir(tile.z, tile.x).join(format!(
            "{}.{}",
            self.scheme.output_row(tile),
            TILE_EXTENSION
        ))
    }
}

/// Create `path` and its parents if missing.
///
/// "Already exists" is success, including when another thread or process
/// creates the directory between the check and the create.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if path.is_dir() => {
            debug!(path = %path.display(), error = %e, "Directory appeared concurrently");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
