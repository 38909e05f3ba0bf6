//! PNG encoding, atomic tile writes and empty-tile detection.
//!
//! An empty tile is a render with no visible features. It is recognised by
//! its encoded size: a blank canvas always compresses to the same number of
//! bytes for a given encoder and tile size. That number depends on the
//! encoder settings, so by default it is measured once per run by encoding a
//! fully transparent tile with the same encoder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use super::error::TileError;
use crate::coord::TILE_SIZE;

/// Suffix of the temporary file a tile is written to before being renamed
/// into place.
const PARTIAL_SUFFIX: &str = "part";

/// Encodes rendered tiles to PNG.
#[derive(Debug, Clone, Copy)]
pub struct TileEncoder {
    compression: CompressionType,
    filter: FilterType,
}

impl Default for TileEncoder {
    fn default() -> Self {
        Self {
            compression: CompressionType::Best,
            filter: FilterType::Adaptive,
        }
    }
}

impl TileEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode an RGBA image to PNG bytes.
    pub fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, TileError> {
        let mut buffer = Vec::new();
        PngEncoder::new_with_quality(&mut buffer, self.compression, self.filter).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(buffer)
    }

    /// Encoded size of a fully transparent standard tile.
    pub fn blank_tile_size(&self) -> Result<u64, TileError> {
        let blank = RgbaImage::new(TILE_SIZE, TILE_SIZE);
        Ok(self.encode(&blank)?.len() as u64)
    }
}

/// How empty renders are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyTilePolicy {
    /// Measure the blank-tile size with the run's encoder.
    #[default]
    Calibrated,
    /// Treat files of exactly this many bytes as empty.
    Bytes(u64),
    /// Never delete; keep every render.
    Keep,
}

impl EmptyTilePolicy {
    /// Resolve to the byte count that marks a tile as empty, if any.
    pub fn signature(&self, encoder: &TileEncoder) -> Result<Option<u64>, TileError> {
        match self {
            EmptyTilePolicy::Calibrated => encoder.blank_tile_size().map(Some),
            EmptyTilePolicy::Bytes(n) => Ok(Some(*n)),
            EmptyTilePolicy::Keep => Ok(None),
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Write `bytes` to `path` via a sibling temporary file and a rename, so the
/// destination never holds a partially written tile.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TileError> {
    let partial = partial_path(path);

    let result = fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, path));
    if let Err(e) = result {
        // Best effort; the partial file may not exist.
        let _ = fs::remove_file(&partial);
        return Err(TileError::io(path, e));
    }
    Ok(())
}

/// Size of the file at `path` in bytes.
pub fn file_size(path: &Path) -> Result<u64, TileError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| TileError::io(path, e))
}

/// Remove `path`, treating an already missing file as success.
pub fn remove_tile(path: &Path) -> Result<(), TileError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TileError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_encode_produces_png() {
        let encoder = TileEncoder::new();
        let bytes = encoder.encode(&RgbaImage::new(256, 256)).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_blank_size_is_stable() {
        let encoder = TileEncoder::new();
        let a = encoder.blank_tile_size().unwrap();
        let b = encoder.blank_tile_size().unwrap();
        assert_eq!(a, b);
        assert!(a > 0);
    }

    #[test]
    fn test_features_change_encoded_size() {
        let encoder = TileEncoder::new();
        let blank = encoder.blank_tile_size().unwrap();

        let mut image = RgbaImage::new(256, 256);
        for i in 0..256 {
            image.put_pixel(i, i, Rgba([200, 30, 30, 255]));
        }
        let drawn = encoder.encode(&image).unwrap().len() as u64;
        assert_ne!(drawn, blank);
    }

    #[test]
    fn test_policy_signature() {
        let encoder = TileEncoder::new();
        assert_eq!(
            EmptyTilePolicy::Calibrated.signature(&encoder).unwrap(),
            Some(encoder.blank_tile_size().unwrap())
        );
        assert_eq!(
            EmptyTilePolicy::Bytes(103).signature(&encoder).unwrap(),
            Some(103)
        );
        assert_eq!(EmptyTilePolicy::Keep.signature(&encoder).unwrap(), None);
    }

    #[test]
    fn test_write_atomic_leaves_no_partial() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("3.png");

        write_atomic(&path, b"tile-bytes").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"tile-bytes");
        assert!(!partial_path(&path).exists());
        assert_eq!(file_size(&path).unwrap(), 10);
    }

    #[test]
    fn test_write_atomic_missing_directory_fails_cleanly() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing/3.png");

        let result = write_atomic(&path, b"tile-bytes");
        assert!(matches!(result, Err(TileError::Io { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_tile_missing_is_ok() {
        let temp = tempfile::TempDir::new().unwrap();
        remove_tile(&temp.path().join("nope.png")).unwrap();
    }

    #[test]
    fn test_partial_path_suffix() {
        assert_eq!(
            partial_path(Path::new("/t/1/2/3.png")),
            PathBuf::from("/t/1/2/3.png.part")
        );
    }
}
