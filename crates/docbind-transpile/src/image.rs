//! Retina image assets and their on-page scale.
//!
//! DocC image references name an asset prefix (`![caption](closure-syntax)`);
//! the file on disk is `{prefix}@2x.png`. The web presentation shows such an
//! image at half its pixel width inside a 760 pixel column, so the printed
//! width is `W / 2 / 760` of the text width.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::TranspileError;

/// Pixel density of retina assets.
const RETINA_SCALE: u64 = 2;

/// Width in logical pixels of the web reference column.
const REFERENCE_COLUMN_WIDTH: u64 = 760;

/// PNG file signature.
const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes needed to read the IHDR width and height.
const PNG_HEADER_LEN: usize = 24;

/// File name of the retina asset for an image prefix.
///
/// ```
/// assert_eq!(docbind_transpile::retina_file_name("closure"), "closure@2x.png");
/// ```
#[must_use]
pub fn retina_file_name(prefix: &str) -> String {
    format!("{prefix}@2x.png")
}

/// Page width percentage for a retina image `width` pixels wide.
///
/// ```
/// assert_eq!(docbind_transpile::scale_percentage(1520), 100);
/// ```
#[must_use]
pub fn scale_percentage(width: u32) -> u32 {
    let percent = u64::from(width) * 100 / (RETINA_SCALE * REFERENCE_COLUMN_WIDTH);
    u32::try_from(percent).unwrap_or(u32::MAX)
}

/// Read the pixel width from PNG header bytes.
///
/// Returns `None` unless `data` starts with the PNG signature followed by an
/// `IHDR` chunk.
#[must_use]
pub fn png_width(data: &[u8]) -> Option<u32> {
    if data.len() < PNG_HEADER_LEN || data[..8] != PNG_SIGNATURE || &data[12..16] != b"IHDR" {
        return None;
    }
    Some(u32::from_be_bytes([data[16], data[17], data[18], data[19]]))
}

/// Directory of image assets referenced by chapters.
#[derive(Debug, Clone)]
pub struct ImageAssets {
    dir: PathBuf,
}

impl ImageAssets {
    /// Create an asset lookup rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Pixel width of the asset `file_name`.
    ///
    /// # Errors
    ///
    /// [`TranspileError::MissingAsset`] if the file is absent, unreadable, or
    /// not a PNG image.
    pub fn width_of(&self, file_name: &str) -> Result<u32, TranspileError> {
        let path = self.dir.join(file_name);
        let header = read_header(&path).map_err(|e| TranspileError::MissingAsset {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        png_width(&header).ok_or_else(|| TranspileError::MissingAsset {
            path,
            reason: "not a PNG image".to_owned(),
        })
    }

    /// Page width percentage of the asset `file_name`.
    pub fn scale_percentage_of(&self, file_name: &str) -> Result<u32, TranspileError> {
        let width = self.width_of(file_name)?;
        let percent = scale_percentage(width);
        tracing::debug!(asset = file_name, width, percent, "Scaled image");
        Ok(percent)
    }
}

fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(PNG_HEADER_LEN);
    File::open(path)?
        .take(PNG_HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal PNG header (signature + IHDR) for an image `width` x 10 pixels.
    pub(crate) fn png_header(width: u32) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&10u32.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    #[test]
    fn test_scale_percentage() {
        assert_eq!(scale_percentage(1520), 100);
        assert_eq!(scale_percentage(760), 50);
        // floor(1000 / 2 / 7.6) = floor(65.78)
        assert_eq!(scale_percentage(1000), 65);
        assert_eq!(scale_percentage(0), 0);
    }

    #[test]
    fn test_png_width() {
        assert_eq!(png_width(&png_header(1234)), Some(1234));
    }

    #[test]
    fn test_png_width_rejects_other_formats() {
        let mut gif = b"GIF89a".to_vec();
        gif.resize(PNG_HEADER_LEN, 0);
        assert_eq!(png_width(&gif), None);
        assert_eq!(png_width(&PNG_SIGNATURE), None);
    }

    #[test]
    fn test_width_of_reads_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("closure@2x.png"), png_header(1520)).unwrap();

        let assets = ImageAssets::new(dir.path());
        assert_eq!(assets.width_of("closure@2x.png").unwrap(), 1520);
        assert_eq!(assets.scale_percentage_of("closure@2x.png").unwrap(), 100);
    }

    #[test]
    fn test_width_of_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let assets = ImageAssets::new(dir.path());

        let err = assets.width_of("absent@2x.png").unwrap_err();
        assert!(
            matches!(&err, TranspileError::MissingAsset { path, .. } if path.ends_with("absent@2x.png")),
            "Expected MissingAsset, got {err:?}"
        );
    }

    #[test]
    fn test_width_of_non_png_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken@2x.png"), "definitely not a png image").unwrap();
        let assets = ImageAssets::new(dir.path());

        let err = assets.width_of("broken@2x.png").unwrap_err();
        assert!(err.to_string().contains("not a PNG image"));
    }
}
