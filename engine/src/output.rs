//! Final wallpaper encoding.

use crate::codec;
use common::RenderError;
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

/// Prefix shared by every generated wallpaper
pub const WALLPAPER_PREFIX: &str = "wallpaper_";

/// `wallpaper_<ts>.jpg`, or `wallpaper_<ts>_<n>.jpg` when `attempt` is non-zero
pub fn wallpaper_file_name(timestamp: i64, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}{}.jpg", WALLPAPER_PREFIX, timestamp)
    } else {
        format!("{}{}_{}.jpg", WALLPAPER_PREFIX, timestamp, attempt)
    }
}

/// First wallpaper path in `root` that doesn't exist yet
fn free_path(root: &Path, timestamp: i64) -> PathBuf {
    let mut attempt = 0;
    loop {
        let path = root.join(wallpaper_file_name(timestamp, attempt));
        if !path.exists() {
            return path;
        }
        attempt += 1;
    }
}

/// Encode `canvas` as JPEG and write it atomically into `root`.
///
/// Returns the absolute path of the written file.
pub fn write_wallpaper(
    root: &Path,
    canvas: RgbaImage,
    quality: u8,
    timestamp: i64,
) -> Result<PathBuf, RenderError> {
    let path = free_path(root, timestamp);
    let (width, height) = canvas.dimensions();

    let bytes = codec::encode_jpeg(&DynamicImage::ImageRgba8(canvas), quality)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    codec::write_atomic(&path, &bytes).map_err(|e| RenderError::Write {
        path: path.clone(),
        source: e,
    })?;

    let path = path.canonicalize().map_err(|e| RenderError::Write {
        path: path.clone(),
        source: e,
    })?;

    log::info!(
        "Wallpaper written to {} ({}x{}, quality {})",
        path.display(),
        width,
        height,
        quality
    );

    Ok(path)
}
