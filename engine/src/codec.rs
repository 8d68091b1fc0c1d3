//! Encoding and atomic persistence shared by the cache and the output stage.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult};
use std::io::Write;
use std::path::Path;

/// Quality used for cache entries
pub const CACHE_QUALITY: u8 = 100;

/// Encode an image as JPEG at the given quality (1-100)
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::with_capacity(rgb.len() / 4);

    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder.encode_image(&rgb)?;

    Ok(bytes)
}

/// Write `bytes` to `path` so that the file only appears once complete.
///
/// The data goes to a temporary file in the destination directory which is
/// then renamed over `path`. A crash leaves at most a `.tmp*` file behind,
/// never a truncated entry at the final path.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageReader, Rgba, RgbaImage};

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 128])));
        let bytes = encode_jpeg(&image, 90).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
        assert!(decoded.as_rgb8().is_some());
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        // Only the final file remains, no temporary leftovers
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("entry")]);
    }

    #[test]
    fn test_written_jpeg_header_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo");
        let image = DynamicImage::ImageRgba8(RgbaImage::new(30, 20));

        write_atomic(&path, &encode_jpeg(&image, CACHE_QUALITY).unwrap()).unwrap();

        let dims = ImageReader::open(&path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .into_dimensions()
            .unwrap();
        assert_eq!(dims, (30, 20));
    }
}
