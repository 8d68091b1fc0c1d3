//! Disk-backed photo cache.
//!
//! Every photo lives in one file directly inside the cache root, named after
//! its identifier. Generated wallpapers share the same root. Entries are
//! JPEG encoded at full quality and written atomically, so a file at its
//! final path is always complete.

use crate::codec::{self, CACHE_QUALITY};
use common::{CacheError, MediaItem};
use image::{DynamicImage, ImageReader};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ImageCache {
    root: PathBuf,
}

impl ImageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache directory if it doesn't exist yet
    pub fn ensure_root(&self) -> Result<(), CacheError> {
        if self.root.is_dir() {
            log::debug!("Cache directory {} already exists", self.root.display());
            return Ok(());
        }

        log::info!("Creating cache directory {}", self.root.display());
        std::fs::create_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))
    }

    /// File name used for an identifier.
    ///
    /// `[A-Za-z0-9.-]` is kept, every other byte (`_` included) becomes
    /// `_XX` in uppercase hex. A leading dot is escaped as well. The mapping
    /// is injective and never leaves the cache root.
    pub fn entry_name(id: &str) -> String {
        if id.is_empty() {
            return "_".to_string();
        }

        let mut name = String::with_capacity(id.len());
        for (i, byte) in id.bytes().enumerate() {
            let keep = byte.is_ascii_alphanumeric() || byte == b'-' || (byte == b'.' && i > 0);
            if keep {
                name.push(byte as char);
            } else {
                name.push_str(&format!("_{:02X}", byte));
            }
        }
        name
    }

    pub fn entry_path(&self, id: &str) -> PathBuf {
        self.root.join(Self::entry_name(id))
    }

    /// Names of all files in the cache root (directories are ignored)
    pub fn list(&self) -> Result<HashSet<String>, CacheError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        let mut names = HashSet::new();

        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.root, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| CacheError::io(entry.path(), e))?;

            if file_type.is_dir() {
                continue;
            }

            names.insert(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(names)
    }

    /// Dimensions of a cached entry, reading only the image header
    pub fn dimensions(&self, id: &str) -> Option<(u32, u32)> {
        let path = self.entry_path(id);
        if !path.is_file() {
            return None;
        }

        match ImageReader::open(&path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::from)
            .and_then(|reader| reader.into_dimensions())
        {
            Ok(dims) => Some(dims),
            Err(e) => {
                log::warn!("Unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Whether the cached entry exists and matches the item's dimensions
    pub fn is_valid(&self, item: &MediaItem) -> bool {
        match self.dimensions(&item.id) {
            Some((w, h)) if w == item.width && h == item.height => true,
            Some((w, h)) => {
                log::info!(
                    "Cached image has wrong size {:?} ({}x{}, want {}x{}) - downloading new version",
                    item.id,
                    w,
                    h,
                    item.width,
                    item.height
                );
                false
            }
            None => false,
        }
    }

    /// Encode and atomically write an entry
    pub fn store(&self, id: &str, image: &DynamicImage) -> Result<(), CacheError> {
        let path = self.entry_path(id);

        let bytes = codec::encode_jpeg(image, CACHE_QUALITY).map_err(|e| CacheError::Image {
            path: path.clone(),
            message: e.to_string(),
        })?;

        codec::write_atomic(&path, &bytes).map_err(|e| CacheError::io(&path, e))
    }

    /// Decode a cached entry
    pub fn load(&self, id: &str) -> Result<DynamicImage, CacheError> {
        let path = self.entry_path(id);

        let reader = ImageReader::open(&path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| CacheError::io(&path, e))?;

        reader.decode().map_err(|e| CacheError::Image {
            path: path.clone(),
            message: e.to_string(),
        })
    }

    /// Cached names that belong to none of the given items
    pub fn stale_entries(cached: &HashSet<String>, items: &[MediaItem]) -> Vec<String> {
        let current: HashSet<String> = items.iter().map(|i| Self::entry_name(&i.id)).collect();

        let mut stale: Vec<String> = cached
            .iter()
            .filter(|name| !current.contains(*name))
            .cloned()
            .collect();
        stale.sort();
        stale
    }

    /// Remove the named entries, returning how many were deleted.
    ///
    /// Failures are logged and skipped.
    pub fn evict(&self, names: &[String]) -> usize {
        let mut removed = 0;

        for name in names {
            let path = self.root.join(name);
            log::info!("Removing old image {:?}", path);

            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to remove old file {:?}: {}", path, e),
            }
        }

        removed
    }
}
