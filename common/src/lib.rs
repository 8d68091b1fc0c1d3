//! Common types and utilities for tilewall.
//!
//! This crate defines the data structures shared between the rendering
//! engine (`engine`) and the command line front-end (`tilewall`): the media
//! descriptors every provider produces, the grid mode selector, color
//! parsing, and the error kinds each pipeline stage can raise.
//!
//! # Examples
//!
//! ```
//! use common::{GridMode, MediaItem};
//!
//! let item = MediaItem::new("abc", "https://example.com/abc.jpg", 640, 480);
//! assert!(!item.is_square());
//! assert_eq!(GridMode::from_name("justified"), Some(GridMode::Justified));
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain the media list from a provider.
///
/// Always fatal: without a descriptor list there is nothing to render.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response data, the profile probably doesn't exist: {0}")]
    Decode(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Unsupported request: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Per-item acquisition failure.
///
/// Recoverable: the item is dropped from the layout and the run continues.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to download {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to download {url}: status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode image {id}: {message}")]
    Decode { id: String, message: String },

    #[error("Failed to store image {id}: {message}")]
    Store { id: String, message: String },
}

/// Cache directory failures.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache image error at {path}: {message}")]
    Image { path: PathBuf, message: String },
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Compositing and encoding failures.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to load background pattern {path}: {message}")]
    Pattern { path: PathBuf, message: String },

    #[error("Failed to resize image: {0}")]
    Resize(String),

    #[error("Failed to encode wallpaper: {0}")]
    Encode(String),

    #[error("Failed to write wallpaper {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a desktop command installing the wallpaper.
#[derive(Error, Debug)]
pub enum SetterError {
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to set wallpaper, {command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// One photo to be placed on the wallpaper.
///
/// `width` and `height` are the intended display dimensions. The downloader
/// overwrites them once when it center-crops the photo, so later stages see
/// the dimensions of what was actually stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            width,
            height,
        }
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Width over height, used by the justified layout
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Parameters handed to a media provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    /// Provider specific profile (user name, blog name or `feature:user`)
    pub profile: String,
    /// Target edge length in pixels
    pub size: u32,
    /// Optional tag filter
    pub tag: Option<String>,
    /// Maximum number of items to return
    pub limit: usize,
    /// Whether square images are requested
    pub square: bool,
}

/// Grid algorithm used to lay out the photos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    /// Equal-size square tiles
    #[default]
    Square,
    /// Rows of shared height preserving each photo's aspect ratio
    Justified,
}

impl GridMode {
    /// Parse grid mode name
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "square" => Some(Self::Square),
            "justified" | "non-square" => Some(Self::Justified),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Justified => "justified",
        }
    }

    pub fn is_square(&self) -> bool {
        matches!(self, Self::Square)
    }
}

/// Parse a hex color string (e.g., "#FF5733" or "FF5733") to RGBA
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8, u8)> {
    let color = color.trim_start_matches('#');

    if color.len() != 6 && color.len() != 8 {
        return None;
    }

    let r = u8::from_str_radix(color.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(color.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(color.get(4..6)?, 16).ok()?;
    let a = if color.len() == 8 {
        u8::from_str_radix(color.get(6..8)?, 16).ok()?
    } else {
        255
    };

    Some((r, g, b, a))
}

/// Parse an output size in the form `<width>x<height>`
pub fn parse_size(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.trim().split_once('x')?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;

    if w == 0 || h == 0 {
        return None;
    }

    Some((w, h))
}
