//! Paints the wallpaper canvas.
//!
//! The canvas starts as a flat color or a tiled pattern. Photos are then
//! copied onto it at their placements, scaled with Lanczos3 when the cached
//! size differs from the slot. Nothing is blended and off-canvas pixels are
//! dropped.

use crate::layout::Placement;
use common::RenderError;
use fast_image_resize::images::{Image, ImageRef};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use std::path::PathBuf;

/// Configured background, resolved before compositing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSpec {
    /// Flat RGBA color
    Color([u8; 4]),
    /// Image tiled across the whole canvas
    Pattern(PathBuf),
}

/// Background ready to be painted
#[derive(Debug, Clone)]
pub enum Background {
    Color(Rgba<u8>),
    Pattern(RgbaImage),
}

impl Background {
    /// Load the background described by `spec`
    pub fn load(spec: &BackgroundSpec) -> Result<Self, RenderError> {
        match spec {
            BackgroundSpec::Color(rgba) => Ok(Self::Color(Rgba(*rgba))),
            BackgroundSpec::Pattern(path) => {
                log::info!("Loading background pattern {}", path.display());

                let pattern = image::open(path).map_err(|e| RenderError::Pattern {
                    path: path.clone(),
                    message: e.to_string(),
                })?;

                if pattern.width() == 0 || pattern.height() == 0 {
                    return Err(RenderError::Pattern {
                        path: path.clone(),
                        message: "pattern is empty".to_string(),
                    });
                }

                Ok(Self::Pattern(pattern.to_rgba8()))
            }
        }
    }
}

/// Canvas the wallpaper is painted on
pub struct Compositor {
    canvas: RgbaImage,
    resizer: Resizer,
}

impl Compositor {
    /// Allocate a canvas and paint the background
    pub fn new(width: u32, height: u32, background: &Background) -> Self {
        let canvas = match background {
            Background::Color(color) => ImageBuffer::from_pixel(width, height, *color),
            Background::Pattern(pattern) => {
                let mut canvas = RgbaImage::new(width, height);
                tile_pattern(&mut canvas, pattern);
                canvas
            }
        };

        Self {
            canvas,
            resizer: Resizer::new(),
        }
    }

    /// Draw a photo at its placement, resizing when needed.
    ///
    /// Pixels are copied as-is (no blending). Anything outside the canvas is
    /// clipped.
    pub fn draw(&mut self, image: &DynamicImage, placement: &Placement) -> Result<(), RenderError> {
        if placement.width == 0 || placement.height == 0 {
            return Ok(());
        }

        let mut tile = image.to_rgba8();
        if tile.dimensions() != (placement.width, placement.height) {
            tile = resize_image(&mut self.resizer, &tile, placement.width, placement.height)?;
        }

        image::imageops::replace(&mut self.canvas, &tile, placement.x, placement.y);
        Ok(())
    }

    pub fn into_canvas(self) -> RgbaImage {
        self.canvas
    }
}

/// Repeat `pattern` from the top-left corner until the canvas is covered
pub fn tile_pattern(canvas: &mut RgbaImage, pattern: &RgbaImage) {
    let (period_x, period_y) = pattern.dimensions();
    if period_x == 0 || period_y == 0 {
        return;
    }

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        *pixel = *pattern.get_pixel(x % period_x, y % period_y);
    }
}

/// Scale `source` to `width`x`height` with a Lanczos3 convolution.
///
/// The result is written straight into a new RGBA buffer. `resizer` keeps
/// its scratch buffers between calls.
pub fn resize_image(
    resizer: &mut Resizer,
    source: &RgbaImage,
    width: u32,
    height: u32,
) -> Result<RgbaImage, RenderError> {
    let src = ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| RenderError::Resize(e.to_string()))?;

    let mut resized = RgbaImage::new(width, height);
    let mut dst = Image::from_slice_u8(width, height, &mut resized, PixelType::U8x4)
        .map_err(|e| RenderError::Resize(e.to_string()))?;

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src, &mut dst, &options)
        .map_err(|e| RenderError::Resize(e.to_string()))?;

    Ok(resized)
}
