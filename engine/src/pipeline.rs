//! One wallpaper run.
//!
//! `fetch -> download -> evict -> layout -> composite -> encode -> apply`.
//! Only the download phase is concurrent; everything after it runs on the
//! joined results.

use crate::cache::ImageCache;
use crate::compositor::{Background, Compositor};
use crate::config::Settings;
use crate::downloader::{Downloader, Transport};
use crate::layout;
use crate::log_and_continue;
use crate::output;
use crate::sources::MediaSource;
use common::{CacheError, GridMode, RenderError, SetterError, SourceError};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// The wallpaper was written but could not be installed
    #[error(transparent)]
    Setter(#[from] SetterError),
}

/// What a run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Absolute path of the new wallpaper, `None` when the source had no photos
    pub wallpaper: Option<PathBuf>,
    pub fetched: usize,
    pub downloaded: usize,
    pub cached: usize,
    pub failed: usize,
    pub evicted: usize,
    /// Photos actually drawn on the canvas
    pub placed: usize,
    pub applied: bool,
}

pub async fn run<S, T>(
    settings: &Settings,
    source: &S,
    transport: &T,
) -> Result<RunSummary, PipelineError>
where
    S: MediaSource,
    T: Transport,
{
    let cache = ImageCache::new(&settings.cache_dir);
    cache.ensure_root()?;

    let mut mode = settings.mode;
    let mut query = settings.query.clone();
    if source.square_only() && !mode.is_square() {
        log::warn!("Provider only delivers square photos, using the square grid");
        mode = GridMode::Square;
        query.square = true;
    }

    let mut items = source.fetch(&query).await?;
    log::info!("Fetched {} images", items.len());

    let mut summary = RunSummary {
        fetched: items.len(),
        ..Default::default()
    };

    if items.is_empty() {
        log::info!("Nothing to do");
        return Ok(summary);
    }

    let cached_names = cache.list()?;
    log::info!("Found {} cached files", cached_names.len());

    let report = Downloader::new(transport, &cache, mode.is_square(), settings.concurrency)
        .run(&mut items)
        .await;
    summary.downloaded = report.downloaded();
    summary.cached = report.cached();
    summary.failed = report.failed();

    // Anything that isn't a current item goes, including older wallpapers
    let stale = ImageCache::stale_entries(&cached_names, &items);
    summary.evicted = cache.evict(&stale);

    let failed = report.failed_ids();
    items.retain(|item| !failed.contains(&item.id));

    if items.is_empty() {
        log::warn!("No image could be acquired, the wallpaper only shows the background");
    }

    let layout = layout::compute(mode, &items, &settings.grid);
    log::info!(
        "Building wallpaper based on {} images ({}x{}, {} rows, {} columns)",
        items.len(),
        settings.grid.canvas_width,
        settings.grid.canvas_height,
        layout.rows,
        layout.cols
    );

    let background = Background::load(&settings.background)?;
    let mut compositor = Compositor::new(
        settings.grid.canvas_width,
        settings.grid.canvas_height,
        &background,
    );

    for (item, placement) in items.iter().zip(&layout.placements) {
        let image = log_and_continue!(
            cache.load(&item.id),
            "Skipping unreadable cached image {:?}",
            item.id
        );

        if placement.width > image.width() || placement.height > image.height() {
            log::warn!(
                "Image too small {:?} ({}x{} drawn at {}x{})",
                item.id,
                image.width(),
                image.height(),
                placement.width,
                placement.height
            );
        }

        compositor.draw(&image, placement)?;
        summary.placed += 1;
    }

    let path = output::write_wallpaper(
        cache.root(),
        compositor.into_canvas(),
        settings.quality,
        chrono::Utc::now().timestamp(),
    )?;
    summary.wallpaper = Some(path.clone());

    if let Some(setter) = &settings.setter {
        setter.apply(&path)?;
        summary.applied = true;
    }

    Ok(summary)
}
