//! Concurrent photo acquisition.
//!
//! Each item is checked against the cache first. Anything missing or stale
//! is fetched, decoded, optionally center-cropped to a square, and written
//! to the cache. At most `concurrency` items are in flight at once; the join
//! waits for every item and returns one outcome per item.

use crate::cache::ImageCache;
use common::{FetchError, MediaItem};
use futures::StreamExt;
use image::DynamicImage;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// Byte transport used to fetch photos
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

/// What happened to a single item during the download phase
#[derive(Debug)]
pub enum DownloadOutcome {
    /// A valid cache entry already existed, nothing was fetched
    Cached,
    /// Fetched and stored; `cropped` if it was center-cropped to a square
    Downloaded { cropped: bool },
    /// Dropped from this run
    Failed(FetchError),
}

/// Per-item outcomes collected by the join
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<(String, DownloadOutcome)>,
}

impl DownloadReport {
    pub fn failed_ids(&self) -> HashSet<String> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DownloadOutcome::Failed(_)))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Downloaded { .. }))
    }

    pub fn cached(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Cached))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

/// Crop rectangle `(x, y, side)` of the centered square inside `width`x`height`.
///
/// The offset on the longer axis is `(longer - shorter) / 2`, truncated.
pub fn square_crop_rect(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}

/// Center-crop a non-square image to a square of its shorter edge
pub fn center_crop_square(image: &DynamicImage) -> Option<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    if width == height {
        return None;
    }

    let (x, y, side) = square_crop_rect(width, height);
    Some(image.crop_imm(x, y, side, side))
}

/// Decode, normalize and store one photo; returns the stored dimensions and
/// whether it was cropped
fn normalize_and_store(
    cache: &ImageCache,
    id: &str,
    bytes: &[u8],
    square: bool,
) -> Result<(u32, u32, bool), FetchError> {
    let mut image = image::load_from_memory(bytes).map_err(|e| FetchError::Decode {
        id: id.to_string(),
        message: e.to_string(),
    })?;

    let mut cropped = false;
    if square && let Some(squared) = center_crop_square(&image) {
        log::debug!(
            "Cropping {:?} from {}x{} to {}x{}",
            id,
            image.width(),
            image.height(),
            squared.width(),
            squared.height()
        );
        image = squared;
        cropped = true;
    }

    cache.store(id, &image).map_err(|e| FetchError::Store {
        id: id.to_string(),
        message: e.to_string(),
    })?;

    Ok((image.width(), image.height(), cropped))
}

pub struct Downloader<'a, T: Transport> {
    transport: &'a T,
    cache: &'a ImageCache,
    square: bool,
    concurrency: usize,
}

impl<'a, T: Transport> Downloader<'a, T> {
    pub fn new(transport: &'a T, cache: &'a ImageCache, square: bool, concurrency: usize) -> Self {
        Self {
            transport,
            cache,
            square,
            concurrency: concurrency.max(1),
        }
    }

    /// Acquire every item and wait for all of them.
    ///
    /// Items cropped to a square have their dimensions updated in place.
    pub async fn run(&self, items: &mut [MediaItem]) -> DownloadReport {
        log::info!(
            "Acquiring {} images ({} at a time)",
            items.len(),
            self.concurrency
        );

        let outcomes = futures::stream::iter(items.iter_mut())
            .map(|item| self.acquire(item))
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let report = DownloadReport { outcomes };
        log::info!(
            "Download complete: {} fetched, {} cached, {} failed",
            report.downloaded(),
            report.cached(),
            report.failed()
        );

        report
    }

    async fn acquire(&self, item: &mut MediaItem) -> (String, DownloadOutcome) {
        // A square tile can never be larger than the shorter edge
        if self.square && !item.is_square() {
            let side = item.width.min(item.height);
            item.width = side;
            item.height = side;
        }

        if self.cache.is_valid(item) {
            log::debug!("Using cached image {:?}", item.id);
            return (item.id.clone(), DownloadOutcome::Cached);
        }

        let outcome = match self.fetch_and_store(item).await {
            Ok(cropped) => DownloadOutcome::Downloaded { cropped },
            Err(e) => {
                log::warn!("Error: {}", e);
                DownloadOutcome::Failed(e)
            }
        };

        (item.id.clone(), outcome)
    }

    /// Fetch one item and write it to the cache.
    ///
    /// Returns whether the photo was cropped, in which case the item now
    /// carries the cropped dimensions.
    pub async fn fetch_and_store(&self, item: &mut MediaItem) -> Result<bool, FetchError> {
        log::info!("Downloading {:?}", item.id);

        let bytes = self.transport.get(&item.url).await?;

        let cache = self.cache.clone();
        let id = item.id.clone();
        let square = self.square;

        let (width, height, cropped) =
            tokio::task::spawn_blocking(move || normalize_and_store(&cache, &id, &bytes, square))
                .await
                .map_err(|e| FetchError::Store {
                    id: item.id.clone(),
                    message: e.to_string(),
                })??;

        if cropped {
            item.width = width;
            item.height = height;
        }

        log::info!("Download of {:?} complete", item.id);
        Ok(cropped)
    }
}
