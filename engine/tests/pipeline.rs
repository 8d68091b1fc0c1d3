/// End to end runs of the wallpaper pipeline
/// Network access is replaced by a stub source and an in-memory transport
use common::{FetchError, FetchQuery, GridMode, MediaItem, SourceError};
use engine::cache::ImageCache;
use engine::compositor::BackgroundSpec;
use engine::layout::GridSpec;
use engine::{MediaSource, PipelineError, Settings, Transport, pipeline};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct StubSource {
    items: Vec<MediaItem>,
    square_only: bool,
}

impl StubSource {
    fn new(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            square_only: false,
        }
    }
}

impl MediaSource for StubSource {
    async fn fetch(&self, _query: &FetchQuery) -> Result<Vec<MediaItem>, SourceError> {
        Ok(self.items.clone())
    }

    fn square_only(&self) -> bool {
        self.square_only
    }
}

struct FailingSource;

impl MediaSource for FailingSource {
    async fn fetch(&self, _query: &FetchQuery) -> Result<Vec<MediaItem>, SourceError> {
        Err(SourceError::Status {
            status: 404,
            message: "Not Found".to_string(),
        })
    }
}

#[derive(Default)]
struct MemoryTransport {
    files: HashMap<String, Vec<u8>>,
    hits: AtomicUsize,
}

impl MemoryTransport {
    fn serve(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Transport for MemoryTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.files.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn url(id: &str) -> String {
    format!("http://photos.test/{}", id)
}

fn item(id: &str, width: u32, height: u32) -> MediaItem {
    MediaItem::new(id, url(id), width, height)
}

fn settings(dir: &Path, mode: GridMode) -> Settings {
    Settings {
        provider: "stub".to_string(),
        api_key: String::new(),
        query: FetchQuery {
            profile: "someone".to_string(),
            size: 64,
            tag: None,
            limit: 20,
            square: mode.is_square(),
        },
        mode,
        grid: GridSpec {
            canvas_width: 400,
            canvas_height: 300,
            tile: 64,
            spacing: 4,
            columns: 3,
        },
        quality: 90,
        background: BackgroundSpec::Color([255, 255, 255, 255]),
        cache_dir: dir.to_path_buf(),
        concurrency: 4,
        timeout: Duration::from_secs(5),
        setter: None,
    }
}

fn wallpapers(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("wallpaper_"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_stale_entries_evicted_and_missing_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ImageCache::new(dir.path());
    let photo = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])));
    cache.store("a", &photo).unwrap();
    cache.store("b", &photo).unwrap();
    cache.store("x", &photo).unwrap();

    let source = StubSource::new(vec![item("a", 64, 64), item("b", 64, 64), item("c", 64, 64)]);
    let transport = MemoryTransport::default().serve(&url("c"), png(64, 64));

    let summary = pipeline::run(&settings(dir.path(), GridMode::Square), &source, &transport)
        .await
        .unwrap();

    assert_eq!(transport.hits(), 1);
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.cached, 2);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.evicted, 1);
    assert_eq!(summary.placed, 3);

    let names = cache.list().unwrap();
    assert!(names.contains("a"));
    assert!(names.contains("b"));
    assert!(names.contains("c"));
    assert!(!names.contains("x"));
    assert_eq!(names.len(), 4);

    let wallpaper = summary.wallpaper.unwrap();
    assert!(wallpaper.is_absolute());
    let written = image::open(&wallpaper).unwrap();
    assert_eq!((written.width(), written.height()), (400, 300));
}

#[tokio::test]
async fn test_second_run_fetches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(vec![item("a", 80, 50), item("b", 64, 64)]);
    let transport = MemoryTransport::default()
        .serve(&url("a"), png(80, 50))
        .serve(&url("b"), png(64, 64));
    let settings = settings(dir.path(), GridMode::Square);

    pipeline::run(&settings, &source, &transport).await.unwrap();
    assert_eq!(transport.hits(), 2);

    let summary = pipeline::run(&settings, &source, &transport).await.unwrap();
    assert_eq!(transport.hits(), 2);
    assert_eq!(summary.cached, 2);
    assert_eq!(summary.downloaded, 0);

    // the previous wallpaper is replaced, not accumulated
    assert_eq!(wallpapers(dir.path()).len(), 1);
    assert_eq!(ImageCache::new(dir.path()).list().unwrap().len(), 3);
}

#[tokio::test]
async fn test_square_mode_stores_center_crop() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(vec![item("wide", 100, 60)]);
    let transport = MemoryTransport::default().serve(&url("wide"), png(100, 60));

    let summary = pipeline::run(&settings(dir.path(), GridMode::Square), &source, &transport)
        .await
        .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(
        ImageCache::new(dir.path()).dimensions("wide"),
        Some((60, 60))
    );
}

#[tokio::test]
async fn test_lookalike_ids_stay_cached() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(vec![item("a/b", 100, 60), item("a_b", 60, 100)]);
    let transport = MemoryTransport::default()
        .serve(&url("a/b"), png(100, 60))
        .serve(&url("a_b"), png(60, 100));
    let settings = settings(dir.path(), GridMode::Justified);

    pipeline::run(&settings, &source, &transport).await.unwrap();
    assert_eq!(transport.hits(), 2);

    let summary = pipeline::run(&settings, &source, &transport).await.unwrap();
    assert_eq!(transport.hits(), 2);
    assert_eq!(summary.cached, 2);
    assert_eq!(summary.evicted, 1);

    let cache = ImageCache::new(dir.path());
    assert_eq!(cache.dimensions("a/b"), Some((100, 60)));
    assert_eq!(cache.dimensions("a_b"), Some((60, 100)));
}

#[tokio::test]
async fn test_justified_mode_keeps_aspect() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(vec![item("wide", 100, 60), item("tall", 60, 100)]);
    let transport = MemoryTransport::default()
        .serve(&url("wide"), png(100, 60))
        .serve(&url("tall"), png(60, 100));

    let summary = pipeline::run(&settings(dir.path(), GridMode::Justified), &source, &transport)
        .await
        .unwrap();

    assert_eq!(summary.placed, 2);
    let cache = ImageCache::new(dir.path());
    assert_eq!(cache.dimensions("wide"), Some((100, 60)));
    assert_eq!(cache.dimensions("tall"), Some((60, 100)));
}

#[tokio::test]
async fn test_failed_item_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(vec![
        item("a", 64, 64),
        item("missing", 64, 64),
        item("broken", 64, 64),
    ]);
    let transport = MemoryTransport::default()
        .serve(&url("a"), png(64, 64))
        .serve(&url("broken"), b"not an image".to_vec());

    let summary = pipeline::run(&settings(dir.path(), GridMode::Square), &source, &transport)
        .await
        .unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.placed, 1);
    assert!(summary.wallpaper.is_some());

    let names = ImageCache::new(dir.path()).list().unwrap();
    assert!(!names.contains("missing"));
    assert!(!names.contains("broken"));
}

#[tokio::test]
async fn test_all_failed_renders_background_only() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(vec![item("gone", 64, 64)]);
    let transport = MemoryTransport::default();

    let summary = pipeline::run(&settings(dir.path(), GridMode::Square), &source, &transport)
        .await
        .unwrap();

    assert_eq!(summary.placed, 0);
    let written = image::open(summary.wallpaper.unwrap()).unwrap().to_rgb8();
    assert!(written.pixels().all(|p| p.0.iter().all(|c| *c >= 250)));
}

#[tokio::test]
async fn test_empty_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(Vec::new());
    let transport = MemoryTransport::default();

    let summary = pipeline::run(&settings(dir.path(), GridMode::Square), &source, &transport)
        .await
        .unwrap();

    assert!(summary.wallpaper.is_none());
    assert!(wallpapers(dir.path()).is_empty());
}

#[tokio::test]
async fn test_source_error_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::default();

    let result = pipeline::run(
        &settings(dir.path(), GridMode::Square),
        &FailingSource,
        &transport,
    )
    .await;

    assert!(matches!(result, Err(PipelineError::Source(_))));
    assert!(wallpapers(dir.path()).is_empty());
}

#[tokio::test]
async fn test_missing_pattern_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::new(vec![item("a", 64, 64)]);
    let transport = MemoryTransport::default().serve(&url("a"), png(64, 64));

    let mut settings = settings(dir.path(), GridMode::Square);
    settings.background = BackgroundSpec::Pattern(dir.path().join("no-such-pattern.png"));

    let result = pipeline::run(&settings, &source, &transport).await;
    assert!(matches!(result, Err(PipelineError::Render(_))));
    assert!(wallpapers(dir.path()).is_empty());
}

#[tokio::test]
async fn test_square_only_source_forces_square_grid() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = StubSource::new(vec![item("wide", 100, 60)]);
    source.square_only = true;
    let transport = MemoryTransport::default().serve(&url("wide"), png(100, 60));

    pipeline::run(&settings(dir.path(), GridMode::Justified), &source, &transport)
        .await
        .unwrap();

    assert_eq!(
        ImageCache::new(dir.path()).dimensions("wide"),
        Some((60, 60))
    );
}
