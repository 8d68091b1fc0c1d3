use super::{MediaSource, get_body, page_count};
use common::{FetchQuery, MediaItem, SourceError};
use serde::Deserialize;

const PHOTOS_URL: &str = "https://api.500px.com/v1/photos";

pub const PAGE_SIZE: usize = 20;

/// `(image_size id, edge length)` of the cropped square variants
const SQUARE_SIZES: &[(&str, u32)] = &[
    ("1", 70),
    ("2", 140),
    ("3", 280),
    ("100", 100),
    ("200", 200),
    ("440", 440),
    ("600", 600),
];

/// `(image_size id, longest edge)` of the uncropped variants
const SIZES: &[(&str, u32)] = &[
    ("4", 900),
    ("5", 1170),
    ("30", 256),
    ("1080", 1080),
    ("1600", 1600),
    ("2048", 2048),
];

#[derive(Debug, Deserialize)]
struct PhotosResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: u64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    images: Vec<PhotoImage>,
}

#[derive(Debug, Deserialize)]
struct PhotoImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Photo streams from the 500px API
#[derive(Debug, Clone)]
pub struct FiveHundredPx {
    client: reqwest::Client,
    consumer_key: String,
    base_url: String,
}

impl FiveHundredPx {
    pub fn new(consumer_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_base_url(consumer_key, client, PHOTOS_URL)
    }

    pub fn with_base_url(
        consumer_key: impl Into<String>,
        client: reqwest::Client,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            consumer_key: consumer_key.into(),
            base_url: base_url.into(),
        }
    }
}

impl MediaSource for FiveHundredPx {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<MediaItem>, SourceError> {
        let mut params = base_params(&self.consumer_key, query)?;

        let (size_id, size) = best_size(query.size, query.square).ok_or_else(|| {
            SourceError::Unsupported(format!("500px doesn't support image size {}", query.size))
        })?;
        params.push(("image_size", size_id.to_string()));

        log::info!(
            "Fetching 500px photos for {:?} (image_size {})",
            query.profile,
            size_id
        );

        let mut items = Vec::with_capacity(query.limit);

        for page in 1..=page_count(query.limit, PAGE_SIZE) {
            let request = self
                .client
                .get(&self.base_url)
                .query(&params)
                .query(&[("page", page.to_string()), ("rpp", PAGE_SIZE.to_string())]);

            let body = get_body(request, error_message).await?;
            let page_items = items_from_page(&body, size, query.square)?;

            if page_items.is_empty() {
                log::debug!("500px stream drained after {} pages", page - 1);
                break;
            }

            items.extend(page_items);
        }

        items.truncate(query.limit);
        Ok(items)
    }
}

/// Query parameters shared by every page.
///
/// The profile is `<feature>` or `user:<username>`.
fn base_params(
    consumer_key: &str,
    query: &FetchQuery,
) -> Result<Vec<(&'static str, String)>, SourceError> {
    let mut parts = query.profile.splitn(2, ':');
    let feature = parts.next().unwrap_or_default();

    let mut params = vec![
        ("consumer_key", consumer_key.to_string()),
        ("feature", feature.to_string()),
    ];

    if feature == "user" {
        match parts.next().filter(|name| !name.is_empty()) {
            Some(username) => params.push(("username", username.to_string())),
            None => {
                return Err(SourceError::InvalidProfile(
                    "Missing username in profile - user:<username>".to_string(),
                ));
            }
        }
    }

    if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
        params.push(("only", tag.to_string()));
    }

    Ok(params)
}

/// Smallest available size at least as large as `size`
pub fn best_size(size: u32, square: bool) -> Option<(&'static str, u32)> {
    let table = if square { SQUARE_SIZES } else { SIZES };

    table
        .iter()
        .filter(|(_, s)| *s >= size)
        .min_by_key(|(_, s)| *s)
        .copied()
}

/// Dimensions of a photo scaled so its longest edge becomes `size`
pub fn scaled_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f64;
    let ratio = size as f64 / longest;

    ((ratio * width as f64) as u32, (ratio * height as f64) as u32)
}

fn items_from_page(body: &[u8], size: u32, square: bool) -> Result<Vec<MediaItem>, SourceError> {
    let response: PhotosResponse = serde_json::from_slice(body)?;

    response
        .photos
        .into_iter()
        .map(|photo| {
            let url = photo
                .images
                .into_iter()
                .next()
                .map(|image| image.url)
                .ok_or_else(|| SourceError::Decode(format!("photo {} has no image", photo.id)))?;

            let (width, height) = if square {
                (size, size)
            } else {
                scaled_dimensions(photo.width, photo.height, size)
            };

            Ok(MediaItem::new(photo.id.to_string(), url, width, height))
        })
        .collect()
}

fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error)
}
