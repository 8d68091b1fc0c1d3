use super::{MediaSource, get_body};
use common::{FetchQuery, MediaItem, SourceError};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

const MEDIA_URL: &str = "https://instagram.com";

/// Most photos the media endpoint returns
pub const MEDIA_LIMIT: usize = 20;

/// Thumbnail edge lengths the CDN serves, ascending
const THUMB_SIZES: [u32; 8] = [320, 360, 420, 480, 540, 640, 720, 960];

static SIZE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/s\d+x\d+/").expect("thumbnail size pattern is valid"));

#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    items: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    id: String,
    images: Images,
}

#[derive(Debug, Deserialize)]
struct Images {
    thumbnail: Thumbnail,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Public profile media of an Instagram account
#[derive(Debug, Clone)]
pub struct Instagram {
    client: reqwest::Client,
    base_url: String,
}

impl Instagram {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, MEDIA_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl MediaSource for Instagram {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<MediaItem>, SourceError> {
        if query.limit > MEDIA_LIMIT {
            return Err(SourceError::Unsupported(format!(
                "Instagram supports only {} photos, limit too high",
                MEDIA_LIMIT
            )));
        }

        let url = format!("{}/{}/media", self.base_url, query.profile);
        log::info!("Fetching Instagram media for {:?}", query.profile);

        let body = get_body(self.client.get(&url), |_| None).await?;
        items_from_response(&body, query)
    }

    fn square_only(&self) -> bool {
        true
    }
}

/// Smallest thumbnail size strictly larger than `size`, else the largest
pub fn best_size(size: u32) -> u32 {
    THUMB_SIZES
        .iter()
        .copied()
        .find(|s| *s > size)
        .unwrap_or(THUMB_SIZES[THUMB_SIZES.len() - 1])
}

/// Point a thumbnail URL at another `/sNxN/` size
pub fn resize_url(url: &str, size: u32) -> String {
    SIZE_PART
        .replace_all(url, format!("/s{}x{}/", size, size).as_str())
        .into_owned()
}

fn items_from_response(body: &[u8], query: &FetchQuery) -> Result<Vec<MediaItem>, SourceError> {
    let response: MediaResponse = serde_json::from_slice(body)?;
    let size = best_size(query.size);

    Ok(response
        .items
        .into_iter()
        .take(query.limit)
        .map(|media| {
            let url = resize_url(&media.images.thumbnail.url, size);
            MediaItem::new(media.id, url, size, size)
        })
        .collect())
}
