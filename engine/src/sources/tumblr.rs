use super::{MediaSource, get_body, page_count};
use common::{FetchQuery, MediaItem, SourceError};
use serde::Deserialize;

const API_URL: &str = "https://api.tumblr.com/v2/blog";

pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Deserialize)]
struct PostsResponse {
    response: Posts,
}

#[derive(Debug, Deserialize)]
struct Posts {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: u64,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    /// Largest first
    #[serde(default)]
    alt_sizes: Vec<PhotoSize>,
    original_size: PhotoSize,
}

#[derive(Debug, Clone, Deserialize)]
struct PhotoSize {
    url: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    meta: ErrorMeta,
}

#[derive(Debug, Deserialize)]
struct ErrorMeta {
    msg: String,
}

/// Photo posts of a Tumblr blog
#[derive(Debug, Clone)]
pub struct Tumblr {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl Tumblr {
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_base_url(api_key, client, API_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        client: reqwest::Client,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

impl MediaSource for Tumblr {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<MediaItem>, SourceError> {
        let url = format!("{}/{}/posts/photo", self.base_url, query.profile);
        log::info!("Fetching Tumblr photo posts for {:?}", query.profile);

        let mut params = vec![("api_key", self.api_key.clone())];
        if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
            params.push(("tag", tag.to_string()));
        }

        let mut items: Vec<MediaItem> = Vec::new();

        for page in 0..page_count(query.limit, PAGE_SIZE) {
            let remaining = query.limit.saturating_sub(items.len());
            if remaining == 0 {
                break;
            }

            let request = self.client.get(&url).query(&params).query(&[
                ("offset", (page * PAGE_SIZE).to_string()),
                ("limit", remaining.min(PAGE_SIZE).to_string()),
            ]);

            let body = get_body(request, error_message).await?;
            let page_items = items_from_page(&body, query.size)?;

            if page_items.is_empty() {
                log::debug!("Tumblr blog drained after {} pages", page);
                break;
            }

            items.extend(page_items);
        }

        items.truncate(query.limit);
        Ok(items)
    }
}

/// Smallest variant whose edges are both at least `size`.
///
/// `alt_sizes` is ordered largest first; the walk stops at the first one
/// that is too small. Without a usable variant the original is used.
fn pick_size(photo: &Photo, size: u32) -> &PhotoSize {
    photo
        .alt_sizes
        .iter()
        .take_while(|s| s.width >= size && s.height >= size)
        .last()
        .unwrap_or(&photo.original_size)
}

fn items_from_page(body: &[u8], size: u32) -> Result<Vec<MediaItem>, SourceError> {
    let response: PostsResponse = serde_json::from_slice(body)?;

    Ok(response
        .response
        .posts
        .iter()
        .filter_map(|post| {
            let Some(photo) = post.photos.first() else {
                log::warn!("Skipping Tumblr post {} without photos", post.id);
                return None;
            };

            let chosen = pick_size(photo, size);
            Some(MediaItem::new(
                post.id.to_string(),
                chosen.url.clone(),
                chosen.width,
                chosen.height,
            ))
        })
        .collect())
}

fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .map(|e| e.meta.msg)
}
