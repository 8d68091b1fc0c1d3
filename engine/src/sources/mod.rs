//! Media providers.
//!
//! A provider turns a [`FetchQuery`] into the list of photos to render.
//! Pagination, authentication and per-provider limits stay in here; the
//! pipeline only sees [`MediaItem`]s.

pub mod fivehundredpx;
pub mod instagram;
pub mod tumblr;

use common::{FetchQuery, MediaItem, SourceError};
use std::future::Future;

pub use fivehundredpx::FiveHundredPx;
pub use instagram::Instagram;
pub use tumblr::Tumblr;

/// Names accepted by [`Provider::new`]
pub const PROVIDER_NAMES: &[&str] = &["instagram", "500px", "tumblr"];

/// Something that lists photos for a profile
pub trait MediaSource {
    fn fetch(
        &self,
        query: &FetchQuery,
    ) -> impl Future<Output = Result<Vec<MediaItem>, SourceError>> + Send;

    /// Whether the provider can only deliver square photos
    fn square_only(&self) -> bool {
        false
    }
}

/// The configured provider, chosen once at startup
#[derive(Debug, Clone)]
pub enum Provider {
    Instagram(Instagram),
    FiveHundredPx(FiveHundredPx),
    Tumblr(Tumblr),
}

impl Provider {
    pub fn new(name: &str, api_key: &str, client: reqwest::Client) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "instagram" => Some(Self::Instagram(Instagram::new(client))),
            "500px" => Some(Self::FiveHundredPx(FiveHundredPx::new(api_key, client))),
            "tumblr" => Some(Self::Tumblr(Tumblr::new(api_key, client))),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Instagram(_) => "instagram",
            Self::FiveHundredPx(_) => "500px",
            Self::Tumblr(_) => "tumblr",
        }
    }
}

impl MediaSource for Provider {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<MediaItem>, SourceError> {
        match self {
            Self::Instagram(source) => source.fetch(query).await,
            Self::FiveHundredPx(source) => source.fetch(query).await,
            Self::Tumblr(source) => source.fetch(query).await,
        }
    }

    fn square_only(&self) -> bool {
        match self {
            Self::Instagram(source) => source.square_only(),
            Self::FiveHundredPx(source) => source.square_only(),
            Self::Tumblr(source) => source.square_only(),
        }
    }
}

/// Send a request and return the body of a successful response.
///
/// Any other status is turned into a [`SourceError::Status`] with the
/// message extracted from the body by `error_message`.
pub(crate) async fn get_body(
    request: reqwest::RequestBuilder,
    error_message: fn(&[u8]) -> Option<String>,
) -> Result<Vec<u8>, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::Http(e.to_string()))?;

    let status = response.status();
    log::debug!("{} {}", status, response.url());

    let body = response
        .bytes()
        .await
        .map_err(|e| SourceError::Http(e.to_string()))?;

    if !status.is_success() {
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        return Err(SourceError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(body.to_vec())
}

/// Number of pages of `page_size` needed for `limit` items
pub(crate) fn page_count(limit: usize, page_size: usize) -> usize {
    limit.div_ceil(page_size)
}
