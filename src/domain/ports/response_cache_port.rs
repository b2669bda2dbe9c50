//! Port for the persistent HTTP response cache.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::http_transport_port::HttpResponse;
use super::image_cache_port::CacheResult;

/// A stored response for a previously requested URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// URL the request was issued for. This is the cache key.
    pub url: String,
    /// URL the response was finally served from.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Content type reported by the origin.
    pub content_type: Option<String>,
    /// When the response was stored.
    pub stored_at: DateTime<Utc>,
    /// Raw payload.
    pub body: Bytes,
}

impl CachedResponse {
    /// Captures a network response for the given request URL.
    #[must_use]
    pub fn from_http(url: impl Into<String>, response: &HttpResponse) -> Self {
        Self {
            url: url.into(),
            final_url: response.url.clone(),
            status: response.status,
            content_type: response.content_type.clone(),
            stored_at: Utc::now(),
            body: response.body.clone(),
        }
    }
}

/// Port for a response cache keyed by request URL.
#[async_trait]
pub trait ResponseCachePort: Send + Sync {
    /// Returns the stored response for `url`, if any.
    async fn cached_response(&self, url: &str) -> Option<CachedResponse>;

    /// Persists a response under its request URL, replacing any previous one.
    async fn store_response(&self, response: &CachedResponse) -> CacheResult<()>;

    /// Removes the stored response for `url`.
    async fn remove(&self, url: &str);

    /// Removes every stored response.
    async fn clear(&self) -> CacheResult<()>;
}
