//! Port definition for image caching.

use std::sync::Arc;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur while resolving an image.
///
/// These never cross the loader boundary; they are collapsed to "no image".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Transport failure before a response was received.
    #[error("Network error: {0}")]
    NetworkError(String),
    /// The origin answered outside the success range.
    #[error("HTTP status {0}")]
    StatusError(u16),
    /// Failed to decode image.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// Failed to (de)serialize persisted response metadata.
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// The request was superseded and abandoned.
    #[error("Request cancelled")]
    Cancelled,
}

/// Port for the in-memory decoded image cache, keyed by absolute URL.
///
/// Implementations must be thread-safe. Reads may run concurrently with each
/// other; writes are mutually exclusive.
pub trait ImageCachePort: Send + Sync {
    /// Attempts to get an image from the cache.
    /// Returns None if not cached.
    fn get(&self, url: &str) -> Option<Arc<image::DynamicImage>>;

    /// Stores an image unless the key is already present.
    /// Returns the value held under `url` afterwards.
    fn insert(&self, url: String, image: Arc<image::DynamicImage>) -> Arc<image::DynamicImage>;

    /// Returns true if `url` has an entry.
    fn contains(&self, url: &str) -> bool;

    /// Returns the current number of cached images.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all images from the cache.
    fn clear(&self);
}
