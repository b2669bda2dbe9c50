//! Disk-backed HTTP response cache for persistence across sessions.
//!
//! Each entry is a pair of files named after the hashed request URL:
//! `<id>.body` holds the raw payload and `<id>.meta` a JSON record of the
//! response. Both are written to `.tmp` siblings and renamed into place, body
//! first, so an entry without metadata is treated as absent.
//!
//! Reads share a lock that stores, removals and clears take exclusively, so a
//! reader never sees the body of one write paired with the metadata of another.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::domain::entities::ImageId;
use crate::domain::ports::{CacheError, CacheResult, CachedResponse, ResponseCachePort};

/// Maximum disk cache size in bytes (200 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const BODY_EXT: &str = "body";
const META_EXT: &str = "meta";
const TMP_EXT: &str = "tmp";

#[derive(Debug, Serialize, Deserialize)]
struct StoredMetadata {
    url: String,
    final_url: String,
    status: u16,
    content_type: Option<String>,
    stored_at: DateTime<Utc>,
    size: u64,
}

/// Disk-based cache of raw HTTP responses.
pub struct DiskResponseCache {
    cache_dir: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
    entries: RwLock<()>,
}

impl std::fmt::Debug for DiskResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskResponseCache")
            .field("cache_dir", &self.cache_dir)
            .field("max_size", &self.max_size)
            .field("current_size", &self.current_size.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl DiskResponseCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created or read.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create cache dir: {e}")))?;
        let mut total_size = 0u64;
        let mut count = 0usize;

        let mut entries = fs::read_dir(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if has_ext(&path, TMP_EXT) {
                // left behind by an interrupted store
                remove_if_present(&path).await;
            } else if has_ext(&path, BODY_EXT)
                && let Ok(meta) = entry.metadata().await
            {
                total_size += meta.len();
                count += 1;
            }
        }

        let cache = Self {
            cache_dir,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
            entries: RwLock::new(()),
        };

        cache.cleanup_if_needed().await;

        Ok(cache)
    }

    /// Creates a cache in the default location (e.g. `~/.cache/feed-images/responses/`).
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created.
    pub async fn default_location() -> CacheResult<Self> {
        Self::new(default_cache_dir(), DEFAULT_MAX_CACHE_SIZE).await
    }

    /// Returns the directory holding the cache files.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn body_path(&self, id: &ImageId) -> PathBuf {
        self.cache_dir.join(format!("{}.{BODY_EXT}", id.as_str()))
    }

    fn meta_path(&self, id: &ImageId) -> PathBuf {
        self.cache_dir.join(format!("{}.{META_EXT}", id.as_str()))
    }

    async fn read_entry(&self, url: &str) -> CacheResult<Option<CachedResponse>> {
        let id = ImageId::from_url(url);
        let _shared = self.entries.read().await;

        let Ok(raw_meta) = fs::read(self.meta_path(&id)).await else {
            return Ok(None);
        };
        let meta: StoredMetadata = serde_json::from_slice(&raw_meta)
            .map_err(|e| CacheError::SerializationError(format!("Bad metadata: {e}")))?;

        if meta.url != url {
            // hash collision or foreign file
            return Ok(None);
        }

        let body_path = self.body_path(&id);
        let body = fs::read(&body_path)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cached body: {e}")))?;

        if body.len() as u64 != meta.size {
            return Err(CacheError::IoError(format!(
                "Truncated body: expected {} bytes, found {}",
                meta.size,
                body.len()
            )));
        }

        touch(&body_path).await;

        Ok(Some(CachedResponse {
            url: meta.url,
            final_url: meta.final_url,
            status: meta.status,
            content_type: meta.content_type,
            stored_at: meta.stored_at,
            body: Bytes::from(body),
        }))
    }

    /// Returns the current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of cached responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if a response is cached for `url`.
    pub async fn contains(&self, url: &str) -> bool {
        let id = ImageId::from_url(url);
        fs::try_exists(self.meta_path(&id)).await.unwrap_or(false)
    }

    /// Cleans up least recently used entries if over size limit.
    ///
    /// Reads refresh a body's modification time, so it orders entries by use.
    /// Callers hold the exclusive lock, except during construction.
    async fn cleanup_if_needed(&self) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = current_size,
            max_size = self.max_size,
            "Response cache over limit, cleaning up"
        );

        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, SystemTime, u64)> = Vec::new();

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !has_ext(&path, BODY_EXT) {
                continue;
            }

            if let Ok(meta) = entry.metadata().await {
                let used = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, used, meta.len()));
            }
        }

        files.sort_by_key(|(_, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        let target = current_size - self.max_size + (self.max_size / 10);

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }

            remove_if_present(&path.with_extension(META_EXT)).await;
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove old cache file");
            } else {
                trace!(path = %path.display(), "Removed old cache file");
                freed_size += size;
                freed_count += 1;
            }
        }
        sub_saturating_u64(&self.current_size, freed_size);
        sub_saturating_usize(&self.item_count, freed_count);

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "Response cache cleanup complete"
        );
    }
}

#[async_trait]
impl ResponseCachePort for DiskResponseCache {
    async fn cached_response(&self, url: &str) -> Option<CachedResponse> {
        match self.read_entry(url).await {
            Ok(Some(response)) => {
                trace!(url = %url, "Response cache hit");
                Some(response)
            }
            Ok(None) => {
                trace!(url = %url, "Response cache miss");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Dropping unreadable cached response");
                self.remove(url).await;
                None
            }
        }
    }

    async fn store_response(&self, response: &CachedResponse) -> CacheResult<()> {
        let id = ImageId::from_url(&response.url);
        let body_path = self.body_path(&id);
        let meta_path = self.meta_path(&id);
        let body_tmp = tmp_path(&body_path);
        let meta_tmp = tmp_path(&meta_path);

        let new_size = response.body.len() as u64;
        let meta = StoredMetadata {
            url: response.url.clone(),
            final_url: response.final_url.clone(),
            status: response.status,
            content_type: response.content_type.clone(),
            stored_at: response.stored_at,
            size: new_size,
        };
        let raw_meta = serde_json::to_vec(&meta)
            .map_err(|e| CacheError::SerializationError(format!("Bad metadata: {e}")))?;

        let _exclusive = self.entries.write().await;

        let old_size = fs::metadata(&body_path).await.map(|m| m.len()).ok();

        if let Err(e) = write_in_place(&body_tmp, &response.body, &body_path).await {
            remove_if_present(&body_tmp).await;
            return Err(e);
        }
        if let Err(e) = write_in_place(&meta_tmp, &raw_meta, &meta_path).await {
            remove_if_present(&meta_tmp).await;
            // the old metadata no longer describes the new body
            remove_if_present(&meta_path).await;
            remove_if_present(&body_path).await;
            if let Some(old) = old_size {
                sub_saturating_u64(&self.current_size, old);
                sub_saturating_usize(&self.item_count, 1);
            }
            return Err(e);
        }

        match old_size {
            Some(old) if new_size >= old => {
                self.current_size.fetch_add(new_size - old, Ordering::Relaxed);
            }
            Some(old) => sub_saturating_u64(&self.current_size, old - new_size),
            None => {
                self.current_size.fetch_add(new_size, Ordering::Relaxed);
                self.item_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        debug!(url = %response.url, path = %body_path.display(), size = new_size, "Stored response in disk cache");

        self.cleanup_if_needed().await;

        Ok(())
    }

    async fn remove(&self, url: &str) {
        let id = ImageId::from_url(url);
        let body_path = self.body_path(&id);

        let _exclusive = self.entries.write().await;
        let size = fs::metadata(&body_path).await.map(|m| m.len()).ok();

        remove_if_present(&self.meta_path(&id)).await;
        if let Err(e) = fs::remove_file(&body_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(url = %url, error = %e, "Failed to remove cached response");
            }
        } else if let Some(s) = size {
            sub_saturating_u64(&self.current_size, s);
            sub_saturating_usize(&self.item_count, 1);
            debug!(url = %url, "Removed cached response");
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        let _exclusive = self.entries.write().await;
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read entry: {e}")))?
        {
            let path = entry.path();
            if (has_ext(&path, BODY_EXT) || has_ext(&path, META_EXT) || has_ext(&path, TMP_EXT))
                && fs::remove_file(&path).await.is_err()
            {
                warn!(path = %path.display(), "Failed to remove cache file");
            }
        }
        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!("Cleared response cache");
        Ok(())
    }
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(TMP_EXT);
    PathBuf::from(name)
}

async fn write_in_place(tmp: &Path, contents: &[u8], dest: &Path) -> CacheResult<()> {
    fs::write(tmp, contents)
        .await
        .map_err(|e| CacheError::IoError(format!("Failed to write cache file: {e}")))?;
    fs::rename(tmp, dest)
        .await
        .map_err(|e| CacheError::IoError(format!("Failed to move cache file into place: {e}")))
}

async fn remove_if_present(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Failed to remove cache file");
    }
}

/// Marks a body as just used.
async fn touch(path: &Path) {
    let path = path.to_path_buf();
    let touched = tokio::task::spawn_blocking(move || {
        std::fs::File::open(&path)?.set_modified(SystemTime::now())
    })
    .await;
    if let Ok(Err(e)) = touched {
        trace!(error = %e, "Failed to refresh cache entry time");
    }
}

fn sub_saturating_u64(counter: &AtomicU64, amount: u64) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
        Some(v.saturating_sub(amount))
    });
}

fn sub_saturating_usize(counter: &AtomicUsize, amount: usize) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
        Some(v.saturating_sub(amount))
    });
}

/// Returns the default cache directory path.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "feedimages", "feed-images").map_or_else(
        || {
            std::env::temp_dir()
                .join("feed-images")
                .join("cache")
                .join("responses")
        },
        |dirs| dirs.cache_dir().join("responses"),
    )
}
