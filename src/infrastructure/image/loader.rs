//! Async image loading orchestrator.
//!
//! Implements a read-through chain: Memory -> Response cache -> Network.
//! A hit in a lower tier is promoted into every tier above it. Concurrent
//! requests for one URL queue behind the first, which resolves it once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{ImageSource, LoadedImage, SlotId};
use crate::domain::ports::{
    CacheError, CacheResult, CachedResponse, HttpTransportPort, ImageCachePort, ResponseCachePort,
};
use crate::infrastructure::http::{DEFAULT_USER_AGENT, ReqwestTransport};

use super::memory_cache::{CacheStats, DEFAULT_CACHE_SIZE, MemoryImageCache};

/// Message sent to the display surface when a slot request finishes.
#[derive(Debug, Clone)]
pub struct ImageLoadedEvent {
    /// Slot that issued the request.
    pub slot: SlotId,
    /// URL that was requested.
    pub url: String,
    /// The loaded image, or None if no image is available.
    pub image: Option<LoadedImage>,
}

/// Configuration for the image loader.
#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    /// Maximum images in memory cache. `0` means unbounded.
    pub memory_cache_size: usize,
    /// Maximum concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent for outgoing requests.
    pub user_agent: String,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            memory_cache_size: DEFAULT_CACHE_SIZE,
            max_concurrent_downloads: 4,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Handle to an in-flight slot request.
#[derive(Debug)]
pub struct RequestHandle {
    url: String,
    token: CancellationToken,
}

impl RequestHandle {
    /// The requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Abandons the request. It delivers nothing; a download that already
    /// finished is still cached.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of issuing a slot request.
#[derive(Debug)]
pub enum RequestOutcome {
    /// Served from memory on the calling task; no event will follow.
    Ready(LoadedImage),
    /// Resolving in the background; an [`ImageLoadedEvent`] follows unless cancelled.
    Pending(RequestHandle),
}

/// URLs being resolved, each mapped to the gate later requests for it wait on.
type InFlight = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Orchestrates image loading from memory, the response cache, and the network.
///
/// Cloning is cheap; clones share caches, transport and the download limit.
#[derive(Clone)]
pub struct ImageLoader {
    memory_cache: Arc<MemoryImageCache>,
    response_cache: Arc<dyn ResponseCachePort>,
    transport: Arc<dyn HttpTransportPort>,
    event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
    semaphore: Arc<Semaphore>,
    in_flight: InFlight,
    config: ImageLoaderConfig,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("config", &self.config)
            .field("memory_cache", &self.memory_cache)
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Creates a new image loader talking to the network through `reqwest`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        config: ImageLoaderConfig,
        event_tx: &mpsc::UnboundedSender<ImageLoadedEvent>,
        response_cache: Arc<dyn ResponseCachePort>,
    ) -> CacheResult<Self> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )?;
        Ok(Self::with_transport(
            config,
            event_tx,
            response_cache,
            Arc::new(transport),
        ))
    }

    /// Creates a loader over an arbitrary transport.
    #[must_use]
    pub fn with_transport(
        config: ImageLoaderConfig,
        event_tx: &mpsc::UnboundedSender<ImageLoadedEvent>,
        response_cache: Arc<dyn ResponseCachePort>,
        transport: Arc<dyn HttpTransportPort>,
    ) -> Self {
        Self {
            memory_cache: Arc::new(MemoryImageCache::new(config.memory_cache_size)),
            response_cache,
            transport,
            event_tx: event_tx.clone(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Returns the loader configuration.
    #[must_use]
    pub const fn config(&self) -> &ImageLoaderConfig {
        &self.config
    }

    /// Checks the memory cache without suspending.
    #[must_use]
    pub fn cached(&self, url: &str) -> Option<LoadedImage> {
        self.memory_cache.get(url).map(|image| LoadedImage {
            url: url.to_string(),
            image,
            source: ImageSource::MemoryCache,
        })
    }

    /// Loads an image, checking caches first.
    ///
    /// Any failure resolves to `None`; callers treat it as "no image available".
    pub async fn fetch(&self, url: &str) -> Option<LoadedImage> {
        match self.resolve(url, None).await {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                debug!(url = %url, error = %e, "Image unavailable");
                None
            }
        }
    }

    /// Starts loading an image on behalf of a display slot.
    ///
    /// A memory hit is returned directly. Otherwise the result is sent on the
    /// event channel as an [`ImageLoadedEvent`]. Must be called within a tokio runtime.
    pub fn request(&self, slot: SlotId, url: &str) -> RequestOutcome {
        if let Some(loaded) = self.cached(url) {
            return RequestOutcome::Ready(loaded);
        }

        let token = CancellationToken::new();
        let loader = self.clone();
        let task_token = token.clone();
        let task_url = url.to_string();

        tokio::spawn(async move {
            let image = match loader.resolve(&task_url, Some(&task_token)).await {
                Ok(loaded) => Some(loaded),
                Err(CacheError::Cancelled) => {
                    trace!(slot = %slot, url = %task_url, "Abandoned superseded request");
                    return;
                }
                Err(e) => {
                    debug!(slot = %slot, url = %task_url, error = %e, "Image unavailable");
                    None
                }
            };

            if task_token.is_cancelled() {
                trace!(slot = %slot, url = %task_url, "Request cancelled before delivery");
                return;
            }

            let event = ImageLoadedEvent {
                slot,
                url: task_url,
                image,
            };
            if loader.event_tx.send(event).is_err() {
                debug!(slot = %slot, "Display surface dropped, discarding image event");
            }
        });

        RequestOutcome::Pending(RequestHandle {
            url: url.to_string(),
            token,
        })
    }

    /// Returns memory cache statistics.
    #[must_use]
    pub fn memory_cache_stats(&self) -> CacheStats {
        self.memory_cache.stats()
    }

    /// Clears all caches.
    pub async fn clear_all(&self) {
        self.memory_cache.clear();
        if let Err(e) = self.response_cache.clear().await {
            warn!(error = %e, "Failed to clear response cache");
        }
        info!("Cleared all image caches");
    }

    async fn resolve(
        &self,
        url: &str,
        cancel: Option<&CancellationToken>,
    ) -> CacheResult<LoadedImage> {
        if let Some(loaded) = self.cached(url) {
            return Ok(loaded);
        }

        let entry = InFlightEntry::join(&self.in_flight, url);
        let _turn = until_cancelled(cancel, entry.gate.lock()).await?;

        // resolved by the request we queued behind
        if let Some(loaded) = self.cached(url) {
            return Ok(loaded);
        }

        if let Some(image) = self.from_response_cache(url).await {
            return Ok(LoadedImage {
                url: url.to_string(),
                image,
                source: ImageSource::ResponseCache,
            });
        }

        self.from_network(url, cancel).await
    }

    async fn from_response_cache(&self, url: &str) -> Option<Arc<image::DynamicImage>> {
        let cached = self.response_cache.cached_response(url).await?;

        match decode(cached.body).await {
            Ok(decoded) => {
                debug!(url = %url, "Promoting cached response into memory");
                Some(self.memory_cache.insert(url.to_string(), Arc::new(decoded)))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Cached response is not a decodable image");
                self.response_cache.remove(url).await;
                None
            }
        }
    }

    async fn from_network(
        &self,
        url: &str,
        cancel: Option<&CancellationToken>,
    ) -> CacheResult<LoadedImage> {
        let permit = until_cancelled(cancel, self.semaphore.acquire())
            .await?
            .map_err(|e| CacheError::NetworkError(format!("Download limiter closed: {e}")))?;

        debug!(url = %url, "Downloading image from network");
        let response = until_cancelled(cancel, self.transport.get(url)).await??;
        drop(permit);

        if !response.is_success() {
            return Err(CacheError::StatusError(response.status));
        }

        let decoded = decode(response.body.clone()).await?;

        if let Err(e) = self
            .response_cache
            .store_response(&CachedResponse::from_http(url, &response))
            .await
        {
            warn!(url = %url, error = %e, "Failed to persist response");
        }

        let image = self.memory_cache.insert(url.to_string(), Arc::new(decoded));

        debug!(url = %url, source = "network", "Image loaded successfully");

        Ok(LoadedImage {
            url: url.to_string(),
            image,
            source: ImageSource::Network,
        })
    }
}

/// Membership of one request in the in-flight map. The last member to leave
/// removes the URL.
struct InFlightEntry<'a> {
    map: &'a InFlight,
    url: &'a str,
    gate: Arc<AsyncMutex<()>>,
}

impl<'a> InFlightEntry<'a> {
    fn join(map: &'a InFlight, url: &'a str) -> Self {
        let gate = map
            .lock()
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        Self { map, url, gate }
    }
}

impl Drop for InFlightEntry<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock();
        // map + self
        if Arc::strong_count(&self.gate) == 2
            && map.get(self.url).is_some_and(|g| Arc::ptr_eq(g, &self.gate))
        {
            map.remove(self.url);
        }
    }
}

/// Decodes image bytes off the async workers.
async fn decode(bytes: Bytes) -> CacheResult<image::DynamicImage> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| CacheError::DecodeError(format!("Decode task panicked: {e}")))?
        .map_err(|e| CacheError::DecodeError(format!("Failed to decode image: {e}")))
}

/// Runs `fut` unless `cancel` fires first.
async fn until_cancelled<F: Future>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> CacheResult<F::Output> {
    match cancel {
        Some(token) => tokio::select! {
            () = token.cancelled() => Err(CacheError::Cancelled),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::HttpResponse;
    use crate::domain::ports::mocks::{MemoryResponseCache, MockTransport, png_bytes};
    use crate::infrastructure::image::DiskResponseCache;
    use test_case::test_case;

    const URL: &str = "https://example.com/products/1.png";

    struct Harness {
        loader: ImageLoader,
        transport: Arc<MockTransport>,
        responses: Arc<MemoryResponseCache>,
        events: mpsc::UnboundedReceiver<ImageLoadedEvent>,
    }

    /// Cancels `token` the moment the inner transport has answered.
    struct CancelOnResponse {
        inner: MockTransport,
        token: CancellationToken,
    }

    #[async_trait::async_trait]
    impl HttpTransportPort for CancelOnResponse {
        async fn get(&self, url: &str) -> CacheResult<HttpResponse> {
            let response = self.inner.get(url).await;
            self.token.cancel();
            response
        }
    }

    fn cached_png(width: u32, height: u32) -> CachedResponse {
        CachedResponse {
            url: URL.to_string(),
            final_url: URL.to_string(),
            status: 200,
            content_type: Some("image/png".to_string()),
            stored_at: chrono::Utc::now(),
            body: png_bytes(width, height),
        }
    }

    fn harness(transport: MockTransport) -> Harness {
        let (tx, events) = mpsc::unbounded_channel();
        let transport = Arc::new(transport);
        let responses = Arc::new(MemoryResponseCache::new());
        let loader = ImageLoader::with_transport(
            ImageLoaderConfig::default(),
            &tx,
            responses.clone(),
            transport.clone(),
        );
        Harness {
            loader,
            transport,
            responses,
            events,
        }
    }

    #[tokio::test]
    async fn test_loader_creation() -> Result<(), Box<dyn std::error::Error>> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let temp_dir = tempfile::TempDir::new()?;
        let disk_cache =
            Arc::new(DiskResponseCache::new(temp_dir.path().to_path_buf(), 1024 * 1024).await?);

        let loader = ImageLoader::new(ImageLoaderConfig::default(), &tx, disk_cache);
        assert!(loader.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_hit_skips_network() {
        let h = harness(MockTransport::new().with_image(URL, 4, 4));
        h.loader
            .memory_cache
            .insert(URL.to_string(), Arc::new(image::DynamicImage::new_rgb8(7, 7)));

        let loaded = h.loader.fetch(URL).await.unwrap();

        assert_eq!(loaded.source, ImageSource::MemoryCache);
        assert_eq!(loaded.image.width(), 7);
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_response_cache_hit_promotes_into_memory() {
        let h = harness(MockTransport::new());
        h.responses.seed(cached_png(5, 3));

        let loaded = h.loader.fetch(URL).await.unwrap();

        assert_eq!(loaded.source, ImageSource::ResponseCache);
        assert_eq!((loaded.image.width(), loaded.image.height()), (5, 3));
        assert!(h.loader.memory_cache.contains(URL));
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_network_fetch_populates_both_tiers() {
        let h = harness(MockTransport::new().with_image(URL, 9, 6));

        let loaded = h.loader.fetch(URL).await.unwrap();
        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(loaded.url, URL);
        assert!(h.loader.memory_cache.contains(URL));
        assert!(h.responses.contains(URL));

        let again = h.loader.fetch(URL).await.unwrap();
        assert_eq!(again.source, ImageSource::MemoryCache);
        assert!(Arc::ptr_eq(&loaded.image, &again.image));
        assert_eq!(h.transport.calls_for(URL), 1);
    }

    #[test_case(300 ; "multiple_choices")]
    #[test_case(302 ; "redirect")]
    #[test_case(404 ; "not_found")]
    #[test_case(500 ; "server_error")]
    #[tokio::test]
    async fn test_bad_status_yields_nothing(status: u16) {
        let h = harness(MockTransport::new().with_route(URL, status, png_bytes(2, 2)));

        assert!(h.loader.fetch(URL).await.is_none());
        assert!(h.loader.memory_cache.is_empty());
        assert_eq!(h.responses.store_count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_payload_yields_nothing() {
        let h = harness(MockTransport::new().with_route(
            URL,
            200,
            Bytes::from_static(b"<html>not an image</html>"),
        ));

        assert!(h.loader.fetch(URL).await.is_none());
        assert!(h.loader.memory_cache.is_empty());
        assert_eq!(h.responses.store_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_yields_nothing() {
        let h = harness(MockTransport::new());

        assert!(h.loader.fetch(URL).await.is_none());
        assert!(h.loader.memory_cache.is_empty());
        assert_eq!(h.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cached_response_falls_through_to_network() {
        let h = harness(MockTransport::new().with_image(URL, 3, 3));
        h.responses.seed(CachedResponse {
            url: URL.to_string(),
            final_url: URL.to_string(),
            status: 200,
            content_type: None,
            stored_at: chrono::Utc::now(),
            body: Bytes::from_static(b"garbage"),
        });

        let loaded = h.loader.fetch(URL).await.unwrap();

        assert_eq!(loaded.source, ImageSource::Network);
        assert_eq!(h.transport.calls_for(URL), 1);
        assert_eq!(h.responses.store_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_fill_memory_cache() {
        const N: usize = 32;
        let urls: Vec<String> = (0..N)
            .map(|i| format!("https://example.com/products/{i}.png"))
            .collect();
        let transport = urls.iter().fold(MockTransport::new(), |t, url| {
            t.with_image(url, 2, 2)
                .with_delay(url, Duration::from_millis(5))
        });
        let h = harness(transport);

        let tasks: Vec<_> = urls
            .iter()
            .cloned()
            .map(|url| {
                let loader = h.loader.clone();
                tokio::spawn(async move { loader.fetch(&url).await })
            })
            .collect();

        for result in futures_util::future::join_all(tasks).await {
            assert!(result.unwrap().is_some());
        }

        assert_eq!(h.loader.memory_cache.len(), N);
        assert_eq!(h.transport.calls(), N);
    }

    #[tokio::test]
    async fn test_request_memory_hit_is_immediate() {
        let h = harness(MockTransport::new());
        h.loader
            .memory_cache
            .insert(URL.to_string(), Arc::new(image::DynamicImage::new_rgb8(1, 1)));

        let outcome = h.loader.request(SlotId::new(1), URL);
        assert!(matches!(outcome, RequestOutcome::Ready(ref l) if l.url == URL));
    }

    #[tokio::test]
    async fn test_request_delivers_event() {
        let mut h = harness(MockTransport::new().with_image(URL, 4, 2));

        let outcome = h.loader.request(SlotId::new(3), URL);
        assert!(matches!(outcome, RequestOutcome::Pending(ref handle) if handle.url() == URL));

        let event = h.events.recv().await.unwrap();
        assert_eq!(event.slot, SlotId::new(3));
        assert_eq!(event.url, URL);
        assert_eq!(event.image.map(|l| l.image.width()), Some(4));
    }

    #[tokio::test]
    async fn test_failed_request_delivers_empty_event() {
        let mut h = harness(MockTransport::new().with_route(URL, 404, Bytes::new()));

        let _outcome = h.loader.request(SlotId::new(1), URL);

        let event = h.events.recv().await.unwrap();
        assert_eq!(event.url, URL);
        assert!(event.image.is_none());
    }

    #[tokio::test]
    async fn test_request_cancelled_mid_download_delivers_nothing() {
        let mut h = harness(
            MockTransport::new()
                .with_image(URL, 4, 4)
                .with_delay(URL, Duration::from_millis(200)),
        );

        let RequestOutcome::Pending(handle) = h.loader.request(SlotId::new(1), URL) else {
            panic!("expected a pending request");
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
        assert!(handle.is_cancelled());

        let waited = tokio::time::timeout(Duration::from_millis(400), h.events.recv()).await;
        assert!(waited.is_err());
        assert!(!h.loader.memory_cache.contains(URL));
        assert_eq!(h.responses.store_count(), 0);
    }

    #[tokio::test]
    async fn test_request_served_from_response_cache() {
        let mut h = harness(MockTransport::new());
        h.responses.seed(cached_png(6, 2));

        let outcome = h.loader.request(SlotId::new(4), URL);
        assert!(matches!(outcome, RequestOutcome::Pending(_)));

        let event = h.events.recv().await.unwrap();
        assert_eq!(event.slot, SlotId::new(4));
        assert_eq!(event.url, URL);
        let loaded = event.image.unwrap();
        assert_eq!(loaded.source, ImageSource::ResponseCache);
        assert_eq!((loaded.image.width(), loaded.image.height()), (6, 2));
        assert!(h.loader.memory_cache.contains(URL));
        assert_eq!(h.transport.calls(), 0);

        let RequestOutcome::Ready(again) = h.loader.request(SlotId::new(5), URL) else {
            panic!("expected a memory hit");
        };
        assert!(Arc::ptr_eq(&again.image, &loaded.image));
    }

    #[tokio::test]
    async fn test_download_finished_before_cancel_is_still_cached() {
        let token = CancellationToken::new();
        let (tx, _events) = mpsc::unbounded_channel();
        let responses = Arc::new(MemoryResponseCache::new());
        let loader = ImageLoader::with_transport(
            ImageLoaderConfig::default(),
            &tx,
            responses.clone(),
            Arc::new(CancelOnResponse {
                inner: MockTransport::new().with_image(URL, 4, 4),
                token: token.clone(),
            }),
        );

        let loaded = loader.resolve(URL, Some(&token)).await.unwrap();

        assert!(token.is_cancelled());
        assert_eq!(loaded.source, ImageSource::Network);
        assert!(loader.memory_cache.contains(URL));
        assert!(responses.contains(URL));
    }

    #[tokio::test]
    async fn test_cancelled_request_does_not_block_same_url_fetch() {
        let mut h = harness(
            MockTransport::new()
                .with_image(URL, 4, 4)
                .with_delay(URL, Duration::from_millis(50)),
        );

        let RequestOutcome::Pending(handle) = h.loader.request(SlotId::new(1), URL) else {
            panic!("expected a pending request");
        };
        let waiter = h.loader.clone();
        let fetched = tokio::spawn(async move { waiter.fetch(URL).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        assert!(fetched.await.unwrap().is_some());
        assert!(h.loader.memory_cache.contains(URL));
        assert!(h.responses.contains(URL));
        assert!(h.loader.in_flight.lock().is_empty());

        let waited = tokio::time::timeout(Duration::from_millis(100), h.events.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_of_one_url_download_once() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let disk = Arc::new(
            DiskResponseCache::new(temp_dir.path().to_path_buf(), 1024 * 1024)
                .await
                .unwrap(),
        );
        let transport = Arc::new(
            MockTransport::new()
                .with_image(URL, 6, 6)
                .with_delay(URL, Duration::from_millis(20)),
        );
        let (tx, _events) = mpsc::unbounded_channel();
        let loader = ImageLoader::with_transport(
            ImageLoaderConfig::default(),
            &tx,
            disk.clone(),
            transport.clone(),
        );

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.fetch(URL).await })
            })
            .collect();
        let loaded: Vec<LoadedImage> = futures_util::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(transport.calls_for(URL), 1);
        assert_eq!(
            loaded
                .iter()
                .filter(|l| l.source == ImageSource::Network)
                .count(),
            1
        );
        assert!(loaded.iter().all(|l| Arc::ptr_eq(&l.image, &loaded[0].image)));
        assert_eq!(disk.len(), 1);
        assert_eq!(disk.current_size(), png_bytes(6, 6).len() as u64);
        assert!(loader.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let h = harness(MockTransport::new().with_image(URL, 2, 2));
        assert!(h.loader.fetch(URL).await.is_some());

        h.loader.clear_all().await;

        assert!(h.loader.memory_cache.is_empty());
        assert!(!h.responses.contains(URL));
    }
}
