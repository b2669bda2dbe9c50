//! Port for the HTTP origin.

use async_trait::async_trait;
use bytes::Bytes;

use super::image_cache_port::CacheResult;

/// A completed HTTP GET, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// URL the response was served from after redirects.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }
}

/// Port for issuing simple GET requests.
///
/// Non-success statuses are returned as responses; only transport failures are errors.
#[async_trait]
pub trait HttpTransportPort: Send + Sync {
    /// Issues a GET for `url`.
    async fn get(&self, url: &str) -> CacheResult<HttpResponse>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::ports::CacheError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Canned reply for one URL.
    #[derive(Debug, Clone)]
    pub struct MockRoute {
        status: u16,
        body: Bytes,
        delay: Duration,
    }

    /// Transport answering from a fixed routing table.
    /// Unknown URLs fail with a network error.
    #[derive(Default)]
    pub struct MockTransport {
        routes: HashMap<String, MockRoute>,
        calls: parking_lot::Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
    }

    /// Encodes a blank PNG of the given size.
    pub fn png_bytes(width: u32, height: u32) -> Bytes {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut buf, image::ImageFormat::Png)
            .expect("PNG encoding of a blank image");
        Bytes::from(buf.into_inner())
    }

    impl MockTransport {
        /// Creates a transport with no routes.
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a route with an explicit status and body.
        #[must_use]
        pub fn with_route(mut self, url: &str, status: u16, body: impl Into<Bytes>) -> Self {
            self.routes.insert(
                url.to_string(),
                MockRoute {
                    status,
                    body: body.into(),
                    delay: Duration::ZERO,
                },
            );
            self
        }

        /// Adds a 200 route serving a PNG of the given size.
        #[must_use]
        pub fn with_image(self, url: &str, width: u32, height: u32) -> Self {
            self.with_route(url, 200, png_bytes(width, height))
        }

        /// Delays the reply for an existing route.
        #[must_use]
        pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            if let Some(route) = self.routes.get_mut(url) {
                route.delay = delay;
            }
            self
        }

        /// Total number of GETs issued.
        pub fn calls(&self) -> usize {
            self.total.load(Ordering::SeqCst)
        }

        /// Number of GETs issued for `url`.
        pub fn calls_for(&self, url: &str) -> usize {
            self.calls.lock().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl HttpTransportPort for MockTransport {
        async fn get(&self, url: &str) -> CacheResult<HttpResponse> {
            self.total.fetch_add(1, Ordering::SeqCst);
            *self.calls.lock().entry(url.to_string()).or_default() += 1;

            let route = self
                .routes
                .get(url)
                .cloned()
                .ok_or_else(|| CacheError::NetworkError(format!("no route for {url}")))?;

            if !route.delay.is_zero() {
                tokio::time::sleep(route.delay).await;
            }

            Ok(HttpResponse {
                url: url.to_string(),
                status: route.status,
                content_type: Some("image/png".to_string()),
                body: route.body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(200, true ; "ok")]
    #[test_case(204, true ; "no_content")]
    #[test_case(299, true ; "upper_bound")]
    #[test_case(300, false ; "redirect_status")]
    #[test_case(404, false ; "not_found")]
    #[test_case(500, false ; "server_error")]
    fn test_success_range(status: u16, expected: bool) {
        let response = HttpResponse {
            url: "https://example.com/a.png".to_string(),
            status,
            content_type: None,
            body: Bytes::new(),
        };
        assert_eq!(response.is_success(), expected);
    }
}
