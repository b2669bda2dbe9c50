mod http_transport_port;
mod image_cache_port;
mod response_cache_port;

pub use http_transport_port::{HttpResponse, HttpTransportPort};
pub use image_cache_port::{CacheError, CacheResult, ImageCachePort};
pub use response_cache_port::{CachedResponse, ResponseCachePort};
