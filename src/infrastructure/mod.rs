//! Infrastructure layer with adapters for the network, disk, and configuration.

/// Application configuration.
pub mod config;
/// HTTP transport adapters.
pub mod http;
/// Image handling (caching, loading).
pub mod image;

pub use self::config::{AppConfig, CliArgs, Command, LogLevel, StorageManager};
pub use self::http::ReqwestTransport;
pub use self::image::{
    CacheStats, DiskResponseCache, ImageLoadedEvent, ImageLoader, ImageLoaderConfig,
    MemoryImageCache, RequestHandle, RequestOutcome,
};
