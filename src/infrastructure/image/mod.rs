//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching of decoded images
//! - A persistent HTTP response cache
//! - The async loading pipeline that chains them in front of the network

pub mod loader;
pub mod memory_cache;
pub mod response_cache;

pub use loader::{
    ImageLoadedEvent, ImageLoader, ImageLoaderConfig, RequestHandle, RequestOutcome,
};
pub use memory_cache::{CacheStats, MemoryImageCache};
pub use response_cache::{DiskResponseCache, default_cache_dir};
