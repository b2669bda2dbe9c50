//! feed-images - async image loading behind a memory cache and an HTTP response cache.
//!
//! Images resolve through a read-through chain (memory, persisted response,
//! network). Display slots guarantee they only ever show the image for the URL
//! they most recently requested.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Domain layer containing entities and port definitions.
pub mod domain;
/// Infrastructure layer containing caches, transport and configuration.
pub mod infrastructure;
/// Presentation layer containing display slots.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "feed-images";
