//! Domain layer with core entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Port definitions.
pub mod ports;

pub use entities::{ImageId, ImageSource, ImageStatus, LoadedImage, SlotId};
pub use ports::{CacheError, CacheResult, HttpTransportPort, ImageCachePort, ResponseCachePort};
