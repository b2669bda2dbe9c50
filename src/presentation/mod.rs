//! Presentation layer: display slots that consume loader completions.

pub mod display;

pub use display::{DisplaySurface, ImageSlot};
