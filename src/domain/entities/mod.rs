mod image;

pub use self::image::{ImageId, ImageSource, ImageStatus, LoadedImage, SlotId};
