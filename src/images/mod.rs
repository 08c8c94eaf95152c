//! Image sources and asynchronous loading of image pairs.

mod catalog;
mod loader;

pub use catalog::{ImageCatalog, ImageSource, is_image_filename};
pub use loader::{LoadError, LoadTicket, PairLoadResult, PairLoader, read_dimensions};
