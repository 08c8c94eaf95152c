//! Data models for pairmark.

mod category;
mod point;
mod sequence;

pub use category::{Category, ImageSlot};
pub use point::Point;
pub use sequence::Sequence;
