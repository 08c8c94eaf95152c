//! Point categories and image slots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic label of a landmark point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Index finger tip
    #[default]
    Index,
    /// Thumb tip
    Thumb,
}

impl Category {
    /// Get the serialized name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Index => "index",
            Category::Thumb => "thumb",
        }
    }

    /// Get all categories.
    pub fn all() -> &'static [Category] {
        &[Category::Index, Category::Thumb]
    }

    /// The other category.
    pub fn toggled(&self) -> Category {
        match self {
            Category::Index => Category::Thumb,
            Category::Thumb => Category::Index,
        }
    }

    /// RGB colour used when rendering points of this category.
    pub fn color(&self) -> [u8; 3] {
        match self {
            Category::Index => [255, 0, 0],
            Category::Thumb => [0, 128, 0],
        }
    }

    /// Parse a category from its serialized name.
    pub fn from_name(name: &str) -> Option<Category> {
        match name {
            "index" => Some(Category::Index),
            "thumb" => Some(Category::Thumb),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the two display surfaces of a sequence.
///
/// The primary (contact) surface is shown first and displays the pair's
/// second image; the secondary surface displays the pair's first image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// Display slot 0, the contact image
    Primary,
    /// Display slot 1
    Secondary,
}

impl ImageSlot {
    /// Both slots in display order.
    pub fn all() -> [ImageSlot; 2] {
        [ImageSlot::Primary, ImageSlot::Secondary]
    }

    /// Display index of this slot.
    pub fn index(&self) -> usize {
        match self {
            ImageSlot::Primary => 0,
            ImageSlot::Secondary => 1,
        }
    }

    /// Slot for a display index.
    pub fn from_index(index: usize) -> Option<ImageSlot> {
        match index {
            0 => Some(ImageSlot::Primary),
            1 => Some(ImageSlot::Secondary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Thumb).unwrap(), "\"thumb\"");
        let parsed: Category = serde_json::from_str("\"index\"").unwrap();
        assert_eq!(parsed, Category::Index);
        assert!(serde_json::from_str::<Category>("\"pinky\"").is_err());
    }

    #[test]
    fn test_toggle_and_names() {
        assert_eq!(Category::default(), Category::Index);
        assert_eq!(Category::Index.toggled(), Category::Thumb);
        assert_eq!(Category::Thumb.toggled().toggled(), Category::Thumb);
        assert_eq!(Category::from_name("thumb"), Some(Category::Thumb));
        assert_eq!(Category::from_name("Thumb"), None);
    }

    #[test]
    fn test_slot_indices() {
        assert_eq!(ImageSlot::from_index(0), Some(ImageSlot::Primary));
        assert_eq!(ImageSlot::from_index(1), Some(ImageSlot::Secondary));
        assert_eq!(ImageSlot::from_index(2), None);
        assert_eq!(ImageSlot::Secondary.index(), 1);
    }
}
