//! Landmark points in original image space.

use serde::{Deserialize, Serialize};

use super::Category;

/// A labeled landmark placed on one image of a sequence.
///
/// Coordinates are in the source image's native pixel space, never in
/// display space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Identifier of the image this point was placed on
    pub img_name: String,
    /// X coordinate in original pixels
    pub x: f64,
    /// Y coordinate in original pixels
    pub y: f64,
    /// Semantic label
    pub category: Category,
    /// Landmark was not directly visible when annotated
    #[serde(default)]
    pub occluded: bool,
}

impl Point {
    pub fn new(img_name: impl Into<String>, x: f64, y: f64, category: Category) -> Self {
        Self {
            img_name: img_name.into(),
            x,
            y,
            category,
            occluded: false,
        }
    }

    /// Mark the point as occluded.
    pub fn with_occluded(mut self, occluded: bool) -> Self {
        self.occluded = occluded;
        self
    }

    /// Check whether this point occupies the given image/category slot.
    pub fn matches(&self, img_name: &str, category: Category) -> bool {
        self.img_name == img_name && self.category == category
    }
}
