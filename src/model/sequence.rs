//! Sequences: pairs of related images annotated together.

use super::ImageSlot;

/// Two images sharing a name prefix, stored in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Shared name prefix of both images
    pub id: String,
    /// The two image identifiers, sorted
    pub images: [String; 2],
}

impl Sequence {
    /// Create a sequence, sorting the two images.
    pub fn new(id: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        let images = if a <= b { [a, b] } else { [b, a] };
        Self {
            id: id.into(),
            images,
        }
    }

    /// The contact image, shown on the primary surface (pair position 1).
    pub fn primary_image(&self) -> &str {
        &self.images[1]
    }

    /// The image shown on the secondary surface (pair position 0).
    pub fn secondary_image(&self) -> &str {
        &self.images[0]
    }

    /// Image identifier displayed on a slot.
    pub fn image_for_slot(&self, slot: ImageSlot) -> &str {
        match slot {
            ImageSlot::Primary => self.primary_image(),
            ImageSlot::Secondary => self.secondary_image(),
        }
    }

    /// Slot displaying an image, if the image belongs to this sequence.
    pub fn slot_of(&self, img_name: &str) -> Option<ImageSlot> {
        if img_name == self.primary_image() {
            Some(ImageSlot::Primary)
        } else if img_name == self.secondary_image() {
            Some(ImageSlot::Secondary)
        } else {
            None
        }
    }
}
