//! Conversion between display-surface and original-image coordinates.
//!
//! Each surface shows its image scaled to fit the viewport, with an
//! independent scale factor per axis. Points are always stored in the
//! original image's pixel space and mapped to the surface when drawn.

use serde::{Deserialize, Serialize};

use crate::constants::layout;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// A position in either display or original space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two positions.
    pub fn midpoint(&self, other: &Position) -> Position {
        Position::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Compute the displayed size of an image inside the viewport.
///
/// Each surface may use half of the viewport width minus a margin, and
/// the viewport height minus room for the controls. Images exceeding
/// either bound are scaled down along their dominant axis, keeping the
/// aspect ratio; smaller images keep their native size. A viewport no
/// larger than the margins still leaves a [`layout::MIN_SURFACE_SIDE`] cell.
pub fn fit_to_viewport(original: Size, viewport: Size) -> Size {
    let max_width =
        (viewport.width / 2.0 - layout::HORIZONTAL_MARGIN).max(layout::MIN_SURFACE_SIDE);
    let max_height = (viewport.height - layout::VERTICAL_MARGIN).max(layout::MIN_SURFACE_SIDE);

    if original.width > max_width || original.height > max_height {
        let aspect = original.aspect_ratio();
        if aspect > 1.0 {
            Size::new(max_width, max_width / aspect)
        } else {
            Size::new(max_height * aspect, max_height)
        }
    } else {
        original
    }
}

/// Mapping between a surface and the image it displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    /// Native image size
    pub original: Size,
    /// Rendered surface size
    pub displayed: Size,
}

impl DisplayMapping {
    pub fn new(original: Size, displayed: Size) -> Self {
        Self {
            original,
            displayed,
        }
    }

    /// Build the mapping for an image fitted into the viewport.
    pub fn fitted(original: Size, viewport: Size) -> Self {
        Self::new(original, fit_to_viewport(original, viewport))
    }

    /// Display pixels per original pixel, per axis.
    pub fn display_scale(&self) -> (f64, f64) {
        (
            self.displayed.width / self.original.width,
            self.displayed.height / self.original.height,
        )
    }

    /// Convert a pointer position relative to the surface origin into
    /// original image coordinates. No rounding is applied.
    pub fn to_original(&self, pointer: Position) -> Position {
        Position::new(
            pointer.x * (self.original.width / self.displayed.width),
            pointer.y * (self.original.height / self.displayed.height),
        )
    }

    /// Convert original image coordinates into surface coordinates.
    pub fn to_display(&self, original: Position) -> Position {
        Position::new(
            original.x * (self.displayed.width / self.original.width),
            original.y * (self.displayed.height / self.original.height),
        )
    }
}
