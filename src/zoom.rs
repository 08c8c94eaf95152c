//! Zoom mathematics for the hover magnifier and the contact-region inset.
//!
//! These functions only compute source/destination rectangles in display
//! space; drawing them is left to the presenter.

use crate::constants::zoom;
use crate::coords::{DisplayMapping, Position};

/// Axis-aligned rectangle in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on a position.
    pub fn centered(center: Position, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// Centre of the rectangle.
    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A region copied from a surface and drawn enlarged elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomView {
    /// Region read from the surface
    pub source: Rect,
    /// Region the enlarged copy is drawn into
    pub dest: Rect,
}

/// Zoom controls shared by the magnifier and the contact-region inset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomState {
    level: u32,
    /// Whether the contact-region inset is requested
    pub contact_region_visible: bool,
}

impl ZoomState {
    /// Create a zoom state, clamping the level to the minimum.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.max(zoom::MIN_LEVEL),
            contact_region_visible: false,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Set the zoom level. Returns `false` and leaves the state unchanged
    /// when `level` is below the minimum.
    pub fn set_level(&mut self, level: u32) -> bool {
        if level < zoom::MIN_LEVEL {
            return false;
        }
        self.level = level;
        true
    }

    /// Flip the contact-region inset on or off, returning the new value.
    pub fn toggle_contact_region(&mut self) -> bool {
        self.contact_region_visible = !self.contact_region_visible;
        self.contact_region_visible
    }
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::new(zoom::MIN_LEVEL)
    }
}

/// Hover magnifier around a pointer position on a surface.
///
/// Hidden at the minimum zoom level. Otherwise a square of side
/// `MAGNIFIER_SIZE / level` around the pointer is enlarged into a
/// `MAGNIFIER_SIZE` square centred on the pointer.
pub fn magnifier_view(pointer: Position, level: u32) -> Option<ZoomView> {
    if level <= zoom::MIN_LEVEL {
        return None;
    }
    let side = zoom::MAGNIFIER_SIZE / level as f64;
    Some(ZoomView {
        source: Rect::centered(pointer, side, side),
        dest: Rect::centered(pointer, zoom::MAGNIFIER_SIZE, zoom::MAGNIFIER_SIZE),
    })
}

/// Inset showing the region between the index and thumb points on the
/// contact image.
///
/// `index` and `thumb` are in original image space. The crop is centred
/// on their midpoint and spans `CONTACT_SOURCE_SIZE / level` original
/// pixels per side, converted to display pixels per axis.
pub fn contact_region_view(
    index: Position,
    thumb: Position,
    mapping: &DisplayMapping,
    level: u32,
) -> ZoomView {
    let center = mapping.to_display(index.midpoint(&thumb));
    let (scale_x, scale_y) = mapping.display_scale();
    let side = zoom::CONTACT_SOURCE_SIZE / level.max(zoom::MIN_LEVEL) as f64;

    ZoomView {
        source: Rect::centered(center, side * scale_x, side * scale_y),
        dest: Rect::new(
            zoom::CONTACT_INSET_OFFSET,
            zoom::CONTACT_INSET_OFFSET,
            zoom::CONTACT_INSET_SIZE,
            zoom::CONTACT_INSET_SIZE,
        ),
    }
}
