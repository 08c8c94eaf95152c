//! Presentation capability called by the session.
//!
//! The core never touches a display surface directly. It tells a
//! `Presenter` what to draw, in display coordinates, and what to report
//! to the user.

use crate::coords::Position;
use crate::model::{Category, ImageSlot};
use crate::zoom::ZoomView;

/// Drawing and reporting operations a front end provides.
pub trait Presenter {
    /// Clear a surface and redraw its image at the fitted size.
    fn clear_surface(&mut self, slot: ImageSlot);

    /// Draw a point marker. Occluded points are drawn as outlines.
    fn render_point(&mut self, slot: ImageSlot, at: Position, category: Category, occluded: bool);

    /// Draw an enlarged copy of part of a surface onto the same surface.
    fn render_zoom_inset(&mut self, _slot: ImageSlot, _view: ZoomView) {}

    /// Show the hover magnifier.
    fn show_magnifier(&mut self, _slot: ImageSlot, _view: ZoomView) {}

    fn hide_magnifier(&mut self) {}

    /// Update the "sequence i of n" indicator.
    fn show_progress(&mut self, _sequence_id: &str, _index: usize, _total: usize) {}

    /// Whether the contact-region zoom control should be enabled.
    fn set_contact_zoom_available(&mut self, _available: bool) {}

    /// Surface a user-visible confirmation or status message.
    fn report(&mut self, message: &str);

    /// Surface a recoverable error.
    fn report_error(&mut self, message: &str) {
        self.report(message);
    }
}

/// Draw calls recorded by [`RecordingPresenter`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(ImageSlot),
    Point {
        slot: ImageSlot,
        at: Position,
        category: Category,
        occluded: bool,
    },
    ZoomInset(ImageSlot, ZoomView),
    Magnifier(ImageSlot, ZoomView),
    HideMagnifier,
    Progress(String, usize, usize),
    ContactZoomAvailable(bool),
    Report(String),
    Error(String),
}

/// Presenter that records every call.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    pub calls: Vec<DrawCall>,
}

#[cfg(test)]
impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points drawn since the last clear of each surface.
    pub fn visible_points(&self) -> Vec<&DrawCall> {
        let mut visible: Vec<&DrawCall> = Vec::new();
        for call in &self.calls {
            match call {
                DrawCall::Clear(slot) => {
                    visible.retain(|c| !matches!(c, DrawCall::Point { slot: s, .. } if s == slot))
                }
                DrawCall::Point { .. } => visible.push(call),
                _ => {}
            }
        }
        visible
    }

    /// Messages reported to the user.
    pub fn reports(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Report(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Errors reported to the user.
    pub fn errors(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

#[cfg(test)]
impl Presenter for RecordingPresenter {
    fn clear_surface(&mut self, slot: ImageSlot) {
        self.calls.push(DrawCall::Clear(slot));
    }

    fn render_point(&mut self, slot: ImageSlot, at: Position, category: Category, occluded: bool) {
        self.calls.push(DrawCall::Point {
            slot,
            at,
            category,
            occluded,
        });
    }

    fn render_zoom_inset(&mut self, slot: ImageSlot, view: ZoomView) {
        self.calls.push(DrawCall::ZoomInset(slot, view));
    }

    fn show_magnifier(&mut self, slot: ImageSlot, view: ZoomView) {
        self.calls.push(DrawCall::Magnifier(slot, view));
    }

    fn hide_magnifier(&mut self) {
        self.calls.push(DrawCall::HideMagnifier);
    }

    fn show_progress(&mut self, sequence_id: &str, index: usize, total: usize) {
        self.calls
            .push(DrawCall::Progress(sequence_id.to_string(), index, total));
    }

    fn set_contact_zoom_available(&mut self, available: bool) {
        self.calls.push(DrawCall::ContactZoomAvailable(available));
    }

    fn report(&mut self, message: &str) {
        self.calls.push(DrawCall::Report(message.to_string()));
    }

    fn report_error(&mut self, message: &str) {
        self.calls.push(DrawCall::Error(message.to_string()));
    }
}
