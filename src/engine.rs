//! Point placement state machine.
//!
//! The engine owns the working point list of the active sequence and
//! enforces its cardinality rules:
//! - at most one point per `(image, category)` pair
//! - at most [`MAX_POINTS_PER_SEQUENCE`] points in total
//!
//! Every mutation is validated first and then written through to the
//! [`AnnotationStore`]. If the write fails the in-memory change is
//! reverted, so the working list always mirrors durable state.

use thiserror::Error;

use crate::constants::MAX_POINTS_PER_SEQUENCE;
use crate::coords::{DisplayMapping, Position};
use crate::model::{Category, ImageSlot, Point, Sequence};
use crate::store::{AnnotationStore, StoreError};

/// Reasons a placement can be rejected.
#[derive(Error, Debug)]
pub enum PlacementError {
    /// The image already has a point of this category
    #[error("You already annotated a {category} point in image '{image}'")]
    DuplicateCategory {
        /// Image identifier
        image: String,
        /// Category that is already taken
        category: Category,
    },

    /// The sequence already holds the maximum number of points
    #[error(
        "Sequence already has {max} points (index and thumb on both images); undo to change"
    )]
    SequenceFull {
        /// Point limit per sequence
        max: usize,
    },

    /// No sequence is active
    #[error("No active sequence")]
    NoActiveSequence,

    /// The pointer does not map to a finite image position
    #[error("Cannot place a point at ({x}, {y}) in image space")]
    InvalidPosition {
        /// Mapped x coordinate
        x: f64,
        /// Mapped y coordinate
        y: f64,
    },

    /// The surface's image has not finished loading
    #[error("Images are still loading")]
    ImagesNotLoaded,

    /// The point was valid but could not be persisted
    #[error("Failed to save points: {0}")]
    Store(#[from] StoreError),
}

/// Working state for the active sequence.
#[derive(Debug, Clone, Default)]
pub struct PlacementEngine {
    active: Option<Sequence>,
    points: Vec<Point>,
    category: Category,
    occluded_armed: bool,
}

impl PlacementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    /// Make `sequence` active, replacing the working list with its stored points.
    pub fn activate(&mut self, sequence: &Sequence, store: &dyn AnnotationStore) {
        self.points = store.load(&sequence.id);
        log::debug!(
            "Activated sequence '{}' with {} stored points",
            sequence.id,
            self.points.len()
        );
        self.active = Some(sequence.clone());
    }

    /// Drop the active sequence and its working list.
    pub fn deactivate(&mut self) {
        self.active = None;
        self.points.clear();
    }

    /// Re-read the active sequence's points from the store.
    pub fn reload(&mut self, store: &dyn AnnotationStore) {
        if let Some(sequence) = &self.active {
            self.points = store.load(&sequence.id);
        }
    }

    pub fn active(&self) -> Option<&Sequence> {
        self.active.as_ref()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    // ------------------------------------------------------------------
    // Tool state
    // ------------------------------------------------------------------

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    /// Switch between `index` and `thumb`, returning the new category.
    pub fn toggle_category(&mut self) -> Category {
        self.category = self.category.toggled();
        self.category
    }

    /// Mark the next successfully placed point as occluded.
    pub fn arm_occluded(&mut self) {
        self.occluded_armed = true;
    }

    pub fn is_occluded_armed(&self) -> bool {
        self.occluded_armed
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Place a point using the current category and occluded flag.
    pub fn place(
        &mut self,
        store: &mut dyn AnnotationStore,
        slot: ImageSlot,
        pointer: Position,
        mapping: &DisplayMapping,
    ) -> Result<Point, PlacementError> {
        let (category, occluded) = (self.category, self.occluded_armed);
        self.place_point(store, slot, pointer, mapping, category, occluded)
    }

    /// Place a point on `slot` at a pointer position relative to the surface.
    ///
    /// The pointer is mapped to original image space before validation.
    /// On success the occluded flag is cleared; on rejection nothing changes.
    pub fn place_point(
        &mut self,
        store: &mut dyn AnnotationStore,
        slot: ImageSlot,
        pointer: Position,
        mapping: &DisplayMapping,
        category: Category,
        occluded: bool,
    ) -> Result<Point, PlacementError> {
        let sequence = self.active.as_ref().ok_or(PlacementError::NoActiveSequence)?;
        let original = mapping.to_original(pointer);
        if !(original.x.is_finite() && original.y.is_finite()) {
            return Err(PlacementError::InvalidPosition {
                x: original.x,
                y: original.y,
            });
        }
        let img_name = sequence.image_for_slot(slot);

        // A full list reports as full even though every slot is also taken.
        if self.points.len() >= MAX_POINTS_PER_SEQUENCE {
            return Err(PlacementError::SequenceFull {
                max: MAX_POINTS_PER_SEQUENCE,
            });
        }
        if self.points.iter().any(|p| p.matches(img_name, category)) {
            return Err(PlacementError::DuplicateCategory {
                image: img_name.to_string(),
                category,
            });
        }

        let point = Point::new(img_name, original.x, original.y, category).with_occluded(occluded);
        self.points.push(point.clone());
        if let Err(e) = store.save(&sequence.id, &self.points) {
            self.points.pop();
            return Err(e.into());
        }

        self.occluded_armed = false;
        log::debug!(
            "Placed {} point on '{}' at ({:.1}, {:.1}){}",
            category,
            point.img_name,
            point.x,
            point.y,
            if occluded { " [occluded]" } else { "" }
        );
        Ok(point)
    }

    /// Remove the most recently placed point.
    ///
    /// Returns `Ok(None)` when the list is already empty.
    pub fn undo_last(
        &mut self,
        store: &mut dyn AnnotationStore,
    ) -> Result<Option<Point>, StoreError> {
        let Some(sequence) = &self.active else {
            return Ok(None);
        };
        let Some(point) = self.points.pop() else {
            return Ok(None);
        };
        if let Err(e) = store.save(&sequence.id, &self.points) {
            self.points.push(point);
            return Err(e);
        }
        log::debug!("Undo: removed {} point on '{}'", point.category, point.img_name);
        Ok(Some(point))
    }

    /// Clear the active sequence's points and persist the empty list.
    pub fn reset_active(&mut self, store: &mut dyn AnnotationStore) -> Result<(), StoreError> {
        if let Some(sequence) = &self.active {
            store.save(&sequence.id, &[])?;
            log::info!("Reset points for sequence '{}'", sequence.id);
        }
        self.points.clear();
        Ok(())
    }

    /// Clear stored points for every sequence and the working list.
    ///
    /// On partial failure the working list is re-read from the store.
    pub fn reset_all(
        &mut self,
        store: &mut dyn AnnotationStore,
        sequence_ids: &[String],
    ) -> Result<(), StoreError> {
        match store.clear_all(sequence_ids) {
            Ok(()) => {
                self.points.clear();
                log::info!("Reset points for all {} sequences", sequence_ids.len());
                Ok(())
            }
            Err(e) => {
                self.reload(store);
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Find the point of a category on an image.
    pub fn find(&self, img_name: &str, category: Category) -> Option<&Point> {
        self.points.iter().find(|p| p.matches(img_name, category))
    }

    /// Index and thumb positions on the contact image, if both exist.
    pub fn contact_points(&self) -> Option<(Position, Position)> {
        let contact = self.active.as_ref()?.primary_image();
        let index = self.find(contact, Category::Index)?;
        let thumb = self.find(contact, Category::Thumb)?;
        Some((
            Position::new(index.x, index.y),
            Position::new(thumb.x, thumb.y),
        ))
    }

    /// Whether the contact image has both an index and a thumb point.
    pub fn can_zoom_into_contact_region(&self) -> bool {
        self.contact_points().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Size;
    use crate::store::MemoryStore;

    fn identity() -> DisplayMapping {
        DisplayMapping::new(Size::new(100.0, 100.0), Size::new(100.0, 100.0))
    }

    fn active_engine(store: &MemoryStore) -> PlacementEngine {
        let mut engine = PlacementEngine::new();
        engine.activate(&Sequence::new("A", "A_left", "A_right"), store);
        engine
    }

    fn place(
        engine: &mut PlacementEngine,
        store: &mut MemoryStore,
        slot: ImageSlot,
        category: Category,
    ) -> Result<Point, PlacementError> {
        engine.place_point(
            store,
            slot,
            Position::new(10.0, 20.0),
            &identity(),
            category,
            false,
        )
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    impl AnnotationStore for BrokenStore {
        fn save(&mut self, _: &str, _: &[Point]) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey("broken".to_string()))
        }
        fn load(&self, _: &str) -> Vec<Point> {
            Vec::new()
        }
        fn clear(&mut self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey("broken".to_string()))
        }
    }

    #[test]
    fn test_slot_resolves_to_role() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        let p = place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap();
        assert_eq!(p.img_name, "A_right");
        let p = place(&mut engine, &mut store, ImageSlot::Secondary, Category::Index).unwrap();
        assert_eq!(p.img_name, "A_left");
    }

    #[test]
    fn test_coordinates_are_mapped_to_original_space() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        let mapping = DisplayMapping::new(Size::new(800.0, 600.0), Size::new(400.0, 200.0));
        let p = engine
            .place_point(
                &mut store,
                ImageSlot::Primary,
                Position::new(100.0, 50.0),
                &mapping,
                Category::Thumb,
                false,
            )
            .unwrap();
        assert_eq!((p.x, p.y), (200.0, 150.0));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap();
        let err = place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::DuplicateCategory { category: Category::Index, .. }
        ));
        assert_eq!(engine.points().len(), 1);
    }

    #[test]
    fn test_fifth_point_rejected() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        for slot in ImageSlot::all() {
            for &category in Category::all() {
                place(&mut engine, &mut store, slot, category).unwrap();
            }
        }
        assert_eq!(engine.points().len(), 4);
        assert_eq!(store.load("A").len(), 4);

        for slot in ImageSlot::all() {
            let err = place(&mut engine, &mut store, slot, Category::Index).unwrap_err();
            assert!(matches!(err, PlacementError::SequenceFull { max: 4 }));
        }
        assert_eq!(engine.points().len(), 4);
        assert_eq!(store.load("A").len(), 4);
    }

    #[test]
    fn test_no_active_sequence() {
        let mut store = MemoryStore::new();
        let mut engine = PlacementEngine::new();
        let err = place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap_err();
        assert!(matches!(err, PlacementError::NoActiveSequence));
    }

    #[test]
    fn test_occluded_flag_is_one_shot() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        engine.arm_occluded();

        let first = engine
            .place(&mut store, ImageSlot::Primary, Position::new(1.0, 1.0), &identity())
            .unwrap();
        assert!(first.occluded);
        assert!(!engine.is_occluded_armed());

        let second = engine
            .place(&mut store, ImageSlot::Secondary, Position::new(1.0, 1.0), &identity())
            .unwrap();
        assert!(!second.occluded);
    }

    #[test]
    fn test_rejected_click_keeps_occluded_armed() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap();
        engine.arm_occluded();
        assert!(
            engine
                .place(&mut store, ImageSlot::Primary, Position::new(1.0, 1.0), &identity())
                .is_err()
        );
        assert!(engine.is_occluded_armed());
    }

    #[test]
    fn test_undo_restores_prior_state() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap();
        place(&mut engine, &mut store, ImageSlot::Secondary, Category::Thumb).unwrap();
        let before = engine.points().to_vec();

        place(&mut engine, &mut store, ImageSlot::Primary, Category::Thumb).unwrap();
        let removed = engine.undo_last(&mut store).unwrap().unwrap();

        assert_eq!(removed.category, Category::Thumb);
        assert_eq!(engine.points(), before.as_slice());
        assert_eq!(store.load("A"), before);
    }

    #[test]
    fn test_undo_on_empty_list_is_noop() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        assert!(engine.undo_last(&mut store).unwrap().is_none());
        assert!(!store.contains("A"));
    }

    #[test]
    fn test_contact_zoom_predicate() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap();
        assert!(!engine.can_zoom_into_contact_region());
        place(&mut engine, &mut store, ImageSlot::Primary, Category::Thumb).unwrap();
        assert!(engine.can_zoom_into_contact_region());
        engine.undo_last(&mut store).unwrap();
        assert!(!engine.can_zoom_into_contact_region());
    }

    #[test]
    fn test_contact_zoom_ignores_secondary_image() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        place(&mut engine, &mut store, ImageSlot::Secondary, Category::Index).unwrap();
        place(&mut engine, &mut store, ImageSlot::Secondary, Category::Thumb).unwrap();
        assert!(!engine.can_zoom_into_contact_region());
    }

    #[test]
    fn test_reset_active_persists_empty_list() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        place(&mut engine, &mut store, ImageSlot::Primary, Category::Index).unwrap();
        engine.reset_active(&mut store).unwrap();
        assert!(engine.points().is_empty());
        assert!(store.contains("A"));
        assert!(store.load("A").is_empty());
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let mut store = BrokenStore;
        let mut engine = PlacementEngine::new();
        engine.activate(&Sequence::new("A", "A_left", "A_right"), &store);
        engine.arm_occluded();

        let err = engine
            .place(&mut store, ImageSlot::Primary, Position::new(1.0, 1.0), &identity())
            .unwrap_err();
        assert!(matches!(err, PlacementError::Store(_)));
        assert!(engine.points().is_empty());
        assert!(engine.is_occluded_armed());
    }

    #[test]
    fn test_non_finite_position_is_rejected() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        engine.arm_occluded();

        let collapsed = DisplayMapping::new(Size::new(400.0, 300.0), Size::new(0.0, 0.0));
        let err = engine
            .place(&mut store, ImageSlot::Primary, Position::new(0.0, 5.0), &collapsed)
            .unwrap_err();
        assert!(matches!(err, PlacementError::InvalidPosition { .. }));

        let err = engine
            .place(&mut store, ImageSlot::Primary, Position::new(f64::NAN, 1.0), &identity())
            .unwrap_err();
        assert!(matches!(err, PlacementError::InvalidPosition { .. }));

        assert!(engine.points().is_empty());
        assert!(store.is_empty());
        assert!(engine.is_occluded_armed());
    }

    #[test]
    fn test_category_toggle() {
        let mut engine = PlacementEngine::new();
        assert_eq!(engine.category(), Category::Index);
        assert_eq!(engine.toggle_category(), Category::Thumb);
        engine.set_category(Category::Index);
        assert_eq!(engine.category(), Category::Index);
    }

    #[test]
    fn test_cardinality_holds_for_any_click_sequence() {
        let mut store = MemoryStore::new();
        let mut engine = active_engine(&store);
        let moves = [
            (0, Category::Index),
            (0, Category::Index),
            (1, Category::Thumb),
            (9, Category::Index),
            (1, Category::Index),
            (0, Category::Thumb),
            (1, Category::Thumb),
            (0, Category::Index),
            (9, Category::Index),
            (1, Category::Index),
        ];
        for &(slot, category) in moves.iter().cycle().take(40) {
            match ImageSlot::from_index(slot) {
                Some(slot) => {
                    let _ = place(&mut engine, &mut store, slot, category);
                }
                None => {
                    engine.undo_last(&mut store).unwrap();
                }
            }
            let points = engine.points();
            assert!(points.len() <= MAX_POINTS_PER_SEQUENCE);
            for (i, a) in points.iter().enumerate() {
                for b in &points[i + 1..] {
                    assert!(!a.matches(&b.img_name, b.category));
                }
            }
        }
    }
}
