//! Annotation session: the explicit context object holding all state.
//!
//! A `Session` owns the store, the grouped sequences, the navigation cursor,
//! the placement engine and the image loader. Front ends feed it commands
//! and receive drawing calls through a [`Presenter`]. Every error is
//! recovered here and reported; none ends the session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::config::AppConfig;
use crate::coords::{DisplayMapping, Position, Size};
use crate::engine::{PlacementEngine, PlacementError};
use crate::format::{
    ExportSummary, FormatError, ImportSummary, export_all, import_all, read_import, write_export,
};
use crate::grouping::{GroupingError, SequenceSet};
use crate::images::{ImageCatalog, LoadError, LoadTicket, PairLoadResult, PairLoader};
use crate::keybindings::{Key, KeyBindings};
use crate::message::{Command, CommandError};
use crate::model::{Category, ImageSlot, Point, Sequence};
use crate::navigator::SequenceNavigator;
use crate::presenter::Presenter;
use crate::store::{AnnotationStore, StoreError};
use crate::zoom::{self, ZoomState};

/// Errors surfaced to the user by a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Command(#[from] CommandError),

    /// Zoom levels start at 1
    #[error("Zoom level must be at least 1, got {0}")]
    InvalidZoomLevel(u32),

    /// The contact image lacks an index or thumb point
    #[error("Place both an index and a thumb point on the contact image first")]
    ContactZoomUnavailable,

    /// The viewport has no area
    #[error("Viewport must have a positive size, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },

    /// No images have been loaded yet
    #[error("No sequence loaded")]
    NoActiveSequence,
}

/// Complete state of one annotation session.
pub struct Session {
    store: Box<dyn AnnotationStore>,
    catalog: ImageCatalog,
    sequences: SequenceSet,
    navigator: SequenceNavigator,
    engine: PlacementEngine,
    loader: PairLoader,
    /// Load the session is waiting for
    pending: Option<LoadTicket>,
    /// Display mapping per slot, set once both images have loaded
    mappings: [Option<DisplayMapping>; 2],
    viewport: Size,
    zoom: ZoomState,
    keybindings: KeyBindings,
    export_filename: String,
}

impl Session {
    /// Create a session writing through `store`, configured by `config`.
    pub fn new(store: Box<dyn AnnotationStore>, config: &AppConfig) -> Result<Self, SessionError> {
        let prefs = &config.preferences;
        Ok(Self {
            store,
            catalog: ImageCatalog::new(),
            sequences: SequenceSet::default(),
            navigator: SequenceNavigator::default(),
            engine: PlacementEngine::new(),
            loader: PairLoader::spawn()?,
            pending: None,
            mappings: [None, None],
            viewport: prefs.viewport,
            zoom: ZoomState::new(prefs.default_zoom),
            keybindings: config.keybindings.clone(),
            export_filename: prefs.export_filename.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn store(&self) -> &dyn AnnotationStore {
        self.store.as_ref()
    }

    pub fn sequences(&self) -> &SequenceSet {
        &self.sequences
    }

    pub fn navigator(&self) -> &SequenceNavigator {
        &self.navigator
    }

    /// The active sequence, once images have been imported.
    pub fn current_sequence(&self) -> Option<&Sequence> {
        self.engine.active()
    }

    /// Working point list of the active sequence.
    pub fn points(&self) -> &[Point] {
        self.engine.points()
    }

    pub fn category(&self) -> Category {
        self.engine.category()
    }

    pub fn is_occluded_armed(&self) -> bool {
        self.engine.is_occluded_armed()
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    /// Display mapping of a surface, once its image has loaded.
    pub fn mapping(&self, slot: ImageSlot) -> Option<&DisplayMapping> {
        self.mappings[slot.index()].as_ref()
    }

    /// Whether the active sequence's images are still loading.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_zoom_into_contact_region(&self) -> bool {
        self.engine.can_zoom_into_contact_region()
    }

    /// One-line summary of the session state.
    pub fn status(&self) -> String {
        let Some(sequence) = self.engine.active() else {
            return "No sequence loaded".to_string();
        };
        let images = if self.is_loading() {
            "loading"
        } else if self.mappings.iter().all(Option::is_some) {
            "loaded"
        } else {
            "not loaded"
        };
        format!(
            "Sequence {} ({}) | category: {}{} | points: {}/{} | zoom: {}x{} | images: {}",
            sequence.id,
            self.navigator.progress(),
            self.engine.category(),
            if self.engine.is_occluded_armed() { " (occluded)" } else { "" },
            self.engine.points().len(),
            crate::constants::MAX_POINTS_PER_SEQUENCE,
            self.zoom.level(),
            if self.zoom.contact_region_visible { " (contact)" } else { "" },
            images
        )
    }

    // ------------------------------------------------------------------
    // Image import and navigation
    // ------------------------------------------------------------------

    /// Import images from files and folders and start at the first sequence.
    pub fn load_images<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize, SessionError> {
        let catalog = ImageCatalog::from_paths(paths)?;
        self.load_catalog(catalog)
    }

    /// Replace the imported images and start at the first sequence.
    ///
    /// On a grouping error the previous images and cursor are kept.
    pub fn load_catalog(&mut self, catalog: ImageCatalog) -> Result<usize, SessionError> {
        let sequences = SequenceSet::group(catalog.names())?;
        let count = sequences.len();

        self.catalog = catalog;
        self.sequences = sequences;
        self.navigator = SequenceNavigator::new(count);
        log::info!("Loaded {} sequences", count);

        self.activate_current()?;
        Ok(count)
    }

    /// Move to the next sequence, wrapping around.
    pub fn next(&mut self) -> Result<(), SessionError> {
        if self.navigator.next().is_none() {
            log::debug!("Next ignored: no sequences");
            return Ok(());
        }
        self.activate_current()
    }

    /// Move to the previous sequence, wrapping around.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        if self.navigator.previous().is_none() {
            log::debug!("Previous ignored: no sequences");
            return Ok(());
        }
        self.activate_current()
    }

    /// Load the stored points of the sequence under the cursor and request
    /// its images.
    fn activate_current(&mut self) -> Result<(), SessionError> {
        let Some(sequence) = self.sequences.at(self.navigator.current_index()).cloned() else {
            self.engine.deactivate();
            return Err(SessionError::NoActiveSequence);
        };

        log::info!(
            "Showing sequence '{}' ({})",
            sequence.id,
            self.navigator.progress()
        );
        self.engine.activate(&sequence, self.store.as_ref());
        self.mappings = [None, None];
        self.pending = None;
        self.refresh_contact_zoom();

        let [primary, secondary] = ImageSlot::all().map(|slot| {
            let name = sequence.image_for_slot(slot).to_string();
            match self.catalog.get(&name) {
                Some(source) => Ok((name, source.clone())),
                None => Err(LoadError::Missing { name }),
            }
        });
        let ticket = self.loader.request(&sequence.id, [primary?, secondary?]);
        self.pending = Some(ticket);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Image loading
    // ------------------------------------------------------------------

    /// Apply a finished pair load.
    ///
    /// Results for any request other than the one being waited for are
    /// stale and discarded; returns whether the result was applied. A
    /// failed load clears the loading state and is returned as an error.
    pub fn apply_load(&mut self, loaded: PairLoadResult) -> Result<bool, SessionError> {
        if self.pending.as_ref() != Some(&loaded.ticket) {
            log::debug!(
                "Discarding stale image load for '{}' (#{})",
                loaded.ticket.sequence_id,
                loaded.ticket.generation
            );
            return Ok(false);
        }
        self.pending = None;

        let sizes = loaded.result?;
        self.mappings = sizes.map(|size| Some(DisplayMapping::fitted(size, self.viewport)));
        log::debug!(
            "Images ready for '{}': {}x{} / {}x{}",
            loaded.ticket.sequence_id,
            sizes[0].width,
            sizes[0].height,
            sizes[1].width,
            sizes[1].height
        );
        Ok(true)
    }

    /// Apply every finished load without blocking.
    pub fn poll_images(&mut self) -> Result<bool, SessionError> {
        let mut applied = false;
        for loaded in self.loader.poll() {
            applied |= self.apply_load(loaded)?;
        }
        Ok(applied)
    }

    /// Block until the pending load resolves or `timeout` elapses.
    ///
    /// Returns `Ok(false)` when nothing was pending or the wait timed out.
    pub fn wait_for_images(&mut self, timeout: Duration) -> Result<bool, SessionError> {
        while self.pending.is_some() {
            let Some(loaded) = self.loader.wait_next(timeout) else {
                return Ok(false);
            };
            if self.apply_load(loaded)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Annotation
    // ------------------------------------------------------------------

    /// Place a point where the user clicked on a surface.
    pub fn on_click(&mut self, slot: ImageSlot, at: Position) -> Result<Point, SessionError> {
        if self.engine.active().is_none() {
            return Err(SessionError::NoActiveSequence);
        }
        let mapping = self.mappings[slot.index()].ok_or(PlacementError::ImagesNotLoaded)?;
        let point = self
            .engine
            .place(self.store.as_mut(), slot, at, &mapping)?;
        Ok(point)
    }

    /// Remove the most recently placed point.
    pub fn undo(&mut self) -> Result<Option<Point>, SessionError> {
        let removed = self.engine.undo_last(self.store.as_mut())?;
        self.refresh_contact_zoom();
        Ok(removed)
    }

    /// Clear the points of the active sequence.
    pub fn reset_current(&mut self) -> Result<(), SessionError> {
        if self.engine.active().is_none() {
            return Err(SessionError::NoActiveSequence);
        }
        let result = self.engine.reset_active(self.store.as_mut());
        self.refresh_contact_zoom();
        Ok(result?)
    }

    /// Clear the stored points of every sequence. The cursor stays put.
    pub fn reset_all(&mut self) -> Result<(), SessionError> {
        let result = self
            .engine
            .reset_all(self.store.as_mut(), self.sequences.ids());
        self.refresh_contact_zoom();
        Ok(result?)
    }

    /// Mark the next successfully placed point as occluded.
    pub fn arm_occluded(&mut self) {
        self.engine.arm_occluded();
    }

    /// Select a category, or toggle it when `category` is `None`.
    pub fn select_category(&mut self, category: Option<Category>) -> Category {
        match category {
            Some(category) => {
                self.engine.set_category(category);
                category
            }
            None => self.engine.toggle_category(),
        }
    }

    // ------------------------------------------------------------------
    // Zoom and layout
    // ------------------------------------------------------------------

    pub fn set_zoom_level(&mut self, level: u32) -> Result<(), SessionError> {
        if !self.zoom.set_level(level) {
            return Err(SessionError::InvalidZoomLevel(level));
        }
        log::debug!("Zoom level set to {}", level);
        Ok(())
    }

    /// Show or hide the contact-region inset, returning the new state.
    ///
    /// Showing it requires both an index and a thumb point on the contact
    /// image. Hiding always succeeds.
    pub fn toggle_contact_zoom(&mut self) -> Result<bool, SessionError> {
        if !self.zoom.contact_region_visible && !self.engine.can_zoom_into_contact_region() {
            return Err(SessionError::ContactZoomUnavailable);
        }
        Ok(self.zoom.toggle_contact_region())
    }

    /// Hide the contact-region inset once its points are gone.
    fn refresh_contact_zoom(&mut self) {
        if self.zoom.contact_region_visible && !self.engine.can_zoom_into_contact_region() {
            self.zoom.contact_region_visible = false;
        }
    }

    /// Recompute both display mappings for a new viewport.
    pub fn resize(&mut self, viewport: Size) -> Result<(), SessionError> {
        if !(viewport.width > 0.0 && viewport.height > 0.0) {
            return Err(SessionError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        self.viewport = viewport;
        for mapping in self.mappings.iter_mut().flatten() {
            *mapping = DisplayMapping::fitted(mapping.original, viewport);
        }
        log::debug!("Viewport resized to {}x{}", viewport.width, viewport.height);
        Ok(())
    }

    /// Update the hover magnifier for a pointer over a surface.
    pub fn hover(&self, slot: ImageSlot, at: Position, presenter: &mut dyn Presenter) {
        let view = self
            .mapping(slot)
            .and_then(|_| zoom::magnifier_view(at, self.zoom.level()));
        match view {
            Some(view) => presenter.show_magnifier(slot, view),
            None => presenter.hide_magnifier(),
        }
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Path used by an export without an explicit destination.
    pub fn default_export_path(&self) -> PathBuf {
        PathBuf::from(&self.export_filename)
    }

    /// Export the stored points of every sequence.
    pub fn export_to_path(&self, path: Option<&Path>) -> Result<ExportSummary, SessionError> {
        let default_path = self.default_export_path();
        let path = path.unwrap_or(&default_path);
        let document = export_all(self.sequences.ids(), self.store.as_ref());
        Ok(write_export(&document, path)?)
    }

    /// Import an annotation document, then reload the active sequence if
    /// it was among those overwritten.
    pub fn import_from_path(&mut self, path: &Path) -> Result<ImportSummary, SessionError> {
        let json = read_import(path)?;
        self.import_json(&json)
    }

    /// Import an annotation document held in memory.
    pub fn import_json(&mut self, json: &str) -> Result<ImportSummary, SessionError> {
        let result = import_all(json, self.store.as_mut());
        let reload = match &result {
            Ok(summary) => self
                .engine
                .active()
                .is_some_and(|sequence| summary.contains(&sequence.id)),
            // A failed write may have touched the store; parse errors never do.
            Err(e) => !e.is_parse_error(),
        };
        if reload {
            self.engine.reload(self.store.as_ref());
            self.refresh_contact_zoom();
        }
        Ok(result?)
    }

    // ------------------------------------------------------------------
    // Presentation
    // ------------------------------------------------------------------

    /// Redraw both surfaces from the working point list.
    pub fn render(&self, presenter: &mut dyn Presenter) {
        for slot in ImageSlot::all() {
            presenter.clear_surface(slot);
        }

        let Some(sequence) = self.engine.active() else {
            presenter.set_contact_zoom_available(false);
            return;
        };

        for point in self.engine.points() {
            let Some(slot) = sequence.slot_of(&point.img_name) else {
                log::warn!(
                    "Point on '{}' does not belong to sequence '{}'",
                    point.img_name,
                    sequence.id
                );
                continue;
            };
            if let Some(mapping) = self.mapping(slot) {
                let at = mapping.to_display(Position::new(point.x, point.y));
                presenter.render_point(slot, at, point.category, point.occluded);
            }
        }

        if self.zoom.contact_region_visible {
            let contact = self.engine.contact_points();
            if let (Some((index, thumb)), Some(mapping)) = (contact, self.mapping(ImageSlot::Primary))
            {
                let view = zoom::contact_region_view(index, thumb, mapping, self.zoom.level());
                presenter.render_zoom_inset(ImageSlot::Primary, view);
            }
        }

        presenter.show_progress(
            &sequence.id,
            self.navigator.current_index(),
            self.navigator.len(),
        );
        presenter.set_contact_zoom_available(self.engine.can_zoom_into_contact_region());
    }

    /// Block for the pending image load, then redraw or report the failure.
    pub fn finish_loading(&mut self, timeout: Duration, presenter: &mut dyn Presenter) {
        match self.wait_for_images(timeout) {
            Ok(true) => self.render(presenter),
            Ok(false) => {}
            Err(e) => {
                log::error!("{}", e);
                presenter.report_error(&e.to_string());
                self.render(presenter);
            }
        }
    }

    /// Resolve a key press through the key bindings and run its command.
    pub fn on_key(&mut self, key: Key, presenter: &mut dyn Presenter) -> bool {
        match self.keybindings.command_for_key(key) {
            Some(command) => self.handle(command, presenter),
            None => {
                log::debug!("Key '{}' is not bound", key);
                false
            }
        }
    }

    /// Run a command, report its outcome and redraw.
    ///
    /// Returns `false` when the command failed; the error has already been
    /// reported through the presenter.
    pub fn handle(&mut self, command: Command, presenter: &mut dyn Presenter) -> bool {
        match self.execute(command, presenter) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}", e);
                presenter.report_error(&e.to_string());
                false
            }
        }
    }

    fn execute(&mut self, command: Command, presenter: &mut dyn Presenter) -> Result<(), SessionError> {
        match command {
            Command::LoadImages(paths) => {
                let count = self.load_images(&paths)?;
                presenter.report(&format!("Loaded {} sequences", count));
            }
            Command::LoadAnnotations(path) => {
                let summary = self.import_from_path(&path)?;
                presenter.report(&format!(
                    "Imported {} points for {} sequences",
                    summary.points,
                    summary.imported.len()
                ));
            }
            Command::SaveAnnotations(path) => {
                let summary = self.export_to_path(path.as_deref())?;
                presenter.report(&format!(
                    "Exported {} sequences with {} points",
                    summary.sequences, summary.points
                ));
                return Ok(());
            }
            Command::ArmOccluded => self.arm_occluded(),
            Command::Undo => {
                self.undo()?;
            }
            Command::ResetCurrent => self.reset_current()?,
            Command::ResetAll => self.reset_all()?,
            Command::Category(category) => {
                let category = self.select_category(category);
                log::debug!("Category set to {}", category);
            }
            Command::Previous => self.previous()?,
            Command::Next => self.next()?,
            Command::SetZoomLevel(level) => self.set_zoom_level(level)?,
            Command::ToggleContactZoom => {
                self.toggle_contact_zoom()?;
            }
            Command::Click { slot, at } => {
                self.on_click(slot, at)?;
            }
            Command::Hover { slot, at } => {
                self.hover(slot, at, presenter);
                return Ok(());
            }
            Command::Resize(viewport) => self.resize(viewport)?,
            Command::Status => {
                presenter.report(&self.status());
                return Ok(());
            }
            Command::Key(key) => {
                self.on_key(key, presenter);
                return Ok(());
            }
        }
        self.render(presenter);
        Ok(())
    }
}
