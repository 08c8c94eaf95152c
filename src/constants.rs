//! Global constants for pairmark.
//!
//! Layout values mirror the two-surface side-by-side arrangement the
//! annotation tool assumes: each image gets half of the viewport width.

/// Number of images that make up one sequence.
pub const IMAGES_PER_SEQUENCE: usize = 2;

/// Maximum number of points a single sequence may hold
/// (one `index` and one `thumb` point on each image).
pub const MAX_POINTS_PER_SEQUENCE: usize = 4;

/// Separator between the tokens of an image identifier.
pub const NAME_TOKEN_SEPARATOR: char = '_';

/// Suffix appended to a sequence identifier to form its storage key.
pub const STORAGE_KEY_SUFFIX: &str = "_points";

/// Default export file name.
pub const DEFAULT_EXPORT_FILENAME: &str = "all_annotations.json";

/// Supported image extensions for directory scans.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// Fit-to-viewport layout.
pub mod layout {
    /// Horizontal space reserved around each surface.
    pub const HORIZONTAL_MARGIN: f64 = 100.0;
    /// Vertical space reserved for controls above and below the surfaces.
    pub const VERTICAL_MARGIN: f64 = 300.0;
    /// Smallest side a surface is given, however small the viewport.
    pub const MIN_SURFACE_SIDE: f64 = 1.0;
    /// Viewport used when no configuration overrides it.
    pub const DEFAULT_VIEWPORT: (f64, f64) = (1600.0, 1000.0);
}

/// Magnifier and contact-region inset geometry (display pixels).
pub mod zoom {
    /// Minimum zoom level; at this level the hover magnifier is hidden.
    pub const MIN_LEVEL: u32 = 1;
    /// Side of the hover magnifier.
    pub const MAGNIFIER_SIZE: f64 = 100.0;
    /// Source side of the contact-region crop before dividing by the zoom level.
    pub const CONTACT_SOURCE_SIZE: f64 = 500.0;
    /// Side of the contact-region inset drawn on the primary surface.
    pub const CONTACT_INSET_SIZE: f64 = 250.0;
    /// Offset of the inset from the surface's top-left corner.
    pub const CONTACT_INSET_OFFSET: f64 = 10.0;
}
