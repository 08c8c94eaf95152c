//! Annotation export/import.
//!
//! The export document maps every sequence identifier to its stored
//! points:
//!
//! ```json
//! {
//!   "A": {
//!     "sequence": "A",
//!     "points": [
//!       { "imgName": "A_right", "x": 10.5, "y": 4.0, "category": "index", "occluded": false }
//!     ]
//!   }
//! }
//! ```
//!
//! Import reads the same shape but only consults each entry's `points`
//! array. Imported points are trusted and written to the store verbatim.

mod document;
mod error;

#[cfg(test)]
mod tests;

pub use document::{
    AnnotationDocument, ExportSummary, ImportPlan, ImportSummary, SequenceEntry, export_all,
    import_all, read_import, write_export,
};
pub use error::FormatError;
