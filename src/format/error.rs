//! Error types for annotation export/import.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while exporting or importing annotations.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON with the wrong structure
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },

    /// A sequence's `points` array could not be read
    #[error("Invalid points for sequence '{sequence}': {source}")]
    InvalidPoints {
        /// Sequence whose points were rejected
        sequence: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Imported points could not be written to the store
    #[error("Failed to store imported points: {0}")]
    Store(#[from] StoreError),
}

impl FormatError {
    /// Create an invalid format error with a message.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from parsing the document (nothing was applied).
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            FormatError::Json(_) | FormatError::InvalidFormat { .. } | FormatError::InvalidPoints { .. }
        )
    }
}
