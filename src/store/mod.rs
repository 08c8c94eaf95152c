//! Durable per-sequence point storage.
//!
//! Each sequence's point list is stored independently under a key derived
//! from its identifier. There is no cross-sequence transaction: a failure
//! while clearing one sequence does not roll back the others.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::STORAGE_KEY_SUFFIX;
use crate::model::Point;

/// Errors that can occur when writing to a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error on a backing file
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Point list could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sequence identifier cannot be used as a storage key
    #[error("Invalid sequence identifier for storage: '{0}'")]
    InvalidKey(String),
}

/// Storage key for a sequence identifier.
pub fn storage_key(sequence_id: &str) -> String {
    format!("{}{}", sequence_id, STORAGE_KEY_SUFFIX)
}

/// Persistent storage of per-sequence point lists.
pub trait AnnotationStore {
    /// Check that a sequence identifier can be stored, without writing.
    fn check_key(&self, _sequence_id: &str) -> Result<(), StoreError> {
        Ok(())
    }

    /// Overwrite the stored list for a sequence.
    fn save(&mut self, sequence_id: &str, points: &[Point]) -> Result<(), StoreError>;

    /// Read the stored list for a sequence, or an empty list if none exists.
    fn load(&self, sequence_id: &str) -> Vec<Point>;

    /// Remove the stored list for a sequence.
    fn clear(&mut self, sequence_id: &str) -> Result<(), StoreError>;

    /// Remove the stored lists for every given sequence.
    ///
    /// Keeps going after a failure and returns the first error.
    fn clear_all(&mut self, sequence_ids: &[String]) -> Result<(), StoreError> {
        let mut first_error = None;
        for id in sequence_ids {
            if let Err(e) = self.clear(id) {
                log::error!("Failed to clear stored points for '{}': {}", id, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("seq_01"), "seq_01_points");
    }
}
