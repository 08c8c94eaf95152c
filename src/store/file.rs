//! File-backed store: one JSON document per sequence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{AnnotationStore, StoreError, storage_key};
use crate::model::Point;

/// Stores each sequence's points in `<dir>/<sequence>_points.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default store directory under the user's data directory.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("pairmark").join("progress"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, sequence_id: &str) -> Result<PathBuf, StoreError> {
        self.check_key(sequence_id)?;
        Ok(self.dir.join(format!("{}.json", storage_key(sequence_id))))
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl AnnotationStore for FileStore {
    fn check_key(&self, sequence_id: &str) -> Result<(), StoreError> {
        if sequence_id.is_empty()
            || sequence_id.contains(['/', '\\'])
            || sequence_id == "."
            || sequence_id == ".."
        {
            return Err(StoreError::InvalidKey(sequence_id.to_string()));
        }
        Ok(())
    }

    fn save(&mut self, sequence_id: &str, points: &[Point]) -> Result<(), StoreError> {
        let path = self.path_for(sequence_id)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;

        let json = serde_json::to_string_pretty(points)?;
        // Write then rename so a crash never leaves a truncated list behind.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| Self::io_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| Self::io_error(&path, e))?;

        log::trace!("Stored {} points for '{}'", points.len(), sequence_id);
        Ok(())
    }

    fn load(&self, sequence_id: &str) -> Vec<Point> {
        let path = match self.path_for(sequence_id) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{}", e);
                return Vec::new();
            }
        };

        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to read stored points {:?}: {}", path, e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&json) {
            Ok(points) => points,
            Err(e) => {
                log::warn!("Ignoring corrupt stored points {:?}: {}", path, e);
                Vec::new()
            }
        }
    }

    fn clear(&mut self, sequence_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(sequence_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn sample_points() -> Vec<Point> {
        vec![
            Point::new("A_right", 10.5, 20.25, Category::Index),
            Point::new("A_left", 3.0, 4.0, Category::Thumb).with_occluded(true),
        ]
    }

    #[test]
    fn test_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        store.save("A", &sample_points()).unwrap();
        assert!(dir.path().join("nested").join("A_points.json").exists());

        let reopened = FileStore::new(dir.path().join("nested"));
        assert_eq!(reopened.load("A"), sample_points());
    }

    #[test]
    fn test_missing_and_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("missing").is_empty());

        std::fs::write(dir.path().join("bad_points.json"), "{not json").unwrap();
        assert!(store.load("bad").is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.save("A", &sample_points()).unwrap();
        store.clear("A").unwrap();
        store.clear("A").unwrap();
        assert!(store.load("A").is_empty());
    }

    #[test]
    fn test_rejects_path_like_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(matches!(
            store.save("../escape", &[]),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(store.load("..").is_empty());
        assert!(store.check_key("a/b").is_err());
        assert!(store.check_key("seq_01").is_ok());
    }
}
