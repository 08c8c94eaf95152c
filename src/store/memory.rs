//! In-memory store for tests and ephemeral sessions.

use std::collections::HashMap;

use super::{AnnotationStore, StoreError, storage_key};
use crate::model::Point;

/// Store keeping point lists in a map. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<Point>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a list is stored for the sequence (even an empty one).
    pub fn contains(&self, sequence_id: &str) -> bool {
        self.entries.contains_key(&storage_key(sequence_id))
    }

    /// Number of stored lists.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AnnotationStore for MemoryStore {
    fn save(&mut self, sequence_id: &str, points: &[Point]) -> Result<(), StoreError> {
        self.entries
            .insert(storage_key(sequence_id), points.to_vec());
        Ok(())
    }

    fn load(&self, sequence_id: &str) -> Vec<Point> {
        self.entries
            .get(&storage_key(sequence_id))
            .cloned()
            .unwrap_or_default()
    }

    fn clear(&mut self, sequence_id: &str) -> Result<(), StoreError> {
        self.entries.remove(&storage_key(sequence_id));
        Ok(())
    }
}
