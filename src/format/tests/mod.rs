//! Unit tests for the export/import codec.
//!
//! These tests verify document shape, import validation and the
//! export-then-import round trip.

mod export_tests;
mod import_tests;

use crate::model::{Category, Point};
use crate::store::{AnnotationStore, MemoryStore};

/// Store with two annotated sequences and one untouched sequence.
fn annotated_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .save(
            "A",
            &[
                Point::new("A_right", 12.5, 40.0, Category::Index),
                Point::new("A_right", 30.0, 41.25, Category::Thumb).with_occluded(true),
                Point::new("A_left", 100.0, 7.0, Category::Index),
            ],
        )
        .unwrap();
    store
        .save("B", &[Point::new("B_left", 0.5, 0.25, Category::Thumb)])
        .unwrap();
    store
}

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
