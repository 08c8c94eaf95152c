//! Tests for parsing and applying import documents.

use crate::format::{FormatError, ImportPlan, import_all, read_import};
use crate::model::{Category, Point};
use crate::store::{AnnotationStore, MemoryStore, StoreError};

/// Memory store that refuses keys or writes for one sequence.
struct FlakyStore {
    inner: MemoryStore,
    bad_key: Option<&'static str>,
    failing_write: Option<&'static str>,
}

impl FlakyStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            bad_key: None,
            failing_write: None,
        }
    }
}

impl AnnotationStore for FlakyStore {
    fn check_key(&self, sequence_id: &str) -> Result<(), StoreError> {
        if self.bad_key == Some(sequence_id) {
            return Err(StoreError::InvalidKey(sequence_id.to_string()));
        }
        Ok(())
    }

    fn save(&mut self, sequence_id: &str, points: &[Point]) -> Result<(), StoreError> {
        if self.failing_write == Some(sequence_id) {
            return Err(StoreError::Io {
                path: sequence_id.into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.save(sequence_id, points)
    }

    fn load(&self, sequence_id: &str) -> Vec<Point> {
        self.inner.load(sequence_id)
    }

    fn clear(&mut self, sequence_id: &str) -> Result<(), StoreError> {
        self.inner.clear(sequence_id)
    }
}

const THREE_SEQUENCES: &str = r#"{
    "A": {"points": [{"imgName": "A_left", "x": 1, "y": 2, "category": "thumb"}]},
    "B": {"points": [{"imgName": "B_left", "x": 3, "y": 4, "category": "index"}]},
    "C": {"points": [{"imgName": "C_left", "x": 5, "y": 6, "category": "index"}]}
}"#;

#[test]
fn test_import_overwrites_listed_sequences() {
    let mut store = super::annotated_store();
    let json = r#"{
        "A": {"sequence": "A", "points": [
            {"imgName": "A_left", "x": 1, "y": 2, "category": "thumb"}
        ]}
    }"#;

    let summary = import_all(json, &mut store).unwrap();
    assert_eq!(summary.imported, vec!["A".to_string()]);
    assert_eq!(summary.points, 1);

    let points = store.load("A");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].category, Category::Thumb);
    assert!(!points[0].occluded);
    // Untouched sequences keep their points.
    assert_eq!(store.load("B").len(), 1);
}

#[test]
fn test_entries_without_points_are_skipped() {
    let mut store = MemoryStore::new();
    let json = r#"{
        "A": {"sequence": "A"},
        "B": {"sequence": "B", "points": null},
        "C": {"sequence": "C", "points": []},
        "D": 42,
        "E": {"points": [{"imgName": "E_x", "x": 0, "y": 0, "category": "index", "occluded": true}]}
    }"#;

    let summary = import_all(json, &mut store).unwrap();
    assert_eq!(summary.imported, vec!["E".to_string()]);
    let mut skipped = summary.skipped.clone();
    skipped.sort();
    assert_eq!(skipped, vec!["A", "B", "C", "D"]);
    assert!(store.load("E")[0].occluded);
    assert!(!store.contains("A"));
}

#[test]
fn test_cardinality_is_not_validated() {
    let mut store = MemoryStore::new();
    let json = r#"{"A": {"points": [
        {"imgName": "A_left", "x": 0, "y": 0, "category": "index"},
        {"imgName": "A_left", "x": 1, "y": 1, "category": "index"},
        {"imgName": "A_left", "x": 2, "y": 2, "category": "index"},
        {"imgName": "A_left", "x": 3, "y": 3, "category": "index"},
        {"imgName": "A_left", "x": 4, "y": 4, "category": "index"}
    ]}}"#;
    import_all(json, &mut store).unwrap();
    assert_eq!(store.load("A").len(), 5);
}

#[test]
fn test_malformed_json_applies_nothing() {
    let mut store = super::annotated_store();
    let err = import_all("{\"A\": {\"points\": [", &mut store).unwrap_err();
    assert!(matches!(err, FormatError::Json(_)));
    assert!(err.is_parse_error());
    assert_eq!(store.load("A").len(), 3);
}

#[test]
fn test_bad_point_rejects_whole_document() {
    let mut store = super::annotated_store();
    let json = r#"{
        "A": {"points": [{"imgName": "A_left", "x": 1, "y": 2, "category": "index"}]},
        "B": {"points": [{"imgName": "B_left", "x": 1, "y": 2, "category": "pinky"}]}
    }"#;

    let err = import_all(json, &mut store).unwrap_err();
    assert!(matches!(err, FormatError::InvalidPoints { ref sequence, .. } if sequence == "B"));
    assert_eq!(store.load("A").len(), 3);
    assert_eq!(store.load("B").len(), 1);
}

#[test]
fn test_top_level_must_be_object() {
    let err = ImportPlan::parse("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, FormatError::InvalidFormat { .. }));
}

#[test]
fn test_read_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_import(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, FormatError::Io { .. }));
    assert!(!err.is_parse_error());
}

#[test]
fn test_rejected_key_writes_nothing() {
    let mut store = FlakyStore::new(super::annotated_store());
    store.bad_key = Some("C");

    let err = import_all(THREE_SEQUENCES, &mut store).unwrap_err();
    assert!(matches!(err, FormatError::Store(StoreError::InvalidKey(_))));
    assert!(!err.is_parse_error());
    assert_eq!(store.load("A").len(), 3);
    assert_eq!(store.load("B").len(), 1);
    assert!(!store.inner.contains("C"));
}

#[test]
fn test_failed_write_restores_earlier_sequences() {
    let mut store = FlakyStore::new(super::annotated_store());
    let before_a = store.load("A");
    let before_b = store.load("B");
    store.failing_write = Some("C");

    let err = import_all(THREE_SEQUENCES, &mut store).unwrap_err();
    assert!(matches!(err, FormatError::Store(StoreError::Io { .. })));
    assert_eq!(store.load("A"), before_a);
    assert_eq!(store.load("B"), before_b);
    assert!(!store.inner.contains("C"));
}

#[test]
fn test_failed_write_removes_lists_that_did_not_exist() {
    let mut store = FlakyStore::new(MemoryStore::new());
    store.failing_write = Some("C");

    import_all(THREE_SEQUENCES, &mut store).unwrap_err();
    assert!(store.inner.is_empty());
}
