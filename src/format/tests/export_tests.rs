//! Tests for building and serializing the export document.

use serde_json::Value;

use super::{annotated_store, ids};
use crate::format::{AnnotationDocument, export_all, write_export};

#[test]
fn test_every_sequence_is_exported() {
    let store = annotated_store();
    let doc = export_all(&ids(&["A", "B", "C"]), &store);

    assert_eq!(doc.entries.len(), 3);
    assert_eq!(doc.get("A").unwrap().points.len(), 3);
    assert_eq!(doc.get("B").unwrap().points.len(), 1);
    assert!(doc.get("C").unwrap().points.is_empty());
    assert_eq!(doc.total_points(), 4);
}

#[test]
fn test_document_shape() {
    let store = annotated_store();
    let doc = export_all(&ids(&["A", "C"]), &store);
    let json: Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["A"]["sequence"], "A");
    assert_eq!(json["C"]["points"], Value::Array(Vec::new()));

    let point = &json["A"]["points"][1];
    assert_eq!(point["imgName"], "A_right");
    assert_eq!(point["x"], 30.0);
    assert_eq!(point["y"], 41.25);
    assert_eq!(point["category"], "thumb");
    assert_eq!(point["occluded"], true);
    assert_eq!(json["A"]["points"][0]["occluded"], false);
}

#[test]
fn test_point_field_order() {
    let store = annotated_store();
    let text = export_all(&ids(&["B"]), &store).to_json_pretty().unwrap();
    let positions: Vec<usize> = ["\"imgName\"", "\"x\"", "\"y\"", "\"category\"", "\"occluded\""]
        .iter()
        .map(|field| text.find(field).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
}

#[test]
fn test_sequence_order_is_kept() {
    let store = annotated_store();
    let text = export_all(&ids(&["B", "A"]), &store).to_json_pretty().unwrap();
    assert!(text.find("\"B\"").unwrap() < text.find("\"A\"").unwrap());
}

#[test]
fn test_empty_document() {
    let doc = AnnotationDocument::new();
    assert_eq!(doc.to_json_pretty().unwrap(), "{}");
}

#[test]
fn test_write_export_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all_annotations.json");
    let store = annotated_store();

    let summary = write_export(&export_all(&ids(&["A", "B"]), &store), &path).unwrap();
    assert_eq!(summary.sequences, 2);
    assert_eq!(summary.points, 4);
    assert!(std::fs::read_to_string(&path).unwrap().contains("\"sequence\": \"A\""));
}
