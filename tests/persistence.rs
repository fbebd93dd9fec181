//! Persisted formats: detection records, conflict rules, feature tables.

use std::fs;

use garmatch::catalog::{FeatureEntry, FeatureTable};
use garmatch::detect::{load_records, save_records, DetectionRecord};
use garmatch::{BoundingBox, ConflictTable, GarmatchError};
use tempfile::tempdir;

fn record(filename: &str, label: &str, bbox: BoundingBox) -> DetectionRecord {
    DetectionRecord {
        filename: filename.to_string(),
        label: label.to_string(),
        bbox,
    }
}

#[test]
fn records_round_trip_with_boxes_as_arrays() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("detections.json");

    let records = vec![
        record("16.jpg", "dress", BoundingBox::new(10.25, 5.5, 90.0, 200.75).unwrap()),
        record("16.jpg", "shoe", BoundingBox::new(0.0, 180.0, 80.0, 220.0).unwrap()),
        record("17.jpg", "pants", BoundingBox::new(5.0, 50.0, 60.0, 190.0).unwrap()),
    ];
    save_records(&path, &records).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"box\": ["));
    assert!(text.contains("\"label\": \"dress\""));

    let loaded = load_records(&path).unwrap();
    assert_eq!(loaded, records);
}

#[test]
fn loading_missing_records_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_records(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, GarmatchError::Io { .. }));
}

#[test]
fn malformed_records_fail_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("detections.json");
    fs::write(&path, "[{\"filename\": \"a.jpg\"").unwrap();
    let err = load_records(&path).unwrap_err();
    assert!(matches!(err, GarmatchError::MalformedJson { .. }));
}

#[test]
fn absent_conflict_file_means_no_conflicts() {
    let dir = tempdir().unwrap();
    let table = ConflictTable::load(dir.path().join("conflict_rules.json")).unwrap();
    assert!(table.is_empty());
}

#[test]
fn conflict_rules_load_from_string_keyed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conflict_rules.json");
    fs::write(&path, r#"{"6": ["8", "10"], "10": ["6"]}"#).unwrap();

    let table = ConflictTable::load(&path).unwrap();
    assert!(table.conflicts_with(6, 8));
    assert!(table.conflicts_with(6, 10));
    assert!(table.conflicts_with(10, 6));
    assert!(!table.conflicts_with(8, 6));
}

#[test]
fn malformed_conflict_rules_fail_fast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conflict_rules.json");

    fs::write(&path, "{not json").unwrap();
    let err = ConflictTable::load(&path).unwrap_err();
    assert!(matches!(err, GarmatchError::MalformedConflictTable { .. }));

    fs::write(&path, r#"{"skirt": ["6"]}"#).unwrap();
    let err = ConflictTable::load(&path).unwrap_err();
    match err {
        GarmatchError::MalformedConflictTable { reason, .. } => {
            assert!(reason.contains("skirt"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn feature_table_round_trip_preserves_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.json");

    let mut table = FeatureTable::new();
    for key in ["2_shoe_0", "0_dress_0", "1_pants_0"] {
        table
            .insert(
                key.to_string(),
                FeatureEntry {
                    filename: format!("{key}.png"),
                    feature: vec![0.1, 0.2, 0.3],
                },
            )
            .unwrap();
    }
    table.save(&path).unwrap();

    let loaded = FeatureTable::load(&path).unwrap();
    assert_eq!(loaded, table);
    let keys: Vec<_> = loaded.keys().collect();
    assert_eq!(keys, ["2_shoe_0", "0_dress_0", "1_pants_0"]);
    assert_eq!(loaded.dimension(), Some(3));
}

#[test]
fn feature_table_with_mixed_dimensions_fails_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.json");
    fs::write(
        &path,
        r#"{
            "a": {"filename": "a.png", "feature": [1.0, 2.0]},
            "b": {"filename": "b.png", "feature": [1.0]}
        }"#,
    )
    .unwrap();

    let err = FeatureTable::load(&path).unwrap_err();
    assert!(matches!(err, GarmatchError::MalformedFeatureTable { .. }));
}

#[test]
fn missing_feature_table_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = FeatureTable::load(dir.path().join("features.json")).unwrap_err();
    assert!(matches!(err, GarmatchError::Io { .. }));
}
