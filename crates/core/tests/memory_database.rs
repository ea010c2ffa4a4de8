use ida2r2_core::db::{AnalysisDatabase, DatabaseSnapshot, DbError, LookupError, MemoryDatabase};

#[test]
fn snapshot_fields_are_optional() {
    let db = MemoryDatabase::from_json("{}").expect("empty snapshot");
    assert!(db.functions().unwrap().is_empty());
    assert!(db.segments().unwrap().is_empty());
    assert!(matches!(db.image_base(), Err(LookupError::NotFound { .. })));
}

#[test]
fn snapshot_comments_are_keyed_by_slot() {
    let db = MemoryDatabase::from_json(
        r#"{"comments": [
            {"address": 16, "text": "regular"},
            {"address": 16, "text": "repeatable", "repeatable": true}
        ]}"#,
    )
    .unwrap();
    assert_eq!(db.comment(16, false).unwrap(), "regular");
    assert_eq!(db.comment(16, true).unwrap(), "repeatable");
    assert!(db.comment(17, false).is_err());
}

#[test]
fn snapshot_serializes_back_to_json() {
    let snapshot = DatabaseSnapshot { image_base: Some(0x1000), ..Default::default() };
    let json = serde_json::to_string(&snapshot).unwrap();
    assert_eq!(json, r#"{"image_base":4096,"functions":[],"segments":[],"comments":[]}"#);
}

#[test]
fn malformed_snapshot_is_an_error() {
    let err = MemoryDatabase::from_json("[1, 2]").unwrap_err();
    assert!(matches!(err, DbError::Snapshot(_)), "unexpected error: {err}");
}
