//! Corrupt data, schema drift and migration on read

use crate::common::*;
use serde_json::json;

fn assert_reset_to_empty(ts: &TestStore) {
    assert!(ts.load().unwrap().is_empty());

    let raw = ts.raw_json();
    assert!(validate_envelope(&raw));
    assert_eq!(raw["version"], CURRENT_VERSION);
    assert!(raw["records"].as_array().unwrap().is_empty());
}

#[test]
fn non_json_bytes_reset_to_empty_envelope() {
    let ts = TestStore::new();
    ts.write_raw(b"not json at all");
    assert_reset_to_empty(&ts);
}

#[test]
fn wrong_shape_resets_to_empty_envelope() {
    let cases = vec![
        json!([1, 2, 3]),
        json!({"version": "1.0.0", "records": "nope", "updatedAt": "2024-01-01T00:00:00Z"}),
        json!({"version": 1, "records": [], "updatedAt": "2024-01-01T00:00:00Z"}),
        json!({"version": "1.0.0", "records": [], "updatedAt": "yesterday"}),
        envelope_json(CURRENT_VERSION, vec![json!({"id": "x", "name": 5})]),
    ];

    for case in cases {
        let ts = TestStore::new();
        ts.write_json(&case);
        assert_reset_to_empty(&ts);
    }
}

#[test]
fn one_bad_record_rejects_the_whole_envelope() {
    let mut bad = record_json("b", "bad");
    bad["category"] = json!("hobby");
    let ts = TestStore::new();
    ts.write_json(&envelope_json(
        CURRENT_VERSION,
        vec![record_json("a", "good"), bad],
    ));

    assert_reset_to_empty(&ts);
}

#[test]
fn strict_policy_surfaces_parse_error() {
    let ts = TestStore::strict();
    ts.write_raw(b"{\"version\":");

    assert!(matches!(ts.load(), Err(StoreError::ParseError(_))));
    assert_eq!(ts.raw(), Some(b"{\"version\":".to_vec()));
}

#[test]
fn strict_policy_counts_invalid_records() {
    let mut bad_priority = record_json("b", "bad");
    bad_priority["priority"] = json!("critical");
    let mut bad_count = record_json("c", "bad");
    bad_count["usageCount"] = json!(-1);

    let ts = TestStore::strict();
    ts.write_json(&envelope_json(
        CURRENT_VERSION,
        vec![record_json("a", "good"), bad_priority, bad_count],
    ));

    match ts.load() {
        Err(StoreError::ValidationError { invalid, .. }) => assert_eq!(invalid, 2),
        other => panic!("expected ValidationError, got {:?}", other),
    }
}

#[test]
fn repeated_ids_on_disk_keep_every_record() {
    for ts in [TestStore::new(), TestStore::strict()] {
        ts.write_json(&envelope_json(
            CURRENT_VERSION,
            vec![record_json("same", "One"), record_json("same", "Two")],
        ));

        let loaded = ts.load().unwrap();
        let names: Vec<_> = loaded.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two"]);
        assert_eq!(loaded[0].id, TemplateId::new("same"));
        assert_ne!(loaded[1].id, TemplateId::new("same"));

        let stored = ts.raw_json();
        assert_eq!(stored["records"].as_array().unwrap().len(), 2);
        assert_eq!(stored["records"][1]["id"], loaded[1].id.as_str());
    }
}

#[test]
fn offsetless_timestamps_survive_load() {
    let mut a = record_json("a", "local time");
    a["createdAt"] = json!("2024-01-01T00:00:00");
    a["updatedAt"] = json!("2024-01-01T08:15:30.5");
    let mut envelope = envelope_json(CURRENT_VERSION, vec![a, record_json("b", "zulu")]);
    envelope["updatedAt"] = json!("2024-01-02");

    let ts = TestStore::new();
    ts.write_json(&envelope);
    let before = ts.raw();

    let loaded = ts.load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded[0].created_at,
        chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap()
    );
    assert_eq!(
        loaded[0].updated_at,
        chrono::DateTime::parse_from_rfc3339("2024-01-01T08:15:30.5Z").unwrap()
    );
    assert_eq!(loaded[1].name, "zulu");
    assert_eq!(ts.raw(), before);
    assert_eq!(ts.storage_info().count, 2);
}

#[test]
fn null_optionals_are_accepted() {
    let mut record = record_json("a", "nullable");
    record["priority"] = json!(null);
    record["recurrence"] = json!(null);
    record["boardId"] = json!(null);
    record["columnId"] = json!(null);

    let ts = TestStore::new();
    ts.write_json(&envelope_json(CURRENT_VERSION, vec![record]));

    let loaded = ts.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].priority, None);
    assert_eq!(loaded[0].recurrence, None);
    assert_eq!(loaded[0].board_id, None);
}

#[test]
fn old_version_is_migrated_and_persisted_once() {
    let ts = TestStore::new();
    ts.write_json(&envelope_json(
        "0.9.0",
        vec![record_json("a", "legacy"), record_json("b", "legacy")],
    ));
    ts.tick(3_600);

    let loaded = ts.load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, TemplateId::new("a"));
    assert_eq!(loaded[0].usage_count, 3);

    let raw = ts.raw_json();
    assert_eq!(raw["version"], CURRENT_VERSION);

    // Second load reads the current version and does not rewrite
    let after_migration = ts.raw();
    ts.tick(60);
    assert_eq!(ts.load().unwrap(), loaded);
    assert_eq!(ts.raw(), after_migration);
}

#[test]
fn storage_info_reports_stored_version_without_migrating() {
    let ts = TestStore::new();
    ts.write_json(&envelope_json("0.9.0", vec![record_json("a", "legacy")]));

    let info = ts.storage_info();
    assert_eq!(info.version, "0.9.0");
    assert_eq!(info.count, 1);
    assert_eq!(ts.raw_json()["version"], "0.9.0");
}

#[test]
fn recovered_store_accepts_new_writes() {
    let ts = TestStore::new();
    ts.write_raw(&[0xde, 0xad, 0xbe, 0xef]);

    let t = ts.create(draft("fresh start")).unwrap();
    assert_eq!(ts.load().unwrap(), vec![t]);
}
