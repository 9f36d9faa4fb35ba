//! Create / read / update / delete through the store API

use crate::common::*;

#[test]
fn create_assigns_fresh_identity() {
    let ts = TestStore::new();
    let t = ts.create(weekly_report()).unwrap();

    assert!(!t.id.as_str().is_empty());
    assert_eq!(t.usage_count, 0);
    assert!(!t.is_favorite);
    assert_eq!(t.created_at, epoch());
    assert_eq!(t.created_at, t.updated_at);
}

#[test]
fn ids_are_unique_across_creates_and_deletes() {
    let ts = TestStore::new();
    let mut seen = std::collections::HashSet::new();

    for i in 0..20 {
        let t = ts.create(draft(&format!("t{}", i))).unwrap();
        assert!(seen.insert(t.id.clone()));
        if i % 3 == 0 {
            assert!(ts.delete(&t.id).unwrap());
        }
    }

    let stored = ts.load().unwrap();
    let ids: std::collections::HashSet<_> = stored.iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids.len(), stored.len());
}

#[test]
fn save_then_load_returns_same_records() {
    let ts = TestStore::new();
    let a = ts.create(weekly_report()).unwrap();
    let b = ts.create(draft("standup")).unwrap();

    let mut reordered = vec![b, a];
    reordered[0].is_favorite = true;
    ts.save(&reordered).unwrap();

    assert_eq!(ts.load().unwrap(), reordered);
}

#[test]
fn envelope_is_stamped_on_every_save() {
    let ts = TestStore::new();
    ts.create(draft("a")).unwrap();
    ts.tick(30);
    ts.create(draft("b")).unwrap();

    let raw = ts.raw_json();
    assert_eq!(raw["version"], CURRENT_VERSION);
    assert_eq!(raw["records"].as_array().unwrap().len(), 2);

    let info = ts.storage_info();
    assert_eq!(info.count, 2);
    assert_eq!(info.size, ts.storage_size());
    assert_eq!(info.last_updated, Some(epoch() + chrono::Duration::seconds(30)));
}

#[test]
fn update_preserves_store_owned_fields() {
    let ts = TestStore::new();
    let t = ts.create(weekly_report()).unwrap();
    ts.increment_usage(&t.id).unwrap();
    ts.tick(60);

    let patch = TemplatePatch {
        name: Some("Monthly Report".to_string()),
        priority: Some(None),
        recurrence: Some(Some(Recurrence::every(1, Frequency::Monthly))),
        ..Default::default()
    };
    let updated = ts.update(&t.id, patch).unwrap().unwrap();

    assert_eq!(updated.id, t.id);
    assert_eq!(updated.created_at, t.created_at);
    assert_eq!(updated.usage_count, 1);
    assert_eq!(updated.name, "Monthly Report");
    assert_eq!(updated.priority, None);
    assert_eq!(updated.recurrence.unwrap().frequency, Frequency::Monthly);
    assert!(updated.updated_at > t.updated_at);
}

#[test]
fn update_and_delete_of_missing_id_leave_bytes_untouched() {
    let ts = TestStore::new();
    ts.create(weekly_report()).unwrap();
    let before = ts.raw();
    ts.tick(5);

    let missing = TemplateId::new("no-such-template");
    assert!(ts.update(&missing, TemplatePatch::default()).unwrap().is_none());
    assert!(!ts.delete(&missing).unwrap());

    assert_eq!(ts.raw(), before);
}

#[test]
fn usage_count_never_decreases() {
    let ts = TestStore::new();
    let t = ts.create(draft("routine")).unwrap();

    let mut last = 0;
    for _ in 0..5 {
        ts.increment_usage(&t.id).unwrap();
        ts.update(
            &t.id,
            TemplatePatch {
                description: Some("edited".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let now = ts.get(&t.id).unwrap().unwrap().usage_count;
        assert!(now > last);
        last = now;
    }
    assert_eq!(last, 5);
}

#[test]
fn invalid_save_leaves_storage_unchanged() {
    let ts = TestStore::new();
    let good = ts.create(weekly_report()).unwrap();
    let before = ts.raw();

    let mut blank = good.clone();
    blank.id = TemplateId::new("");
    let err = ts.save(&[good.clone(), blank]).unwrap_err();

    match err {
        StoreError::ValidationError { invalid, .. } => assert_eq!(invalid, 1),
        other => panic!("expected ValidationError, got {:?}", other),
    }
    assert_eq!(ts.raw(), before);
    assert_eq!(ts.load().unwrap(), vec![good]);
}

#[test]
fn favorites_toggle_back_and_forth() {
    let ts = TestStore::new();
    let t = ts.create(draft("fav")).unwrap();

    assert!(ts.toggle_favorite(&t.id).unwrap());
    assert!(!ts.toggle_favorite(&t.id).unwrap());
    assert!(ts.toggle_favorite(&t.id).unwrap());
    assert!(ts.get(&t.id).unwrap().unwrap().is_favorite);
}

#[test]
fn use_template_projects_task_fields() {
    let ts = TestStore::new();
    let t = ts.create(weekly_report()).unwrap();

    let task = ts.use_template(&t.id).unwrap().unwrap();
    assert_eq!(task.template_id, t.id);
    assert_eq!(task.title, "Write report");
    assert_eq!(task.priority, Some(Priority::Medium));
    assert_eq!(task.due_date.as_deref(), Some("+7d"));
    assert_eq!(task.recurrence, Some(Recurrence::every(1, Frequency::Weekly)));
    assert_eq!(ts.get(&t.id).unwrap().unwrap().usage_count, 1);
}

#[test]
fn quota_failure_surfaces_and_keeps_previous_state() {
    let ts = TestStore::with_quota(2_048);
    let t = ts.create(draft("small")).unwrap();
    let before = ts.raw();

    let huge = draft("huge").with_task_description("x".repeat(4_096));
    assert!(matches!(ts.create(huge), Err(StoreError::QuotaExceeded(_))));

    assert_eq!(ts.raw(), before);
    assert_eq!(ts.load().unwrap(), vec![t]);
}

#[test]
fn unavailable_storage_is_reported_not_hidden() {
    let ts = TestStore::new();
    ts.create(draft("kept")).unwrap();
    ts.backend().set_available(false);

    assert!(matches!(ts.load(), Err(StoreError::StorageUnavailable(_))));
    assert!(matches!(ts.clear(), Err(StoreError::StorageUnavailable(_))));
    assert_eq!(ts.storage_info(), StorageInfo::default());

    ts.backend().set_available(true);
    assert_eq!(ts.load().unwrap().len(), 1);
}

#[test]
fn clear_then_load_is_empty() {
    let ts = TestStore::new();
    ts.create(draft("gone")).unwrap();
    ts.clear().unwrap();

    assert!(ts.raw().is_none());
    assert!(ts.load().unwrap().is_empty());
    assert_eq!(ts.storage_info(), StorageInfo::default());
}

/// Create, use twice, favorite, export, import into a second store.
#[test]
fn weekly_report_scenario() {
    let ts = TestStore::new();
    let t = ts.create(weekly_report()).unwrap();
    assert_eq!(t.usage_count, 0);

    ts.increment_usage(&t.id).unwrap();
    ts.increment_usage(&t.id).unwrap();
    assert!(ts.toggle_favorite(&t.id).unwrap());

    let exported = ts.export().unwrap();
    assert_eq!(exported.version, CURRENT_VERSION);
    assert_eq!(exported.records.len(), 1);
    assert_eq!(exported.records[0].usage_count, 2);
    assert!(exported.records[0].is_favorite);

    let other = TestStore::new();
    let json = serde_json::to_value(&exported).unwrap();
    let report = other.import(json, ImportMode::Merge).unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.reidentified, 0);

    let copied = other.load().unwrap();
    assert_eq!(copied, exported.records);
}
