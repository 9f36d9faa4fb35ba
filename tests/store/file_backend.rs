//! File-backed stores: persistence across reopen and `stencil.toml`

use crate::common::*;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    init_tracing();
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn open_writes_default_config() {
    let dir = temp_dir();
    let store = TemplateStore::open(dir.path()).unwrap();

    let config_path = dir.path().join(CONFIG_FILE_NAME);
    assert!(config_path.exists());
    assert_eq!(
        std::fs::read_to_string(&config_path).unwrap(),
        StencilConfig::default_toml()
    );
    assert_eq!(store.config(), &StencilConfig::default());
}

#[test]
fn templates_survive_reopen() {
    let dir = temp_dir();

    let created = {
        let store = TemplateStore::open(dir.path()).unwrap();
        let t = store.create(weekly_report()).unwrap();
        store.increment_usage(&t.id).unwrap();
        t
    };

    let store = TemplateStore::open(dir.path()).unwrap();
    let loaded = store.get(&created.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Weekly Report");
    assert_eq!(loaded.usage_count, 1);
    assert_eq!(store.storage_info().count, 1);
}

#[test]
fn envelope_lives_in_one_file_per_key() {
    let dir = temp_dir();
    let store = TemplateStore::open(dir.path()).unwrap();
    store.create(draft("one")).unwrap();

    let path = store.backend().path_for(store.storage_key());
    assert!(path.exists());
    assert_eq!(
        std::fs::metadata(&path).unwrap().len() as usize,
        store.storage_size()
    );

    store.clear().unwrap();
    assert!(!path.exists());
    assert_eq!(store.storage_size(), 0);
}

#[test]
fn custom_config_is_persisted_and_honored() {
    let dir = temp_dir();
    let config = StencilConfig {
        storage_key: "team-templates".to_string(),
        on_corruption: CorruptionPolicy::FailOnCorruption,
        ..StencilConfig::default()
    };

    {
        let store = TemplateStore::open_with_config(dir.path(), config.clone()).unwrap();
        store.create(draft("shared")).unwrap();
    }

    let reopened = TemplateStore::open(dir.path()).unwrap();
    assert_eq!(reopened.config(), &config);
    assert_eq!(reopened.storage_key(), "team-templates");
    assert_eq!(reopened.load().unwrap().len(), 1);

    std::fs::write(reopened.backend().path_for("team-templates"), b"torn write").unwrap();
    assert!(matches!(reopened.load(), Err(StoreError::ParseError(_))));
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = temp_dir();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "storage_key = \"\"\n").unwrap();

    assert!(matches!(
        TemplateStore::open(dir.path()),
        Err(StoreError::ConfigError(_))
    ));

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "on_corruption = \"shrug\"\n").unwrap();
    assert!(matches!(
        TemplateStore::open(dir.path()),
        Err(StoreError::ConfigError(_))
    ));
}

#[test]
fn max_bytes_limits_the_file_backend() {
    let dir = temp_dir();
    let config = StencilConfig {
        max_bytes: Some(1_024),
        ..StencilConfig::default()
    };
    let store = TemplateStore::open_with_config(dir.path(), config).unwrap();
    let small = store.create(draft("small")).unwrap();

    let big = draft("big").with_description("y".repeat(2_048));
    assert!(matches!(store.create(big), Err(StoreError::QuotaExceeded(_))));
    assert_eq!(store.load().unwrap(), vec![small]);
}
