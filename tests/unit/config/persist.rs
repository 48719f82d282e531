use serde_json::json;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "stardream_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn debouncer_emits_only_last_value_after_quiet_period() {
    let t0 = Instant::now();
    let mut d = Debouncer::new(Duration::from_millis(300));
    d.schedule(1, t0);
    d.schedule(2, t0 + Duration::from_millis(100));
    assert_eq!(d.take_due(t0 + Duration::from_millis(300)), None);
    assert!(d.is_pending());
    assert_eq!(d.take_due(t0 + Duration::from_millis(400)), Some(2));
    assert!(!d.is_pending());
    assert_eq!(d.take_due(t0 + Duration::from_secs(10)), None);
}

#[test]
fn debouncer_flush_ignores_timing() {
    let t0 = Instant::now();
    let mut d = Debouncer::new(DEFAULT_SAVE_DEBOUNCE);
    d.schedule("x", t0);
    assert_eq!(d.flush(), Some("x"));
    assert_eq!(d.flush(), None);
}

#[test]
fn memory_store_round_trips_and_counts_saves() {
    let mut store = MemorySettingsStore::new();
    assert!(store.load().unwrap().is_none());

    let mut doc = ConfigDocument::default();
    doc.core.zoom = 2.0;
    store.save(&doc).unwrap();
    assert_eq!(store.saves(), 1);
    assert_eq!(load_or_default(&store).document, doc);

    store.set_fail_writes(true);
    assert!(matches!(
        store.save(&doc),
        Err(StardreamError::Persistence(_))
    ));
    assert_eq!(store.saves(), 1);
}

#[test]
fn malformed_memory_value_migrates_to_defaults() {
    let store = MemorySettingsStore::with_value(json!("not a document"));
    let m = load_or_default(&store);
    assert_eq!(m.document, ConfigDocument::default());
    assert!(!m.is_clean());
}

#[test]
fn json_file_store_saves_atomically_and_reloads() {
    let dir = temp_dir("settings_file");
    let path = dir.join("nested").join("settings.json");
    let mut store = JsonFileSettingsStore::new(&path);
    assert!(store.load().unwrap().is_none());

    let mut doc = ConfigDocument::default();
    doc.dreams[3].image = Some(crate::config::slot::ImageId::new("abc"));
    store.save(&doc).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
    assert_eq!(load_or_default(&store).document, doc);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn json_file_store_reports_garbage_as_integrity_error() {
    let dir = temp_dir("settings_garbage");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    std::fs::write(&path, "{ nope").unwrap();

    let store = JsonFileSettingsStore::new(&path);
    assert!(matches!(
        store.load(),
        Err(StardreamError::ConfigIntegrity(_))
    ));
    assert_eq!(load_or_default(&store).document, ConfigDocument::default());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn migration_load_recovers_from_garbage_but_not_from_io_errors() {
    let dir = temp_dir("settings_migration_load");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    std::fs::write(&path, "{ nope").unwrap();
    assert_eq!(load_for_migration(&JsonFileSettingsStore::new(&path)).unwrap(), None);

    let missing = JsonFileSettingsStore::new(dir.join("absent.json"));
    assert_eq!(load_for_migration(&missing).unwrap(), None);

    // a directory exists but cannot be read as a file
    let unreadable = JsonFileSettingsStore::new(&dir);
    assert!(matches!(
        load_for_migration(&unreadable),
        Err(StardreamError::Persistence(_))
    ));

    std::fs::remove_dir_all(&dir).ok();
}
