use super::*;
use serde::Deserialize;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

#[test]
fn test_put_and_get_json() {
    let store = StateStore::in_memory().expect("Failed to open store");
    let sample = Sample { name: "alpha".into(), count: 3 };

    store.put_json("sample", &sample).expect("Failed to store");
    let loaded: Option<Sample> = store.get_json("sample").expect("Failed to load");
    assert_eq!(loaded, Some(sample));
}

#[test]
fn test_missing_key_is_none() {
    let store = StateStore::in_memory().expect("Failed to open store");
    let loaded: Option<Sample> = store.get_json("absent").expect("Failed to load");
    assert!(loaded.is_none());
    assert!(!store.contains("absent").expect("Failed to query"));
}

#[test]
fn test_remove_reports_existence() {
    let store = StateStore::in_memory().expect("Failed to open store");
    store.put_json("key", &1u32).expect("Failed to store");

    assert!(store.remove("key").expect("Failed to remove"));
    assert!(!store.remove("key").expect("Failed to remove"));
}

#[test]
fn test_corrupt_value_is_serialization_error() {
    let store = StateStore::in_memory().expect("Failed to open store");
    store.put_json("key", &"not a sample").expect("Failed to store");

    let result: NewworkResult<Option<Sample>> = store.get_json("key");
    assert!(matches!(result, Err(NewworkError::Serialization(_))));
    assert_eq!(store.metrics().errors, 1);
}

#[test]
fn test_app_state_uses_camel_case_keys() {
    let store = StateStore::in_memory().expect("Failed to open store");
    let state = SavedAppState::new()
        .with_session("session-1")
        .with_tab(2);

    store.save_app_state(&state).expect("Failed to save");

    let raw: serde_json::Value = store
        .get_json(APP_STATE_KEY)
        .expect("Failed to load")
        .expect("State missing");
    assert_eq!(raw["activeSessionId"], "session-1");
    assert_eq!(raw["activeTabIndex"], 2);

    let loaded = store.load_app_state().expect("Failed to load").expect("State missing");
    assert_eq!(loaded.active_session_id.as_deref(), Some("session-1"));

    assert!(store.clear_app_state().expect("Failed to clear"));
    assert!(store.load_app_state().expect("Failed to load").is_none());
}

#[test]
fn test_persists_across_reopen() {
    let dir = std::env::temp_dir().join(format!("newwork-store-{}", uuid::Uuid::new_v4()));
    let config = StorageConfig::default().with_path(&dir);

    {
        let store = StateStore::open(config.clone()).expect("Failed to open store");
        store
            .save_app_state(&SavedAppState::new().with_workspace("ws-9"))
            .expect("Failed to save");
    }

    let store = StateStore::open(config).expect("Failed to reopen store");
    let loaded = store.load_app_state().expect("Failed to load").expect("State missing");
    assert_eq!(loaded.active_workspace_id.as_deref(), Some("ws-9"));
    drop(store);

    let _ = std::fs::remove_dir_all(dir);
}
