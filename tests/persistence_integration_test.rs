use lx200_bridge::adapters::ActuationQueue;
use lx200_bridge::app::Lx200Session;
use lx200_bridge::domain::model::{AnglePosition, AxisIds, StoreFormat};
use lx200_bridge::{LocalStorage, MountStore, StateFile};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_session_state_survives_restart_as_yaml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scope.yaml");
    let state = StateFile::local(path.to_str().unwrap(), StoreFormat::Yaml);

    let store = MountStore::new();
    let (queue, _receiver) = ActuationQueue::channel(8);
    let mut session = Lx200Session::new(store.clone(), AxisIds::default(), queue);
    assert_eq!(session.handle_bytes(b":Sd +12*30:00#:RM#:U#"), b"1");
    state.save(&store).await.unwrap();

    let restored = MountStore::new();
    assert!(state.load_into(&restored).await.unwrap());
    assert_eq!(
        restored.get_as::<AnglePosition>("mount.target.declination"),
        Some(AnglePosition::new(12.0, 30.0, 0.0))
    );
    assert_eq!(restored.get("mount.slew.rate"), Some(json!("finding")));
    assert_eq!(restored.get("mount.high_precision"), Some(json!(true)));
    assert!(!restored.contains("mount.target.right_ascension"));
}

#[tokio::test]
async fn test_json_state_overrides_defaults_only_where_present() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("state.json"),
        r#"{"mount": {"alignment_status": {"is_tracking": true}}}"#,
    )
    .unwrap();

    let state = StateFile::new(
        LocalStorage::new(temp_dir.path()),
        "state.json",
        StoreFormat::Json,
    );
    let store = MountStore::new();
    state.load_into(&store).await.unwrap();

    assert_eq!(
        store.get("mount.alignment_status.is_tracking"),
        Some(json!(true))
    );
    assert_eq!(store.get("mount.slew.rate"), Some(json!("max")));
}

#[tokio::test]
async fn test_corrupt_state_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("state.json"), "mount: [unclosed").unwrap();

    let state = StateFile::new(
        LocalStorage::new(temp_dir.path()),
        "state.json",
        StoreFormat::Json,
    );
    assert!(state.load_into(&MountStore::new()).await.is_err());
}
