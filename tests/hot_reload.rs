//! Live reload tests for the configuration engine.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use hot_config::config::{ChangeAction, HotConfig, RestartReason};
use serde_json::json;

mod common;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_base_update_dispatches_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "mqtt.yaml", "broker:\n  host: a\n");
    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;

    fs::write(&path, "broker:\n  host: b\n").unwrap();
    backend.emit(dir.path(), &[path.clone()]);

    let event = common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(event.action, ChangeAction::Updated);
    assert_eq!(event.changed_name, "mqtt.yaml");
    assert_eq!(event.snapshot.unwrap()["mqtt.yaml"], json!({"broker": {"host": "b"}}));
    assert_eq!(engine.get_path("mqtt.yaml", "broker.host"), Some(json!("b")));
    engine.stop();
}

#[tokio::test]
async fn test_deletion_removes_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "devices.json", "[]");
    common::write(dir.path(), "mqtt.yaml", "{}");
    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;
    assert_eq!(engine.list(), vec!["devices.json", "mqtt.yaml"]);

    fs::remove_file(&path).unwrap();
    backend.emit(dir.path(), &[path]);

    let event = common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(event.action, ChangeAction::Deleted);
    assert_eq!(event.changed_name, "devices.json");
    assert_eq!(engine.list(), vec!["mqtt.yaml"]);
    engine.stop();
}

#[tokio::test]
async fn test_broken_file_reports_error_and_keeps_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "ai.json", r#"{"model": "small"}"#);
    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;

    fs::write(&path, r#"{"model": "#).unwrap();
    backend.emit(dir.path(), &[path]);

    let event = common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(event.action, ChangeAction::Error);
    assert!(event.error.unwrap().to_string().contains("ai.json"));
    assert_eq!(engine.get("ai.json"), Some(json!({"model": "small"})));
    engine.stop();
}

#[tokio::test]
async fn test_override_added_live_merges_into_base() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "sensors.json", r#"[{"id":1,"room":"hall"},{"id":2,"room":"attic"}]"#);
    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;

    let patch = common::write(
        dir.path(),
        "sensors-surcharge.json",
        r#"[{"replace":{"id":2},"with":{"room":"garage"}}]"#,
    );
    backend.emit(dir.path(), &[patch]);

    let event = common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(event.changed_name, "sensors.json");
    assert_eq!(
        engine.get("sensors.json"),
        Some(json!([{"id":1,"room":"hall"},{"id":2,"room":"garage"}]))
    );
    assert!(!engine.has("sensors-surcharge.json"));
    engine.stop();
}

#[tokio::test]
async fn test_overrides_compose_in_listing_order() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "lights.json", r#"[{"id":1,"level":0}]"#);
    common::write(dir.path(), "lights-surcharge.json", r#"{"replace":{"id":1},"with":{"level":50}}"#);
    let local = dir.path().join("local");
    fs::create_dir(&local).unwrap();
    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;
    assert_eq!(engine.get("lights.json"), Some(json!([{"id":1,"level":50}])));

    // Sorted after the top-level override, so it sees level 50.
    let patch = common::write(&local, "lights-surcharge.json", r#"{"replace":{"level":50},"with":{"level":80}}"#);
    backend.emit(dir.path(), &[patch]);

    let event = common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(event.changed_name, "lights.json");
    assert_eq!(event.snapshot.unwrap()["lights.json"], json!([{"id":1,"level":80}]));
    engine.stop();
}

#[tokio::test]
async fn test_idempotent_full_load() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "a.json", r#"[{"id":1}]"#);
    common::write(dir.path(), "a-surcharge.json", r#"[{"replace":{"id":1},"with":{"x":true}}]"#);
    common::write(dir.path(), "b.toml", "[db]\npath = \"data.sqlite\"\n");
    common::write(dir.path(), "c.yml", "- 1\n- 2\n");

    let first = HotConfig::new(common::settings(dir.path())).unwrap().init().await;
    let second = HotConfig::new(common::settings(dir.path())).unwrap().init().await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[tokio::test]
async fn test_watch_error_reaches_observers() {
    let dir = tempfile::tempdir().unwrap();
    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;

    backend.fail(dir.path(), "inotify queue overflow");

    let event = common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(event.action, ChangeAction::Error);
    assert_eq!(event.changed_name, dir.path().display().to_string());
    engine.stop();
}

#[tokio::test]
async fn test_restart_requested_only_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "a.json", "{}");

    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;
    let mut requests = engine.take_restart_requests().unwrap();
    backend.emit(dir.path(), &[path.clone()]);
    common::next_event(&mut events, WAIT).await.expect("no event");
    assert!(requests.try_recv().is_err());
    engine.stop();

    let mut settings = common::settings(dir.path());
    settings.restart_on_update = true;
    let (backend, engine, mut events) = common::start_manual(settings).await;
    let mut requests = engine.take_restart_requests().unwrap();
    backend.emit(dir.path(), &[path]);
    common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(
        requests.try_recv().unwrap().reason,
        RestartReason::ConfigUpdated { name: "a.json".into() }
    );
    engine.stop();
}

#[tokio::test]
async fn test_plugin_change_requests_restart() {
    let config_dir = tempfile::tempdir().unwrap();
    let plugins_dir = tempfile::tempdir().unwrap();
    let mut settings = common::settings(config_dir.path());
    settings.plugins_dir = Some(plugins_dir.path().to_path_buf());

    let (backend, engine, _events) = common::start_manual(settings).await;
    let mut requests = engine.take_restart_requests().unwrap();
    assert!(backend.is_watching(plugins_dir.path()));

    let ignored = plugins_dir.path().join("store.sqlite");
    let page = plugins_dir.path().join("random").join("ui.html");
    backend.emit(plugins_dir.path(), &[ignored, page.clone()]);

    let request = tokio::time::timeout(WAIT, requests.recv()).await.unwrap().unwrap();
    assert_eq!(request.reason, RestartReason::PluginChanged { path: page });
    engine.stop();
}

#[tokio::test]
async fn test_stop_silences_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "a.json", "{}");
    let (backend, engine, mut events) = common::start_manual(common::settings(dir.path())).await;

    engine.stop();
    fs::write(&path, r#"{"after": "stop"}"#).unwrap();
    backend.emit(dir.path(), &[path]);

    assert!(common::next_event(&mut events, Duration::from_millis(300)).await.is_none());
    assert!(engine.list().is_empty());
}

#[tokio::test]
async fn test_notify_backend_picks_up_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "mqtt.json", r#"{"port": 1883}"#);

    let engine = HotConfig::new(common::settings(dir.path())).unwrap();
    engine.start().await.unwrap();
    let mut events = common::subscribe(&engine);

    // Let the OS watch settle before writing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(&path, r#"{"port": 8883}"#).unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut seen = false;
    while tokio::time::Instant::now() < deadline {
        match common::next_event(&mut events, Duration::from_secs(1)).await {
            Some(event) if event.changed_name == "mqtt.json" && event.action == ChangeAction::Updated => {
                if engine.get_path("mqtt.json", "port") == Some(json!(8883)) {
                    seen = true;
                    break;
                }
            }
            _ => {}
        }
    }

    assert!(seen, "notify backend never reported the edit");
    engine.stop();
}

#[tokio::test]
async fn test_unwatchable_directory_does_not_fail_start() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "mqtt.json", r#"{"port": 1883}"#);

    let backend = Arc::new(common::FailingWatch::new("inotify watch limit reached"));
    let engine = HotConfig::with_watch_backend(common::settings(dir.path()), backend).unwrap();
    let mut events = common::subscribe(&engine);

    let snapshot = engine.start().await.expect("start must not fail on watch errors");
    assert_eq!(snapshot["mqtt.json"], json!({"port": 1883}));

    let event = common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(event.action, ChangeAction::Error);
    assert_eq!(event.changed_name, dir.path().display().to_string());
    assert!(event.error.unwrap().to_string().contains("inotify watch limit reached"));
    assert_eq!(engine.get_path("mqtt.json", "port"), Some(json!(1883)));
    engine.stop();
}

#[tokio::test]
async fn test_restart_rearmed_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "a.json", "{}");
    let mut settings = common::settings(dir.path());
    settings.restart_on_update = true;

    let (backend, engine, mut events) = common::start_manual(settings).await;
    let mut requests = engine.take_restart_requests().unwrap();
    backend.emit(dir.path(), &[path.clone()]);
    common::next_event(&mut events, WAIT).await.expect("no event");
    assert!(requests.try_recv().is_ok());

    engine.stop();
    engine.start().await.unwrap();
    let mut events = common::subscribe(&engine);
    backend.emit(dir.path(), &[path]);
    common::next_event(&mut events, WAIT).await.expect("no event");
    assert_eq!(
        requests.try_recv().unwrap().reason,
        RestartReason::ConfigUpdated { name: "a.json".into() }
    );
    engine.stop();
}
