use rust_wallcover::config::{Configuration, SettingKey};
use rust_wallcover::events::HostEvent;
use rust_wallcover::tasks::settings;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Write next to `path` and rename over it, the way settings stores save.
fn replace_file(path: &Path, contents: &str) {
    let staging = path.with_extension("yaml.tmp");
    fs::write(&staging, contents).unwrap();
    fs::rename(&staging, path).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn edited_settings_file_emits_change() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("wallcover.yaml");
    fs::write(&path, "image_filepath: /photos/a.jpg\n").unwrap();
    let initial = Configuration::from_yaml_file(&path).unwrap();

    let (tx, mut rx) = mpsc::channel::<HostEvent>(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(settings::run(path.clone(), initial, tx, cancel.clone()));

    // Give the watcher time to register before editing.
    tokio::time::sleep(Duration::from_millis(300)).await;
    replace_file(&path, "image_filepath: /photos/a.jpg\nscreen_count: 3\n");

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for setting change")
        .expect("settings channel closed");
    match event {
        HostEvent::SettingChanged { key, config } => {
            assert_eq!(key, SettingKey::ScreenCount);
            assert_eq!(config.screen_count, 3);
        }
        other => panic!("unexpected event {other:?}"),
    }

    cancel.cancel();
    let _ = handle.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_settings_are_ignored() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("wallcover.yaml");
    fs::write(&path, "screen_count: 5\n").unwrap();
    let initial = Configuration::from_yaml_file(&path).unwrap();

    let (tx, mut rx) = mpsc::channel::<HostEvent>(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(settings::run(path.clone(), initial, tx, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(300)).await;
    replace_file(&path, "screen_count: 0\n");

    let none = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(none.is_err(), "zero screens must not reach the engine");

    cancel.cancel();
    let _ = handle.await;
}
