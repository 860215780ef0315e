//! Config watcher: file edits reload the root, freezing stops the watcher.

use hotroute::config::{PipelineSettings, WatchSettings};
use hotroute::watch::ConfigWatcher;
use hotroute::{Facade, Level, RootFacade};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

fn write_config(path: &Path, min_level: &str) {
    std::fs::write(
        path,
        format!(
            "[pipeline]\nmin_level = \"{}\"\nsinks = [\"null\"]\n",
            min_level
        ),
    )
    .unwrap();
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

fn watch_settings() -> WatchSettings {
    WatchSettings {
        enabled: true,
        debounce_ms: 50,
    }
}

#[test]
fn test_file_change_reloads_root() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hotroute.toml");
    write_config(&path, "info");

    let root = RootFacade::from_settings(&PipelineSettings {
        sinks: vec!["null".to_string()],
        ..PipelineSettings::default()
    })
    .unwrap();
    let logger = root.logger();
    assert!(logger.is_enabled(Level::Info).unwrap());

    let watcher = ConfigWatcher::spawn(Arc::clone(&root), path.clone(), &watch_settings()).unwrap();
    // Let the watch registration settle before editing.
    thread::sleep(Duration::from_millis(100));
    write_config(&path, "error");

    assert!(wait_until(|| watcher.reload_count() >= 1));
    assert!(root.generation().unwrap().value() >= 1);
    assert!(!logger.is_enabled(Level::Info).unwrap());
    assert!(logger.is_enabled(Level::Error).unwrap());

    watcher.stop();
}

#[test]
fn test_invalid_edit_keeps_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hotroute.toml");
    write_config(&path, "info");

    let root = RootFacade::from_settings(&PipelineSettings::default()).unwrap();
    let watcher = ConfigWatcher::spawn(Arc::clone(&root), path.clone(), &watch_settings()).unwrap();
    thread::sleep(Duration::from_millis(100));

    std::fs::write(&path, "[pipeline]\nsinks = []\n").unwrap();
    thread::sleep(Duration::from_millis(500));

    assert_eq!(watcher.reload_count(), 0);
    assert!(watcher.is_running());
    assert_eq!(root.generation().unwrap().value(), 0);
    watcher.stop();
}

#[test]
fn test_watcher_stops_after_freeze() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hotroute.toml");
    write_config(&path, "info");

    let root = RootFacade::from_settings(&PipelineSettings::default()).unwrap();
    let watcher = ConfigWatcher::spawn(Arc::clone(&root), path.clone(), &watch_settings()).unwrap();
    thread::sleep(Duration::from_millis(100));

    root.freeze().unwrap();
    write_config(&path, "debug");

    assert!(wait_until(|| !watcher.is_running()));
    assert_eq!(watcher.reload_count(), 0);
    assert_eq!(root.generation().unwrap().value(), 0);
}
