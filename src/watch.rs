//! Config Watcher
//!
//! Reconfiguration trigger: watches the config file, waits for events to settle,
//! reloads the file and hands the new pipeline settings to the root facade. A file
//! that fails to load or validate is logged and the current pipeline is kept.
//! The watcher stops on its own once the root is frozen or disposed.

use crate::config::{ConfigLoader, WatchSettings};
use crate::error::FacadeError;
use crate::facade::{Generation, RootFacade};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Load `path` and reload `root` from its pipeline section.
pub fn reload_from_file(root: &RootFacade, path: &Path) -> Result<Generation, FacadeError> {
    let config = ConfigLoader::load_from_file(path)?;
    root.reload_from_settings(&config.pipeline)
}

/// Background thread reloading a root facade when its config file changes.
pub struct ConfigWatcher {
    running: Arc<RwLock<bool>>,
    reloads: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Start watching `path` on behalf of `root`.
    pub fn spawn(
        root: Arc<RootFacade>,
        path: PathBuf,
        settings: &WatchSettings,
    ) -> Result<Self, FacadeError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the watcher is shutting down
            let _ = tx.send(res);
        })
        .map_err(|e| FacadeError::Config(format!("Failed to create watcher: {}", e)))?;

        // Watch the directory: editors often replace the file instead of writing it.
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| FacadeError::Config(format!("Failed to watch {:?}: {}", directory, e)))?;

        info!(config = %path.display(), "Watching configuration");

        let running = Arc::new(RwLock::new(true));
        let reloads = Arc::new(AtomicU64::new(0));
        let debounce = Duration::from_millis(settings.debounce_ms);

        let handle = {
            let running = Arc::clone(&running);
            let reloads = Arc::clone(&reloads);
            thread::Builder::new()
                .name("hotroute-watch".to_string())
                .spawn(move || {
                    let _watcher = watcher;
                    let mut pending: Option<Instant> = None;

                    while *running.read() {
                        match rx.recv_timeout(POLL_INTERVAL) {
                            Ok(Ok(event)) => {
                                if touches(&event, &path) {
                                    pending = Some(Instant::now());
                                }
                            }
                            Ok(Err(e)) => warn!(error = %e, "Watch error"),
                            Err(RecvTimeoutError::Timeout) => {}
                            Err(RecvTimeoutError::Disconnected) => break,
                        }

                        let settled = pending.map_or(false, |at| at.elapsed() >= debounce);
                        if !settled {
                            continue;
                        }
                        pending = None;

                        match reload_from_file(&root, &path) {
                            Ok(generation) => {
                                reloads.fetch_add(1, Ordering::SeqCst);
                                info!(generation = generation.value(), "Configuration reloaded");
                            }
                            Err(FacadeError::AlreadyFrozen) => {
                                info!("Root facade frozen; stopping config watcher");
                                break;
                            }
                            Err(FacadeError::Disposed) => {
                                debug!("Root facade disposed; stopping config watcher");
                                break;
                            }
                            Err(e) => {
                                warn!(error = %e, "Configuration rejected; keeping current pipeline")
                            }
                        }
                    }

                    *running.write() = false;
                })
                .map_err(|e| FacadeError::Config(format!("Failed to spawn watcher: {}", e)))?
        };

        Ok(Self {
            running,
            reloads,
            handle: Some(handle),
        })
    }

    /// Number of successful reloads so far.
    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Stop watching and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        *self.running.write() = false;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Config watcher thread panicked");
            }
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Whether `event` changes the file at `path`. Compared by file name, since
/// the watcher may report a differently spelled parent directory.
fn touches(event: &Event, path: &Path) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    );
    relevant
        && event
            .paths
            .iter()
            .any(|changed| changed.file_name() == path.file_name())
}
