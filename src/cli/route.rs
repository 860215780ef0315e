//! CLI route: run context and command dispatch.

use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, HotrouteConfig};
use crate::error::FacadeError;
use crate::facade::{Facade, RootFacade};
use crate::pipeline::Extension;
use crate::record::Level;
use crate::watch::ConfigWatcher;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of `hotroute run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: u64,
    pub reloads: u64,
    pub final_generation: u64,
    pub frozen: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Emitted {} records; {} reloads; final generation {}{}",
            self.records,
            self.reloads,
            self.final_generation,
            if self.frozen { " (frozen)" } else { "" }
        )
    }
}

/// Runtime context for CLI execution: config path and loaded configuration.
pub struct RunContext {
    config_path: PathBuf,
    config: HotrouteConfig,
}

impl RunContext {
    pub fn new(config_path: PathBuf) -> Result<Self, FacadeError> {
        let config = ConfigLoader::load_from_file(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn execute(&self, command: &Commands) -> Result<String, FacadeError> {
        match command {
            Commands::Check => Ok(self.check()),
            Commands::Run {
                workers,
                duration_secs,
                freeze_after_secs,
                interval_ms,
            } => self
                .run(
                    *workers,
                    Duration::from_secs(*duration_secs),
                    freeze_after_secs.map(Duration::from_secs),
                    Duration::from_millis(*interval_ms),
                )
                .map(|summary| summary.to_string()),
        }
    }

    fn check(&self) -> String {
        let pipeline = &self.config.pipeline;
        let watch = &self.config.watch;
        format!(
            "Configuration OK: {}\n  min_level: {}\n  sinks: {}\n  properties: {}\n  watch: {}",
            self.config_path.display(),
            pipeline.min_level,
            pipeline.sinks.join(", "),
            pipeline.properties.len(),
            if watch.enabled {
                format!("on (debounce {}ms)", watch.debounce_ms)
            } else {
                "off".to_string()
            }
        )
    }

    /// Emit sample records from `workers` threads for `duration`.
    pub fn run(
        &self,
        workers: usize,
        duration: Duration,
        freeze_after: Option<Duration>,
        interval: Duration,
    ) -> Result<RunSummary, FacadeError> {
        let root = RootFacade::from_settings(&self.config.pipeline)?;
        let watcher = if self.config.watch.enabled {
            Some(ConfigWatcher::spawn(
                Arc::clone(&root),
                self.config_path.clone(),
                &self.config.watch,
            )?)
        } else {
            None
        };

        let app = root
            .logger()
            .derive(Extension::property("App", "hotroute")?)?;
        let loggers = (0..workers)
            .map(|id| Ok((id, app.derive(Extension::property("Worker", id as u64)?)?)))
            .collect::<Result<Vec<_>, FacadeError>>()?;

        let deadline = Instant::now() + duration;
        let emitted = Arc::new(AtomicU64::new(0));
        let handles = loggers
            .into_iter()
            .map(|(id, logger)| {
                let emitted = Arc::clone(&emitted);
                thread::spawn(move || {
                    let mut tick: u64 = 0;
                    while Instant::now() < deadline {
                        match logger.write(
                            Level::Info,
                            "Worker {worker} tick {tick}",
                            &[json!(id), json!(tick)],
                        ) {
                            Ok(()) => {
                                emitted.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                warn!(worker = id, error = %e, "Worker stopped");
                                break;
                            }
                        }
                        tick += 1;
                        thread::sleep(interval);
                    }
                })
            })
            .collect();

        let freeze_after = freeze_after.map(|after| after.min(duration));
        let (frozen, reloads) = freeze_and_drain(&root, freeze_after, handles, watcher);
        let summary = frozen.and_then(|()| {
            Ok(RunSummary {
                records: emitted.load(Ordering::Relaxed),
                reloads,
                final_generation: root.generation()?.value(),
                frozen: root.is_frozen(),
            })
        });
        root.dispose();
        summary
    }
}

/// Optionally freeze `root` after `freeze_after`, then join every worker and
/// stop the watcher whether or not the freeze succeeded. Returns the freeze
/// outcome and the watcher's reload count.
fn freeze_and_drain(
    root: &RootFacade,
    freeze_after: Option<Duration>,
    handles: Vec<JoinHandle<()>>,
    watcher: Option<ConfigWatcher>,
) -> (Result<(), FacadeError>, u64) {
    let frozen = match freeze_after {
        Some(after) => {
            thread::sleep(after);
            root.freeze().map(|_| {
                info!(after_ms = after.as_millis() as u64, "Pipeline frozen");
            })
        }
        None => Ok(()),
    };

    for handle in handles {
        if handle.join().is_err() {
            warn!("Worker thread panicked");
        }
    }

    let reloads = match watcher {
        Some(watcher) => {
            let count = watcher.reload_count();
            watcher.stop();
            count
        }
        None => 0,
    };
    (frozen, reloads)
}
