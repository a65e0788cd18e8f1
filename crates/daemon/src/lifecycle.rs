// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: logging, the instance lock, polling cycles and the
//! restart loop around them.

use std::fs::File;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use prattle_adapters::{OctoPrintSource, TracedObservationSource};
use prattle_core::{
    Config, ConfigError, DeviceRegistry, InMemoryInterner, LogSettings, RegistryError, Scheduler,
    SystemClock,
};
use prattle_engine::octoprint::raw_data_unique_keys;
use prattle_engine::{
    Monitor, NotifyWorkers, ObservationCruncher, ObservationLogger, Poller, TargetNotifiers,
};
use prattle_storage::{StoreError, WalStore};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

type DaemonMonitor = Monitor<SystemClock, TracedObservationSource<OctoPrintSource>>;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("device registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to acquire lock {}: is prattled already running?", .0.display())]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("invalid log filter: {0}")]
    LogFilter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Output goes to stderr and,
/// when a log path is configured, to that file as well. The returned guard
/// flushes the file writer and must live as long as the process.
pub fn setup_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| LifecycleError::LogFilter(e.to_string()))?,
    };

    let (file_layer, guard) = match &settings.path {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LifecycleError> {
    let name = path.file_name().ok_or_else(|| {
        LifecycleError::LogFilter(format!("log path has no file name: {}", path.display()))
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}

/// Exclusive lock held for the life of the daemon; released on drop
pub struct InstanceLock {
    // NOTE(lifetime): the lock is tied to the open file
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Lock `<config>.lock` next to the configuration file and write our pid
    pub fn acquire(config_path: &Path) -> Result<Self, LifecycleError> {
        let path = config_path.with_extension("lock");
        let mut file = File::create(&path)?;
        file.try_lock_exclusive()
            .map_err(|e| LifecycleError::LockFailed(path.clone(), e))?;
        writeln!(file, "{}", std::process::id())?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove lock file");
        }
    }
}

/// One polling cycle: everything rebuilt from the configuration after a fault
pub struct Cycle {
    monitor: DaemonMonitor,
    workers: NotifyWorkers,
}

impl Cycle {
    pub fn build(config: &Config, runtime: Handle) -> Result<Self, LifecycleError> {
        let registry = DeviceRegistry::load(config.device_loader().as_ref())?;
        info!(
            devices = registry.len(),
            active = registry.active().count(),
            "device registry loaded"
        );

        let scheduler = Scheduler::new(SystemClock);
        let notifiers = TargetNotifiers::new(
            runtime,
            config.notify.clone(),
            config.request_timeout,
        );
        let workers = notifiers.workers();
        let source = TracedObservationSource::new(OctoPrintSource::new(config.request_timeout));

        let mut poller = Poller::new(registry, source);
        match &config.store {
            Some(store) => {
                let sink = WalStore::open(&store.path, raw_data_unique_keys())?;
                info!(path = %store.path.display(), "store opened");
                poller = poller.with_handler(ObservationLogger::octoprint(
                    sink,
                    Box::new(InMemoryInterner::new()),
                ));
            }
            None => info!("no store configured, observations are not persisted"),
        }
        let poller = poller.with_handler(ObservationCruncher::new(
            scheduler.clone(),
            notifiers,
            config.notify.greeting.clone(),
        ));

        Ok(Self {
            monitor: Monitor::new(scheduler, poller, config.poll_interval),
            workers,
        })
    }

    pub fn stopper(&self) -> Scheduler<SystemClock> {
        self.monitor.stopper()
    }

    pub fn workers(&self) -> NotifyWorkers {
        self.workers.clone()
    }

    /// Block until stopped, then shut every model and handler down
    pub fn run(mut self) {
        self.monitor.run();
        self.monitor.shutdown();
    }
}

/// SIGTERM and SIGINT
struct Signals {
    term: Signal,
    int: Signal,
}

impl Signals {
    fn install() -> Result<Self, LifecycleError> {
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
        }
    }
}

/// Run polling cycles until a signal arrives.
///
/// A cycle that fails to start, panics or returns on its own is logged and
/// replaced after `restart_delay`.
pub async fn run(config: &Config) -> Result<(), LifecycleError> {
    let mut signals = Signals::install()?;
    let mut cycles = 0u64;

    loop {
        cycles += 1;
        match Cycle::build(config, Handle::current()) {
            Ok(cycle) => {
                let stopper = cycle.stopper();
                let workers = cycle.workers();
                let mut task = tokio::task::spawn_blocking(move || cycle.run());
                info!(cycle = cycles, "polling started");

                tokio::select! {
                    result = &mut task => {
                        match result {
                            Ok(()) => error!(cycle = cycles, "polling loop exited unexpectedly"),
                            Err(e) => error!(cycle = cycles, error = %e, "polling loop panicked"),
                        }
                        if let Some(name) = drain_until(&workers, signals.recv()).await {
                            info!(signal = name, "shutting down");
                            return Ok(());
                        }
                    }
                    name = signals.recv() => {
                        info!(signal = name, "shutting down");
                        stopper.stop();
                        if let Err(e) = task.await {
                            error!(error = %e, "polling loop panicked during shutdown");
                        }
                        workers.drain().await;
                        return Ok(());
                    }
                }
            }
            Err(e) => error!(cycle = cycles, error = %e, "failed to start polling"),
        }

        info!(delay = ?config.restart_delay, "restarting");
        tokio::select! {
            _ = tokio::time::sleep(config.restart_delay) => {}
            name = signals.recv() => {
                info!(signal = name, "shutting down");
                return Ok(());
            }
        }
    }
}

/// Wait for the delivery tasks unless `signal` resolves first.
///
/// Notifiers stranded by a panicked cycle may never be terminated, so their
/// workers would never finish on their own.
async fn drain_until<F>(workers: &NotifyWorkers, signal: F) -> Option<&'static str>
where
    F: Future<Output = &'static str>,
{
    tokio::select! {
        _ = workers.drain() => None,
        name = signal => Some(name),
    }
}

/// One-line summary printed by `prattled check`
pub fn check(config: &Config) -> Result<String, LifecycleError> {
    let registry = DeviceRegistry::load(config.device_loader().as_ref())?;
    Ok(format!(
        "Config OK: {} devices ({} active), polling every {}",
        registry.len(),
        registry.active().count(),
        humanize(config.poll_interval)
    ))
}

fn humanize(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
