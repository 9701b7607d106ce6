//! Keeps one launcher window alive per configured group.
//!
//! The monitor is level-triggered: every poll re-checks every group and
//! relaunches whatever is missing, whatever the reason it went away. Config
//! changes are debounced and, when the set of group names differs, every old
//! group window is killed and the whole set is relaunched.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::error::ConfigError;
use crate::paths::AppPaths;
use crate::store::ConfigStore;

pub const SETTLE_DELAY: Duration = Duration::from_secs(5);
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("config watcher failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("{action} of group {group:?} failed: {message}")]
    Process {
        action: &'static str,
        group: String,
        message: String,
    },
}

/// The OS side of the watchdog: group window liveness and the processes
/// behind them.
pub trait GroupProcessControl: Send + Sync + 'static {
    /// True when a top-level window titled `group_name` exists.
    fn is_alive(&self, group_name: &str) -> bool;

    /// Starts the launcher in silent mode for `group_name`.
    fn launch(&self, group_name: &str) -> Result<(), WatchdogError>;

    /// Terminates the process owning the window titled `group_name`.
    fn kill(&self, group_name: &str) -> Result<(), WatchdogError>;

    /// Terminates every process running the launcher executable and returns
    /// how many were stopped.
    fn kill_all(&self) -> usize;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub launched: usize,
    pub failed: usize,
}

/// One reconciliation pass: launch every group in `names` without a live
/// window. Launches run concurrently and are awaited together.
pub async fn reconcile(control: &Arc<dyn GroupProcessControl>, names: &BTreeSet<String>) -> ReconcileReport {
    let mut launches = JoinSet::new();
    for name in names {
        if control.is_alive(name) {
            continue;
        }
        let control = Arc::clone(control);
        let name = name.clone();
        launches.spawn_blocking(move || {
            let result = control.launch(&name);
            (name, result)
        });
    }

    let mut report = ReconcileReport::default();
    while let Some(joined) = launches.join_next().await {
        match joined {
            Ok((name, Ok(()))) => {
                tracing::info!(group = %name, "relaunched group window");
                report.launched += 1;
            }
            Ok((name, Err(e))) => {
                tracing::warn!(group = %name, error = %e, "group launch failed");
                report.failed += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "group launch task panicked");
                report.failed += 1;
            }
        }
    }
    report
}

/// Remembers the set of group names the running windows were started for.
#[derive(Debug, Default, Clone)]
pub struct GroupSetTracker {
    names: BTreeSet<String>,
}

impl GroupSetTracker {
    pub fn new(names: BTreeSet<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Adopts `names`. Returns the previous set if membership changed.
    pub fn observe(&mut self, names: BTreeSet<String>) -> Option<BTreeSet<String>> {
        if names == self.names {
            return None;
        }
        Some(std::mem::replace(&mut self.names, names))
    }
}

/// Kills the windows of every group in `old`, logging failures. Returns the
/// number of successful kills.
pub fn kill_groups(control: &dyn GroupProcessControl, old: &BTreeSet<String>) -> usize {
    old.iter()
        .filter(|name| match control.kill(name) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(group = %name, error = %e, "group kill failed");
                false
            }
        })
        .count()
}

/// Forwards one signal per burst from `raw` to `out`. A burst ends once
/// `window` passes without a new event; every new event restarts the wait.
pub async fn debounce(mut raw: mpsc::Receiver<()>, out: mpsc::Sender<()>, window: Duration) {
    while raw.recv().await.is_some() {
        loop {
            match tokio::time::timeout(window, raw.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => {
                    let _ = out.send(()).await;
                    return;
                }
                Err(_) => break,
            }
        }
        if out.send(()).await.is_err() {
            return;
        }
    }
}

/// Watches the data directory and signals on any event touching the
/// config file. The returned watcher must be kept alive.
pub fn watch_config(paths: &AppPaths) -> Result<(RecommendedWatcher, mpsc::Receiver<()>), WatchdogError> {
    let (tx, rx) = mpsc::channel(16);
    let file_name = AppPaths::config_file_name();

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        let Ok(event) = result else {
            return;
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
            return;
        }
        let touches_config = event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|f| f == file_name));
        if touches_config {
            // A full channel already carries a pending change.
            let _ = tx.try_send(());
        }
    })?;

    watcher.watch(paths.root(), RecursiveMode::NonRecursive)?;
    tracing::info!(dir = %paths.root().display(), "watching group configuration");
    Ok((watcher, rx))
}

#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub settle: Duration,
    pub poll: Duration,
    pub debounce: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle: SETTLE_DELAY,
            poll: POLL_INTERVAL,
            debounce: DEBOUNCE_WINDOW,
        }
    }
}

/// The monitor loop and the state it carries between passes.
pub struct Watchdog {
    store: ConfigStore,
    control: Arc<dyn GroupProcessControl>,
    tracker: GroupSetTracker,
    timings: Timings,
    /// The last config read failed; every poll retries it.
    config_unreadable: bool,
}

impl Watchdog {
    pub fn new(store: ConfigStore, control: Arc<dyn GroupProcessControl>) -> Self {
        Self {
            store,
            control,
            tracker: GroupSetTracker::default(),
            timings: Timings::default(),
            config_unreadable: false,
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    async fn current_names(&mut self) -> Option<BTreeSet<String>> {
        match self.store.group_names().await {
            Ok(names) => {
                self.config_unreadable = false;
                Some(names)
            }
            Err(e) => {
                if !self.config_unreadable {
                    tracing::warn!(error = %e, "watchdog could not read group configuration");
                }
                self.config_unreadable = true;
                None
            }
        }
    }

    async fn handle_change(&mut self) {
        let Some(names) = self.current_names().await else {
            return;
        };
        if let Some(old) = self.tracker.observe(names) {
            tracing::info!(old = old.len(), new = self.tracker.names().len(), "group set changed; restarting all");
            kill_groups(self.control.as_ref(), &old);
            reconcile(&self.control, self.tracker.names()).await;
        }
    }

    /// Runs until `cancel` flips to `true` or its sender is dropped. The
    /// current pass always finishes first. An unreadable configuration is
    /// logged and retried on every poll; it never ends the loop.
    pub async fn run(mut self, changes: mpsc::Receiver<()>, mut cancel: watch::Receiver<bool>) -> Result<(), WatchdogError> {
        let names = self.current_names().await.unwrap_or_default();
        self.tracker = GroupSetTracker::new(names);
        tracing::info!(groups = self.tracker.names().len(), "watchdog started");
        reconcile(&self.control, self.tracker.names()).await;

        let (debounced_tx, mut debounced) = mpsc::channel(1);
        let debouncer = tokio::spawn(debounce(changes, debounced_tx, self.timings.debounce));

        tokio::select! {
            _ = tokio::time::sleep(self.timings.settle) => {}
            _ = wait_cancelled(&mut cancel) => {
                debouncer.abort();
                return Ok(());
            }
        }

        let mut interval = tokio::time::interval(self.timings.poll);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = wait_cancelled(&mut cancel) => break,
                Some(()) = debounced.recv() => self.handle_change().await,
                _ = interval.tick() => {
                    if self.config_unreadable {
                        self.handle_change().await;
                    }
                    reconcile(&self.control, self.tracker.names()).await;
                }
            }
        }

        debouncer.abort();
        tracing::info!("watchdog stopped");
        Ok(())
    }
}

async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stop| *stop).await;
}
