#![windows_subsystem = "windows"]

//! Keeps a silent popup process alive for every configured group, and offers
//! a tray menu to open the main window or stop everything.

mod logging;
mod platform;
mod tray;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use group_core::registry::WindowRegistry;
use group_core::watchdog::{self, GroupProcessControl, Watchdog, WatchdogError};
use group_core::{AppPaths, ConfigStore};
use os_api::OS;
use tokio::sync::watch;

use crate::platform::{LAUNCHER_EXE, OsWindowRegistry};
use crate::tray::tray_windows::WatchdogTray;

/// Group popups are found by window title and owned by launcher processes.
struct LauncherProcesses {
    launcher_exe: PathBuf,
    windows: OsWindowRegistry,
}

impl LauncherProcesses {
    fn failed(action: &'static str, group: &str, message: impl ToString) -> WatchdogError {
        WatchdogError::Process {
            action,
            group: group.to_string(),
            message: message.to_string(),
        }
    }
}

impl GroupProcessControl for LauncherProcesses {
    fn is_alive(&self, group_name: &str) -> bool {
        self.windows.find_by_title(group_name).is_some()
    }

    fn launch(&self, group_name: &str) -> Result<(), WatchdogError> {
        let args = [group_name.to_string(), group_core::cli::SILENT_FLAG.to_string()];
        let pid = OS::spawn_detached(&self.launcher_exe, &args).map_err(|e| Self::failed("launch", group_name, e))?;
        tracing::info!(group = group_name, pid, "started group popup");
        Ok(())
    }

    fn kill(&self, group_name: &str) -> Result<(), WatchdogError> {
        let Some(handle) = self.windows.find_by_title(group_name) else {
            return Ok(());
        };
        let pid = OS::window_process_id(handle.0).ok_or_else(|| Self::failed("kill", group_name, "window has no owning process"))?;
        OS::terminate_process(pid).map_err(|e| Self::failed("kill", group_name, e))
    }

    fn kill_all(&self) -> usize {
        let mut killed = 0;
        for pid in OS::find_pids_by_image_name(LAUNCHER_EXE) {
            match OS::terminate_process(pid) {
                Ok(()) => killed += 1,
                Err(e) => tracing::warn!(pid, error = %e, "could not stop launcher process"),
            }
        }
        killed
    }
}

fn main() {
    if let Err(e) = run() {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let paths = AppPaths::discover()?;
    logging::init(&paths, "app-group-watchdog")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let launcher_exe = platform::launcher_exe()?;
    let control: Arc<dyn GroupProcessControl> = Arc::new(LauncherProcesses {
        launcher_exe: launcher_exe.clone(),
        windows: OsWindowRegistry,
    });
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let mut tray = WatchdogTray::new("App Group watchdog");
    tray.add_menu_item("Show App Group", move || {
        if let Err(e) = OS::spawn_detached(&launcher_exe, &[]) {
            tracing::warn!(error = %e, "could not open the main window");
        }
    });
    let tray_control = Arc::clone(&control);
    tray.add_menu_item("Exit", move || {
        let killed = tray_control.kill_all();
        tracing::info!(killed, "exit requested from tray");
        let _ = cancel_tx.send(true);
    });
    let tray = match tray.spawn() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "running without a tray icon");
            None
        }
    };

    let result = runtime.block_on(async {
        let (_watcher, changes) = watchdog::watch_config(&paths)?;
        Watchdog::new(ConfigStore::new(paths.clone()), control).run(changes, cancel_rx).await
    });

    if let Some(tray) = tray {
        tray.shutdown();
    }
    result.context("watchdog stopped")?;
    tracing::info!("watchdog exited");
    Ok(())
}
