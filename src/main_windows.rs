#![windows_subsystem = "windows"]

mod app;
mod logging;
mod platform;
mod tray;

use anyhow::Context;
use group_core::cli::Invocation;
use group_core::coordinator::{self, Action, LaunchPlan};
use group_core::icon_cache::IconCacheService;
use group_core::launcher::launch_group;
use group_core::mailbox::{Mailbox, Slot};
use group_core::registry::{self, Liveness};
use group_core::settings::Settings;
use group_core::{AppPaths, ConfigStore};

use crate::app::models::IconTextures;
use crate::platform::{OsIconExtractor, OsWindowRegistry, ShellLauncher};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{e:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> anyhow::Result<i32> {
    let paths = AppPaths::discover()?;
    logging::init(&paths, "app-group")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let _guard = runtime.enter();

    let invocation = Invocation::parse(std::env::args());
    tracing::debug!(?invocation, "invoked");

    let store = ConfigStore::new(paths.clone());
    let last_open = Mailbox::new(&paths, Slot::LastOpen);
    let (doc, last_open_name) = runtime.block_on(async {
        let doc = store.load().await;
        let name = last_open.take_latest().await;
        (doc, name)
    });
    let doc = doc.context("failed to load the group configuration")?;
    let last_open_name = last_open_name.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read lastOpen");
        None
    });

    let window_registry = OsWindowRegistry;
    let probe_title = coordinator::popup_probe_title(&invocation, last_open_name.as_deref());
    let liveness = Liveness::probe(&window_registry, probe_title);
    let plan = coordinator::decide(&invocation, liveness, &doc);
    tracing::info!(?liveness, action = ?plan.action, "launch decided");

    runtime.block_on(post_mailbox(&paths, &plan))?;

    match plan.action.clone() {
        Action::Exit(reason) => tracing::info!(?reason, "nothing to do"),
        Action::ActivateAndExit { role, reposition } => {
            if let Some(handle) = registry::activate(&window_registry, &role) {
                if reposition {
                    platform::reposition(&window_registry, handle);
                }
            }
        }
        Action::LaunchAll { group_id } => match doc.get(group_id) {
            Some(group) => {
                let launched = launch_group(&ShellLauncher, group);
                tracing::info!(group = %group.group_name, launched, "launched group");
            }
            None => tracing::warn!(group_id, "group to launch has gone away"),
        },
        Action::Bootstrap { show, popup_group } => {
            let (settings, icon_cache) = runtime.block_on(async {
                let settings = Settings::load(&paths).await;
                let cache = IconCacheService::load(&paths, Box::new(OsIconExtractor)).await;
                (settings, cache)
            });
            let settings = settings.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "using default settings");
                Settings::default()
            });

            app::run(app::HostInit {
                paths: paths.clone(),
                store,
                doc,
                settings,
                icons: IconTextures::new(icon_cache?, runtime.handle().clone()),
                show,
                popup_group,
                runtime: runtime.handle().clone(),
                launcher_exe: platform::launcher_exe()?,
            })?;
        }
    }

    Ok(plan.exit_code())
}

async fn post_mailbox(paths: &AppPaths, plan: &LaunchPlan) -> anyhow::Result<()> {
    for (slot, value) in &plan.mailbox {
        Mailbox::new(paths, *slot)
            .post(value)
            .await
            .with_context(|| format!("failed to post {value:?} to the {slot:?} mailbox"))?;
    }
    Ok(())
}
