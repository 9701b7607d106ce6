use std::fs::OpenOptions;
use std::sync::Mutex;

use group_core::AppPaths;
use tracing_subscriber::EnvFilter;

/// Both binaries run without a console, so logs go to `<data>/logs/<binary>.log`.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(paths: &AppPaths, binary: &str) -> anyhow::Result<()> {
    let dir = paths.logs_dir();
    std::fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{binary}.log")))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), pid = std::process::id(), "{binary} starting");
    Ok(())
}
