use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tokio::io::AsyncWriteExt;

use crate::error::ConfigError;

const LOCK_TIMEOUT: Duration = Duration::from_secs(3);
const STALE_AFTER: Duration = Duration::from_secs(10);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

/// Advisory cross-process lock held for a read-modify-write of the config
/// file. The lock is a sibling file created with `create_new`; dropping the
/// guard removes it. A lock file older than [`STALE_AFTER`] belongs to a
/// crashed writer and is broken.
#[derive(Debug)]
pub(crate) struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    pub(crate) fn path_for(target: &Path) -> PathBuf {
        let mut name = target.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        target.with_file_name(name)
    }

    pub(crate) async fn acquire(target: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_for(target);
        let deadline = Instant::now() + LOCK_TIMEOUT;
        let mut backoff = Duration::from_millis(10);

        loop {
            let attempt = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match attempt {
                Ok(mut file) => {
                    let _ = file
                        .write_all(std::process::id().to_string().as_bytes())
                        .await;
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path).await {
                        tracing::warn!(lock = %path.display(), "breaking stale config lock");
                        let _ = tokio::fs::remove_file(&path).await;
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(ConfigError::Lock(path));
                    }
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(e) => return Err(ConfigError::io(&path, e)),
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn is_stale(path: &Path) -> bool {
    let Ok(meta) = tokio::fs::metadata(path).await else {
        return false;
    };
    meta.modified()
        .ok()
        .and_then(|m| SystemTime::now().duration_since(m).ok())
        .is_some_and(|age| age > STALE_AFTER)
}
