use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::paths::AppPaths;
use crate::store::write_atomic;

/// Which single-slot mailbox file to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Name of the group the popup should show.
    LastOpen,
    /// Id of the group the editor should load.
    LastEdit,
}

/// Last-value channel between a launching process and the long-lived UI
/// process. Writers overwrite; readers see whatever was written most recently
/// at the time they look. Nothing is ever consumed or acknowledged.
#[derive(Debug, Clone)]
pub struct Mailbox {
    path: PathBuf,
}

impl Mailbox {
    pub fn new(paths: &AppPaths, slot: Slot) -> Self {
        let path = match slot {
            Slot::LastOpen => paths.last_open_file(),
            Slot::LastEdit => paths.last_edit_file(),
        };
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Replaces the slot's content with `value` (first line only).
    pub async fn post(&self, value: &str) -> Result<(), ConfigError> {
        let line = value.lines().next().unwrap_or_default().trim();
        write_atomic(self.path.clone(), line.as_bytes().to_vec()).await?;
        tracing::debug!(mailbox = %self.path.display(), value = line, "mailbox posted");
        Ok(())
    }

    /// Most recent value, or `None` if nothing was ever posted or it is blank.
    pub async fn take_latest(&self) -> Result<Option<String>, ConfigError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                let value = text.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::io(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_write_wins_and_reads_do_not_consume() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());
        let open = Mailbox::new(&paths, Slot::LastOpen);

        assert_eq!(open.take_latest().await.unwrap(), None);

        open.post("Dev").await.unwrap();
        open.post("Games\nignored").await.unwrap();
        assert_eq!(open.take_latest().await.unwrap().as_deref(), Some("Games"));
        assert_eq!(open.take_latest().await.unwrap().as_deref(), Some("Games"));
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());
        Mailbox::new(&paths, Slot::LastEdit).post("7").await.unwrap();
        assert_eq!(Mailbox::new(&paths, Slot::LastOpen).take_latest().await.unwrap(), None);
        assert_eq!(std::fs::read_to_string(paths.last_edit_file()).unwrap(), "7");
    }
}
