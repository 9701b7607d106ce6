use std::collections::BTreeSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;
use crate::model::{ConfigDocument, GroupId, GroupRecord};
use crate::paths::AppPaths;
use crate::shortcut::{group_shortcut_args, ShortcutService};
use crate::store_lock::StoreLock;

/// Budget for a UI-side load; on timeout the caller keeps what it last showed.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-backed group configuration shared by every App Group process.
///
/// Every call re-reads the file; nothing is cached between calls. Writes are
/// atomic (temp file + rename) and read-modify-write cycles hold an advisory
/// lock, so concurrent writers serialize instead of silently dropping edits.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: AppPaths,
}

impl ConfigStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Reads the document. A missing file is a fresh install: empty document.
    pub async fn load(&self) -> Result<ConfigDocument, ConfigError> {
        let path = self.paths.config_file();
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ConfigDocument::new()),
            Err(e) => return Err(ConfigError::io(path, e)),
        };

        if text.trim().is_empty() {
            return Ok(ConfigDocument::new());
        }

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    /// [`load`](Self::load) bounded by `timeout`. `Ok(None)` means the read
    /// was abandoned.
    pub async fn load_within(&self, timeout: Duration) -> Result<Option<ConfigDocument>, ConfigError> {
        match tokio::time::timeout(timeout, self.load()).await {
            Ok(result) => result.map(Some),
            Err(_) => {
                tracing::warn!(?timeout, "config load timed out");
                Ok(None)
            }
        }
    }

    /// Names of every configured group, read fresh from disk.
    pub async fn group_names(&self) -> Result<BTreeSet<String>, ConfigError> {
        Ok(self.load().await?.names())
    }

    /// Overwrites the whole document.
    pub async fn save(&self, doc: &ConfigDocument) -> Result<(), ConfigError> {
        let path = self.paths.config_file();
        let _lock = StoreLock::acquire(&path).await?;
        self.write_document(doc).await
    }

    /// Loads, applies `edit`, and writes the result back while holding the
    /// store lock. Nothing is written when `edit` fails.
    pub async fn update<T, F>(&self, edit: F) -> Result<T, ConfigError>
    where
        F: FnOnce(&mut ConfigDocument) -> Result<T, ConfigError>,
    {
        let path = self.paths.config_file();
        let _lock = StoreLock::acquire(&path).await?;
        let mut doc = self.load().await?;
        let out = edit(&mut doc)?;
        self.write_document(&doc).await?;
        Ok(out)
    }

    /// Stores `record` under a freshly allocated id.
    pub async fn create(&self, record: GroupRecord) -> Result<GroupId, ConfigError> {
        self.update(|doc| {
            let id = doc.next_id();
            doc.insert(id, record);
            Ok(id)
        })
        .await
    }

    /// Saves `record` over `id`, creating the key if needed.
    pub async fn upsert(&self, id: GroupId, record: GroupRecord) -> Result<(), ConfigError> {
        self.update(|doc| {
            doc.insert(id, record);
            Ok(())
        })
        .await
    }

    /// Persists a user reorder of a group's items. Paths missing from
    /// `order` keep their relative order after the listed ones.
    pub async fn reorder_items(&self, id: GroupId, order: &[PathBuf]) -> Result<(), ConfigError> {
        self.update(|doc| {
            let group = doc.get_mut(id).ok_or(ConfigError::GroupNotFound(id))?;
            let mut remaining = std::mem::take(&mut group.items);
            let mut reordered = Vec::with_capacity(remaining.len());
            for path in order {
                if let Some(pos) = remaining.iter().position(|i| &i.file_path == path) {
                    reordered.push(remaining.remove(pos));
                }
            }
            reordered.append(&mut remaining);
            group.items = reordered;
            Ok(())
        })
        .await
    }

    /// Removes the record and its `Groups/<name>/` folder.
    pub async fn delete_record(&self, id: GroupId) -> Result<GroupRecord, ConfigError> {
        let removed = self.update(|doc| doc.remove(id)).await?;

        let dir = self.paths.group_dir(&removed.group_name);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ConfigError::io(dir, e)),
        }

        tracing::info!(id, group = %removed.group_name, "group deleted");
        Ok(removed)
    }

    /// Deep-copies group `id` under a new id and a unique copy name, copying
    /// its folder with the old name replaced by the new one in file names.
    /// The taskbar shortcut is recreated so it launches the copy.
    pub async fn duplicate_record(
        &self,
        id: GroupId,
        shortcuts: &dyn ShortcutService,
        launcher_exe: &Path,
    ) -> Result<GroupId, ConfigError> {
        let (new_id, original, copy) = self
            .update(|doc| {
                let original = doc.get(id).cloned().ok_or(ConfigError::GroupNotFound(id))?;
                let new_name = doc.unique_copy_name(&original.group_name);
                let mut copy = original.clone();
                copy.group_icon = self.rehome_icon(&original, &new_name);
                copy.group_name = new_name;
                let new_id = doc.next_id();
                doc.insert(new_id, copy.clone());
                Ok((new_id, original, copy))
            })
            .await?;

        self.copy_group_folder(&original.group_name, &copy.group_name, shortcuts, launcher_exe, &copy.group_icon)
            .await?;

        tracing::info!(from = id, to = new_id, group = %copy.group_name, "group duplicated");
        Ok(new_id)
    }

    fn rehome_icon(&self, original: &GroupRecord, new_name: &str) -> PathBuf {
        let old_dir = self.paths.group_dir(&original.group_name);
        match original.group_icon.strip_prefix(&old_dir) {
            Ok(relative) => self
                .paths
                .group_dir(new_name)
                .join(renamed(relative, &original.group_name, new_name)),
            Err(_) => original.group_icon.clone(),
        }
    }

    async fn copy_group_folder(
        &self,
        old_name: &str,
        new_name: &str,
        shortcuts: &dyn ShortcutService,
        launcher_exe: &Path,
        new_icon: &Path,
    ) -> Result<(), ConfigError> {
        let old_dir = self.paths.group_dir(old_name);
        let new_dir = self.paths.group_dir(new_name);

        let mut entries = match tokio::fs::read_dir(&old_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(ConfigError::io(old_dir, e)),
        };

        tokio::fs::create_dir_all(&new_dir)
            .await
            .map_err(|e| ConfigError::io(&new_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ConfigError::io(&old_dir, e))?
        {
            let source = entry.path();
            if !source.is_file() {
                continue;
            }
            let file_name = PathBuf::from(entry.file_name());
            let dest = new_dir.join(renamed(&file_name, old_name, new_name));

            let is_group_link = source.extension().is_some_and(|e| e.eq_ignore_ascii_case("lnk"))
                && source.file_stem().is_some_and(|s| s == old_name);

            if is_group_link {
                let icon = (!new_icon.as_os_str().is_empty()).then_some(new_icon);
                shortcuts.create(&dest, launcher_exe, &group_shortcut_args(new_name), icon)?;
            } else {
                tokio::fs::copy(&source, &dest)
                    .await
                    .map_err(|e| ConfigError::io(&dest, e))?;
            }
        }
        Ok(())
    }

    async fn write_document(&self, doc: &ConfigDocument) -> Result<(), ConfigError> {
        write_json_atomic(self.paths.config_file(), doc, "group configuration").await
    }
}

/// Replaces a file stem equal to `old_name` with `new_name`, keeping the extension.
fn renamed(relative: &Path, old_name: &str, new_name: &str) -> PathBuf {
    let stem = relative.file_stem().map(|s| s.to_string_lossy());
    match stem {
        Some(stem) if stem == old_name => {
            let mut file = new_name.to_string();
            if let Some(ext) = relative.extension() {
                file.push('.');
                file.push_str(&ext.to_string_lossy());
            }
            relative.with_file_name(file)
        }
        _ => relative.to_path_buf(),
    }
}

/// Pretty-prints `value` and replaces `path` atomically.
pub(crate) async fn write_json_atomic<T: Serialize + ?Sized>(
    path: PathBuf,
    value: &T,
    what: &'static str,
) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ConfigError::Serialize { what, source })?;
    write_atomic(path, json.into_bytes()).await
}

/// Writes `bytes` to a temp file next to `path`, then renames it over `path`.
pub(crate) async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> Result<(), ConfigError> {
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &bytes))
        .await
        .map_err(|e| ConfigError::io("<writer task>", std::io::Error::other(e)))?
}

/// Blocking form of [`write_atomic`] for callers outside the runtime.
pub(crate) fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> Result<(), ConfigError> {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::io(&dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| ConfigError::io(&dir, e))?;
    tmp.write_all(bytes).map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| ConfigError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemRecord;
    use crate::shortcut::fake::TextShortcuts;
    use crate::shortcut::write_group_shortcut;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(AppPaths::at(dir.path()));
        (dir, store)
    }

    fn group(name: &str, items: &[&str]) -> GroupRecord {
        let mut g = GroupRecord::new(name);
        for item in items {
            g.push_item(ItemRecord::new(*item));
        }
        g
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let (_dir, store) = store();
        let doc = store.load().await.unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.next_id(), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let (_dir, store) = store();
        std::fs::write(store.paths().config_file(), "{ not json").unwrap();
        assert!(matches!(store.load().await, Err(ConfigError::Parse { .. })));
    }

    #[tokio::test]
    async fn next_id_is_stable_until_saved() {
        let (_dir, store) = store();
        let first = store.load().await.unwrap().next_id();
        let again = store.load().await.unwrap().next_id();
        assert_eq!(first, again);

        let mut doc = store.load().await.unwrap();
        doc.insert(first, group("Dev", &[]));
        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap().next_id(), first + 1);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let mut doc = ConfigDocument::new();
        let mut dev = group("Dev", &[r"C:\b.exe", r"C:\a.exe"]);
        dev.show_labels = true;
        dev.group_header = true;
        doc.insert(1, dev);
        doc.insert(5, group("Games", &[r"D:\steam.exe"]));

        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), doc);
        assert!(!StoreLock::path_for(&store.paths().config_file()).exists());
    }

    #[tokio::test]
    async fn create_allocates_sequential_ids() {
        let (_dir, store) = store();
        assert_eq!(store.create(group("A", &[])).await.unwrap(), 1);
        assert_eq!(store.create(group("B", &[])).await.unwrap(), 2);
        let doc = store.load().await.unwrap();
        assert_eq!(doc.find_id_by_name("B").unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let (_dir, store) = store();
        let mut tasks = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.create(group(&format!("G{n}"), &[])).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let doc = store.load().await.unwrap();
        assert_eq!(doc.len(), 8);
        assert_eq!(doc.next_id(), 9);
    }

    #[tokio::test]
    async fn failed_edit_writes_nothing() {
        let (_dir, store) = store();
        store.create(group("A", &[])).await.unwrap();
        let err = store
            .update(|doc| {
                doc.insert(2, group("B", &[]));
                Err::<(), _>(ConfigError::GroupNotFound(9))
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reorder_persists_new_item_order() {
        let (_dir, store) = store();
        let id = store
            .create(group("Dev", &[r"C:\a.exe", r"C:\b.exe", r"C:\c.exe"]))
            .await
            .unwrap();

        store
            .reorder_items(id, &[PathBuf::from(r"C:\c.exe"), PathBuf::from(r"C:\a.exe")])
            .await
            .unwrap();

        let doc = store.load().await.unwrap();
        let order: Vec<_> = doc.get(id).unwrap().items.iter().map(|i| i.file_path.clone()).collect();
        assert_eq!(
            order,
            vec![PathBuf::from(r"C:\c.exe"), PathBuf::from(r"C:\a.exe"), PathBuf::from(r"C:\b.exe")]
        );
    }

    #[tokio::test]
    async fn delete_removes_record_and_folder() {
        let (_dir, store) = store();
        let id = store.create(group("Dev", &[])).await.unwrap();
        let folder = store.paths().group_dir("Dev");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("Dev.ico"), b"ico").unwrap();

        store.delete_record(id).await.unwrap();

        assert!(!folder.exists());
        assert!(store.load().await.unwrap().is_empty());
        assert!(store.delete_record(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn duplicate_copies_folder_under_new_name() {
        let (_dir, store) = store();
        let shortcuts = TextShortcuts::default();
        let exe = Path::new(r"C:\Apps\app-group.exe");

        let folder = store.paths().group_dir("Work");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("Work.ico"), b"ico").unwrap();
        std::fs::write(folder.join("source.png"), b"png").unwrap();
        let mut work = group("Work", &[r"C:\mail.exe"]);
        work.group_icon = folder.join("Work.ico");
        write_group_shortcut(store.paths(), &shortcuts, exe, "Work", Some(&work.group_icon)).unwrap();
        let id = store.create(work).await.unwrap();

        let copy_id = store.duplicate_record(id, &shortcuts, exe).await.unwrap();
        let doc = store.load().await.unwrap();
        let copy = doc.get(copy_id).unwrap();

        assert_eq!(copy_id, 2);
        assert_eq!(copy.group_name, "Work - Copy");
        assert_eq!(copy.items, doc.get(id).unwrap().items);

        let copy_dir = store.paths().group_dir("Work - Copy");
        assert_eq!(copy.group_icon, copy_dir.join("Work - Copy.ico"));
        assert!(copy_dir.join("Work - Copy.ico").exists());
        assert!(copy_dir.join("source.png").exists());

        let link = shortcuts.resolve(&store.paths().group_shortcut("Work - Copy")).unwrap();
        assert_eq!(link.args, "\"Work - Copy\"");
        assert_eq!(link.target, exe);

        let second = store.duplicate_record(copy_id, &shortcuts, exe).await.unwrap();
        let doc = store.load().await.unwrap();
        assert_eq!(doc.find_name_by_id(second), Some("Work - Copy(2)"));
    }

    #[tokio::test]
    async fn duplicate_without_folder_still_copies_record() {
        let (_dir, store) = store();
        let id = store.create(group("Solo", &[])).await.unwrap();
        let copy = store
            .duplicate_record(id, &TextShortcuts::default(), Path::new("app.exe"))
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap().find_name_by_id(copy), Some("Solo - Copy"));
    }

    #[test]
    fn renamed_only_touches_matching_stems() {
        assert_eq!(renamed(Path::new("Work.ico"), "Work", "W2"), PathBuf::from("W2.ico"));
        assert_eq!(renamed(Path::new("other.png"), "Work", "W2"), PathBuf::from("other.png"));
    }
}
