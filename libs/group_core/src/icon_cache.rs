use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::error::ConfigError;
use crate::paths::AppPaths;
use crate::store::{write_atomic, write_atomic_blocking};

/// Pulls an icon out of an executable, shortcut or URL file and writes it
/// into `dest_dir`, returning the written file.
pub trait IconExtractor: Send + Sync {
    fn extract(&self, source: &Path, dest_dir: &Path) -> Option<PathBuf>;
}

/// Process-owned icon cache backed by `icon_cache.json`.
///
/// Entries are keyed by `"<path>_<mtime secs>_<length>"`, so a rebuilt
/// executable gets a fresh icon. Changes stay in memory until
/// [`flush`](Self::flush) or [`flush_in_background`](Self::flush_in_background);
/// a dirty cache is also written on drop.
///
/// Every write is atomic. Writes are numbered, and one that finishes after a
/// newer snapshot has landed is skipped.
pub struct IconCacheService {
    file: PathBuf,
    icons_dir: PathBuf,
    entries: HashMap<String, PathBuf>,
    extractor: Box<dyn IconExtractor>,
    dirty: bool,
    generation: u64,
    /// Generation of the snapshot last on disk.
    written: Arc<Mutex<u64>>,
}

impl IconCacheService {
    pub async fn load(paths: &AppPaths, extractor: Box<dyn IconExtractor>) -> Result<Self, ConfigError> {
        let file = paths.icon_cache_file();
        let entries = match tokio::fs::read_to_string(&file).await {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %file.display(), error = %e, "discarding malformed icon cache");
                HashMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(ConfigError::io(file, e)),
        };

        Ok(Self {
            file,
            icons_dir: paths.icons_dir(),
            entries,
            extractor,
            dirty: false,
            generation: 0,
            written: Arc::new(Mutex::new(0)),
        })
    }

    /// Cached icon for `source`, extracting it on a miss. `None` means the
    /// caller should draw a placeholder.
    pub fn icon_path(&mut self, source: &Path) -> Option<PathBuf> {
        let key = cache_key(source);
        if let Some(hit) = self.entries.get(&key).filter(|p| p.exists()) {
            return Some(hit.clone());
        }

        if let Err(e) = std::fs::create_dir_all(&self.icons_dir) {
            tracing::warn!(dir = %self.icons_dir.display(), error = %e, "cannot create icon directory");
            return None;
        }

        let Some(extracted) = self.extractor.extract(source, &self.icons_dir) else {
            tracing::debug!(source = %source.display(), "no icon extracted");
            return None;
        };
        self.entries.insert(key, extracted.clone());
        self.dirty = true;
        Some(extracted)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub async fn flush(&mut self) -> Result<(), ConfigError> {
        let Some((generation, bytes)) = self.snapshot()? else {
            return Ok(());
        };
        let mut written = self.written.lock().await;
        if *written < generation {
            write_atomic(self.file.clone(), bytes).await?;
            *written = generation;
        }
        self.dirty = false;
        Ok(())
    }

    /// Writes pending entries on `runtime` without blocking the caller.
    /// Failures are logged; the entries stay in memory either way.
    pub fn flush_in_background(&mut self, runtime: &Handle) {
        let (generation, bytes) = match self.snapshot() {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "icon cache not serialized");
                return;
            }
        };
        self.dirty = false;

        let file = self.file.clone();
        let written = self.written.clone();
        runtime.spawn(async move {
            let mut written = written.lock().await;
            if *written >= generation {
                return;
            }
            match write_atomic(file.clone(), bytes).await {
                Ok(()) => *written = generation,
                Err(e) => tracing::warn!(path = %file.display(), error = %e, "icon cache not saved"),
            }
        });
    }

    fn snapshot(&mut self) -> Result<Option<(u64, Vec<u8>)>, ConfigError> {
        if !self.dirty {
            return Ok(None);
        }
        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(|source| ConfigError::Serialize {
            what: "icon cache",
            source,
        })?;
        self.generation += 1;
        Ok(Some((self.generation, bytes)))
    }
}

impl Drop for IconCacheService {
    fn drop(&mut self) {
        let (generation, bytes) = match self.snapshot() {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "icon cache not serialized");
                return;
            }
        };
        if let Err(e) = write_atomic_blocking(&self.file, &bytes) {
            tracing::warn!(path = %self.file.display(), error = %e, "icon cache not saved");
            return;
        }
        // Background writes still queued hold older snapshots.
        if let Ok(mut written) = self.written.try_lock() {
            *written = generation;
        }
    }
}

/// `"<path>_<mtime secs>_<length>"`; files that cannot be stat'ed (URLs,
/// missing targets) use zeros.
pub fn cache_key(source: &Path) -> String {
    let (mtime, len) = std::fs::metadata(source)
        .map(|m| {
            let mtime = m
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_secs());
            (mtime, m.len())
        })
        .unwrap_or((0, 0));
    format!("{}_{}_{}", source.display(), mtime, len)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct CountingExtractor {
        calls: Arc<AtomicUsize>,
    }

    impl IconExtractor for CountingExtractor {
        fn extract(&self, source: &Path, dest_dir: &Path) -> Option<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if source.extension().is_some_and(|e| e == "bad") {
                return None;
            }
            let out = dest_dir.join(format!("{}.png", source.file_stem()?.to_string_lossy()));
            std::fs::write(&out, b"png").ok()?;
            Some(out)
        }
    }

    fn service(paths: &AppPaths, calls: &Arc<AtomicUsize>) -> IconCacheService {
        let extractor = Box::new(CountingExtractor { calls: calls.clone() });
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(IconCacheService::load(paths, extractor))
            .unwrap()
    }

    #[test]
    fn key_includes_size_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("tool.exe");
        std::fs::write(&exe, b"12345").unwrap();
        let key = cache_key(&exe);
        assert!(key.starts_with(&exe.display().to_string()));
        assert!(key.ends_with("_5"));
        assert!(cache_key(Path::new("https://example.com")).ends_with("_0_0"));
    }

    #[test]
    fn hits_skip_extraction_and_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());
        let exe = dir.path().join("tool.exe");
        std::fs::write(&exe, b"bin").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let mut cache = service(&paths, &calls);
            let first = cache.icon_path(&exe).unwrap();
            assert_eq!(cache.icon_path(&exe).unwrap(), first);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
        assert!(paths.icon_cache_file().exists());

        let mut cache = service(&paths, &calls);
        assert_eq!(cache.len(), 1);
        cache.icon_path(&exe).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_extraction_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut cache = IconCacheService::load(&paths, Box::new(CountingExtractor { calls: calls.clone() }))
            .await
            .unwrap();

        assert_eq!(cache.icon_path(Path::new("broken.bad")), None);
        assert!(cache.is_empty());
        cache.flush().await.unwrap();
        assert!(!paths.icon_cache_file().exists());
    }

    #[tokio::test]
    async fn background_flush_saves_new_entries_without_drop() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());
        let calls = Arc::new(AtomicUsize::new(0));
        let extractor = || Box::new(CountingExtractor { calls: calls.clone() });
        let (a, b) = (dir.path().join("a.exe"), dir.path().join("b.exe"));
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        let mut cache = IconCacheService::load(&paths, extractor()).await.unwrap();
        cache.icon_path(&a).unwrap();
        cache.flush_in_background(&Handle::current());
        cache.icon_path(&b).unwrap();
        cache.flush_in_background(&Handle::current());
        assert!(!cache.is_dirty());
        // A killed process never runs drop.
        std::mem::forget(cache);

        let file = paths.icon_cache_file();
        let mut saved = 0;
        for _ in 0..200 {
            if let Ok(text) = tokio::fs::read_to_string(&file).await {
                saved = serde_json::from_str::<HashMap<String, PathBuf>>(&text).map_or(0, |m| m.len());
                if saved == 2 {
                    break;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(saved, 2);

        let mut reloaded = IconCacheService::load(&paths, extractor()).await.unwrap();
        reloaded.icon_path(&a).unwrap();
        reloaded.icon_path(&b).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
