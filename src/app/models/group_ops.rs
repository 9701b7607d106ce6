//! Group mutations the UI starts on the runtime. Each returns a plain
//! `anyhow` error the caller turns into a log entry or a modal.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use group_core::shortcut::write_group_shortcut;
use group_core::{AppPaths, ConfigStore, GroupId, GroupRecord};
use image::ImageFormat;
use image::imageops::FilterType;

use crate::platform::OsShortcuts;

const ICON_SIZE: u32 = 256;

/// Everything needed to commit one editor save.
pub struct SaveJob {
    pub store: ConfigStore,
    pub launcher_exe: PathBuf,
    pub id: GroupId,
    /// A new group keeps `id` only if nobody took it since the editor opened.
    pub is_new: bool,
    pub record: GroupRecord,
    pub renamed_from: Option<String>,
    pub icon_source: Option<PathBuf>,
}

/// Writes the group folder (icon, source image, shortcut) and then the
/// record. The record is only stored once the folder side effects succeeded.
pub async fn save_group(job: SaveJob) -> anyhow::Result<GroupId> {
    let SaveJob {
        store,
        launcher_exe,
        id,
        is_new,
        mut record,
        renamed_from,
        icon_source,
    } = job;
    let paths = store.paths().clone();
    let name = record.group_name.clone();
    let dir = paths.group_dir(&name);

    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    if let Some(source) = icon_source {
        record.group_icon = install_icon(&source, &dir, &name).await?;
    } else if !record.group_icon.as_os_str().is_empty() && !record.group_icon.starts_with(&dir) {
        record.group_icon = carry_icon(&record.group_icon, &dir, &name).await?;
    }

    let shortcut_paths = paths.clone();
    let shortcut_name = name.clone();
    let icon = record.group_icon.clone();
    tokio::task::spawn_blocking(move || {
        let icon = (!icon.as_os_str().is_empty()).then_some(icon.as_path());
        write_group_shortcut(&shortcut_paths, &OsShortcuts, &launcher_exe, &shortcut_name, icon)
    })
    .await
    .context("shortcut task failed")?
    .context("creating the group shortcut")?;

    let id = if is_new {
        store
            .update(move |doc| {
                let id = if doc.contains(id) { doc.next_id() } else { id };
                doc.insert(id, record);
                Ok(id)
            })
            .await?
    } else {
        store.upsert(id, record).await?;
        id
    };

    if let Some(old) = renamed_from {
        remove_group_dir(&paths, &old).await;
    }
    tracing::info!(id, group = %name, "group saved");
    Ok(id)
}

/// Copies `source` next to the group as `<name>.<ext>` and renders `<name>.ico`.
async fn install_icon(source: &Path, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let source = source.to_path_buf();
    let dir = dir.to_path_buf();
    let name = name.to_string();
    tokio::task::spawn_blocking(move || -> anyhow::Result<PathBuf> {
        if let Some(ext) = source.extension() {
            let copy = dir.join(format!("{name}.{}", ext.to_string_lossy()));
            if copy != source {
                std::fs::copy(&source, &copy).with_context(|| format!("copying {}", source.display()))?;
            }
        }

        let ico = dir.join(format!("{name}.ico"));
        if source.extension().is_some_and(|e| e.eq_ignore_ascii_case("ico")) {
            if ico != source {
                std::fs::copy(&source, &ico).with_context(|| format!("copying {}", source.display()))?;
            }
            return Ok(ico);
        }

        let img = image::open(&source).with_context(|| format!("reading image {}", source.display()))?;
        img.resize(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3)
            .save_with_format(&ico, ImageFormat::Ico)
            .with_context(|| format!("writing {}", ico.display()))?;
        Ok(ico)
    })
    .await
    .context("icon task failed")?
}

/// An icon living outside the group folder (a renamed group's old folder)
/// is copied in under the group's name.
async fn carry_icon(icon: &Path, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let ext = icon.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_else(|| "ico".into());
    let dest = dir.join(format!("{name}.{ext}"));
    match tokio::fs::copy(icon, &dest).await {
        Ok(_) => Ok(dest),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(icon = %icon.display(), "group icon is missing; saving without one");
            Ok(PathBuf::new())
        }
        Err(e) => Err(e).with_context(|| format!("copying {}", icon.display())),
    }
}

async fn remove_group_dir(paths: &AppPaths, name: &str) {
    let dir = paths.group_dir(name);
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => tracing::debug!(dir = %dir.display(), "removed folder of renamed group"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "could not remove old group folder"),
    }
}

pub async fn delete_group(store: ConfigStore, id: GroupId) -> anyhow::Result<String> {
    let removed = store.delete_record(id).await?;
    Ok(removed.group_name)
}

pub async fn duplicate_group(store: ConfigStore, id: GroupId, launcher_exe: PathBuf) -> anyhow::Result<GroupId> {
    Ok(store.duplicate_record(id, &OsShortcuts, &launcher_exe).await?)
}

pub async fn reorder_items(store: ConfigStore, id: GroupId, order: Vec<PathBuf>) -> anyhow::Result<()> {
    Ok(store.reorder_items(id, &order).await?)
}
