use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use group_core::ShortcutError;
use group_core::icon_cache::IconExtractor;
use group_core::launcher::{ItemLauncher, LaunchError};
use group_core::shortcut::{ShortcutInfo, ShortcutService};
use os_api::OS;
use parselnk::Lnk;

/// File name of the launcher binary; the watchdog starts it and kills it by name.
pub const LAUNCHER_EXE: &str = "app-group.exe";

/// Starts items through the shell so shortcuts and URL files behave as in Explorer.
pub struct ShellLauncher;

impl ItemLauncher for ShellLauncher {
    fn launch(&self, target: &Path, args: &[String]) -> Result<(), LaunchError> {
        OS::shell_execute(target, args).map_err(|e| LaunchError {
            target: target.display().to_string(),
            message: e.to_string(),
        })
    }
}

pub struct OsShortcuts;

impl ShortcutService for OsShortcuts {
    fn create(&self, link: &Path, target: &Path, args: &str, icon: Option<&Path>) -> Result<PathBuf, ShortcutError> {
        OS::create_shortcut(link, target, args, icon).map_err(|e| ShortcutError::Failed {
            path: link.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn resolve(&self, link: &Path) -> Result<ShortcutInfo, ShortcutError> {
        let resolved = OS::resolve_shortcut(link).map_err(|e| ShortcutError::Failed {
            path: link.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(ShortcutInfo {
            target: resolved.target,
            args: resolved.args,
            icon_location: resolved.icon_location,
        })
    }
}

/// Renders shell icons to PNG files.
pub struct OsIconExtractor;

impl IconExtractor for OsIconExtractor {
    fn extract(&self, source: &Path, dest_dir: &Path) -> Option<PathBuf> {
        let icon_source = icon_source(source);
        let (rgba, width, height) = match OS::extract_icon_rgba(&icon_source) {
            Ok(icon) => icon,
            Err(e) => {
                tracing::debug!(source = %icon_source.display(), error = %e, "no icon extracted");
                return None;
            }
        };

        let dest = dest_dir.join(icon_file_name(source));
        match image::save_buffer(&dest, &rgba, width, height, image::ExtendedColorType::Rgba8) {
            Ok(()) => Some(dest),
            Err(e) => {
                tracing::warn!(dest = %dest.display(), error = %e, "failed to write icon");
                None
            }
        }
    }
}

/// A shortcut's own icon carries the overlay arrow; prefer its icon location,
/// then its target.
fn icon_source(source: &Path) -> PathBuf {
    if !is_shortcut(source) {
        return source.to_path_buf();
    }
    let Ok(link) = Lnk::try_from(source) else {
        return source.to_path_buf();
    };
    link.string_data
        .icon_location
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .filter(|p| p.exists())
        .or_else(|| link.link_info.local_base_path.map(PathBuf::from))
        .unwrap_or_else(|| source.to_path_buf())
}

fn icon_file_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "icon".to_string());
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    format!("{stem}_{:016x}.png", hasher.finish())
}

pub fn is_shortcut(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lnk"))
}

/// Arguments stored in a dropped shortcut, used to prefill the item form.
pub fn shortcut_args(path: &Path) -> Option<String> {
    if !is_shortcut(path) {
        return None;
    }
    let link = Lnk::try_from(path).ok()?;
    link.string_data.command_line_arguments.filter(|a| !a.trim().is_empty())
}

/// The launcher binary next to the running executable.
pub fn launcher_exe() -> anyhow::Result<PathBuf> {
    let current = std::env::current_exe()?;
    let dir = current
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable {} has no parent directory", current.display()))?;
    Ok(dir.join(LAUNCHER_EXE))
}
