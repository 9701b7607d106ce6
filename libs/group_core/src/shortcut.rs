use std::path::{Path, PathBuf};

use crate::error::ShortcutError;
use crate::paths::AppPaths;

/// What a shortcut file points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
    pub target: PathBuf,
    pub args: String,
    pub icon_location: Option<PathBuf>,
}

/// Platform shortcut files (`.lnk` on Windows).
pub trait ShortcutService: Send + Sync {
    /// Writes a shortcut at `link` and returns its path.
    fn create(
        &self,
        link: &Path,
        target: &Path,
        args: &str,
        icon: Option<&Path>,
    ) -> Result<PathBuf, ShortcutError>;

    fn resolve(&self, link: &Path) -> Result<ShortcutInfo, ShortcutError>;
}

/// Argument string carried by a group's taskbar shortcut.
pub fn group_shortcut_args(group_name: &str) -> String {
    format!("\"{group_name}\"")
}

/// Creates `Groups/<name>/` and the `<name>.lnk` pointing back at the
/// launcher with the group name as its single argument.
pub fn write_group_shortcut(
    paths: &AppPaths,
    shortcuts: &dyn ShortcutService,
    launcher_exe: &Path,
    group_name: &str,
    icon: Option<&Path>,
) -> Result<PathBuf, ShortcutError> {
    let dir = paths.group_dir(group_name);
    std::fs::create_dir_all(&dir).map_err(|e| ShortcutError::Failed {
        path: dir.clone(),
        message: e.to_string(),
    })?;

    let icon = icon.filter(|p| !p.as_os_str().is_empty());
    shortcuts.create(
        &paths.group_shortcut(group_name),
        launcher_exe,
        &group_shortcut_args(group_name),
        icon,
    )
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use super::*;

    /// Writes shortcuts as plain text `target|args|icon` so tests can read them back.
    #[derive(Default)]
    pub struct TextShortcuts {
        pub created: Mutex<Vec<PathBuf>>,
    }

    impl ShortcutService for TextShortcuts {
        fn create(
            &self,
            link: &Path,
            target: &Path,
            args: &str,
            icon: Option<&Path>,
        ) -> Result<PathBuf, ShortcutError> {
            let icon = icon.map(|p| p.display().to_string()).unwrap_or_default();
            std::fs::write(link, format!("{}|{}|{}", target.display(), args, icon)).map_err(|e| {
                ShortcutError::Failed {
                    path: link.to_path_buf(),
                    message: e.to_string(),
                }
            })?;
            self.created.lock().unwrap().push(link.to_path_buf());
            Ok(link.to_path_buf())
        }

        fn resolve(&self, link: &Path) -> Result<ShortcutInfo, ShortcutError> {
            let text = std::fs::read_to_string(link).map_err(|e| ShortcutError::Failed {
                path: link.to_path_buf(),
                message: e.to_string(),
            })?;
            let mut parts = text.splitn(3, '|');
            let target = parts.next().unwrap_or_default();
            let args = parts.next().unwrap_or_default();
            let icon = parts.next().unwrap_or_default();
            Ok(ShortcutInfo {
                target: PathBuf::from(target),
                args: args.to_string(),
                icon_location: (!icon.is_empty()).then(|| PathBuf::from(icon)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::TextShortcuts;
    use super::*;

    #[test]
    fn group_shortcut_lands_in_group_folder() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());
        let shortcuts = TextShortcuts::default();

        let link = write_group_shortcut(
            &paths,
            &shortcuts,
            Path::new(r"C:\Apps\app-group.exe"),
            "Dev",
            Some(Path::new("")),
        )
        .unwrap();

        assert_eq!(link, paths.group_shortcut("Dev"));
        let info = shortcuts.resolve(&link).unwrap();
        assert_eq!(info.args, "\"Dev\"");
        assert_eq!(info.icon_location, None);
    }
}
