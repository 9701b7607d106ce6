use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::ConfigError;

/// Overrides the per-user data directory (tests, portable installs).
pub const DATA_DIR_ENV: &str = "APPGROUP_DATA_DIR";

const CONFIG_FILE: &str = "appgroups.json";
const SETTINGS_FILE: &str = "settings.json";
const ICON_CACHE_FILE: &str = "icon_cache.json";
const LAST_OPEN_FILE: &str = "lastOpen";
const LAST_EDIT_FILE: &str = "lastEdit";
const GROUPS_DIR: &str = "Groups";
const ICONS_DIR: &str = "Icons";
const LOGS_DIR: &str = "logs";

/// Every path App Group reads or writes, rooted at one per-user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Resolves the data directory (`%APPDATA%\AppGroup\data` on Windows, or
    /// `APPGROUP_DATA_DIR` when set) and makes sure it exists.
    pub fn discover() -> Result<Self, ConfigError> {
        let root = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "AppGroup")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    ConfigError::io(
                        "<data dir>",
                        std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "failed to determine user data directory",
                        ),
                    )
                })?,
        };

        std::fs::create_dir_all(&root).map_err(|e| ConfigError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Uses `root` as-is, without creating it.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn config_file_name() -> &'static str {
        CONFIG_FILE
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn icon_cache_file(&self) -> PathBuf {
        self.root.join(ICON_CACHE_FILE)
    }

    pub fn last_open_file(&self) -> PathBuf {
        self.root.join(LAST_OPEN_FILE)
    }

    pub fn last_edit_file(&self) -> PathBuf {
        self.root.join(LAST_EDIT_FILE)
    }

    pub fn groups_dir(&self) -> PathBuf {
        self.root.join(GROUPS_DIR)
    }

    /// `Groups/<name>/`. The name is used verbatim.
    pub fn group_dir(&self, group_name: &str) -> PathBuf {
        self.groups_dir().join(group_name)
    }

    /// `Groups/<name>/<name>.lnk`, the shortcut pinned to the taskbar.
    pub fn group_shortcut(&self, group_name: &str) -> PathBuf {
        self.group_dir(group_name).join(format!("{group_name}.lnk"))
    }

    /// Extracted item icons referenced by `icon_cache.json`.
    pub fn icons_dir(&self) -> PathBuf {
        self.root.join(ICONS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_paths_nest_under_groups_dir() {
        let paths = AppPaths::at("/data");
        assert_eq!(paths.group_dir("Dev"), PathBuf::from("/data/Groups/Dev"));
        assert_eq!(
            paths.group_shortcut("Dev"),
            PathBuf::from("/data/Groups/Dev/Dev.lnk")
        );
        assert_eq!(paths.config_file(), PathBuf::from("/data/appgroups.json"));
    }
}
