use std::io::ErrorKind;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::AppPaths;
use crate::store::write_json_atomic;

/// User toggles persisted in `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Settings {
    pub show_system_tray_icon: bool,
    pub run_at_startup: bool,
    pub use_grayscale_icon: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_system_tray_icon: true,
            run_at_startup: false,
            use_grayscale_icon: false,
        }
    }
}

impl Settings {
    /// Missing or unreadable settings fall back to defaults; only I/O
    /// failures other than "not found" are reported.
    pub async fn load(paths: &AppPaths) -> Result<Self, ConfigError> {
        let path = paths.settings_file();
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::io(path, e)),
        };

        match serde_json::from_str(&text) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Ok(Self::default())
            }
        }
    }

    pub async fn save(&self, paths: &AppPaths) -> Result<(), ConfigError> {
        write_json_atomic(paths.settings_file(), self, "settings").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_when_missing_then_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());

        let mut settings = Settings::load(&paths).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.show_system_tray_icon);

        settings.run_at_startup = true;
        settings.save(&paths).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(paths.settings_file()).unwrap()).unwrap();
        assert_eq!(raw["RunAtStartup"], true);
        assert_eq!(raw["ShowSystemTrayIcon"], true);
        assert_eq!(Settings::load(&paths).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::at(dir.path());
        std::fs::write(paths.settings_file(), r#"{"UseGrayscaleIcon": true}"#).unwrap();

        let settings = Settings::load(&paths).await.unwrap();
        assert!(settings.use_grayscale_icon);
        assert!(settings.show_system_tray_icon);
        assert!(!settings.run_at_startup);
    }
}
