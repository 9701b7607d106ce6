use std::path::PathBuf;

use thiserror::Error;

use crate::model::GroupId;

/// Failures surfaced by the configuration store and the files that live next
/// to it. A missing `appgroups.json` is never reported here: it loads as an
/// empty document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("no group named {0:?}")]
    NameNotFound(String),

    #[error("group name {name:?} {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("another group is already named {0:?}")]
    DuplicateName(String),

    #[error("timed out waiting for config lock {0}")]
    Lock(PathBuf),

    #[error(transparent)]
    Shortcut(#[from] ShortcutError),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error only says a group/name lookup missed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GroupNotFound(_) | Self::NameNotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum ShortcutError {
    #[error("shortcut operation failed for {path}: {message}")]
    Failed { path: PathBuf, message: String },

    #[error("shortcuts are not supported on this platform")]
    Unsupported,
}
