mod error;
mod types;

pub use error::OsError;
pub use types::{AppBarEdge, MonitorInfo, Rect, ShortcutTarget, TaskbarState};

#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(target_os = "windows"))]
mod unsupported;

// One `OS` facade; everything but Windows reports `OsError::Unsupported`.
#[cfg(target_os = "windows")]
pub use self::windows::OS;
#[cfg(not(target_os = "windows"))]
pub use unsupported::OS;
