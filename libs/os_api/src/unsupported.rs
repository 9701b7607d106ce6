use std::path::{Path, PathBuf};

use crate::{MonitorInfo, OsError, Rect, ShortcutTarget, TaskbarState};

/// Stand-in for non-Windows builds: lookups find nothing and actions fail
/// with [`OsError::Unsupported`].
pub struct OS;

impl OS {
    pub fn find_window_by_title(_title: &str) -> Option<isize> {
        None
    }

    pub fn force_foreground(_hwnd: isize) -> Result<(), OsError> {
        Err(OsError::Unsupported)
    }

    pub fn show_window(_hwnd: isize) -> Result<(), OsError> {
        Err(OsError::Unsupported)
    }

    pub fn hide_window(_hwnd: isize) -> Result<(), OsError> {
        Err(OsError::Unsupported)
    }

    pub fn move_window(_hwnd: isize, _x: i32, _y: i32) -> Result<(), OsError> {
        Err(OsError::Unsupported)
    }

    pub fn window_rect(_hwnd: isize) -> Option<Rect> {
        None
    }

    pub fn window_process_id(_hwnd: isize) -> Option<u32> {
        None
    }

    pub fn cursor_position() -> Option<(i32, i32)> {
        None
    }

    pub fn monitor_at(_x: i32, _y: i32) -> Option<MonitorInfo> {
        None
    }

    pub fn virtual_screen() -> Rect {
        Rect::default()
    }

    pub fn taskbar_state() -> TaskbarState {
        TaskbarState::default()
    }

    pub fn terminate_process(_pid: u32) -> Result<(), OsError> {
        Err(OsError::Unsupported)
    }

    pub fn find_pids_by_image_name(_file_name: &str) -> Vec<u32> {
        Vec::new()
    }

    pub fn shell_execute(_target: &Path, _args: &[String]) -> Result<(), OsError> {
        Err(OsError::Unsupported)
    }

    pub fn spawn_detached(_exe: &Path, _args: &[String]) -> Result<u32, OsError> {
        Err(OsError::Unsupported)
    }

    pub fn create_shortcut(_link: &Path, _target: &Path, _args: &str, _icon: Option<&Path>) -> Result<PathBuf, OsError> {
        Err(OsError::Unsupported)
    }

    pub fn resolve_shortcut(_link: &Path) -> Result<ShortcutTarget, OsError> {
        Err(OsError::Unsupported)
    }

    pub fn extract_icon_rgba(_source: &Path) -> Result<(Vec<u8>, u32, u32), OsError> {
        Err(OsError::Unsupported)
    }

    pub fn set_run_at_startup(_enabled: bool, _exe: &Path) -> Result<(), OsError> {
        Err(OsError::Unsupported)
    }
}
