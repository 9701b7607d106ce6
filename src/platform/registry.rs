use group_core::registry::{WindowError, WindowHandle, WindowRegistry};
use os_api::{OS, OsError};

/// Top-level window lookup by exact title through `FindWindowW`.
pub struct OsWindowRegistry;

fn failed(op: &'static str, handle: WindowHandle) -> impl FnOnce(OsError) -> WindowError {
    move |e| WindowError {
        op,
        handle,
        message: e.to_string(),
    }
}

impl WindowRegistry for OsWindowRegistry {
    fn find_by_title(&self, title: &str) -> Option<WindowHandle> {
        OS::find_window_by_title(title).map(WindowHandle)
    }

    fn force_foreground(&self, handle: WindowHandle) -> Result<(), WindowError> {
        OS::force_foreground(handle.0).map_err(failed("force_foreground", handle))
    }

    fn show(&self, handle: WindowHandle) -> Result<(), WindowError> {
        OS::show_window(handle.0).map_err(failed("show", handle))
    }

    fn hide(&self, handle: WindowHandle) -> Result<(), WindowError> {
        OS::hide_window(handle.0).map_err(failed("hide", handle))
    }

    fn move_to(&self, handle: WindowHandle, x: i32, y: i32) -> Result<(), WindowError> {
        OS::move_window(handle.0, x, y).map_err(failed("move", handle))
    }

    fn window_size(&self, handle: WindowHandle) -> Option<(i32, i32)> {
        OS::window_rect(handle.0).map(|r| (r.width(), r.height()))
    }
}
