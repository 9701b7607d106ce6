//! Windows implementations of the collaborator traits `group_core` is written against.

mod geometry;
mod registry;
mod shell;

pub use geometry::{off_screen_position, popup_position, reposition};
pub use registry::OsWindowRegistry;
pub use shell::{
    LAUNCHER_EXE, OsIconExtractor, OsShortcuts, ShellLauncher, is_shortcut, launcher_exe, shortcut_args,
};
