use std::path::PathBuf;

/// Screen rectangle in physical pixels; `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorInfo {
    pub monitor: Rect,
    pub work: Rect,
    /// Effective DPI, 96 at 100% scaling.
    pub dpi: u32,
}

impl MonitorInfo {
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 96.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppBarEdge {
    Left,
    Top,
    Right,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskbarState {
    pub edge: Option<AppBarEdge>,
    pub auto_hide: bool,
}

/// What a `.lnk` file resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutTarget {
    pub target: PathBuf,
    pub args: String,
    pub icon_location: Option<PathBuf>,
}
