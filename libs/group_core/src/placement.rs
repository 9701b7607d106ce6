//! Popup positioning relative to the cursor and the taskbar.

/// Gap between the popup and the taskbar edge, in logical pixels.
pub const BASE_GAP: i32 = 8;
/// Logical thickness of an auto-hidden taskbar once it slides in.
pub const TASKBAR_THICKNESS: i32 = 48;
/// Distance beyond the virtual screen used to park a window out of view.
pub const OFF_SCREEN_MARGIN: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Screen rectangle with exclusive `right`/`bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left && other.right <= self.right && other.top >= self.top && other.bottom <= self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskbarEdge {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// Edge the taskbar reserves on `monitor`, judged by where the work area
/// falls short of it. When nothing is reserved (auto-hide) the answer comes
/// from `appbar_edge`, the OS's own record of where the bar is docked.
pub fn detect_edge(monitor: Rect, work: Rect, appbar_edge: impl FnOnce() -> Option<TaskbarEdge>) -> TaskbarEdge {
    if work.top > monitor.top {
        TaskbarEdge::Top
    } else if work.bottom < monitor.bottom {
        TaskbarEdge::Bottom
    } else if work.left > monitor.left {
        TaskbarEdge::Left
    } else if work.right < monitor.right {
        TaskbarEdge::Right
    } else {
        appbar_edge().unwrap_or_default()
    }
}

/// Everything the placement math needs, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementInput {
    pub width: i32,
    pub height: i32,
    pub cursor: Point,
    pub monitor: Rect,
    pub work: Rect,
    /// Monitor DPI divided by 96.
    pub scale: f32,
    pub edge: TaskbarEdge,
    pub auto_hide: bool,
}

impl PlacementInput {
    fn scaled(&self, logical: i32) -> i32 {
        (logical as f32 * self.scale).round() as i32
    }

    /// The strip the taskbar occupies or slides into.
    pub fn taskbar_band(&self) -> Rect {
        let m = self.monitor;
        if self.auto_hide {
            let t = self.scaled(TASKBAR_THICKNESS);
            return match self.edge {
                TaskbarEdge::Top => Rect::new(m.left, m.top, m.right, m.top + t),
                TaskbarEdge::Bottom => Rect::new(m.left, m.bottom - t, m.right, m.bottom),
                TaskbarEdge::Left => Rect::new(m.left, m.top, m.left + t, m.bottom),
                TaskbarEdge::Right => Rect::new(m.right - t, m.top, m.right, m.bottom),
            };
        }
        let w = self.work;
        match self.edge {
            TaskbarEdge::Top => Rect::new(m.left, m.top, m.right, w.top),
            TaskbarEdge::Bottom => Rect::new(m.left, w.bottom, m.right, m.bottom),
            TaskbarEdge::Left => Rect::new(m.left, m.top, w.left, m.bottom),
            TaskbarEdge::Right => Rect::new(w.right, m.top, m.right, m.bottom),
        }
    }

    pub fn cursor_in_band(&self) -> bool {
        self.taskbar_band().contains(self.cursor)
    }

    /// Base gap, plus the taskbar thickness while an auto-hidden bar is shown
    /// because the cursor is on it.
    pub fn spacing(&self) -> i32 {
        let mut spacing = self.scaled(BASE_GAP);
        if self.auto_hide && self.cursor_in_band() {
            spacing += self.scaled(TASKBAR_THICKNESS);
        }
        spacing
    }

    /// Work area minus the band an auto-hidden taskbar slides into.
    pub fn usable(&self) -> Rect {
        let mut area = self.work;
        if self.auto_hide {
            let t = self.scaled(TASKBAR_THICKNESS);
            match self.edge {
                TaskbarEdge::Top => area.top += t,
                TaskbarEdge::Bottom => area.bottom -= t,
                TaskbarEdge::Left => area.left += t,
                TaskbarEdge::Right => area.right -= t,
            }
        }
        area
    }
}

fn clamp_span(start: i32, len: i32, lo: i32, hi: i32) -> i32 {
    start.min(hi - len).max(lo)
}

/// Top-left corner for the popup: next to the taskbar on the cursor's side,
/// fully inside the usable work area.
pub fn place(input: &PlacementInput) -> Point {
    let area = input.usable();
    let work = input.work;
    let spacing = input.spacing();
    let (w, h) = (input.width, input.height);
    let centered_x = input.cursor.x - w / 2;
    let centered_y = input.cursor.y - h / 2;

    let (x, y) = match input.edge {
        TaskbarEdge::Top | TaskbarEdge::Bottom => {
            let y = if input.cursor_in_band() {
                match input.edge {
                    TaskbarEdge::Top => work.top + spacing,
                    _ => work.bottom - spacing - h,
                }
            } else {
                centered_y
            };
            (centered_x, y)
        }
        TaskbarEdge::Left => (work.left + spacing, centered_y),
        TaskbarEdge::Right => (work.right - spacing - w, centered_y),
    };

    Point {
        x: clamp_span(x, w, area.left, area.right),
        y: clamp_span(y, h, area.top, area.bottom),
    }
}

/// A position fully outside `virtual_screen` (the union of all monitors),
/// used to take a window out of view without hiding it.
pub fn off_screen(virtual_screen: Rect, width: i32, height: i32) -> Point {
    Point {
        x: virtual_screen.left - width - OFF_SCREEN_MARGIN,
        y: virtual_screen.top - height - OFF_SCREEN_MARGIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITOR: Rect = Rect {
        left: 0,
        top: 0,
        right: 1920,
        bottom: 1080,
    };

    fn work_for(edge: TaskbarEdge) -> Rect {
        match edge {
            TaskbarEdge::Top => Rect::new(0, 48, 1920, 1080),
            TaskbarEdge::Bottom => Rect::new(0, 0, 1920, 1032),
            TaskbarEdge::Left => Rect::new(60, 0, 1920, 1080),
            TaskbarEdge::Right => Rect::new(0, 0, 1860, 1080),
        }
    }

    fn input(edge: TaskbarEdge, auto_hide: bool, cursor: Point, size: (i32, i32), scale: f32) -> PlacementInput {
        PlacementInput {
            width: size.0,
            height: size.1,
            cursor,
            monitor: MONITOR,
            work: if auto_hide { MONITOR } else { work_for(edge) },
            scale,
            edge,
            auto_hide,
        }
    }

    #[test]
    fn edge_from_work_area() {
        for edge in [TaskbarEdge::Top, TaskbarEdge::Bottom, TaskbarEdge::Left, TaskbarEdge::Right] {
            assert_eq!(detect_edge(MONITOR, work_for(edge), || None), edge);
        }
    }

    #[test]
    fn auto_hide_asks_the_appbar() {
        assert_eq!(detect_edge(MONITOR, MONITOR, || Some(TaskbarEdge::Left)), TaskbarEdge::Left);
        assert_eq!(detect_edge(MONITOR, MONITOR, || None), TaskbarEdge::Bottom);
    }

    #[test]
    fn bottom_taskbar_click_sits_above_it() {
        let p = place(&input(TaskbarEdge::Bottom, false, Point { x: 900, y: 1050 }, (300, 200), 1.0));
        assert_eq!(p, Point { x: 750, y: 1032 - 8 - 200 });
    }

    #[test]
    fn auto_hidden_bar_adds_thickness_at_scale() {
        let i = input(TaskbarEdge::Bottom, true, Point { x: 900, y: 1075 }, (300, 200), 1.5);
        assert!(i.cursor_in_band());
        assert_eq!(i.spacing(), 12 + 72);
        assert_eq!(place(&i).y, 1080 - 84 - 200);
    }

    #[test]
    fn cursor_near_right_edge_is_clamped() {
        let p = place(&input(TaskbarEdge::Bottom, false, Point { x: 1910, y: 1050 }, (300, 200), 1.0));
        assert_eq!(p.x, 1920 - 300);
    }

    #[test]
    fn left_taskbar_places_flush_right_of_it() {
        let p = place(&input(TaskbarEdge::Left, false, Point { x: 20, y: 500 }, (300, 200), 1.0));
        assert_eq!(p, Point { x: 68, y: 400 });
    }

    #[test]
    fn away_from_band_centers_on_cursor() {
        let p = place(&input(TaskbarEdge::Top, false, Point { x: 600, y: 600 }, (300, 200), 1.0));
        assert_eq!(p, Point { x: 450, y: 500 });
    }

    #[test]
    fn placement_stays_inside_work_area_and_off_the_band() {
        let edges = [TaskbarEdge::Top, TaskbarEdge::Bottom, TaskbarEdge::Left, TaskbarEdge::Right];
        let sizes = [(120, 80), (300, 200), (800, 600), (1800, 1000)];
        for edge in edges {
            for auto_hide in [false, true] {
                for scale in [1.0, 1.25, 2.0] {
                    for size in sizes {
                        for cx in (0..1920).step_by(97) {
                            for cy in (0..1080).step_by(53) {
                                let i = input(edge, auto_hide, Point { x: cx, y: cy }, size, scale);
                                if size.0 > i.usable().width() || size.1 > i.usable().height() {
                                    continue;
                                }
                                let p = place(&i);
                                let r = Rect::new(p.x, p.y, p.x + size.0, p.y + size.1);
                                assert!(i.work.contains_rect(&r), "{edge:?} {auto_hide} {scale} {size:?} ({cx},{cy}) -> {r:?}");
                                let band = i.taskbar_band();
                                let overlaps = r.left < band.right
                                    && r.right > band.left
                                    && r.top < band.bottom
                                    && r.bottom > band.top;
                                assert!(!overlaps, "{edge:?} {auto_hide} {scale} {size:?} ({cx},{cy}) -> {r:?}");
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn off_screen_is_outside_every_monitor() {
        let virtual_screen = Rect::new(-1920, 0, 1920, 1080);
        let p = off_screen(virtual_screen, 300, 200);
        let r = Rect::new(p.x, p.y, p.x + 300, p.y + 200);
        assert!(r.right < virtual_screen.left && r.bottom < virtual_screen.top);
    }
}
