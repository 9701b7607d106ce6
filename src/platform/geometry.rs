use group_core::placement::{self, PlacementInput, Point, Rect, TaskbarEdge};
use group_core::registry::{WindowHandle, WindowRegistry};
use os_api::{AppBarEdge, OS};

fn rect(r: os_api::Rect) -> Rect {
    Rect::new(r.left, r.top, r.right, r.bottom)
}

fn taskbar_edge(edge: AppBarEdge) -> TaskbarEdge {
    match edge {
        AppBarEdge::Left => TaskbarEdge::Left,
        AppBarEdge::Top => TaskbarEdge::Top,
        AppBarEdge::Right => TaskbarEdge::Right,
        AppBarEdge::Bottom => TaskbarEdge::Bottom,
    }
}

/// Where a popup of the given outer size goes for the current cursor.
pub fn popup_position(width: i32, height: i32) -> Option<Point> {
    let (x, y) = OS::cursor_position()?;
    let info = OS::monitor_at(x, y)?;
    let taskbar = OS::taskbar_state();
    let (monitor, work) = (rect(info.monitor), rect(info.work));

    let input = PlacementInput {
        width,
        height,
        cursor: Point { x, y },
        monitor,
        work,
        scale: info.scale(),
        edge: placement::detect_edge(monitor, work, || taskbar.edge.map(taskbar_edge)),
        auto_hide: taskbar.auto_hide,
    };
    Some(placement::place(&input))
}

pub fn off_screen_position(width: i32, height: i32) -> Point {
    placement::off_screen(rect(OS::virtual_screen()), width, height)
}

/// Moves a live popup next to the cursor.
pub fn reposition(registry: &dyn WindowRegistry, handle: WindowHandle) {
    let Some((width, height)) = registry.window_size(handle) else {
        tracing::warn!(?handle, "popup size unavailable; leaving it in place");
        return;
    };
    let Some(p) = popup_position(width, height) else {
        return;
    };
    if let Err(e) = registry.move_to(handle, p.x, p.y) {
        tracing::warn!(error = %e, "failed to reposition popup");
    }
}
