pub mod controllers;
pub mod models;
pub mod views;

use eframe::{NativeOptions, egui, run_native};
use group_core::coordinator::Show;
use group_core::registry::MAIN_WINDOW_TITLE;

pub use models::HostInit;

/// Runs the UI host until the main window closes for good.
pub fn run(init: HostInit) -> anyhow::Result<()> {
    let viewport = egui::ViewportBuilder::default()
        .with_title(MAIN_WINDOW_TITLE)
        .with_inner_size([480.0, 600.0])
        .with_min_inner_size([380.0, 320.0])
        .with_visible(matches!(init.show, Show::Main))
        .with_drag_and_drop(true);

    let options = NativeOptions {
        viewport,
        run_and_return: true,
        ..Default::default()
    };

    run_native(
        MAIN_WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(models::App::new(cc, init)))),
    )
    .map_err(|e| anyhow::anyhow!("UI host failed: {e}"))
}
