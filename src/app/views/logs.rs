use eframe::egui::{self, CentralPanel, Color32, RichText, ScrollArea};

use crate::app::controllers::MainView;
use crate::app::models::{AppState, LogLevel};

pub fn draw_logs(app: &mut AppState, ctx: &egui::Context) {
    CentralPanel::default().show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Logs");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("❌").on_hover_text("Close").clicked() {
                    app.set_current_view(MainView::Groups);
                }
                if ui.button("Clear Logs").clicked() {
                    app.log_manager.entries.clear();
                }
                if ui.button("📁").on_hover_text("Open log folder").clicked() {
                    let dir = app.paths.logs_dir();
                    if let Err(e) = os_api::OS::shell_execute(&dir, &[]) {
                        app.log_manager.error(format!("Cannot open {}: {e}", dir.display()));
                    }
                }
            });
        });
        ui.separator();
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for (level, line) in app.log_manager.entries.iter().rev() {
                let color = match level {
                    LogLevel::Error => Color32::RED,
                    LogLevel::Info => Color32::LIGHT_GRAY,
                };
                ui.label(RichText::new(line).color(color));
            }
        });
    });
}
