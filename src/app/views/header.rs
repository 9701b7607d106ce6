use eframe::egui::{self, Layout, RichText, TopBottomPanel};

use crate::app::controllers::MainView;
use crate::app::models::AppState;

pub fn draw_top_panel(app: &mut AppState, ctx: &egui::Context) {
    TopBottomPanel::top("top_panel").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui
                .selectable_label(app.current_view == MainView::Groups, RichText::new("App Groups").heading())
                .clicked()
            {
                app.set_current_view(MainView::Groups);
            }
            ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(format!("📄 Logs({})", app.log_manager.entries.len())).clicked() {
                    app.set_current_view(MainView::Logs);
                }
                if ui.button("⚙ Settings").clicked() {
                    app.set_current_view(MainView::Settings);
                }
                if ui.button("➕ New Group").clicked() {
                    app.new_group();
                }
            });
        });
        ui.separator();
        ui.label("💡 Tip: pin a group's shortcut from its folder to the taskbar to open it as a popup");
        ui.add_space(3.0);
    });
}
