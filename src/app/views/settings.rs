use eframe::egui::{self, Align, CentralPanel, Layout, RichText};

use crate::app::controllers::MainView;
use crate::app::models::AppState;
use crate::app::views::shared_elements::card_frame;

pub fn draw_settings(app: &mut AppState, ctx: &egui::Context) {
    CentralPanel::default().show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Settings");
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("❌").on_hover_text("Close").clicked() {
                    app.set_current_view(MainView::Groups);
                }
            });
        });
        ui.separator();

        card_frame(ui).show(ui, |ui| {
            let mut run_at_startup = app.settings.run_at_startup;
            if ui
                .checkbox(&mut run_at_startup, "Run at startup")
                .on_hover_text("Start the popups of every group silently when you sign in")
                .changed()
            {
                app.set_run_at_startup(run_at_startup);
            }

            let mut show_tray = app.settings.show_system_tray_icon;
            if ui.checkbox(&mut show_tray, "Show system tray icon").changed() {
                app.set_tray_enabled(show_tray);
            }

            let mut grayscale = app.settings.use_grayscale_icon;
            if ui
                .add_enabled(show_tray, egui::Checkbox::new(&mut grayscale, "Use grayscale tray icon"))
                .changed()
            {
                app.set_grayscale_icon(grayscale);
            }
        });

        ui.add_space(8.0);
        ui.label(RichText::new(format!("Data folder: {}", app.paths.root().display())).weak());
        ui.label(RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION"))).weak());
    });
}
