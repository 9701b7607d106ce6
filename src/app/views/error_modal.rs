use eframe::egui::{self, Color32, RichText};

use crate::app::models::AppState;

/// Blocks the editor until the user acknowledges a failed save.
pub fn draw_error_modal(app: &mut AppState, ctx: &egui::Context) {
    let Some(message) = app.error_modal.clone() else {
        return;
    };

    let modal = egui::Modal::new(egui::Id::new("save_error_modal")).show(ctx, |ui| {
        ui.set_max_width(380.0);
        ui.label(RichText::new("⚠ Could not save the group").heading().color(Color32::from_rgb(230, 90, 70)));
        ui.add_space(6.0);
        ui.label(&message);
        ui.add_space(10.0);
        ui.button("OK").clicked()
    });

    if modal.inner || modal.should_close() {
        app.error_modal = None;
    }
}
