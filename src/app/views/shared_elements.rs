use eframe::egui::{self, Color32, Frame, RichText, Shadow, Stroke};

/// Translucent card used for group rows and editor sections.
pub fn card_frame(ui: &egui::Ui) -> Frame {
    let dark_mode = ui.visuals().dark_mode;

    let fill = if dark_mode {
        Color32::from_rgba_unmultiplied(255, 255, 255, 10)
    } else {
        Color32::from_rgba_unmultiplied(0, 0, 0, 14)
    };
    let stroke_color = if dark_mode {
        Color32::from_rgba_unmultiplied(255, 255, 255, 45)
    } else {
        Color32::from_rgba_unmultiplied(0, 0, 0, 50)
    };

    Frame::NONE
        .fill(fill)
        .stroke(Stroke::new(1.0, stroke_color))
        .shadow(Shadow {
            offset: [0, 6],
            blur: 12,
            spread: 1,
            color: Color32::from_black_alpha(if dark_mode { 40 } else { 25 }),
        })
        .corner_radius(7.0)
        .inner_margin(egui::Margin::same(12))
        .outer_margin(egui::Margin::symmetric(4, 4))
}

pub fn section_label(ui: &mut egui::Ui, text: &str) {
    ui.add_space(6.0);
    ui.label(RichText::new(text).strong());
}

/// A fixed-width row label so text fields line up.
pub fn field_label(ui: &mut egui::Ui, text: &str) {
    ui.add_sized([110.0, 20.0], egui::Label::new(text));
}
