use eframe::egui::{self, Button, CentralPanel, Image, Key, RichText, Vec2, ViewportBuilder, ViewportId};
use eframe::egui::load::SizedTexture;
use group_core::{GroupRecord, ItemRecord, LabelPosition};

use crate::app::models::AppState;

const ICON_PX: f32 = 32.0;
const CELL_PX: f32 = 48.0;
const SPACING: f32 = 6.0;
const MARGIN: f32 = 12.0;
const HEADER_PX: f32 = 34.0;
const RIGHT_LABEL_PX: f32 = 110.0;

enum PopupAction {
    Launch(usize),
    Move(usize, usize),
    Edit,
}

/// Logical inner size for `group`'s grid.
pub fn popup_size(group: Option<&GroupRecord>) -> Vec2 {
    let Some(group) = group else {
        return Vec2::new(220.0, 80.0);
    };
    let cols = group.columns().min(group.items.len()).max(1);
    let rows = group.items.len().div_ceil(cols).max(1);

    let (mut cell_w, mut cell_h) = (CELL_PX, CELL_PX);
    if group.show_labels {
        match group.label_position {
            LabelPosition::Right => cell_w += RIGHT_LABEL_PX,
            LabelPosition::Bottom => cell_h += group.label_size as f32 + 8.0,
        }
    }

    let header = if group.group_header { HEADER_PX } else { 0.0 };
    Vec2::new(
        cols as f32 * (cell_w + SPACING) + 2.0 * MARGIN,
        rows as f32 * (cell_h + SPACING) + 2.0 * MARGIN + header,
    )
}

/// The popup viewport. Once shown it is never hidden again; dismissing it
/// moves it off-screen so the taskbar pin keeps a live window to activate.
pub fn show_popup_viewport(app: &mut AppState, ctx: &egui::Context) {
    let Some(group_id) = app.popup.group_id else {
        return;
    };
    let group = app.doc.get(group_id).cloned();
    if let Some(group) = &group {
        app.popup.title = group.group_name.clone();
    }

    let builder = ViewportBuilder::default()
        .with_title(app.popup.title.clone())
        .with_inner_size(popup_size(group.as_ref()))
        .with_resizable(false)
        .with_decorations(false)
        .with_taskbar(false)
        .with_always_on_top()
        .with_visible(app.popup.shown);

    ctx.show_viewport_immediate(ViewportId::from_hash_of("group_popup"), builder, |ctx, _class| {
        if ctx.input(|i| i.viewport().close_requested()) {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            app.hide_popup();
        }

        let focused = ctx.input(|i| i.viewport().focused).unwrap_or(false);
        if focused && !app.popup.focused {
            app.on_popup_activated();
        } else if !focused && app.popup.focused {
            app.hide_popup();
        }
        app.popup.focused = focused;

        if app.popup.shown && app.popup.place_pending {
            app.place_popup();
        }

        CentralPanel::default().show(ctx, |ui| {
            let action = match &group {
                Some(group) => draw_grid(app, ui, group),
                None => {
                    ui.label("This group no longer exists.");
                    None
                }
            };

            match action {
                Some(PopupAction::Launch(index)) => {
                    if let Some(item) = group.as_ref().and_then(|g| g.items.get(index)) {
                        app.launch_item(item);
                    }
                    app.hide_popup();
                }
                Some(PopupAction::Move(from, to)) => app.move_popup_item(group_id, from, to),
                Some(PopupAction::Edit) => {
                    app.hide_popup();
                    app.open_editor(group_id);
                }
                None => {}
            }
        });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            app.hide_popup();
        }
    });
}

fn draw_grid(app: &mut AppState, ui: &mut egui::Ui, group: &GroupRecord) -> Option<PopupAction> {
    if group.group_header {
        ui.label(RichText::new(&group.group_name).heading());
        ui.separator();
    }
    if group.items.is_empty() {
        ui.label(RichText::new("No items yet").weak());
        return ui
            .button("⚙ Edit group")
            .clicked()
            .then_some(PopupAction::Edit);
    }

    let cols = group.columns();
    let last = group.items.len() - 1;
    let mut action = None;

    egui::Grid::new("popup_grid")
        .spacing([SPACING, SPACING])
        .show(ui, |ui| {
            for (index, item) in group.items.iter().enumerate() {
                let response = item_cell(app, ui, group, item);
                if response.clicked() {
                    action = Some(PopupAction::Launch(index));
                }
                response.context_menu(|ui| {
                    if ui.add_enabled(index > 0, Button::new("⬅ Move back")).clicked() {
                        action = Some(PopupAction::Move(index, index - 1));
                    }
                    if ui.add_enabled(index < last, Button::new("➡ Move forward")).clicked() {
                        action = Some(PopupAction::Move(index, index + 1));
                    }
                    ui.separator();
                    if ui.button("⚙ Edit group").clicked() {
                        action = Some(PopupAction::Edit);
                    }
                });
                if (index + 1) % cols == 0 {
                    ui.end_row();
                }
            }
        });

    action
}

fn item_cell(app: &mut AppState, ui: &mut egui::Ui, group: &GroupRecord, item: &ItemRecord) -> egui::Response {
    let texture = app.icons.get(ui.ctx(), item);
    let icon = texture.map(|t| Image::new(SizedTexture::from_handle(&t)).fit_to_exact_size(Vec2::splat(ICON_PX)));
    let text = group
        .show_labels
        .then(|| RichText::new(item.label()).size(group.label_size as f32));

    let hover = match &item.tooltip {
        Some(tooltip) => format!("{tooltip}\n{}", item.file_path.display()),
        None => format!("{}\n{}", item.label(), item.file_path.display()),
    };

    let response = match (group.label_position, icon, text) {
        (LabelPosition::Right, Some(icon), Some(text)) => {
            ui.add(Button::image_and_text(icon, text).min_size(Vec2::new(CELL_PX + RIGHT_LABEL_PX, CELL_PX)))
        }
        (LabelPosition::Right, None, Some(text)) => {
            ui.add(Button::new(text).min_size(Vec2::new(CELL_PX + RIGHT_LABEL_PX, CELL_PX)))
        }
        (LabelPosition::Bottom, icon, Some(text)) => {
            ui.vertical_centered(|ui| {
                let response = match icon {
                    Some(icon) => ui.add(Button::image(icon).min_size(Vec2::splat(CELL_PX))),
                    None => ui.add(Button::new("▶").min_size(Vec2::splat(CELL_PX))),
                };
                ui.label(text);
                response
            })
            .inner
        }
        (_, Some(icon), None) => ui.add(Button::image(icon).min_size(Vec2::splat(CELL_PX))),
        (_, None, None) => ui.add(Button::new(RichText::new("▶").size(ICON_PX * 0.6)).min_size(Vec2::splat(CELL_PX))),
    };
    response.on_hover_text(hover)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(items: usize, cols: u32) -> GroupRecord {
        let mut group = GroupRecord::new("Dev");
        group.group_col = cols;
        for i in 0..items {
            group.push_item(ItemRecord::new(format!(r"C:\apps\{i}.exe")));
        }
        group
    }

    #[test]
    fn size_follows_columns_and_rows() {
        let one_row = popup_size(Some(&group(3, 3)));
        let two_rows = popup_size(Some(&group(4, 3)));
        assert_eq!(one_row.x, two_rows.x);
        assert!(two_rows.y > one_row.y);
    }

    #[test]
    fn fewer_items_than_columns_shrinks_width() {
        assert!(popup_size(Some(&group(2, 5))).x < popup_size(Some(&group(5, 5))).x);
    }

    #[test]
    fn labels_and_header_add_room() {
        let plain = group(3, 3);
        let mut labelled = plain.clone();
        labelled.show_labels = true;
        labelled.label_position = LabelPosition::Right;
        let mut headed = plain.clone();
        headed.group_header = true;

        assert!(popup_size(Some(&labelled)).x > popup_size(Some(&plain)).x);
        assert!(popup_size(Some(&headed)).y > popup_size(Some(&plain)).y);
    }
}
