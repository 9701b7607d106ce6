use eframe::egui::{self, CentralPanel, Color32, Layout, RichText, ScrollArea};
use group_core::GroupId;

use crate::app::models::AppState;
use crate::app::views::shared_elements::card_frame;

const PREVIEW_ICONS: usize = 8;
const PREVIEW_PX: f32 = 20.0;

enum GroupAction {
    Open(GroupId),
    LaunchAll(GroupId),
    Edit(GroupId),
    Duplicate(GroupId),
    OpenFolder(GroupId),
    AskDelete(GroupId),
    ConfirmDelete(GroupId),
    CancelDelete,
}

pub fn draw_group_list(app: &mut AppState, ctx: &egui::Context) {
    CentralPanel::default().show(ctx, |ui| {
        if app.doc.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(RichText::new("No groups yet.").heading());
                if ui.button("➕ Create your first group").clicked() {
                    app.new_group();
                }
            });
            return;
        }

        let mut action = None;
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            let groups: Vec<(GroupId, String)> = app
                .doc
                .iter()
                .map(|(id, g)| (id, g.group_name.clone()))
                .collect();
            for (id, name) in groups {
                card_frame(ui).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    if let Some(a) = draw_group_row(app, ui, id, &name) {
                        action = Some(a);
                    }
                });
            }
        });

        match action {
            Some(GroupAction::Open(id)) => app.open_popup(id),
            Some(GroupAction::LaunchAll(id)) => app.launch_all(id),
            Some(GroupAction::Edit(id)) => app.open_editor(id),
            Some(GroupAction::Duplicate(id)) => app.duplicate_group(id),
            Some(GroupAction::OpenFolder(id)) => app.open_group_folder(id),
            Some(GroupAction::AskDelete(id)) => app.pending_delete = Some(id),
            Some(GroupAction::ConfirmDelete(id)) => app.delete_group(id),
            Some(GroupAction::CancelDelete) => app.pending_delete = None,
            None => {}
        }
    });
}

fn draw_group_row(app: &mut AppState, ui: &mut egui::Ui, id: GroupId, name: &str) -> Option<GroupAction> {
    let mut action = None;
    let items = app.doc.get(id).map(|g| g.items.clone()).unwrap_or_default();

    ui.horizontal(|ui| {
        ui.label(RichText::new(name).heading());
        ui.label(RichText::new(format!("{} items", items.len())).weak());

        ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
            if app.pending_delete == Some(id) {
                if ui.button("Cancel").clicked() {
                    action = Some(GroupAction::CancelDelete);
                }
                if ui.button(RichText::new("Delete").color(Color32::RED)).clicked() {
                    action = Some(GroupAction::ConfirmDelete(id));
                }
                return;
            }
            if ui.button("🗑").on_hover_text("Delete group").clicked() {
                action = Some(GroupAction::AskDelete(id));
            }
            if ui.button("⧉").on_hover_text("Duplicate group").clicked() {
                action = Some(GroupAction::Duplicate(id));
            }
            if ui.button("📁").on_hover_text("Open group folder").clicked() {
                action = Some(GroupAction::OpenFolder(id));
            }
            if ui.button("⚙").on_hover_text("Edit group").clicked() {
                action = Some(GroupAction::Edit(id));
            }
            if ui
                .add_enabled(!items.is_empty(), egui::Button::new("🚀"))
                .on_hover_text("Launch every item")
                .clicked()
            {
                action = Some(GroupAction::LaunchAll(id));
            }
            if ui.button("▶ Open").on_hover_text("Show the popup").clicked() {
                action = Some(GroupAction::Open(id));
            }
        });
    });

    ui.horizontal(|ui| {
        if items.is_empty() {
            ui.label(RichText::new("No items. Edit the group to add some.").weak());
        }
        for item in items.iter().take(PREVIEW_ICONS) {
            let response = match app.icons.get(ui.ctx(), item) {
                Some(texture) => ui.add(
                    egui::Image::new(egui::load::SizedTexture::from_handle(&texture))
                        .fit_to_exact_size(egui::Vec2::splat(PREVIEW_PX)),
                ),
                None => ui.label("▪"),
            };
            response.on_hover_text(item.label());
        }
        if items.len() > PREVIEW_ICONS {
            ui.label(RichText::new(format!("+{}", items.len() - PREVIEW_ICONS)).weak());
        }
    });

    action
}
