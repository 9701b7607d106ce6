use std::path::PathBuf;

use eframe::egui::{self, CentralPanel, Color32, ComboBox, DragValue, Layout, RichText, ScrollArea, ViewportBuilder, ViewportId};
use group_core::LabelPosition;
use group_core::registry::EDIT_WINDOW_TITLE;

use crate::app::models::{AppState, GroupFormState, ItemForm};
use crate::app::views::error_modal::draw_error_modal;
use crate::app::views::shared_elements::{card_frame, field_label, section_label};
use crate::platform::shortcut_args;

const ITEM_EXTENSIONS: &[&str] = &["exe", "lnk", "url", "bat", "cmd"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "ico"];

enum RowAction {
    Up(usize),
    Down(usize),
    Remove(usize),
}

/// The editor viewport. It exists for the whole life of the UI host and is
/// only shown while a group is being edited.
pub fn show_edit_viewport(app: &mut AppState, ctx: &egui::Context) {
    let builder = ViewportBuilder::default()
        .with_title(EDIT_WINDOW_TITLE)
        .with_inner_size([560.0, 640.0])
        .with_min_inner_size([420.0, 420.0])
        .with_visible(app.edit.visible);

    ctx.show_viewport_immediate(ViewportId::from_hash_of("group_editor"), builder, |ctx, _class| {
        if ctx.input(|i| i.viewport().close_requested()) {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            app.close_editor();
        }

        let focused = ctx.input(|i| i.viewport().focused).unwrap_or(false);
        if focused && !app.edit.focused {
            app.on_edit_activated();
        }
        app.edit.focused = focused;

        if !app.edit.visible {
            return;
        }

        let dropped: Vec<PathBuf> = ctx.input(|i| i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect());
        for path in dropped {
            add_path(&mut app.edit.form, path);
        }

        let mut save = false;
        let mut cancel = false;
        CentralPanel::default().show(ctx, |ui| {
            let form = &mut app.edit.form;
            ui.heading(if form.is_new() { "New group" } else { "Edit group" });
            ui.separator();

            ScrollArea::vertical().auto_shrink([false, false]).max_height((ui.available_height() - 48.0).max(120.0)).show(ui, |ui| {
                draw_appearance(ui, form);
                draw_items(ui, form);
            });

            ui.separator();
            ui.horizontal(|ui| {
                let save_button = egui::Button::new(RichText::new("💾 Save").strong()).min_size(egui::vec2(120.0, 32.0));
                if ui.add_enabled(!app.edit.saving, save_button).clicked() {
                    save = true;
                }
                if ui.add(egui::Button::new("❌ Cancel").min_size(egui::vec2(100.0, 32.0))).clicked() {
                    cancel = true;
                }
                if app.edit.saving {
                    ui.spinner();
                }
            });
        });

        if save {
            app.save_form();
        } else if cancel {
            app.close_editor();
        }

        draw_error_modal(app, ctx);
    });
}

fn add_path(form: &mut GroupFormState, path: PathBuf) {
    let args = shortcut_args(&path);
    form.add_item(ItemForm::new(path, args));
}

fn draw_appearance(ui: &mut egui::Ui, form: &mut GroupFormState) {
    card_frame(ui).show(ui, |ui| {
        ui.horizontal(|ui| {
            field_label(ui, "Group name:");
            ui.text_edit_singleline(&mut form.group_name);
        });

        ui.horizontal(|ui| {
            field_label(ui, "Icon:");
            let current = form
                .icon_source
                .as_ref()
                .unwrap_or(&form.group_icon)
                .display()
                .to_string();
            ui.label(if current.is_empty() { RichText::new("none").weak() } else { RichText::new(current) });
            if ui.button("📁").on_hover_text("Choose an image...").clicked() {
                if let Some(path) = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS).pick_file() {
                    form.icon_source = Some(path);
                }
            }
        });

        ui.horizontal(|ui| {
            field_label(ui, "Columns:");
            ui.add(DragValue::new(&mut form.group_col).range(1..=12));
        });

        ui.checkbox(&mut form.group_header, "Show group name as header");
        ui.checkbox(&mut form.show_labels, "Show item labels");

        ui.add_enabled_ui(form.show_labels, |ui| {
            ui.horizontal(|ui| {
                field_label(ui, "Label size:");
                ui.add(DragValue::new(&mut form.label_size).range(8..=32));
            });
            ui.horizontal(|ui| {
                field_label(ui, "Label position:");
                ComboBox::from_id_salt("label_position")
                    .selected_text(format!("{:?}", form.label_position))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut form.label_position, LabelPosition::Bottom, "Bottom");
                        ui.selectable_value(&mut form.label_position, LabelPosition::Right, "Right");
                    });
            });
        });
    });
}

fn draw_items(ui: &mut egui::Ui, form: &mut GroupFormState) {
    card_frame(ui).show(ui, |ui| {
        ui.horizontal(|ui| {
            section_label(ui, "Items");
            ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("📁add").on_hover_text("Add programs...").clicked() {
                    if let Some(paths) = rfd::FileDialog::new().add_filter("Programs", ITEM_EXTENSIONS).pick_files() {
                        for path in paths {
                            add_path(form, path);
                        }
                    }
                }
            });
        });

        if form.items.is_empty() {
            ui.label(RichText::new("No items. Drag & drop programs or shortcuts here.").weak());
            return;
        }

        let last = form.items.len() - 1;
        let mut action = None;
        for (index, item) in form.items.iter_mut().enumerate() {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("{}.", index + 1)).strong());
                    ui.add(egui::TextEdit::singleline(&mut item.file_path).desired_width(f32::INFINITY).hint_text("Path"));
                });
                ui.horizontal(|ui| {
                    ui.add(egui::TextEdit::singleline(&mut item.tooltip).desired_width(140.0).hint_text("Tooltip"));
                    ui.add(egui::TextEdit::singleline(&mut item.args).desired_width(160.0).hint_text("Arguments"));
                    ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(RichText::new("🗑").color(Color32::RED)).on_hover_text("Remove").clicked() {
                            action = Some(RowAction::Remove(index));
                        }
                        if ui.add_enabled(index < last, egui::Button::new("⬇")).clicked() {
                            action = Some(RowAction::Down(index));
                        }
                        if ui.add_enabled(index > 0, egui::Button::new("⬆")).clicked() {
                            action = Some(RowAction::Up(index));
                        }
                    });
                });
                ui.horizontal(|ui| {
                    ui.add(egui::TextEdit::singleline(&mut item.icon_override).desired_width(260.0).hint_text("Icon override (optional)"));
                    if ui.button("📁").on_hover_text("Choose icon image...").clicked() {
                        if let Some(path) = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS).pick_file() {
                            item.icon_override = path.display().to_string();
                        }
                    }
                });
            });
        }

        match action {
            Some(RowAction::Up(i)) => form.move_item(i, i - 1),
            Some(RowAction::Down(i)) => form.move_item(i, i + 1),
            Some(RowAction::Remove(i)) => {
                form.items.remove(i);
            }
            None => {}
        }
    });
}
