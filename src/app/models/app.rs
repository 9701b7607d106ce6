use std::time::Duration;

use eframe::egui;

use crate::app::controllers::{self, MainView};
use crate::app::models::{AppState, HostInit};
use crate::app::views::{group_editor, group_list, header, logs, popup, settings};

/// Hidden viewports still need frames to notice mailbox activation and
/// background results.
const IDLE_REPAINT: Duration = Duration::from_millis(250);

/// The UI host: the main window in the root viewport, the popup and the
/// editor as immediate child viewports.
pub struct App {
    pub state: AppState,
    pub main_controller: controllers::MainController,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, init: HostInit) -> Self {
        Self {
            state: AppState::new(&cc.egui_ctx, init),
            main_controller: controllers::MainController::new(),
        }
    }

    /// Closing the main window only hides it while the tray icon can bring it back.
    fn handle_root_close(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) || self.state.exit_requested {
            return;
        }
        if self.state.has_tray() {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.state.hide_main();
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(IDLE_REPAINT);

        self.state.handle_events();
        self.state.handle_tray();
        self.handle_root_close(ctx);

        if ctx.input(|i| i.viewport().focused) == Some(true) {
            self.state.main_visible = true;
        }

        let app_state = &mut self.state;
        self.main_controller.render_with(ctx, |controller, ui_ctx| {
            header::draw_top_panel(app_state, ui_ctx);
            match controller.view {
                MainView::Groups => group_list::draw_group_list(app_state, ui_ctx),
                MainView::Settings => settings::draw_settings(app_state, ui_ctx),
                MainView::Logs => logs::draw_logs(app_state, ui_ctx),
            }
        });

        if app_state.view_changed {
            app_state.view_changed = false;
            self.main_controller.set_view(app_state.current_view);
        }

        popup::show_popup_viewport(&mut self.state, ctx);
        group_editor::show_edit_viewport(&mut self.state, ctx);

        if self.state.exit_requested {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.state.stop_tray();
    }
}
