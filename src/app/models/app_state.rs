use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use eframe::egui;
use group_core::coordinator::Show;
use group_core::launcher::{ItemLauncher, launch_group, split_args};
use group_core::mailbox::{Mailbox, Slot};
use group_core::registry::{WindowRegistry, WindowRole};
use group_core::settings::Settings;
use group_core::store::LOAD_TIMEOUT;
use group_core::{AppPaths, ConfigDocument, ConfigStore, GroupId, ItemRecord};
use os_api::OS;
use tokio::runtime::Handle;

use crate::app::controllers::MainView;
use crate::app::models::group_form_state::GroupFormState;
use crate::app::models::group_ops::{self, SaveJob};
use crate::app::models::icon_textures::IconTextures;
use crate::app::models::log_manager::LogManager;
use crate::platform::{self, OsWindowRegistry, ShellLauncher};
use crate::tray::{TrayCmd, TraySession};

const TRAY_TOOLTIP: &str = "App Group";

/// Results of background work, drained on the UI thread every frame.
#[derive(Debug)]
pub enum UiEvent {
    Loaded(ConfigDocument),
    Info(String),
    Failed(String),
    /// A mutation finished; the list is reloaded.
    Changed(String),
    EditRequested(GroupId),
    OpenRequested(String),
    Saved(GroupId),
    SaveFailed(String),
}

/// The popup window. It exists whenever a group is bound, titled with that
/// group's name; "closing" it only moves it off-screen.
#[derive(Default)]
pub struct PopupState {
    pub group_id: Option<GroupId>,
    pub title: String,
    /// Whether the native window has been made visible at least once.
    pub shown: bool,
    pub place_pending: bool,
    pub focused: bool,
}

pub struct EditState {
    pub visible: bool,
    pub focused: bool,
    pub saving: bool,
    pub form: GroupFormState,
}

/// Everything the composition root hands to the UI host.
pub struct HostInit {
    pub paths: AppPaths,
    pub store: ConfigStore,
    pub doc: ConfigDocument,
    pub settings: Settings,
    pub icons: IconTextures,
    pub show: Show,
    pub popup_group: Option<GroupId>,
    pub runtime: Handle,
    pub launcher_exe: PathBuf,
}

/// UI-thread state of the single UI-hosting process: one main window, one
/// popup and one editor.
pub struct AppState {
    pub paths: AppPaths,
    pub store: ConfigStore,
    pub runtime: Handle,
    pub launcher_exe: PathBuf,
    pub doc: ConfigDocument,
    pub settings: Settings,
    pub icons: IconTextures,
    pub popup: PopupState,
    pub edit: EditState,
    pub main_visible: bool,
    /// Save error shown as a modal over the editor.
    pub error_modal: Option<String>,
    pub pending_delete: Option<GroupId>,
    pub log_manager: LogManager,
    pub current_view: MainView,
    pub view_changed: bool,
    pub exit_requested: bool,
    pub registry: OsWindowRegistry,
    tray: Option<TraySession>,
    ctx: egui::Context,
    events_tx: Sender<UiEvent>,
    events_rx: Receiver<UiEvent>,
}

impl AppState {
    pub fn new(ctx: &egui::Context, init: HostInit) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let next_id = init.doc.next_id();

        let mut state = Self {
            paths: init.paths,
            store: init.store,
            runtime: init.runtime,
            launcher_exe: init.launcher_exe,
            doc: init.doc,
            settings: init.settings,
            icons: init.icons,
            popup: PopupState::default(),
            edit: EditState {
                visible: false,
                focused: false,
                saving: false,
                form: GroupFormState::new_group(next_id),
            },
            main_visible: matches!(init.show, Show::Main),
            error_modal: None,
            pending_delete: None,
            log_manager: LogManager::default(),
            current_view: MainView::Groups,
            view_changed: false,
            exit_requested: false,
            registry: OsWindowRegistry,
            tray: None,
            ctx: ctx.clone(),
            events_tx,
            events_rx,
        };

        if let Some(id) = init.popup_group {
            state.bind_popup(id);
        }
        match init.show {
            Show::Popup(id) => state.open_popup(id),
            Show::Edit(id) => state.open_editor(id),
            Show::Main | Show::Nothing => {}
        }

        if state.settings.show_system_tray_icon {
            state.start_tray();
        }
        state.log_manager.info(format!("{} groups loaded", state.doc.len()));
        state
    }

    /// Runs `work` on the runtime and delivers its event to the UI thread.
    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = Option<UiEvent>> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            if let Some(event) = work.await {
                let _ = tx.send(event);
                ctx.request_repaint();
            }
        });
    }

    /// Re-reads the configuration. A load that times out keeps the current list.
    pub fn reload(&self) {
        let store = self.store.clone();
        self.spawn(async move {
            Some(match store.load_within(LOAD_TIMEOUT).await {
                Ok(Some(doc)) => UiEvent::Loaded(doc),
                Ok(None) => UiEvent::Failed("Loading groups timed out; keeping the current list".into()),
                Err(e) => UiEvent::Failed(format!("Loading groups failed: {e}")),
            })
        });
    }

    pub fn handle_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                UiEvent::Loaded(doc) => self.doc = doc,
                UiEvent::Info(message) => self.log_manager.info(message),
                UiEvent::Failed(message) => self.log_manager.error(message),
                UiEvent::Changed(message) => {
                    self.log_manager.info(message);
                    self.reload();
                }
                UiEvent::EditRequested(id) => {
                    if self.edit.visible && self.edit.form.id == id {
                        continue;
                    }
                    if self.edit.visible && self.edit_has_changes() {
                        tracing::debug!(id, "keeping unsaved editor contents");
                        continue;
                    }
                    self.open_editor(id);
                }
                UiEvent::OpenRequested(name) => match self.doc.find_id_by_name(&name) {
                    Ok(id) => self.bind_popup(id),
                    Err(e) => self.log_manager.error(format!("Popup request ignored: {e}")),
                },
                UiEvent::Saved(id) => {
                    self.edit.saving = false;
                    self.edit.visible = false;
                    self.icons.invalidate();
                    self.log_manager.info(format!("Saved group '{}' (id {id})", self.edit.form.group_name.trim()));
                    self.reload();
                }
                UiEvent::SaveFailed(message) => {
                    self.edit.saving = false;
                    self.log_manager.error(format!("Save failed: {message}"));
                    self.error_modal = Some(message);
                }
            }
        }
    }

    pub fn set_current_view(&mut self, view: MainView) {
        self.current_view = view;
        self.view_changed = true;
    }

    // ---- main window ----

    pub fn show_main(&mut self) {
        self.main_visible = true;
        self.ctx.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Visible(true));
        self.ctx.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Focus);
    }

    pub fn hide_main(&mut self) {
        self.main_visible = false;
        self.ctx.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Visible(false));
    }

    pub fn has_tray(&self) -> bool {
        self.tray.is_some()
    }

    // ---- popup ----

    /// Points the popup at `id` without showing it.
    pub fn bind_popup(&mut self, id: GroupId) {
        self.popup.group_id = Some(id);
        if let Some(name) = self.doc.find_name_by_id(id) {
            self.popup.title = name.to_string();
        }
    }

    pub fn open_popup(&mut self, id: GroupId) {
        self.bind_popup(id);
        self.popup.shown = true;
        self.popup.place_pending = true;
    }

    /// Activation edge of the popup: another process may have asked for a
    /// different group through the mailbox.
    pub fn on_popup_activated(&self) {
        let mailbox = Mailbox::new(&self.paths, Slot::LastOpen);
        self.spawn(async move {
            match mailbox.take_latest().await {
                Ok(name) => name.map(UiEvent::OpenRequested),
                Err(e) => Some(UiEvent::Failed(format!("Reading lastOpen failed: {e}"))),
            }
        });
    }

    /// Moves the popup next to the cursor and focuses it, once its native
    /// window exists.
    pub fn place_popup(&mut self) {
        let role = WindowRole::Popup(self.popup.title.clone());
        let Some(handle) = self.registry.find_by_title(role.title()) else {
            return;
        };
        self.popup.place_pending = false;
        platform::reposition(&self.registry, handle);
        if let Err(e) = self.registry.force_foreground(handle) {
            tracing::warn!(error = %e, "popup could not take focus");
        }
    }

    /// Moves the popup outside every monitor instead of hiding it.
    pub fn hide_popup(&mut self) {
        let Some(handle) = self.registry.find_by_title(&self.popup.title) else {
            return;
        };
        let (width, height) = self.registry.window_size(handle).unwrap_or((0, 0));
        let p = platform::off_screen_position(width, height);
        if let Err(e) = self.registry.move_to(handle, p.x, p.y) {
            tracing::warn!(error = %e, "failed to move popup off-screen");
        }
    }

    pub fn launch_item(&mut self, item: &ItemRecord) {
        let args = split_args(item.args.as_deref());
        match ShellLauncher.launch(&item.file_path, &args) {
            Ok(()) => self.log_manager.info(format!("Launched {}", item.label())),
            Err(e) => self.log_manager.error(e.to_string()),
        }
    }

    /// Reorders locally right away, then persists the new order.
    pub fn move_popup_item(&mut self, id: GroupId, from: usize, to: usize) {
        let Some(group) = self.doc.get_mut(id) else {
            return;
        };
        if !group.move_item(from, to) {
            return;
        }
        let order: Vec<PathBuf> = group.items.iter().map(|i| i.file_path.clone()).collect();
        let store = self.store.clone();
        self.spawn(async move {
            match group_ops::reorder_items(store, id, order).await {
                Ok(()) => None,
                Err(e) => Some(UiEvent::Changed(format!("Reorder not saved: {e:#}"))),
            }
        });
    }

    // ---- group list ----

    pub fn launch_all(&self, id: GroupId) {
        let Some(record) = self.doc.get(id).cloned() else {
            return;
        };
        self.spawn(async move {
            let name = record.group_name.clone();
            Some(match tokio::task::spawn_blocking(move || launch_group(&ShellLauncher, &record)).await {
                Ok(n) => UiEvent::Info(format!("Launched {n} items of '{name}'")),
                Err(e) => UiEvent::Failed(format!("Launching '{name}' failed: {e}")),
            })
        });
    }

    pub fn delete_group(&mut self, id: GroupId) {
        self.pending_delete = None;
        if self.popup.group_id == Some(id) {
            self.hide_popup();
        }
        let store = self.store.clone();
        self.spawn(async move {
            Some(match group_ops::delete_group(store, id).await {
                Ok(name) => UiEvent::Changed(format!("Deleted group '{name}'")),
                Err(e) => UiEvent::Failed(format!("Delete failed: {e:#}")),
            })
        });
    }

    pub fn duplicate_group(&self, id: GroupId) {
        let store = self.store.clone();
        let launcher_exe = self.launcher_exe.clone();
        self.spawn(async move {
            Some(match group_ops::duplicate_group(store, id, launcher_exe).await {
                Ok(new_id) => UiEvent::Changed(format!("Duplicated group {id} as {new_id}")),
                Err(e) => UiEvent::Failed(format!("Duplicate failed: {e:#}")),
            })
        });
    }

    pub fn open_group_folder(&mut self, id: GroupId) {
        let Some(name) = self.doc.find_name_by_id(id) else {
            return;
        };
        let dir = self.paths.group_dir(name);
        if let Err(e) = OS::shell_execute(&dir, &[]) {
            self.log_manager.error(format!("Cannot open {}: {e}", dir.display()));
        }
    }

    // ---- editor ----

    pub fn new_group(&mut self) {
        let id = self.doc.next_id();
        self.open_editor(id);
    }

    pub fn open_editor(&mut self, id: GroupId) {
        self.edit.form = GroupFormState::load(id, &self.doc);
        self.edit.visible = true;
        self.error_modal = None;
    }

    /// True when the form differs from what is stored for its group.
    fn edit_has_changes(&self) -> bool {
        self.edit.form != GroupFormState::load(self.edit.form.id, &self.doc)
    }

    pub fn close_editor(&mut self) {
        self.edit.visible = false;
        self.error_modal = None;
    }

    /// Activation edge of the editor: load whatever group was last requested.
    pub fn on_edit_activated(&self) {
        let mailbox = Mailbox::new(&self.paths, Slot::LastEdit);
        self.spawn(async move {
            match mailbox.take_latest().await {
                Ok(Some(raw)) => match raw.parse::<GroupId>() {
                    Ok(id) => Some(UiEvent::EditRequested(id)),
                    Err(_) => Some(UiEvent::Failed(format!("Ignoring malformed lastEdit value {raw:?}"))),
                },
                Ok(None) => None,
                Err(e) => Some(UiEvent::Failed(format!("Reading lastEdit failed: {e}"))),
            }
        });
    }

    /// Validates and starts the save. The form stays as typed until the save
    /// succeeds, so a failure can be fixed and retried.
    pub fn save_form(&mut self) {
        if self.edit.saving {
            return;
        }
        let form = &self.edit.form;
        let record = form.to_record();
        if let Err(e) = self.doc.check_name(form.id, &record.group_name) {
            self.error_modal = Some(e.to_string());
            return;
        }

        let job = SaveJob {
            store: self.store.clone(),
            launcher_exe: self.launcher_exe.clone(),
            id: form.id,
            is_new: form.is_new(),
            record,
            renamed_from: form.renamed_from().map(str::to_string),
            icon_source: form.icon_source.clone(),
        };
        self.edit.saving = true;
        self.spawn(async move {
            Some(match group_ops::save_group(job).await {
                Ok(id) => UiEvent::Saved(id),
                Err(e) => UiEvent::SaveFailed(format!("{e:#}")),
            })
        });
    }

    // ---- settings and tray ----

    fn save_settings(&self) {
        let settings = self.settings.clone();
        let paths = self.paths.clone();
        self.spawn(async move {
            match settings.save(&paths).await {
                Ok(()) => None,
                Err(e) => Some(UiEvent::Failed(format!("Settings not saved: {e}"))),
            }
        });
    }

    pub fn set_run_at_startup(&mut self, enabled: bool) {
        match OS::set_run_at_startup(enabled, &self.launcher_exe) {
            Ok(()) => {
                self.settings.run_at_startup = enabled;
                self.save_settings();
            }
            Err(e) => self.log_manager.error(format!("Updating autostart failed: {e}")),
        }
    }

    pub fn set_tray_enabled(&mut self, enabled: bool) {
        self.settings.show_system_tray_icon = enabled;
        if enabled {
            self.start_tray();
        } else {
            self.stop_tray();
        }
        self.save_settings();
    }

    pub fn set_grayscale_icon(&mut self, enabled: bool) {
        self.settings.use_grayscale_icon = enabled;
        if self.tray.is_some() {
            self.stop_tray();
            self.start_tray();
        }
        self.save_settings();
    }

    fn start_tray(&mut self) {
        if self.tray.is_some() {
            return;
        }
        let ctx = self.ctx.clone();
        match TraySession::start(TRAY_TOOLTIP, self.settings.use_grayscale_icon, move || ctx.request_repaint()) {
            Ok(tray) => self.tray = Some(tray),
            Err(e) => self.log_manager.error(format!("Tray init failed: {e}")),
        }
    }

    pub fn stop_tray(&mut self) {
        if let Some(tray) = self.tray.take() {
            tray.shutdown();
        }
    }

    pub fn handle_tray(&mut self) {
        let commands: Vec<TrayCmd> = match &self.tray {
            Some(tray) => std::iter::from_fn(|| tray.try_recv()).collect(),
            None => return,
        };
        for cmd in commands {
            match cmd {
                TrayCmd::Show => self.show_main(),
                TrayCmd::Exit => self.exit_requested = true,
            }
        }
    }
}
