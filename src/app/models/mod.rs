/// eframe entry point
mod app;
/// UI-thread state and background work
mod app_state;
/// Editable copy of one group
pub mod group_form_state;
/// Save, delete and duplicate as async jobs
pub mod group_ops;
/// Item icon textures
pub mod icon_textures;
mod log_manager;

pub use app::App;
pub use app_state::{AppState, EditState, HostInit, PopupState, UiEvent};
pub use group_form_state::{GroupFormState, ItemForm};
pub use icon_textures::IconTextures;
pub use log_manager::{LogLevel, LogManager};
