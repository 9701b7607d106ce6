//! Platform-neutral core of App Group: the group configuration store, the
//! cross-process mailbox, launch coordination, popup placement and the
//! watchdog reconciliation logic. Everything that touches real windows or
//! processes sits behind the traits in [`registry`] and [`watchdog`], so the
//! decisions made here can be exercised without a GUI host.

pub mod cli;
pub mod coordinator;
pub mod error;
pub mod icon_cache;
pub mod launcher;
pub mod mailbox;
pub mod model;
pub mod paths;
pub mod placement;
pub mod registry;
pub mod settings;
pub mod shortcut;
pub mod store;
pub mod watchdog;

mod store_lock;

pub use error::{ConfigError, ShortcutError};
pub use model::{ConfigDocument, GroupId, GroupRecord, ItemRecord, LabelPosition};
pub use paths::AppPaths;
pub use store::ConfigStore;
