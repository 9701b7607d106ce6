use thiserror::Error;

pub const MAIN_WINDOW_TITLE: &str = "App Group";
pub const EDIT_WINDOW_TITLE: &str = "Edit Group";

/// Opaque native window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

#[derive(Debug, Error)]
#[error("{op} failed for window {handle:?}: {message}")]
pub struct WindowError {
    pub op: &'static str,
    pub handle: WindowHandle,
    pub message: String,
}

/// The three roles a UI-hosting process presents. A role is "alive" when a
/// top-level window with its title exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowRole {
    Main,
    Edit,
    /// Popups are titled with the name of the group they show.
    Popup(String),
}

impl WindowRole {
    pub fn title(&self) -> &str {
        match self {
            Self::Main => MAIN_WINDOW_TITLE,
            Self::Edit => EDIT_WINDOW_TITLE,
            Self::Popup(group) => group,
        }
    }
}

/// Top-level window lookup and activation across processes.
pub trait WindowRegistry: Send + Sync {
    fn find_by_title(&self, title: &str) -> Option<WindowHandle>;

    /// Brings `handle` to the foreground even when the caller does not own
    /// the foreground window.
    fn force_foreground(&self, handle: WindowHandle) -> Result<(), WindowError>;

    fn show(&self, handle: WindowHandle) -> Result<(), WindowError>;

    fn hide(&self, handle: WindowHandle) -> Result<(), WindowError>;

    fn move_to(&self, handle: WindowHandle, x: i32, y: i32) -> Result<(), WindowError>;

    /// Outer size in physical pixels.
    fn window_size(&self, handle: WindowHandle) -> Option<(i32, i32)>;
}

/// Which roles already have a live window, captured once per process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Liveness {
    pub main: bool,
    pub popup: bool,
    pub edit: bool,
}

impl Liveness {
    /// Probes the registry. `popup_title` is the group name the popup would
    /// carry; `None` means no popup can be identified and it counts as dead.
    pub fn probe(registry: &dyn WindowRegistry, popup_title: Option<&str>) -> Self {
        Self {
            main: registry.find_by_title(MAIN_WINDOW_TITLE).is_some(),
            popup: popup_title
                .filter(|t| !t.is_empty())
                .is_some_and(|t| registry.find_by_title(t).is_some()),
            edit: registry.find_by_title(EDIT_WINDOW_TITLE).is_some(),
        }
    }
}

/// Finds the window presenting `role` and brings it forward. Activation is
/// best-effort: a failure to take focus is logged and the handle is still
/// returned.
pub fn activate(registry: &dyn WindowRegistry, role: &WindowRole) -> Option<WindowHandle> {
    let Some(handle) = registry.find_by_title(role.title()) else {
        tracing::warn!(title = role.title(), "window to activate has gone away");
        return None;
    };
    if let Err(e) = registry.force_foreground(handle) {
        tracing::warn!(error = %e, "could not bring window to foreground");
    }
    Some(handle)
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory window table that records every call made against it.
    #[derive(Default)]
    pub struct FakeRegistry {
        pub windows: Mutex<HashMap<String, WindowHandle>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        pub fn with(titles: &[&str]) -> Self {
            let registry = Self::default();
            for (n, title) in titles.iter().enumerate() {
                registry.open(title, n as isize + 1);
            }
            registry
        }

        pub fn open(&self, title: &str, raw: isize) {
            self.windows.lock().unwrap().insert(title.to_string(), WindowHandle(raw));
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl WindowRegistry for FakeRegistry {
        fn find_by_title(&self, title: &str) -> Option<WindowHandle> {
            self.windows.lock().unwrap().get(title).copied()
        }

        fn force_foreground(&self, handle: WindowHandle) -> Result<(), WindowError> {
            self.record(format!("foreground {}", handle.0));
            Ok(())
        }

        fn show(&self, handle: WindowHandle) -> Result<(), WindowError> {
            self.record(format!("show {}", handle.0));
            Ok(())
        }

        fn hide(&self, handle: WindowHandle) -> Result<(), WindowError> {
            self.record(format!("hide {}", handle.0));
            Ok(())
        }

        fn move_to(&self, handle: WindowHandle, x: i32, y: i32) -> Result<(), WindowError> {
            self.record(format!("move {} {x},{y}", handle.0));
            Ok(())
        }

        fn window_size(&self, _handle: WindowHandle) -> Option<(i32, i32)> {
            Some((300, 200))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeRegistry;
    use super::*;

    #[test]
    fn probe_uses_role_titles() {
        let registry = FakeRegistry::with(&["App Group", "Dev"]);
        let live = Liveness::probe(&registry, Some("Dev"));
        assert_eq!(
            live,
            Liveness {
                main: true,
                popup: true,
                edit: false
            }
        );
        assert!(!Liveness::probe(&registry, None).popup);
        assert!(!Liveness::probe(&registry, Some("Games")).popup);
    }

    #[test]
    fn activate_foregrounds_the_role_window() {
        let registry = FakeRegistry::with(&["App Group", "Edit Group"]);
        assert_eq!(activate(&registry, &WindowRole::Edit), Some(WindowHandle(2)));
        assert_eq!(activate(&registry, &WindowRole::Popup("Dev".into())), None);
        assert_eq!(registry.calls(), vec!["foreground 2"]);
    }

    #[test]
    fn popup_title_is_group_name() {
        assert_eq!(WindowRole::Popup("Dev".into()).title(), "Dev");
        assert_eq!(WindowRole::Edit.title(), EDIT_WINDOW_TITLE);
    }
}
