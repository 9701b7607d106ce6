use std::collections::HashMap;
use std::sync::Mutex;

use group_core::cli::Invocation;
use group_core::coordinator::{decide, popup_probe_title, Action, Show};
use group_core::mailbox::{Mailbox, Slot};
use group_core::registry::{self, Liveness, WindowError, WindowHandle, WindowRegistry, WindowRole};
use group_core::{AppPaths, ConfigStore, GroupRecord, ItemRecord};

#[derive(Default)]
struct Desktop {
    windows: Mutex<HashMap<String, WindowHandle>>,
    foreground: Mutex<Vec<WindowHandle>>,
}

impl WindowRegistry for Desktop {
    fn find_by_title(&self, title: &str) -> Option<WindowHandle> {
        self.windows.lock().unwrap().get(title).copied()
    }

    fn force_foreground(&self, handle: WindowHandle) -> Result<(), WindowError> {
        self.foreground.lock().unwrap().push(handle);
        Ok(())
    }

    fn show(&self, _handle: WindowHandle) -> Result<(), WindowError> {
        Ok(())
    }

    fn hide(&self, _handle: WindowHandle) -> Result<(), WindowError> {
        Ok(())
    }

    fn move_to(&self, _handle: WindowHandle, _x: i32, _y: i32) -> Result<(), WindowError> {
        Ok(())
    }

    fn window_size(&self, _handle: WindowHandle) -> Option<(i32, i32)> {
        None
    }
}

async fn plan_for(store: &ConfigStore, desktop: &Desktop, args: &[&str]) -> group_core::coordinator::LaunchPlan {
    let inv = Invocation::parse(std::iter::once("app-group.exe").chain(args.iter().copied()));
    let last_open = Mailbox::new(store.paths(), Slot::LastOpen).take_latest().await.unwrap();
    let live = Liveness::probe(desktop, popup_probe_title(&inv, last_open.as_deref()));
    let doc = store.load().await.unwrap();
    let plan = decide(&inv, live, &doc);
    for (slot, value) in &plan.mailbox {
        Mailbox::new(store.paths(), *slot).post(value).await.unwrap();
    }
    plan
}

#[tokio::test]
async fn popup_bootstraps_then_hands_off() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::at(dir.path());
    std::fs::write(paths.config_file(), "{}").unwrap();
    let store = ConfigStore::new(paths);

    assert_eq!(store.load().await.unwrap().next_id(), 1);

    let mut dev = GroupRecord::new("Dev");
    dev.push_item(ItemRecord::new(r"C:\Tools\editor.exe"));
    dev.push_item(ItemRecord::new(r"C:\Tools\terminal.exe"));
    assert_eq!(store.create(dev).await.unwrap(), 1);

    let doc = store.load().await.unwrap();
    assert_eq!(doc.find_id_by_name("Dev").unwrap(), 1);
    assert_eq!(doc.find_name_by_id(1), Some("Dev"));

    let desktop = Desktop::default();
    let plan = plan_for(&store, &desktop, &["Dev"]).await;
    assert_eq!(
        plan.action,
        Action::Bootstrap {
            show: Show::Popup(1),
            popup_group: Some(1)
        }
    );

    // The bootstrapped process now presents its windows.
    desktop.windows.lock().unwrap().insert("App Group".into(), WindowHandle(10));
    desktop.windows.lock().unwrap().insert("Dev".into(), WindowHandle(11));

    let plan = plan_for(&store, &desktop, &["Dev"]).await;
    assert_eq!(
        plan.action,
        Action::ActivateAndExit {
            role: WindowRole::Popup("Dev".into()),
            reposition: true
        }
    );
    assert_eq!(plan.exit_code(), 0);

    if let Action::ActivateAndExit { role, .. } = &plan.action {
        assert_eq!(registry::activate(&desktop, role), Some(WindowHandle(11)));
    }
    assert_eq!(*desktop.foreground.lock().unwrap(), vec![WindowHandle(11)]);

    let last_open = Mailbox::new(store.paths(), Slot::LastOpen).take_latest().await.unwrap();
    assert_eq!(last_open.as_deref(), Some("Dev"));
    let last_edit = Mailbox::new(store.paths(), Slot::LastEdit).take_latest().await.unwrap();
    assert_eq!(last_edit.as_deref(), Some("1"));
}

#[tokio::test]
async fn silent_autostart_sees_last_popup() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(AppPaths::at(dir.path()));
    store.create(GroupRecord::new("Games")).await.unwrap();

    let desktop = Desktop::default();
    let plan = plan_for(&store, &desktop, &["Games"]).await;
    assert!(plan.hosts_ui());

    desktop.windows.lock().unwrap().insert("Games".into(), WindowHandle(3));
    let plan = plan_for(&store, &desktop, &["--silent"]).await;
    assert!(!plan.hosts_ui());
}
