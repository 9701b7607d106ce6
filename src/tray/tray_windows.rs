//! Raw Win32 notification icon for the watchdog, which has no UI framework
//! and therefore no event loop of its own.
//!
//! Each tray owns its menu. The tray thread keeps it alive for the whole
//! message loop and the window reaches it through `GWLP_USERDATA`.

use std::sync::mpsc;
use std::thread::JoinHandle;

use windows::{
    Win32::{
        Foundation::*,
        System::LibraryLoader::GetModuleHandleW,
        UI::{Shell::*, WindowsAndMessaging::*},
    },
    core::PCWSTR,
};

type Callback = Box<dyn Fn() + Send + Sync>;

const WM_TRAY: u32 = WM_USER + 1;

const FIRST_MENU_ID: usize = 1000;

/// Menu entries in display order, with command ids local to one tray.
#[derive(Default)]
struct TrayMenu {
    entries: Vec<(usize, String, Callback)>,
}

impl TrayMenu {
    fn push(&mut self, label: &str, callback: Callback) -> usize {
        let id = FIRST_MENU_ID + self.entries.len();
        self.entries.push((id, label.to_string(), callback));
        id
    }

    /// Runs the callback behind command `id`; false when the id is not ours.
    fn invoke(&self, id: usize) -> bool {
        match self.entries.iter().find(|(entry, ..)| *entry == id) {
            Some((_, _, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }
}

pub struct WatchdogTray {
    tip: String,
    menu: TrayMenu,
}

/// A running tray thread. [`shutdown`](Self::shutdown) removes the icon and
/// joins the thread.
pub struct TrayHandle {
    hwnd: isize,
    thread: JoinHandle<()>,
}

impl WatchdogTray {
    pub fn new(tip: &str) -> Self {
        Self {
            tip: tip.to_string(),
            menu: TrayMenu::default(),
        }
    }

    pub fn add_menu_item<F>(&mut self, label: &str, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.menu.push(label, Box::new(callback));
    }

    /// Runs the message loop on its own thread.
    pub fn spawn(self) -> Result<TrayHandle, String> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<isize, String>>();
        let thread = std::thread::Builder::new()
            .name("watchdog-tray".into())
            .spawn(move || {
                if let Err(e) = self.run(&ready_tx) {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| e.to_string())?;

        match ready_rx.recv() {
            Ok(Ok(hwnd)) => Ok(TrayHandle { hwnd, thread }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err("tray thread exited before creating its window".into()),
        }
    }

    fn run(self, ready: &mpsc::Sender<Result<isize, String>>) -> windows::core::Result<()> {
        // Outlives the window: the loop below only ends once it is destroyed.
        let menu = Box::new(self.menu);
        unsafe {
            let hinstance = GetModuleHandleW(None)?;

            let class_name_vec = to_wide("app_group_watchdog_tray");
            let class_name = class_name_vec.as_ptr();
            let wnd_class = WNDCLASSW {
                hInstance: HINSTANCE(hinstance.0),
                lpszClassName: PCWSTR(class_name),
                lpfnWndProc: Some(wnd_proc),
                ..Default::default()
            };

            RegisterClassW(&wnd_class);

            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                PCWSTR(class_name),
                PCWSTR::null(),
                WS_OVERLAPPEDWINDOW,
                0,
                0,
                0,
                0,
                None,
                None,
                Some(HINSTANCE(hinstance.0)),
                Some(&*menu as *const TrayMenu as *const core::ffi::c_void),
            )?;

            // Resource 1 is the icon embedded by the build script.
            let hicon = LoadIconW(Some(HINSTANCE(hinstance.0)), PCWSTR(1 as *const u16))
                .or_else(|_| LoadIconW(None, IDI_APPLICATION))
                .unwrap_or_default();

            let mut nid = NOTIFYICONDATAW {
                cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: hwnd,
                uID: 1,
                uFlags: NIF_MESSAGE | NIF_ICON | NIF_TIP,
                uCallbackMessage: WM_TRAY,
                hIcon: hicon,
                szTip: [0; 128],
                ..Default::default()
            };

            let tip_wide = to_wide(&self.tip);
            let n = tip_wide.len().min(nid.szTip.len() - 1);
            nid.szTip[..n].copy_from_slice(&tip_wide[..n]);

            if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
                tracing::warn!("failed to add the notification icon");
            }

            let _ = ready.send(Ok(hwnd.0 as isize));

            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }

            if !Shell_NotifyIconW(NIM_DELETE, &nid).as_bool() {
                tracing::debug!("notification icon was already removed");
            }
        }
        drop(menu);
        Ok(())
    }
}

impl TrayHandle {
    pub fn shutdown(self) {
        unsafe {
            let _ = PostMessageW(Some(HWND(self.hwnd as *mut core::ffi::c_void)), WM_CLOSE, WPARAM(0), LPARAM(0));
        }
        if self.thread.join().is_err() {
            tracing::warn!("tray thread panicked");
        }
    }
}

/// The menu stored on `hwnd` at creation, if the window still has one.
unsafe fn window_menu<'a>(hwnd: HWND) -> Option<&'a TrayMenu> {
    unsafe { (GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const TrayMenu).as_ref() }
}

unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        match msg {
            WM_NCCREATE => {
                let create = &*(lparam.0 as *const CREATESTRUCTW);
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, create.lpCreateParams as isize);
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }
            WM_TRAY => {
                let event = lparam.0 as u32;
                if event == WM_RBUTTONUP || event == WM_LBUTTONUP {
                    if let Some(menu) = window_menu(hwnd) {
                        show_menu(hwnd, menu);
                    }
                }
                LRESULT(0)
            }
            WM_COMMAND => {
                let id = (wparam.0 as u32 & 0xFFFF) as usize;
                if let Some(menu) = window_menu(hwnd) {
                    if !menu.invoke(id) {
                        tracing::debug!(id, "unknown tray command");
                    }
                }
                LRESULT(0)
            }
            WM_CLOSE => {
                let _ = DestroyWindow(hwnd);
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            WM_NCDESTROY => {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}

unsafe fn show_menu(hwnd: HWND, menu: &TrayMenu) {
    unsafe {
        let Ok(hmenu) = CreatePopupMenu() else {
            return;
        };
        for (id, label, _) in &menu.entries {
            // `wide_label` must outlive the AppendMenuW call
            let wide_label = to_wide(label);
            let _ = AppendMenuW(hmenu, MF_STRING, *id, PCWSTR(wide_label.as_ptr()));
        }

        let mut p = POINT::default();
        if GetCursorPos(&mut p).is_ok() {
            let _ = SetForegroundWindow(hwnd);
            let _ = TrackPopupMenu(hmenu, TPM_BOTTOMALIGN, p.x, p.y, None, hwnd, None);
        }
        let _ = DestroyMenu(hmenu);
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn menu_ids_are_local_to_each_tray() {
        let mut first = WatchdogTray::new("first");
        first.add_menu_item("Show", || {});
        first.add_menu_item("Exit", || {});
        let mut second = WatchdogTray::new("second");
        second.add_menu_item("Show", || {});

        let ids = |tray: &WatchdogTray| tray.menu.entries.iter().map(|(id, ..)| *id).collect::<Vec<_>>();
        assert_eq!(ids(&first), [FIRST_MENU_ID, FIRST_MENU_ID + 1]);
        assert_eq!(ids(&second), [FIRST_MENU_ID]);
    }

    #[test]
    fn commands_reach_only_their_own_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut menu = TrayMenu::default();
        let counter = hits.clone();
        let show = menu.push("Show", Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let exit = menu.push("Exit", Box::new(|| {}));

        assert!(menu.invoke(show));
        assert!(menu.invoke(exit));
        assert!(!menu.invoke(exit + 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
