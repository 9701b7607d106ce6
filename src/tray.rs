use std::sync::mpsc::{self, Receiver};

use tokio::task::JoinHandle;
use tray_icon::{
    Icon, MouseButton, TrayIcon, TrayIconBuilder, TrayIconEvent,
    menu::{Menu, MenuEvent, MenuId, MenuItem},
};

pub mod tray_windows;

const MENU_SHOW: &str = "show";
const MENU_EXIT: &str = "exit";

/// Commands from the tray to the UI host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCmd {
    Show,
    Exit,
}

/// The UI host's notification-area icon. Dropping the session removes the
/// icon; [`shutdown`](Self::shutdown) also stops the event poller.
pub struct TraySession {
    tray_icon: TrayIcon,
    rx: Receiver<TrayCmd>,
    poller: JoinHandle<()>,
}

impl TraySession {
    /// Builds the icon and starts polling its events on the tokio runtime.
    /// `wake` is called after every command so the UI thread picks it up.
    pub fn start<W>(tooltip: &str, grayscale: bool, wake: W) -> Result<Self, String>
    where
        W: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<TrayCmd>();

        let menu = Menu::new();
        let show = MenuItem::with_id(MenuId::new(MENU_SHOW), "Show", true, None);
        let exit = MenuItem::with_id(MenuId::new(MENU_EXIT), "Exit", true, None);
        menu.append(&show).map_err(|e| e.to_string())?;
        menu.append(&exit).map_err(|e| e.to_string())?;

        let (rgba, width, height) = decode_icon_rgba(include_bytes!("../assets/icon.ico"), grayscale)
            .map_err(|e| format!("Failed to decode tray icon: {e}"))?;
        let icon = Icon::from_rgba(rgba, width, height).map_err(|e| format!("Failed to create tray icon: {e}"))?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(tooltip)
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .with_menu_on_left_click(false)
            .build()
            .map_err(|e| format!("Failed to build tray icon: {e}"))?;

        let poller = tokio::spawn(async move {
            let menu_channel = MenuEvent::receiver();
            let tray_channel = TrayIconEvent::receiver();

            loop {
                while let Ok(event) = menu_channel.try_recv() {
                    let cmd = match event.id.0.as_str() {
                        MENU_SHOW => TrayCmd::Show,
                        MENU_EXIT => TrayCmd::Exit,
                        _ => continue,
                    };
                    if tx.send(cmd).is_err() {
                        return;
                    }
                    wake();
                }

                while let Ok(event) = tray_channel.try_recv() {
                    if let TrayIconEvent::DoubleClick {
                        button: MouseButton::Left,
                        ..
                    } = event
                    {
                        if tx.send(TrayCmd::Show).is_err() {
                            return;
                        }
                        wake();
                    }
                }

                tokio::time::sleep(std::time::Duration::from_millis(16)).await;
            }
        });

        Ok(Self { tray_icon, rx, poller })
    }

    pub fn try_recv(&self) -> Option<TrayCmd> {
        self.rx.try_recv().ok()
    }

    pub fn shutdown(self) {
        self.poller.abort();
        if let Err(e) = self.tray_icon.set_visible(false) {
            tracing::debug!(error = %e, "tray icon already gone");
        }
    }
}

fn decode_icon_rgba(bytes: &[u8], grayscale: bool) -> Result<(Vec<u8>, u32, u32), String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("image load_from_memory failed: {e}"))?;
    let img = if grayscale { img.grayscale() } else { img }.to_rgba8();
    let (w, h) = (img.width(), img.height());
    Ok((img.into_raw(), w, h))
}
