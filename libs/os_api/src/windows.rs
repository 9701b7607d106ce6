use std::ffi::c_void;
use std::mem::size_of;
use std::os::windows::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::ptr::null_mut;

use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND, POINT, RECT};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC,
    DeleteObject, GetDIBits, GetMonitorInfoW, GetObjectW, HBITMAP, HGDIOBJ, MONITOR_DEFAULTTONEAREST,
    MONITORINFO, MonitorFromPoint,
};
use windows::Win32::Storage::FileSystem::{FILE_FLAGS_AND_ATTRIBUTES, WIN32_FIND_DATAW};
use windows::Win32::System::Com::{
    CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
    CoUninitialize, IPersistFile, STGM_READ,
};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Environment::ExpandEnvironmentStringsW;
use windows::Win32::System::Threading::{
    AttachThreadInput, GetCurrentThreadId, OpenProcess, PROCESS_ACCESS_RIGHTS, PROCESS_TERMINATE,
    TerminateProcess,
};
use windows::Win32::UI::HiDpi::{GetDpiForMonitor, MDT_EFFECTIVE_DPI};
use windows::Win32::UI::Shell::{
    ABE_BOTTOM, ABE_LEFT, ABE_RIGHT, ABE_TOP, ABM_GETSTATE, ABM_GETTASKBARPOS, ABS_AUTOHIDE,
    APPBARDATA, IShellLinkW, SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHAppBarMessage,
    SHGetFileInfoW, SLGP_UNCPRIORITY, SLR_NO_UI, ShellExecuteW, ShellLink,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BringWindowToTop, DestroyIcon, FindWindowW, GetCursorPos, GetForegroundWindow, GetIconInfo,
    GetSystemMetrics, GetWindowRect, GetWindowThreadProcessId, HICON, ICONINFO, IsIconic,
    SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SW_HIDE,
    SW_RESTORE, SW_SHOW, SW_SHOWNORMAL, SWP_NOACTIVATE, SWP_NOSIZE, SWP_NOZORDER,
    SetForegroundWindow, SetWindowPos, ShowWindow,
};
use windows::core::{Interface, PCWSTR, w};

use winreg::RegKey;
use winreg::enums::*;

use crate::{AppBarEdge, MonitorInfo, OsError, Rect, ShortcutTarget, TaskbarState};

const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";
const RUN_VALUE: &str = "AppGroup";

// ---- tiny RAII helpers ----
struct HandleGuard(HANDLE);
impl Drop for HandleGuard {
    fn drop(&mut self) {
        unsafe {
            if !self.0.is_invalid() {
                let _ = CloseHandle(self.0);
            }
        }
    }
}

struct ComGuard;
impl ComGuard {
    fn init() -> Result<Self, OsError> {
        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(OsError::win("CoInitializeEx"))?;
        }
        Ok(Self)
    }
}
impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe { CoUninitialize() }
    }
}

struct IconGuard(HICON);
impl Drop for IconGuard {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyIcon(self.0);
        }
    }
}

struct BitmapGuard(HBITMAP);
impl Drop for BitmapGuard {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = DeleteObject(HGDIOBJ(self.0.0));
            }
        }
    }
}

fn hwnd(raw: isize) -> HWND {
    HWND(raw as *mut c_void)
}

fn rect(r: RECT) -> Rect {
    Rect {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

fn to_wide_z(s: &std::ffi::OsStr) -> Vec<u16> {
    s.encode_wide().chain([0]).collect()
}

fn to_wide_z_str(s: &str) -> Vec<u16> {
    std::ffi::OsStr::new(s).encode_wide().chain([0]).collect()
}

fn from_wide_z(buf: &[u16]) -> String {
    let n = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..n])
}

// Windows CreateProcess quoting rules: minimal implementation good enough for args/paths.
fn quote_arg_windows(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }
    let needs_quotes = arg
        .bytes()
        .any(|b| b == b' ' || b == b'\t' || b == b'\n' || b == b'\r');
    if !needs_quotes && !arg.contains('"') {
        return arg.to_string();
    }

    let mut out = String::from('"');
    let mut backslashes = 0usize;
    for ch in arg.chars() {
        match ch {
            '\\' => backslashes += 1,
            '"' => {
                out.push_str(&"\\".repeat(backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.push_str(&"\\".repeat(backslashes));
                out.push(ch);
                backslashes = 0;
            }
        }
    }
    out.push_str(&"\\".repeat(backslashes * 2));
    out.push('"');
    out
}

fn expand_env(s: &str) -> String {
    let wide = to_wide_z_str(s);
    unsafe {
        let needed = ExpandEnvironmentStringsW(PCWSTR(wide.as_ptr()), None);
        if needed == 0 {
            return s.to_string();
        }
        let mut buf = vec![0u16; needed as usize];
        if ExpandEnvironmentStringsW(PCWSTR(wide.as_ptr()), Some(&mut buf)) == 0 {
            return s.to_string();
        }
        from_wide_z(&buf)
    }
}

pub struct OS;

impl OS {
    fn open_process(pid: u32, access: PROCESS_ACCESS_RIGHTS) -> Result<HANDLE, OsError> {
        unsafe { OpenProcess(access, false, pid).map_err(OsError::win(format!("OpenProcess({pid})"))) }
    }

    // ---- windows ----

    /// Top-level window whose title is exactly `title`, hidden ones included.
    pub fn find_window_by_title(title: &str) -> Option<isize> {
        let wide = to_wide_z_str(title);
        unsafe {
            FindWindowW(PCWSTR::null(), PCWSTR(wide.as_ptr()))
                .ok()
                .filter(|h| !h.is_invalid())
                .map(|h| h.0 as isize)
        }
    }

    /// Brings a window to the foreground from a process that does not own
    /// the current foreground window. The calling thread's input queue is
    /// attached to the foreground thread for the duration of the call.
    pub fn force_foreground(raw: isize) -> Result<(), OsError> {
        let target = hwnd(raw);
        unsafe {
            let foreground = GetForegroundWindow();
            let fg_thread = GetWindowThreadProcessId(foreground, None);
            let this_thread = GetCurrentThreadId();
            let attached = fg_thread != 0
                && fg_thread != this_thread
                && AttachThreadInput(this_thread, fg_thread, true).as_bool();

            let show = if IsIconic(target).as_bool() { SW_RESTORE } else { SW_SHOW };
            let _ = ShowWindow(target, show);
            let _ = BringWindowToTop(target);
            let focused = SetForegroundWindow(target).as_bool();

            if attached {
                let _ = AttachThreadInput(this_thread, fg_thread, false);
            }

            if focused {
                Ok(())
            } else {
                Err(OsError::Msg(format!("SetForegroundWindow refused window {raw:#x}")))
            }
        }
    }

    pub fn show_window(raw: isize) -> Result<(), OsError> {
        unsafe {
            let _ = ShowWindow(hwnd(raw), SW_SHOW);
        }
        Ok(())
    }

    pub fn hide_window(raw: isize) -> Result<(), OsError> {
        unsafe {
            let _ = ShowWindow(hwnd(raw), SW_HIDE);
        }
        Ok(())
    }

    pub fn move_window(raw: isize, x: i32, y: i32) -> Result<(), OsError> {
        unsafe {
            SetWindowPos(hwnd(raw), None, x, y, 0, 0, SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE)
                .map_err(OsError::win("SetWindowPos"))
        }
    }

    pub fn window_rect(raw: isize) -> Option<Rect> {
        let mut r = RECT::default();
        unsafe { GetWindowRect(hwnd(raw), &mut r).ok()? };
        Some(rect(r))
    }

    pub fn window_process_id(raw: isize) -> Option<u32> {
        let mut pid = 0u32;
        unsafe {
            GetWindowThreadProcessId(hwnd(raw), Some(&mut pid));
        }
        (pid != 0).then_some(pid)
    }

    // ---- screen geometry ----

    pub fn cursor_position() -> Option<(i32, i32)> {
        let mut p = POINT::default();
        unsafe { GetCursorPos(&mut p).ok()? };
        Some((p.x, p.y))
    }

    /// Monitor nearest to the point, with its work area and effective DPI.
    pub fn monitor_at(x: i32, y: i32) -> Option<MonitorInfo> {
        unsafe {
            let monitor = MonitorFromPoint(POINT { x, y }, MONITOR_DEFAULTTONEAREST);
            if monitor.is_invalid() {
                return None;
            }

            let mut info = MONITORINFO {
                cbSize: size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if !GetMonitorInfoW(monitor, &mut info).as_bool() {
                return None;
            }

            let (mut dpi_x, mut dpi_y) = (96u32, 96u32);
            if GetDpiForMonitor(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y).is_err() {
                dpi_x = 96;
            }

            Some(MonitorInfo {
                monitor: rect(info.rcMonitor),
                work: rect(info.rcWork),
                dpi: dpi_x,
            })
        }
    }

    /// Bounding rectangle of all monitors.
    pub fn virtual_screen() -> Rect {
        unsafe {
            let left = GetSystemMetrics(SM_XVIRTUALSCREEN);
            let top = GetSystemMetrics(SM_YVIRTUALSCREEN);
            Rect {
                left,
                top,
                right: left + GetSystemMetrics(SM_CXVIRTUALSCREEN),
                bottom: top + GetSystemMetrics(SM_CYVIRTUALSCREEN),
            }
        }
    }

    /// Docked edge and auto-hide flag of the primary taskbar.
    pub fn taskbar_state() -> TaskbarState {
        unsafe {
            let mut data = APPBARDATA {
                cbSize: size_of::<APPBARDATA>() as u32,
                ..Default::default()
            };
            let state = SHAppBarMessage(ABM_GETSTATE, &mut data) as u32;
            let edge = if SHAppBarMessage(ABM_GETTASKBARPOS, &mut data) != 0 {
                match data.uEdge {
                    e if e == ABE_LEFT => Some(AppBarEdge::Left),
                    e if e == ABE_TOP => Some(AppBarEdge::Top),
                    e if e == ABE_RIGHT => Some(AppBarEdge::Right),
                    e if e == ABE_BOTTOM => Some(AppBarEdge::Bottom),
                    _ => None,
                }
            } else {
                None
            };
            TaskbarState {
                edge,
                auto_hide: state & ABS_AUTOHIDE != 0,
            }
        }
    }

    // ---- processes ----

    pub fn terminate_process(pid: u32) -> Result<(), OsError> {
        let handle = Self::open_process(pid, PROCESS_TERMINATE)?;
        let _hg = HandleGuard(handle);
        unsafe { TerminateProcess(handle, 0).map_err(OsError::win(format!("TerminateProcess({pid})"))) }
    }

    /// All process IDs whose executable file name equals `file_name`
    /// (case-insensitive, extension included).
    pub fn find_pids_by_image_name(file_name: &str) -> Vec<u32> {
        let mut pids = Vec::new();
        if file_name.is_empty() {
            return pids;
        }
        unsafe {
            let snap = match CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) {
                Ok(s) => s,
                Err(_) => return pids,
            };
            let _hg = HandleGuard(snap);

            let mut pe: PROCESSENTRY32W = std::mem::zeroed();
            pe.dwSize = size_of::<PROCESSENTRY32W>() as u32;

            if Process32FirstW(snap, &mut pe).is_err() {
                return pids;
            }

            loop {
                if from_wide_z(&pe.szExeFile).eq_ignore_ascii_case(file_name) {
                    pids.push(pe.th32ProcessID);
                }
                if Process32NextW(snap, &mut pe).is_err() {
                    break;
                }
            }
        }
        pids
    }

    /// Opens `target` through the shell so executables, shortcuts and URL
    /// files all start the way Explorer would start them.
    pub fn shell_execute(target: &Path, args: &[String]) -> Result<(), OsError> {
        let file = to_wide_z(target.as_os_str());
        let params = args.iter().map(|a| quote_arg_windows(a)).collect::<Vec<_>>().join(" ");
        let params = to_wide_z_str(&params);
        let dir = target.parent().map(|d| to_wide_z(d.as_os_str()));
        let dir_ptr = dir.as_ref().map_or(PCWSTR::null(), |d| PCWSTR(d.as_ptr()));

        let result = unsafe {
            ShellExecuteW(
                None,
                w!("open"),
                PCWSTR(file.as_ptr()),
                PCWSTR(params.as_ptr()),
                dir_ptr,
                SW_SHOWNORMAL,
            )
        };
        // Values above 32 mean success.
        if result.0 as isize > 32 {
            Ok(())
        } else {
            Err(OsError::Msg(format!(
                "ShellExecute {} failed with code {}",
                target.display(),
                result.0 as isize
            )))
        }
    }

    pub fn spawn_detached(exe: &Path, args: &[String]) -> Result<u32, OsError> {
        let child = Command::new(exe).args(args).spawn()?;
        Ok(child.id())
    }

    // ---- shell links ----

    pub fn create_shortcut(link: &Path, target: &Path, args: &str, icon: Option<&Path>) -> Result<PathBuf, OsError> {
        let _com = ComGuard::init()?;
        unsafe {
            let shell_link: IShellLinkW =
                CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER).map_err(OsError::win("CoCreateInstance(ShellLink)"))?;

            let target_w = to_wide_z(target.as_os_str());
            shell_link
                .SetPath(PCWSTR(target_w.as_ptr()))
                .map_err(OsError::win("IShellLinkW::SetPath"))?;

            let args_w = to_wide_z_str(args);
            shell_link
                .SetArguments(PCWSTR(args_w.as_ptr()))
                .map_err(OsError::win("IShellLinkW::SetArguments"))?;

            if let Some(dir) = target.parent() {
                let dir_w = to_wide_z(dir.as_os_str());
                shell_link
                    .SetWorkingDirectory(PCWSTR(dir_w.as_ptr()))
                    .map_err(OsError::win("IShellLinkW::SetWorkingDirectory"))?;
            }

            if let Some(icon) = icon {
                let icon_w = to_wide_z(icon.as_os_str());
                shell_link
                    .SetIconLocation(PCWSTR(icon_w.as_ptr()), 0)
                    .map_err(OsError::win("IShellLinkW::SetIconLocation"))?;
            }

            let persist: IPersistFile = shell_link.cast().map_err(OsError::win("IPersistFile cast"))?;
            let link_w = to_wide_z(link.as_os_str());
            persist
                .Save(PCWSTR(link_w.as_ptr()), true)
                .map_err(OsError::win(format!("saving {}", link.display())))?;
        }
        Ok(link.to_path_buf())
    }

    pub fn resolve_shortcut(link: &Path) -> Result<ShortcutTarget, OsError> {
        let _com = ComGuard::init()?;
        unsafe {
            let shell_link: IShellLinkW =
                CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER).map_err(OsError::win("CoCreateInstance(ShellLink)"))?;
            let persist: IPersistFile = shell_link.cast().map_err(OsError::win("IPersistFile cast"))?;

            let wide = to_wide_z(link.as_os_str());
            persist
                .Load(PCWSTR(wide.as_ptr()), STGM_READ)
                .map_err(OsError::win(format!("loading {}", link.display())))?;
            let _ = shell_link.Resolve(HWND(null_mut()), SLR_NO_UI.0 as u32);

            let mut wbuf = [0u16; 32768];
            let mut find = WIN32_FIND_DATAW::default();
            shell_link
                .GetPath(&mut wbuf, &mut find as *mut _, SLGP_UNCPRIORITY.0 as u32)
                .map_err(OsError::win("IShellLinkW::GetPath"))?;
            let target = PathBuf::from(expand_env(&from_wide_z(&wbuf)));

            let mut abuf = [0u16; 32768];
            shell_link
                .GetArguments(&mut abuf)
                .map_err(OsError::win("IShellLinkW::GetArguments"))?;
            let args = expand_env(&from_wide_z(&abuf));

            let mut ibuf = [0u16; 1024];
            let mut index = 0i32;
            let icon_location = shell_link
                .GetIconLocation(&mut ibuf, &mut index)
                .ok()
                .map(|_| expand_env(&from_wide_z(&ibuf)))
                .filter(|s| !s.is_empty())
                .map(PathBuf::from);

            Ok(ShortcutTarget {
                target,
                args,
                icon_location,
            })
        }
    }

    // ---- icons ----

    /// Large shell icon of `source` as straight RGBA.
    pub fn extract_icon_rgba(source: &Path) -> Result<(Vec<u8>, u32, u32), OsError> {
        let _com = ComGuard::init()?;
        let wide = to_wide_z(source.as_os_str());
        unsafe {
            let mut info = SHFILEINFOW::default();
            let ok = SHGetFileInfoW(
                PCWSTR(wide.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&mut info),
                size_of::<SHFILEINFOW>() as u32,
                SHGFI_ICON | SHGFI_LARGEICON,
            );
            if ok == 0 || info.hIcon.is_invalid() {
                return Err(OsError::Msg(format!("no shell icon for {}", source.display())));
            }
            let _icon = IconGuard(info.hIcon);

            let mut icon_info = ICONINFO::default();
            GetIconInfo(info.hIcon, &mut icon_info).map_err(OsError::win("GetIconInfo"))?;
            let _color = BitmapGuard(icon_info.hbmColor);
            let _mask = BitmapGuard(icon_info.hbmMask);
            if icon_info.hbmColor.is_invalid() {
                return Err(OsError::Msg("monochrome icons are not supported".into()));
            }

            let mut bitmap = BITMAP::default();
            if GetObjectW(
                HGDIOBJ(icon_info.hbmColor.0),
                size_of::<BITMAP>() as i32,
                Some(&mut bitmap as *mut _ as *mut c_void),
            ) == 0
            {
                return Err(OsError::Msg("GetObjectW failed for icon bitmap".into()));
            }
            let (width, height) = (bitmap.bmWidth, bitmap.bmHeight);

            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut pixels = vec![0u8; (width * height * 4) as usize];
            let dc = CreateCompatibleDC(None);
            let lines = GetDIBits(
                dc,
                icon_info.hbmColor,
                0,
                height as u32,
                Some(pixels.as_mut_ptr() as *mut c_void),
                &mut bmi,
                DIB_RGB_COLORS,
            );
            let _ = DeleteDC(dc);
            if lines == 0 {
                return Err(OsError::Msg("GetDIBits failed for icon bitmap".into()));
            }

            // BGRA -> RGBA; icons without an alpha channel are fully opaque.
            let has_alpha = pixels.chunks_exact(4).any(|px| px[3] != 0);
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
                if !has_alpha {
                    px[3] = 255;
                }
            }

            Ok((pixels, width as u32, height as u32))
        }
    }

    // ---- autostart ----

    /// Adds or removes `"<exe>" --silent` under the per-user Run key.
    pub fn set_run_at_startup(enabled: bool, exe: &Path) -> Result<(), OsError> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (run, _) = hkcu.create_subkey(RUN_KEY)?;
        if enabled {
            run.set_value(RUN_VALUE, &format!("\"{}\" --silent", exe.display()))?;
        } else {
            match run.delete_value(RUN_VALUE) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(enabled, "run-at-startup updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_follows_command_line_rules() {
        assert_eq!(quote_arg_windows("plain"), "plain");
        assert_eq!(quote_arg_windows("with space"), "\"with space\"");
        assert_eq!(quote_arg_windows(r"C:\dir with space\"), "\"C:\\dir with space\\\\\"");
        assert_eq!(quote_arg_windows(""), "\"\"");
    }
}
