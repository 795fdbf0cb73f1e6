use dockbar_core::{MonitorInfo, Rect};

use crate::{MonitorManager, WindowHandle};

use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

/// Windows 显示器管理器（基于 MonitorFromWindow / EnumDisplayMonitors）
pub struct WinMonitorManager;

impl Default for WinMonitorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WinMonitorManager {
    pub fn new() -> Self {
        Self
    }
}

fn rect_from_win(rect: &RECT) -> Rect {
    Rect::from_edges(
        rect.left as f64,
        rect.top as f64,
        rect.right as f64,
        rect.bottom as f64,
    )
}

unsafe fn monitor_info(hmonitor: HMONITOR) -> Option<MonitorInfo> {
    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };

    if GetMonitorInfoW(hmonitor, &mut info).as_bool() {
        Some(MonitorInfo {
            id: hmonitor.0 as u64,
            bounds: rect_from_win(&info.rcMonitor),
            work_area: rect_from_win(&info.rcWork),
        })
    } else {
        None
    }
}

impl MonitorManager for WinMonitorManager {
    fn get_monitors(&self) -> Vec<MonitorInfo> {
        let mut monitors = Vec::new();

        unsafe {
            let data = LPARAM(&mut monitors as *mut Vec<MonitorInfo> as isize);
            let _ = EnumDisplayMonitors(None, None, Some(enum_monitor_proc), data);
        }

        monitors
    }

    fn get_monitor_for_window(&self, handle: &WindowHandle) -> Option<MonitorInfo> {
        unsafe {
            let hmonitor = MonitorFromWindow(handle.hwnd(), MONITOR_DEFAULTTONEAREST);
            if hmonitor.is_invalid() {
                log::debug!("MonitorFromWindow 未返回显示器: {:?}", handle);
                return None;
            }
            monitor_info(hmonitor)
        }
    }

    fn virtual_screen(&self) -> Rect {
        unsafe {
            Rect::new(
                GetSystemMetrics(SM_XVIRTUALSCREEN) as f64,
                GetSystemMetrics(SM_YVIRTUALSCREEN) as f64,
                GetSystemMetrics(SM_CXVIRTUALSCREEN) as f64,
                GetSystemMetrics(SM_CYVIRTUALSCREEN) as f64,
            )
        }
    }
}

unsafe extern "system" fn enum_monitor_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _lprc_clip: *mut RECT,
    data: LPARAM,
) -> BOOL {
    let monitors = &mut *(data.0 as *mut Vec<MonitorInfo>);

    if let Some(info) = monitor_info(hmonitor) {
        monitors.push(info);
    }

    BOOL(1) // 继续枚举
}
