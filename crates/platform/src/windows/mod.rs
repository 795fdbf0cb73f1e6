pub mod autostart;
pub mod hook;
pub mod monitor;
pub mod window;

use windows::Win32::Foundation::HWND;

use crate::WindowHandle;

impl WindowHandle {
    pub fn from_hwnd(hwnd: HWND) -> Self {
        Self(hwnd.0 as isize)
    }

    pub fn hwnd(&self) -> HWND {
        HWND(self.0 as *mut _)
    }
}

/// Windows 平台实现集合
pub struct WinPlatform {
    pub hook: hook::WinForegroundHook,
    pub window_manager: window::WinWindowManager,
    pub monitor_manager: monitor::WinMonitorManager,
    pub auto_start: autostart::WinAutoStart,
}

impl Default for WinPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl WinPlatform {
    pub fn new() -> Self {
        Self {
            hook: hook::WinForegroundHook::new(),
            window_manager: window::WinWindowManager::new(),
            monitor_manager: monitor::WinMonitorManager::new(),
            auto_start: autostart::WinAutoStart::new(),
        }
    }
}
