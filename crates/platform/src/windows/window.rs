use anyhow::{Context, Result};
use dockbar_core::Rect;
use std::path::Path;

use crate::{WindowHandle, WindowManager};

use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, SetLastError, RECT, WIN32_ERROR};
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DWMWA_EXTENDED_FRAME_BOUNDS};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::*;

/// Windows 窗口管理器（基于 Win32 API）
pub struct WinWindowManager;

impl Default for WinWindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WinWindowManager {
    pub fn new() -> Self {
        Self
    }
}

impl WindowManager for WinWindowManager {
    fn get_window_frame(&self, handle: &WindowHandle) -> Option<Rect> {
        unsafe {
            let hwnd = handle.hwnd();
            let mut rect = RECT::default();

            // 扩展边框区域不含阴影，更接近窗口的真实可见范围
            let dwm = DwmGetWindowAttribute(
                hwnd,
                DWMWA_EXTENDED_FRAME_BOUNDS,
                &mut rect as *mut RECT as *mut _,
                std::mem::size_of::<RECT>() as u32,
            );
            if dwm.is_err() && GetWindowRect(hwnd, &mut rect).is_err() {
                return None;
            }

            Some(Rect::from_edges(
                rect.left as f64,
                rect.top as f64,
                rect.right as f64,
                rect.bottom as f64,
            ))
        }
    }

    fn set_window_bounds(&self, handle: &WindowHandle, bounds: Rect) -> Result<()> {
        unsafe {
            SetWindowPos(
                handle.hwnd(),
                None,
                bounds.x.round() as i32,
                bounds.y.round() as i32,
                bounds.width.round() as i32,
                bounds.height.round() as i32,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
            .context("SetWindowPos 调整 Dock 位置失败")?;
        }
        Ok(())
    }

    fn set_window_left(&self, handle: &WindowHandle, x: f64) -> Result<()> {
        unsafe {
            let hwnd = handle.hwnd();
            let mut rect = RECT::default();
            GetWindowRect(hwnd, &mut rect).context("GetWindowRect 失败")?;
            SetWindowPos(
                hwnd,
                None,
                x.round() as i32,
                rect.top,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
            .context("SetWindowPos 移动 Dock 失败")?;
        }
        Ok(())
    }

    fn set_visible(&self, handle: &WindowHandle, visible: bool) -> Result<()> {
        unsafe {
            let cmd = if visible { SW_SHOWNOACTIVATE } else { SW_HIDE };
            // 返回值是之前的可见状态，不代表失败
            let _ = ShowWindow(handle.hwnd(), cmd);
        }
        Ok(())
    }

    fn set_topmost(&self, handle: &WindowHandle, topmost: bool) -> Result<()> {
        unsafe {
            let insert_after = if topmost { HWND_TOPMOST } else { HWND_NOTOPMOST };
            SetWindowPos(
                handle.hwnd(),
                insert_after,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
            .context("SetWindowPos 设置置顶失败")?;
        }
        Ok(())
    }

    fn exclude_from_switchers(&self, handle: &WindowHandle) -> Result<()> {
        unsafe {
            let hwnd = handle.hwnd();
            let mut ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE);
            ex_style |= WS_EX_TOOLWINDOW.0 as i32;
            ex_style &= !(WS_EX_APPWINDOW.0 as i32);

            // 返回 0 既可能是失败也可能是旧值为 0，需要结合 GetLastError 判断
            SetLastError(WIN32_ERROR(0));
            if SetWindowLongW(hwnd, GWL_EXSTYLE, ex_style) == 0 {
                let error = windows::core::Error::from_win32();
                if error.code().is_err() {
                    return Err(error).context("SetWindowLongW 设置工具窗口样式失败");
                }
            }
        }
        Ok(())
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                None
            } else {
                Some(WindowHandle::from_hwnd(hwnd))
            }
        }
    }

    fn process_name(&self, handle: &WindowHandle) -> Option<String> {
        unsafe {
            let mut pid = 0u32;
            GetWindowThreadProcessId(handle.hwnd(), Some(&mut pid));
            if pid == 0 {
                return None;
            }

            let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
            let mut buf = [0u16; 512];
            let mut len = buf.len() as u32;
            let queried = QueryFullProcessImageNameW(
                process,
                PROCESS_NAME_WIN32,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            );
            let _ = CloseHandle(process);
            queried.ok()?;

            let image = String::from_utf16_lossy(&buf[..len as usize]);
            Path::new(&image)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        }
    }

    fn class_name(&self, handle: &WindowHandle) -> Option<String> {
        unsafe {
            let mut class_name = [0u16; 256];
            let len = GetClassNameW(handle.hwnd(), &mut class_name);
            if len <= 0 {
                return None;
            }
            Some(String::from_utf16_lossy(&class_name[..len as usize]))
        }
    }
}
