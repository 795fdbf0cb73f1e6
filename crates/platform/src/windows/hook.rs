use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{ForegroundHook, HookEvent};

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, EVENT_OBJECT_LOCATIONCHANGE, EVENT_SYSTEM_FOREGROUND, OBJID_WINDOW,
    WINEVENT_OUTOFCONTEXT,
};

type HookCallback = Box<dyn Fn(HookEvent) + Send>;

// WinEvent 回调没有用户数据参数，只能通过全局表转发
static CALLBACK: Mutex<Option<HookCallback>> = Mutex::new(None);

/// 前台窗口通知钩子（基于 SetWinEventHook）
pub struct WinForegroundHook {
    handles: Vec<HWINEVENTHOOK>,
    active: Arc<AtomicBool>,
}

impl Default for WinForegroundHook {
    fn default() -> Self {
        Self::new()
    }
}

impl WinForegroundHook {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    unsafe fn install(event: u32) -> Result<HWINEVENTHOOK> {
        let hook = SetWinEventHook(
            event,
            event,
            None,
            Some(win_event_proc),
            0,
            0,
            WINEVENT_OUTOFCONTEXT,
        );
        if hook.is_invalid() {
            anyhow::bail!("SetWinEventHook 安装失败: 0x{:04X}", event);
        }
        Ok(hook)
    }
}

impl ForegroundHook for WinForegroundHook {
    fn start<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(HookEvent) + Send + 'static,
    {
        if self.is_active() {
            self.stop()?;
        }

        if let Ok(mut slot) = CALLBACK.lock() {
            *slot = Some(Box::new(callback));
        }

        unsafe {
            for event in [EVENT_SYSTEM_FOREGROUND, EVENT_OBJECT_LOCATIONCHANGE] {
                match Self::install(event) {
                    Ok(hook) => self.handles.push(hook),
                    Err(e) => {
                        self.stop()?;
                        return Err(e);
                    }
                }
            }
        }

        self.active.store(true, Ordering::SeqCst);
        log::info!("前台窗口钩子已安装");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        unsafe {
            for hook in self.handles.drain(..) {
                let _ = UnhookWinEvent(hook);
            }
        }
        if let Ok(mut slot) = CALLBACK.lock() {
            *slot = None;
        }
        if self.active.swap(false, Ordering::SeqCst) {
            log::info!("前台窗口钩子已卸载");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for WinForegroundHook {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// WinEvent 回调：只转发前台切换，以及前台窗口本身的位置变化
unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    _id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    let hook_event = if event == EVENT_SYSTEM_FOREGROUND {
        HookEvent::ForegroundChanged
    } else if event == EVENT_OBJECT_LOCATIONCHANGE {
        if id_object != OBJID_WINDOW.0 {
            return;
        }
        let foreground = GetForegroundWindow();
        if foreground.0.is_null() || hwnd != foreground {
            return;
        }
        HookEvent::ForegroundMoved
    } else {
        return;
    };

    if let Ok(slot) = CALLBACK.lock() {
        if let Some(ref callback) = *slot {
            callback(hook_event);
        }
    }
}
