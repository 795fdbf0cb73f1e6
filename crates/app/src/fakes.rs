//! 测试用的平台替身

use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dockbar_core::{MonitorInfo, Rect};
use dockbar_platform::{ForegroundHook, HookEvent, MonitorManager, WindowHandle, WindowManager};

#[derive(Default)]
pub struct FakeWindow {
    pub frame: Cell<Option<Rect>>,
    pub visible: Cell<bool>,
    pub topmost: Cell<bool>,
    pub excluded: Cell<bool>,
    pub moves: Cell<usize>,
    /// 为 true 时所有修改操作都返回错误
    pub fail: Cell<bool>,
    pub foreground: Cell<Option<WindowHandle>>,
    pub windows: RefCell<HashMap<WindowHandle, (Option<String>, Option<String>, Option<Rect>)>>,
}

impl FakeWindow {
    pub fn add_window(
        &self,
        handle: WindowHandle,
        process: Option<&str>,
        class: Option<&str>,
        frame: Option<Rect>,
    ) {
        self.windows.borrow_mut().insert(
            handle,
            (
                process.map(str::to_string),
                class.map(str::to_string),
                frame,
            ),
        );
    }

    fn check(&self) -> Result<()> {
        if self.fail.get() {
            anyhow::bail!("模拟的系统调用失败");
        }
        Ok(())
    }
}

impl WindowManager for FakeWindow {
    fn get_window_frame(&self, handle: &WindowHandle) -> Option<Rect> {
        self.windows.borrow().get(handle).and_then(|w| w.2)
    }

    fn set_window_bounds(&self, _handle: &WindowHandle, bounds: Rect) -> Result<()> {
        self.check()?;
        self.frame.set(Some(bounds));
        Ok(())
    }

    fn set_window_left(&self, _handle: &WindowHandle, x: f64) -> Result<()> {
        self.check()?;
        if let Some(mut frame) = self.frame.get() {
            frame.x = x;
            self.frame.set(Some(frame));
        }
        self.moves.set(self.moves.get() + 1);
        Ok(())
    }

    fn set_visible(&self, _handle: &WindowHandle, visible: bool) -> Result<()> {
        self.check()?;
        self.visible.set(visible);
        Ok(())
    }

    fn set_topmost(&self, _handle: &WindowHandle, topmost: bool) -> Result<()> {
        self.check()?;
        self.topmost.set(topmost);
        Ok(())
    }

    fn exclude_from_switchers(&self, _handle: &WindowHandle) -> Result<()> {
        self.check()?;
        self.excluded.set(true);
        Ok(())
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground.get()
    }

    fn process_name(&self, handle: &WindowHandle) -> Option<String> {
        self.windows.borrow().get(handle).and_then(|w| w.0.clone())
    }

    fn class_name(&self, handle: &WindowHandle) -> Option<String> {
        self.windows.borrow().get(handle).and_then(|w| w.1.clone())
    }
}

pub struct FakeMonitors {
    monitors: Vec<MonitorInfo>,
    nearest: Option<usize>,
}

impl FakeMonitors {
    pub fn single(bounds: Rect) -> Self {
        Self {
            monitors: vec![MonitorInfo {
                id: 1,
                bounds,
                work_area: bounds,
            }],
            nearest: Some(0),
        }
    }

    /// 所有窗口查询都失败，只能枚举显示器
    pub fn detached(bounds: Vec<Rect>) -> Self {
        Self {
            monitors: bounds
                .into_iter()
                .enumerate()
                .map(|(i, b)| MonitorInfo {
                    id: i as u64,
                    bounds: b,
                    work_area: b,
                })
                .collect(),
            nearest: None,
        }
    }
}

impl MonitorManager for FakeMonitors {
    fn get_monitors(&self) -> Vec<MonitorInfo> {
        self.monitors.clone()
    }

    fn get_monitor_for_window(&self, _handle: &WindowHandle) -> Option<MonitorInfo> {
        self.nearest.map(|i| self.monitors[i].clone())
    }
}

type SharedCallback = Arc<Mutex<Option<Box<dyn Fn(HookEvent) + Send>>>>;

/// 可以从任意线程手动触发通知的钩子
#[derive(Default)]
pub struct FakeHook {
    callback: SharedCallback,
}

impl FakeHook {
    /// 取得一个触发器，可以移动到其他线程
    pub fn trigger(&self) -> impl Fn(HookEvent) + Send + Clone + 'static {
        let callback = self.callback.clone();
        move |event| {
            if let Some(cb) = callback.lock().unwrap().as_ref() {
                cb(event);
            }
        }
    }
}

impl ForegroundHook for FakeHook {
    fn start<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(HookEvent) + Send + 'static,
    {
        *self.callback.lock().unwrap() = Some(Box::new(callback));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        *self.callback.lock().unwrap() = None;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }
}
