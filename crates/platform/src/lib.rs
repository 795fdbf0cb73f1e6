use anyhow::Result;
use dockbar_core::{MonitorInfo, Rect};

/// 窗口句柄（平台无关的包装，Windows 上为 HWND 的数值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// 前台窗口相关的系统通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// 前台窗口切换
    ForegroundChanged,
    /// 前台窗口位置或尺寸变化
    ForegroundMoved,
}

/// 前台窗口通知钩子 trait
///
/// 回调可能在任意线程被调用，实现方只负责转发通知，不做任何状态修改。
pub trait ForegroundHook {
    /// 订阅前台切换和前台窗口位置变化通知
    fn start<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(HookEvent) + Send + 'static;

    /// 取消订阅
    fn stop(&mut self) -> Result<()>;

    /// 钩子是否处于活跃状态
    fn is_active(&self) -> bool;
}

/// 窗口管理 trait
pub trait WindowManager {
    /// 获取窗口的可见边界（优先扩展边框区域，失败时退回窗口矩形）
    fn get_window_frame(&self, handle: &WindowHandle) -> Option<Rect>;

    /// 设置窗口位置和尺寸，不改变 Z 序也不激活
    fn set_window_bounds(&self, handle: &WindowHandle, bounds: Rect) -> Result<()>;

    /// 只修改窗口水平位置
    fn set_window_left(&self, handle: &WindowHandle, x: f64) -> Result<()>;

    /// 显示（不激活）或隐藏窗口
    fn set_visible(&self, handle: &WindowHandle, visible: bool) -> Result<()>;

    /// 设置或取消置顶，不移动、不缩放、不抢焦点
    fn set_topmost(&self, handle: &WindowHandle, topmost: bool) -> Result<()>;

    /// 让窗口不出现在任务切换列表中
    fn exclude_from_switchers(&self, handle: &WindowHandle) -> Result<()>;

    /// 当前前台窗口
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// 窗口所属进程名（不含扩展名）
    fn process_name(&self, handle: &WindowHandle) -> Option<String>;

    /// 窗口类名
    fn class_name(&self, handle: &WindowHandle) -> Option<String>;
}

/// 显示器管理 trait
pub trait MonitorManager {
    /// 获取所有显示器信息
    fn get_monitors(&self) -> Vec<MonitorInfo>;

    /// 获取离窗口最近的显示器
    fn get_monitor_for_window(&self, handle: &WindowHandle) -> Option<MonitorInfo>;

    /// 虚拟屏幕（所有显示器的外接矩形）
    fn virtual_screen(&self) -> Rect {
        self.get_monitors()
            .iter()
            .map(|m| m.bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0))
    }

    /// 窗口所在显示器的边界，查询失败时退回虚拟屏幕
    ///
    /// 每次调整位置都必须重新调用，显示器可能随时增减。
    fn resolve(&self, handle: &WindowHandle) -> Rect {
        match self.get_monitor_for_window(handle) {
            Some(monitor) => monitor.bounds,
            None => {
                let fallback = self.virtual_screen();
                log::warn!("无法获取窗口所在显示器，使用虚拟屏幕 {:?}", fallback);
                fallback
            }
        }
    }
}

/// 开机自启动 trait
pub trait AutoStart {
    /// 是否已启用自启动
    fn is_enabled(&self) -> bool;

    /// 设置自启动状态
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

// 平台实现模块
#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub fn create_platform() -> windows::WinPlatform {
    windows::WinPlatform::new()
}
