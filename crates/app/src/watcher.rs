use anyhow::Result;

use dockbar_core::fullscreen::ForegroundSample;
use dockbar_core::schedule::CheckScheduler;
use dockbar_platform::{ForegroundHook, MonitorManager, WindowManager};

use crate::engine::DockEngine;

/// 全屏检测
///
/// 钩子回调只负责合并通知并把一次检查投递回 UI 线程，真正的判断在
/// [`FullscreenWatcher::evaluate`] 中完成，结果交给状态机处理。
pub struct FullscreenWatcher<H> {
    hook: H,
    scheduler: CheckScheduler,
}

impl<H: ForegroundHook> FullscreenWatcher<H> {
    pub fn new(hook: H) -> Self {
        Self {
            hook,
            scheduler: CheckScheduler::new(),
        }
    }

    /// 订阅系统通知；`dispatch` 会在通知线程上调用，只能做投递
    pub fn start<D>(&mut self, dispatch: D) -> Result<()>
    where
        D: Fn() + Send + 'static,
    {
        let scheduler = self.scheduler.clone();
        self.hook.start(move |event| {
            if scheduler.try_schedule() {
                log::trace!("调度全屏检查: {:?}", event);
                dispatch();
            }
        })
    }

    pub fn stop(&mut self) -> Result<()> {
        self.scheduler.take();
        self.hook.stop()
    }

    pub fn is_active(&self) -> bool {
        self.hook.is_active()
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// 检查前台窗口并把结果交给状态机，返回是否全屏
    pub fn apply<W, M>(&self, engine: &mut DockEngine<W, M>) -> bool
    where
        W: WindowManager,
        M: MonitorManager,
    {
        let fullscreen = self.evaluate(engine.window(), engine.monitors());
        engine.set_suppressed(fullscreen);
        fullscreen
    }

    /// 投递的检查丢失时补做一次，否则合并标记会一直占用，后续通知全部被丢弃
    pub fn recover<W, M>(&self, engine: &mut DockEngine<W, M>) -> bool
    where
        W: WindowManager,
        M: MonitorManager,
    {
        if !self.is_pending() {
            return false;
        }
        log::debug!("补做未处理的全屏检查");
        self.apply(engine);
        true
    }

    /// 在 UI 线程上判断当前前台窗口是否全屏
    pub fn evaluate<W, M>(&self, windows: &W, monitors: &M) -> bool
    where
        W: WindowManager,
        M: MonitorManager,
    {
        self.scheduler.take();

        let Some(handle) = windows.foreground_window() else {
            return false;
        };

        let mut sample = ForegroundSample {
            handle: handle.0,
            process_name: windows.process_name(&handle),
            class_name: windows.class_name(&handle),
            bounds: None,
        };
        if sample.is_ignored() {
            log::debug!(
                "忽略系统界面: {:?} / {:?}",
                sample.process_name,
                sample.class_name
            );
            return false;
        }

        sample.bounds = windows.get_window_frame(&handle);
        let monitor = monitors.get_monitor_for_window(&handle).map(|m| m.bounds);
        let fullscreen = sample.suppresses(monitor.as_ref());
        if fullscreen {
            log::debug!("前台窗口全屏: {:?}", sample);
        }
        fullscreen
    }
}
