use std::time::{Duration, Instant};

use dockbar_core::animation::Animator;
use dockbar_core::config::DockConfig;
use dockbar_core::geometry::{DockGeometry, EDIT_MODE_MIN_WIDTH};
use dockbar_core::{DockSide, Rect};
use dockbar_platform::{MonitorManager, WindowHandle, WindowManager};

/// 托盘“显示”之后至少保持显示的时间
pub const REVEAL_HOLD: Duration = Duration::from_secs(3);

/// Dock 显隐状态机
///
/// 持有逻辑上的 Hidden/Shown 状态以及动画、编辑模式、全屏抑制三个正交标记，
/// 所有窗口几何修改都从这里发出。全部方法只在 UI 线程调用，时间由调用方传入。
pub struct DockEngine<W, M> {
    window: W,
    monitors: M,
    handle: WindowHandle,
    geometry: DockGeometry,
    configured_width: f64,
    auto_hide_delay: Duration,
    animation: Duration,
    hidden: bool,
    edit_mode: bool,
    suppressed: bool,
    animator: Animator,
    hide_deadline: Option<Instant>,
    left: f64,
    completed: u64,
}

impl<W: WindowManager, M: MonitorManager> DockEngine<W, M> {
    pub fn new(window: W, monitors: M, handle: WindowHandle, config: &DockConfig) -> Self {
        let geometry = config.geometry();
        Self {
            window,
            monitors,
            handle,
            geometry,
            configured_width: geometry.width,
            auto_hide_delay: config.auto_hide_delay(),
            animation: config.hide_animation(),
            hidden: false,
            edit_mode: false,
            suppressed: false,
            animator: Animator::new(),
            hide_deadline: None,
            left: 0.0,
            completed: 0,
        }
    }

    /// 窗口创建后调用：从任务切换列表中移除、贴边显示并置顶；
    /// 已处于全屏抑制时保持不可见
    pub fn start(&mut self) {
        if let Err(e) = self.window.exclude_from_switchers(&self.handle) {
            log::warn!("设置工具窗口样式失败: {:#}", e);
        }
        self.align(true);
        if !self.suppressed {
            if let Err(e) = self.window.set_visible(&self.handle, true) {
                log::warn!("显示 Dock 窗口失败: {:#}", e);
            }
            self.reassert_topmost();
        }
        log::info!(
            "Dock 已就绪: {:?} 侧，宽度 {:.0}",
            self.geometry.side,
            self.geometry.width
        );
    }

    pub fn pointer_enter(&mut self, now: Instant) {
        if self.suppressed {
            return;
        }
        self.stop_hide_timer();
        self.request_shown(now);
    }

    /// 不依赖指针直接显示，随后照常自动隐藏
    pub fn reveal(&mut self, now: Instant) {
        if self.suppressed {
            return;
        }
        self.stop_hide_timer();
        self.request_shown(now);
        if !self.edit_mode {
            self.hide_deadline = Some(now + self.auto_hide_delay.max(REVEAL_HOLD));
        }
    }

    pub fn pointer_move(&mut self, now: Instant) {
        if self.hidden {
            self.pointer_enter(now);
        }
    }

    pub fn pointer_leave(&mut self, now: Instant) {
        if self.edit_mode {
            return;
        }
        self.start_hide_timer(now);
    }

    /// 推进自动隐藏计时器和动画
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.hide_deadline {
            if now >= deadline {
                self.hide_deadline = None;
                self.request_hidden(now);
            }
        }
        self.step_animation(now);
    }

    /// 请求显示；已显示且没有动画时不做任何事
    pub fn request_shown(&mut self, now: Instant) -> bool {
        if !self.hidden && !self.animator.is_animating() {
            return false;
        }
        self.hidden = false;
        let target = self.geometry.shown_left(&self.bounds());
        self.animate(target, now);
        true
    }

    /// 请求隐藏；编辑模式下或已隐藏且没有动画时不做任何事
    pub fn request_hidden(&mut self, now: Instant) -> bool {
        if self.edit_mode {
            return false;
        }
        if self.hidden && !self.animator.is_animating() {
            return false;
        }
        self.hidden = true;
        let target = self.geometry.hidden_left(&self.bounds());
        self.animate(target, now);
        true
    }

    pub fn set_edit_mode(&mut self, enabled: bool, now: Instant) {
        if self.edit_mode == enabled {
            return;
        }
        self.edit_mode = enabled;

        if enabled {
            self.stop_hide_timer();
            self.geometry.width = self.configured_width.max(EDIT_MODE_MIN_WIDTH);
            self.hidden = false;
            self.align(true);
        } else {
            self.geometry.width = self.configured_width;
            self.align(!self.hidden);
            self.start_hide_timer(now);
        }
        log::info!("编辑模式: {}", if enabled { "开启" } else { "关闭" });
    }

    /// 全屏抑制：隐藏窗口并取消置顶，不改变逻辑上的显隐状态
    pub fn set_suppressed(&mut self, active: bool) {
        if self.suppressed == active {
            return;
        }
        self.suppressed = active;

        if active {
            if let Err(e) = self.window.set_visible(&self.handle, false) {
                log::warn!("隐藏 Dock 窗口失败: {:#}", e);
            }
            if let Err(e) = self.window.set_topmost(&self.handle, false) {
                log::warn!("取消置顶失败: {:#}", e);
            }
            log::info!("检测到全屏窗口，Dock 已让位");
        } else {
            if let Err(e) = self.window.set_visible(&self.handle, true) {
                log::warn!("恢复 Dock 窗口失败: {:#}", e);
            }
            self.align(!self.hidden);
            self.reassert_topmost();
            log::info!("全屏窗口已退出，Dock 已恢复");
        }
    }

    /// 窗口激活状态变化时重新置顶
    pub fn on_activation_changed(&mut self) {
        if !self.suppressed {
            self.reassert_topmost();
        }
    }

    pub fn set_side(&mut self, side: DockSide) {
        if self.geometry.side == side {
            return;
        }
        self.geometry.side = side;
        self.align(!self.hidden);
    }

    pub fn toggle_side(&mut self) -> DockSide {
        self.set_side(self.geometry.side.toggled());
        self.geometry.side
    }

    /// 应用一份新的配置快照
    pub fn apply_config(&mut self, config: &DockConfig) {
        let geometry = config.geometry();
        self.geometry.side = geometry.side;
        self.configured_width = geometry.width;
        self.geometry.width = if self.edit_mode {
            geometry.width.max(EDIT_MODE_MIN_WIDTH)
        } else {
            geometry.width
        };
        self.auto_hide_delay = config.auto_hide_delay();
        self.animation = config.hide_animation();
        self.align(!self.hidden);
    }

    /// 按当前显示器重新贴边，打断正在进行的动画
    pub fn align(&mut self, shown: bool) {
        self.animator.cancel();
        let bounds = self.bounds();
        let frame = self.geometry.frame(&bounds, shown);
        self.left = frame.x;
        if let Err(e) = self.window.set_window_bounds(&self.handle, frame) {
            log::warn!("调整 Dock 位置失败: {:#}", e);
        }
    }

    /// Dock 所在显示器的边界，每次重新查询
    pub fn bounds(&self) -> Rect {
        self.monitors.resolve(&self.handle)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn side(&self) -> DockSide {
        self.geometry.side
    }

    pub fn width(&self) -> f64 {
        self.geometry.width
    }

    /// 配置中的宽度（编辑模式加宽之前）
    pub fn configured_width(&self) -> f64 {
        self.configured_width
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_deadline
    }

    /// 是否需要继续按帧调用 [`DockEngine::tick`]
    pub fn needs_tick(&self) -> bool {
        self.animator.is_animating() || self.hide_deadline.is_some()
    }

    pub fn transitions_started(&self) -> u64 {
        self.animator.started()
    }

    pub fn transitions_completed(&self) -> u64 {
        self.completed
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn monitors(&self) -> &M {
        &self.monitors
    }

    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn start_hide_timer(&mut self, now: Instant) {
        if self.edit_mode {
            return;
        }
        self.hide_deadline = None;
        if self.auto_hide_delay.is_zero() {
            self.request_hidden(now);
            return;
        }
        self.hide_deadline = Some(now + self.auto_hide_delay);
    }

    fn stop_hide_timer(&mut self) {
        self.hide_deadline = None;
    }

    fn animate(&mut self, target: f64, now: Instant) {
        self.animator
            .animate_to(self.left, target, self.animation, now);
        if self.animation.is_zero() {
            self.step_animation(now);
        }
    }

    fn step_animation(&mut self, now: Instant) {
        let Some(frame) = self.animator.advance(now) else {
            return;
        };

        self.left = frame.x;
        if let Err(e) = self.window.set_window_left(&self.handle, frame.x) {
            log::warn!("移动 Dock 失败: {:#}", e);
        }

        if let Some(ticket) = frame.completed {
            self.completed += 1;
            log::debug!(
                "动画完成 {:?}: {}",
                ticket,
                if self.hidden { "已隐藏" } else { "已显示" }
            );
            self.align(!self.hidden);
        }
    }

    fn reassert_topmost(&self) {
        if let Err(e) = self.window.set_topmost(&self.handle, true) {
            log::warn!("重新置顶失败: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeMonitors, FakeWindow};
    use dockbar_core::geometry::hidden_left;

    const MS: Duration = Duration::from_millis(1);

    fn config(delay_seconds: f64) -> DockConfig {
        DockConfig {
            auto_hide_delay_seconds: delay_seconds,
            ..DockConfig::default()
        }
    }

    fn engine(config: &DockConfig) -> DockEngine<FakeWindow, FakeMonitors> {
        let mut engine = DockEngine::new(
            FakeWindow::default(),
            FakeMonitors::single(Rect::new(0.0, 0.0, 1920.0, 1080.0)),
            WindowHandle(0x42),
            config,
        );
        engine.start();
        engine
    }

    /// 以 16ms 为一帧推进直到动画结束
    fn settle(engine: &mut DockEngine<FakeWindow, FakeMonitors>, mut now: Instant) -> Instant {
        for _ in 0..100 {
            if !engine.is_animating() {
                break;
            }
            now += 16 * MS;
            engine.tick(now);
        }
        now
    }

    #[test]
    fn test_start_shows_excluded_and_topmost() {
        let engine = engine(&config(0.0));
        let window = engine.window();
        assert!(window.visible.get());
        assert!(window.excluded.get());
        assert!(window.topmost.get());
        assert_eq!(window.frame.get(), Some(Rect::new(0.0, 0.0, 175.0, 1080.0)));
        assert!(!engine.is_hidden());
        assert!(!engine.needs_tick());
    }

    #[test]
    fn test_request_shown_is_idempotent() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        assert!(!engine.request_shown(t0));
        assert!(!engine.request_shown(t0 + MS));
        engine.pointer_enter(t0 + 2 * MS);
        assert_eq!(engine.transitions_started(), 0);
        assert_eq!(engine.window().moves.get(), 0);
    }

    #[test]
    fn test_instant_hide_on_leave() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));

        engine.pointer_leave(t0);
        assert!(engine.is_hidden());
        assert!(engine.is_animating());
        assert!(engine.hide_deadline().is_none());

        settle(&mut engine, t0);
        assert_eq!(engine.left(), -173.0);
        assert_eq!(
            engine.window().frame.get(),
            Some(Rect::new(-173.0, 0.0, 175.0, 1080.0))
        );
        assert_eq!(engine.transitions_completed(), 1);
        assert!(!engine.needs_tick());
    }

    #[test]
    fn test_delayed_hide_and_cancel_on_enter() {
        let t0 = Instant::now();
        let mut engine = engine(&config(1.0));

        engine.pointer_leave(t0);
        assert_eq!(engine.hide_deadline(), Some(t0 + 1000 * MS));
        engine.tick(t0 + 500 * MS);
        assert!(!engine.is_hidden());

        // 指针回到 Dock 上，计时器取消
        engine.pointer_enter(t0 + 600 * MS);
        assert!(engine.hide_deadline().is_none());
        engine.tick(t0 + 2000 * MS);
        assert!(!engine.is_hidden());

        engine.pointer_leave(t0 + 3000 * MS);
        engine.tick(t0 + 4000 * MS);
        assert!(engine.is_hidden());
        settle(&mut engine, t0 + 4000 * MS);
        assert_eq!(engine.left(), -173.0);
    }

    #[test]
    fn test_redirect_mid_flight_completes_once_at_hidden_position() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        engine.pointer_leave(t0);
        let t1 = settle(&mut engine, t0);
        let completed_before = engine.transitions_completed();

        assert!(engine.request_shown(t1));
        engine.tick(t1 + 48 * MS);
        let mid = engine.left();
        assert!(mid > -173.0 && mid < 0.0);

        // 动画未结束时反向请求隐藏
        assert!(engine.request_hidden(t1 + 64 * MS));
        settle(&mut engine, t1 + 64 * MS);

        assert_eq!(engine.transitions_completed(), completed_before + 1);
        let bounds = Rect::new(0.0, 0.0, 1920.0, 1080.0);
        assert_eq!(
            engine.left(),
            hidden_left(DockSide::Left, &bounds, 175.0, 2.0)
        );
        assert!(engine.is_hidden());
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_pointer_move_reveals_only_when_hidden() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        engine.pointer_move(t0);
        assert_eq!(engine.transitions_started(), 0);

        engine.pointer_leave(t0);
        let t1 = settle(&mut engine, t0);
        engine.pointer_move(t1);
        assert!(!engine.is_hidden());
        settle(&mut engine, t1);
        assert_eq!(engine.left(), 0.0);
    }

    #[test]
    fn test_edit_mode_pins_dock() {
        let t0 = Instant::now();
        let mut engine = engine(&config(1.0));
        engine.pointer_leave(t0);
        assert!(engine.hide_deadline().is_some());

        engine.set_edit_mode(true, t0 + 100 * MS);
        assert!(engine.hide_deadline().is_none());
        assert_eq!(engine.width(), 350.0);
        assert!(!engine.is_hidden());

        engine.pointer_leave(t0 + 200 * MS);
        assert!(engine.hide_deadline().is_none());
        engine.tick(t0 + 10_000 * MS);
        assert!(!engine.is_hidden());
        assert!(!engine.request_hidden(t0 + 10_000 * MS));

        engine.set_edit_mode(false, t0 + 11_000 * MS);
        assert_eq!(engine.width(), 175.0);
        assert_eq!(engine.hide_deadline(), Some(t0 + 12_000 * MS));
    }

    #[test]
    fn test_edit_mode_from_hidden_shows_wide() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        engine.pointer_leave(t0);
        let t1 = settle(&mut engine, t0);
        assert!(engine.is_hidden());

        engine.set_edit_mode(true, t1);
        assert!(!engine.is_hidden());
        assert_eq!(
            engine.window().frame.get(),
            Some(Rect::new(0.0, 0.0, 350.0, 1080.0))
        );

        // 退出编辑模式后立即隐藏（延迟为 0）
        engine.set_edit_mode(false, t1);
        assert!(engine.is_hidden());
        settle(&mut engine, t1);
        assert_eq!(engine.left(), -173.0);
    }

    #[test]
    fn test_suppression_restores_shown_position() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));

        engine.set_suppressed(true);
        assert!(!engine.window().visible.get());
        assert!(!engine.window().topmost.get());
        assert!(!engine.is_hidden());

        // 抑制期间指针事件被忽略
        engine.pointer_enter(t0);
        assert_eq!(engine.transitions_started(), 0);

        engine.set_suppressed(false);
        assert!(engine.window().visible.get());
        assert!(engine.window().topmost.get());
        assert_eq!(
            engine.window().frame.get(),
            Some(Rect::new(0.0, 0.0, 175.0, 1080.0))
        );
    }

    #[test]
    fn test_suppression_keeps_hidden_bit() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        engine.pointer_leave(t0);
        settle(&mut engine, t0);

        engine.set_suppressed(true);
        engine.set_suppressed(true);
        assert!(engine.is_hidden());
        engine.set_suppressed(false);
        assert_eq!(engine.left(), -173.0);
    }

    #[test]
    fn test_activation_reasserts_topmost_unless_suppressed() {
        let mut engine = engine(&config(0.0));
        engine.window().topmost.set(false);
        engine.on_activation_changed();
        assert!(engine.window().topmost.get());

        engine.set_suppressed(true);
        engine.on_activation_changed();
        assert!(!engine.window().topmost.get());
    }

    #[test]
    fn test_native_failures_are_not_fatal() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        engine.window().fail.set(true);
        engine.on_activation_changed();
        engine.pointer_leave(t0);
        settle(&mut engine, t0);
        engine.set_suppressed(true);
        engine.set_suppressed(false);
        assert!(engine.is_hidden());
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_toggle_side_realigns() {
        let mut engine = engine(&config(0.0));
        assert_eq!(engine.toggle_side(), DockSide::Right);
        assert_eq!(
            engine.window().frame.get(),
            Some(Rect::new(1745.0, 0.0, 175.0, 1080.0))
        );
    }

    #[test]
    fn test_apply_config_snapshot() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        let updated = DockConfig {
            dock_side: DockSide::Right,
            dock_width: 240.0,
            auto_hide_delay_seconds: 2.0,
            ..DockConfig::default()
        };
        engine.apply_config(&updated);
        assert_eq!(engine.side(), DockSide::Right);
        assert_eq!(engine.width(), 240.0);
        assert_eq!(engine.left(), 1680.0);

        engine.pointer_leave(t0);
        assert_eq!(engine.hide_deadline(), Some(t0 + 2000 * MS));
    }

    #[test]
    fn test_zero_duration_completes_synchronously() {
        let t0 = Instant::now();
        let zero = DockConfig {
            hide_animation_ms: 0.0,
            ..DockConfig::default()
        };
        let mut engine = engine(&zero);
        engine.pointer_leave(t0);
        assert!(!engine.is_animating());
        assert_eq!(engine.transitions_completed(), 1);
        assert_eq!(engine.left(), -173.0);
    }

    #[test]
    fn test_monitor_lookup_failure_uses_virtual_screen() {
        let mut engine = DockEngine::new(
            FakeWindow::default(),
            FakeMonitors::detached(vec![
                Rect::new(0.0, 0.0, 1920.0, 1080.0),
                Rect::new(-1280.0, 0.0, 1280.0, 1024.0),
            ]),
            WindowHandle(0x42),
            &config(0.0),
        );
        engine.start();
        assert_eq!(
            engine.window().frame.get(),
            Some(Rect::new(-1280.0, 0.0, 175.0, 1080.0))
        );
    }

    #[test]
    fn test_start_while_suppressed_stays_invisible() {
        let mut engine = DockEngine::new(
            FakeWindow::default(),
            FakeMonitors::single(Rect::new(0.0, 0.0, 1920.0, 1080.0)),
            WindowHandle(0x42),
            &config(0.0),
        );
        engine.set_suppressed(true);
        engine.start();
        assert!(!engine.window().visible.get());
        assert!(!engine.window().topmost.get());

        engine.set_suppressed(false);
        assert!(engine.window().visible.get());
        assert!(engine.window().topmost.get());
        assert_eq!(engine.left(), 0.0);
    }

    #[test]
    fn test_start_continues_when_switcher_exclusion_fails() {
        let window = FakeWindow::default();
        window.fail.set(true);
        let mut engine = DockEngine::new(
            window,
            FakeMonitors::single(Rect::new(0.0, 0.0, 1920.0, 1080.0)),
            WindowHandle(0x42),
            &config(0.0),
        );
        engine.start();
        assert!(!engine.window().excluded.get());
        assert!(!engine.is_hidden());
        assert_eq!(engine.left(), 0.0);
    }

    #[test]
    fn test_reveal_shows_then_auto_hides() {
        let t0 = Instant::now();
        let mut engine = engine(&config(0.0));
        engine.pointer_leave(t0);
        let t1 = settle(&mut engine, t0);
        assert!(engine.is_hidden());

        engine.reveal(t1);
        assert!(!engine.is_hidden());
        assert_eq!(engine.hide_deadline(), Some(t1 + REVEAL_HOLD));
        settle(&mut engine, t1);
        assert_eq!(engine.left(), 0.0);

        engine.tick(t1 + REVEAL_HOLD);
        assert!(engine.is_hidden());
        settle(&mut engine, t1 + REVEAL_HOLD);
        assert_eq!(engine.left(), -173.0);
    }

    #[test]
    fn test_reveal_uses_longer_configured_delay() {
        let t0 = Instant::now();
        let mut engine = engine(&config(5.0));
        engine.reveal(t0);
        assert_eq!(engine.hide_deadline(), Some(t0 + 5000 * MS));

        engine.set_edit_mode(true, t0);
        engine.reveal(t0 + MS);
        assert!(engine.hide_deadline().is_none());
    }
}
