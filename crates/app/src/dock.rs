use anyhow::{Context, Result};
use std::cell::RefCell;
use std::ops::Range;
use std::time::Instant;

use dockbar_core::config::DockConfig;
use dockbar_core::pager::{items_per_page, Pager, ITEM_CHROME_HEIGHT};
use dockbar_platform::windows::autostart::WinAutoStart;
use dockbar_platform::windows::hook::WinForegroundHook;
use dockbar_platform::windows::monitor::WinMonitorManager;
use dockbar_platform::windows::window::WinWindowManager;
use dockbar_platform::windows::WinPlatform;
use dockbar_platform::{AutoStart, WindowHandle};

use windows::core::{w, HSTRING, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT};
use windows::Win32::UI::Shell::{
    DragFinish, DragQueryFileW, ShellExecuteExW, HDROP, SEE_MASK_FLAG_NO_UI, SHELLEXECUTEINFOW,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::command::DockCommand;
use crate::engine::DockEngine;
use crate::tray::Tray;
use crate::watcher::FullscreenWatcher;

const CLASS_NAME: PCWSTR = w!("DockBarWindow");

/// 钩子线程投递回 UI 线程的全屏检查消息
const WM_FULLSCREEN_CHECK: u32 = WM_APP + 1;

const TIMER_FRAME: usize = 1;
const TIMER_TRAY: usize = 2;
const FRAME_MS: u32 = 15;
const TRAY_POLL_MS: u32 = 50;

const PADDING: i32 = 12;
const FOOTER_HEIGHT: i32 = 36;

type Engine = DockEngine<WinWindowManager, WinMonitorManager>;

thread_local! {
    static APP: RefCell<Option<DockApp>> = const { RefCell::new(None) };
}

/// 在 UI 线程上访问 Dock；窗口过程重入时返回 None
fn with_app<R>(f: impl FnOnce(&mut DockApp) -> R) -> Option<R> {
    APP.with(|slot| {
        let mut guard = slot.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

/// 创建 Dock 窗口并运行消息循环（阻塞直到退出）
pub fn run(config: DockConfig) -> Result<()> {
    unsafe {
        let instance = GetModuleHandleW(None)?;

        let wc = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: instance.into(),
            lpszClassName: CLASS_NAME,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            anyhow::bail!("注册 Dock 窗口类失败");
        }

        let hwnd = CreateWindowExW(
            WS_EX_TOOLWINDOW | WS_EX_TOPMOST | WS_EX_LAYERED | WS_EX_ACCEPTFILES,
            CLASS_NAME,
            w!("DockBar"),
            WS_POPUP,
            0,
            0,
            config.dock_width.round() as i32,
            600,
            None,
            None,
            instance,
            None,
        )
        .context("创建 Dock 窗口失败")?;

        APP.with(|slot| *slot.borrow_mut() = Some(DockApp::new(hwnd, config)));
        // 显示窗口由状态机负责，启动时若已是全屏则保持隐藏
        with_app(|app| app.start());

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    if let Some(mut app) = APP.with(|slot| slot.borrow_mut().take()) {
        app.shutdown();
    }
    log::info!("消息循环已结束");
    Ok(())
}

struct DockApp {
    hwnd: HWND,
    engine: Engine,
    watcher: FullscreenWatcher<WinForegroundHook>,
    auto_start: WinAutoStart,
    config: DockConfig,
    pager: Pager,
    tray: Option<Tray>,
    pointer_inside: bool,
    frame_timer: bool,
}

impl DockApp {
    fn new(hwnd: HWND, config: DockConfig) -> Self {
        let WinPlatform {
            hook,
            window_manager,
            monitor_manager,
            auto_start,
        } = dockbar_platform::create_platform();

        let engine = DockEngine::new(
            window_manager,
            monitor_manager,
            WindowHandle::from_hwnd(hwnd),
            &config,
        );
        let per_page = items_per_page(engine.bounds().height, config.icon_size);

        Self {
            hwnd,
            engine,
            watcher: FullscreenWatcher::new(hook),
            auto_start,
            config,
            pager: Pager::new(per_page),
            tray: None,
            pointer_inside: false,
            frame_timer: false,
        }
    }

    fn start(&mut self) {
        if self.auto_start.is_enabled() != self.config.auto_start {
            if let Err(e) = self.auto_start.set_enabled(self.config.auto_start) {
                log::error!("同步自启动设置失败: {:#}", e);
            }
        }

        self.apply_transparency();
        self.engine.start();
        self.refresh_pager();

        // 钩子回调只投递消息，状态都在 UI 线程上修改
        let target = self.hwnd.0 as isize;
        let hooked = self.watcher.start(move || unsafe {
            let hwnd = HWND(target as *mut _);
            if let Err(e) = PostMessageW(hwnd, WM_FULLSCREEN_CHECK, WPARAM(0), LPARAM(0)) {
                log::warn!("投递全屏检查失败: {}", e);
            }
        });
        if let Err(e) = hooked {
            log::error!("安装前台窗口钩子失败，全屏检测不可用: {:#}", e);
        }
        self.on_fullscreen_check();

        match Tray::new(&self.config) {
            Ok(tray) => self.tray = Some(tray),
            Err(e) => log::error!("创建托盘图标失败: {:#}", e),
        }
        unsafe {
            SetTimer(self.hwnd, TIMER_TRAY, TRAY_POLL_MS, None);
        }
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.watcher.stop() {
            log::warn!("卸载前台窗口钩子失败: {:#}", e);
        }
        self.tray = None;
    }

    fn on_mouse_move(&mut self) {
        let now = Instant::now();
        // 每次移动都重新登记离开通知，丢失的 WM_MOUSELEAVE 不会让跟踪失效
        let mut tme = TRACKMOUSEEVENT {
            cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
            dwFlags: TME_LEAVE,
            hwndTrack: self.hwnd,
            dwHoverTime: 0,
        };
        if let Err(e) = unsafe { TrackMouseEvent(&mut tme) } {
            log::warn!("TrackMouseEvent 失败: {}", e);
        }

        if !self.pointer_inside {
            self.pointer_inside = true;
            self.engine.pointer_enter(now);
        } else {
            self.engine.pointer_move(now);
        }
        self.sync_frame_timer();
    }

    fn on_mouse_leave(&mut self) {
        self.pointer_inside = false;
        self.engine.pointer_leave(Instant::now());
        self.sync_frame_timer();
    }

    fn on_timer(&mut self, id: usize) {
        match id {
            TIMER_FRAME => {
                self.engine.tick(Instant::now());
                self.sync_frame_timer();
            }
            TIMER_TRAY => {
                let commands = self
                    .tray
                    .as_ref()
                    .map(Tray::poll)
                    .unwrap_or_default();
                for command in commands {
                    self.handle_command(command);
                }
                if self.watcher.recover(&mut self.engine) {
                    self.sync_frame_timer();
                }
            }
            _ => {}
        }
    }

    fn on_fullscreen_check(&mut self) {
        self.watcher.apply(&mut self.engine);
        self.sync_frame_timer();
    }

    fn on_display_change(&mut self) {
        log::info!("显示器配置变化，重新贴边");
        self.engine.align(!self.engine.is_hidden());
        self.refresh_pager();
        self.invalidate();
    }

    fn handle_command(&mut self, command: DockCommand) {
        log::debug!("执行指令: {:?}", command);
        let now = Instant::now();
        match command {
            DockCommand::Show => self.engine.reveal(now),
            DockCommand::ToggleSide => {
                self.config.dock_side = self.engine.toggle_side();
                self.save_config();
            }
            DockCommand::ToggleEdit => {
                let enabled = !self.engine.is_edit_mode();
                self.engine.set_edit_mode(enabled, now);
                self.refresh_pager();
                self.invalidate();
                if let Some(tray) = &self.tray {
                    tray.set_edit_mode(enabled);
                }
            }
            DockCommand::RequestSettings => {
                let opened = DockConfig::config_path().and_then(|path| {
                    DockConfig::ensure_file(&path)?;
                    shell_open(&path.to_string_lossy())
                });
                if let Err(e) = opened {
                    log::error!("打开配置文件失败: {:#}", e);
                }
            }
            DockCommand::ReloadConfig => match DockConfig::load() {
                Ok(config) => self.apply_config(config),
                Err(e) => log::error!("重新加载配置失败: {:#}", e),
            },
            DockCommand::OpenConfigFolder => {
                let opened = DockConfig::config_dir().and_then(|dir| {
                    std::fs::create_dir_all(&dir)
                        .with_context(|| format!("无法创建配置目录: {}", dir.display()))?;
                    shell_open(&dir.to_string_lossy())
                });
                if let Err(e) = opened {
                    log::error!("打开配置目录失败: {:#}", e);
                }
            }
            DockCommand::ToggleAutoStart => {
                self.config.auto_start = !self.config.auto_start;
                if let Err(e) = self.auto_start.set_enabled(self.config.auto_start) {
                    log::error!("设置自启动失败: {:#}", e);
                }
                if let Some(tray) = &self.tray {
                    tray.set_auto_start(self.config.auto_start);
                }
                self.save_config();
            }
            DockCommand::PrevPage => self.turn_page(false),
            DockCommand::NextPage => self.turn_page(true),
            DockCommand::Exit => {
                log::info!("用户请求退出");
                unsafe {
                    let _ = DestroyWindow(self.hwnd);
                }
            }
        }
        self.sync_frame_timer();
    }

    /// 应用新的配置快照
    fn apply_config(&mut self, config: DockConfig) {
        if config.auto_start != self.config.auto_start {
            if let Err(e) = self.auto_start.set_enabled(config.auto_start) {
                log::error!("设置自启动失败: {:#}", e);
            }
        }
        self.config = config;
        self.engine.apply_config(&self.config);
        self.apply_transparency();
        self.refresh_pager();
        if let Some(tray) = &self.tray {
            tray.set_auto_start(self.config.auto_start);
        }
        self.invalidate();
        log::info!("配置已重新应用");
    }

    fn save_config(&mut self) {
        self.config.dock_side = self.engine.side();
        self.config.dock_width = self.engine.configured_width();
        if let Err(e) = self.config.save() {
            log::error!("保存配置失败: {:#}", e);
        }
    }

    fn apply_transparency(&self) {
        let alpha = self.config.background_alpha();
        unsafe {
            if let Err(e) = SetLayeredWindowAttributes(self.hwnd, COLORREF(0), alpha, LWA_ALPHA) {
                log::warn!("设置窗口透明度失败: {}", e);
            }
        }
    }

    fn refresh_pager(&mut self) {
        let per_page = items_per_page(self.engine.bounds().height, self.config.icon_size);
        self.pager.set_per_page(per_page, self.config.shortcuts.len());
    }

    fn turn_page(&mut self, forward: bool) {
        if self.engine.is_edit_mode() {
            return;
        }
        let count = self.config.shortcuts.len();
        let turned = if forward {
            self.pager.next(count)
        } else {
            self.pager.prev(count)
        };
        if turned {
            self.invalidate();
        }
    }

    fn visible_range(&self) -> Range<usize> {
        let count = self.config.shortcuts.len();
        if self.engine.is_edit_mode() {
            0..count
        } else {
            self.pager.visible_range(count)
        }
    }

    fn row_height(&self) -> i32 {
        (self.config.icon_size + ITEM_CHROME_HEIGHT).round() as i32
    }

    fn client_rect(&self) -> RECT {
        let mut rect = RECT::default();
        unsafe {
            let _ = GetClientRect(self.hwnd, &mut rect);
        }
        rect
    }

    fn shows_footer(&self) -> bool {
        !self.engine.is_edit_mode() && self.pager.has_multiple_pages(self.config.shortcuts.len())
    }

    /// 点击位置对应的条目下标
    fn item_at(&self, y: i32) -> Option<usize> {
        if y < PADDING {
            return None;
        }
        let row = ((y - PADDING) / self.row_height()) as usize;
        let range = self.visible_range();
        let index = range.start + row;
        range.contains(&index).then_some(index)
    }

    fn on_click(&mut self, x: i32, y: i32) {
        if self.engine.is_edit_mode() {
            return;
        }

        let client = self.client_rect();
        if self.shows_footer() && y >= client.bottom - FOOTER_HEIGHT {
            self.turn_page(x >= (client.right - client.left) / 2);
            return;
        }

        if let Some(index) = self.item_at(y) {
            let item = &self.config.shortcuts[index];
            log::info!("启动: {} ({})", item.name, item.path);
            if let Err(e) = shell_open(&item.path) {
                log::error!("启动快捷方式失败: {:#}", e);
            }
        }
    }

    fn on_right_click(&mut self, y: i32) {
        if !self.engine.is_edit_mode() {
            return;
        }
        if let Some(index) = self.item_at(y) {
            if let Some(removed) = self.config.remove_shortcut(index) {
                log::info!("已移除快捷方式: {}", removed.name);
                self.save_config();
                self.refresh_pager();
                self.invalidate();
            }
        }
    }

    fn on_drop(&mut self, hdrop: HDROP) {
        let mut added = 0;
        unsafe {
            let count = DragQueryFileW(hdrop, u32::MAX, None);
            for i in 0..count {
                let len = DragQueryFileW(hdrop, i, None) as usize;
                let mut buf = vec![0u16; len + 1];
                let copied = DragQueryFileW(hdrop, i, Some(&mut buf)) as usize;
                let path = String::from_utf16_lossy(&buf[..copied]);
                if self.config.add_shortcut(&path, None) {
                    log::info!("已添加快捷方式: {}", path);
                    added += 1;
                }
            }
            DragFinish(hdrop);
        }

        if added > 0 {
            self.save_config();
            self.refresh_pager();
            self.invalidate();
        }
    }

    fn paint(&self) {
        unsafe {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(self.hwnd, &mut ps);
            let client = self.client_rect();

            let [r, g, b] = self.config.background_color;
            let brush = CreateSolidBrush(rgb(r, g, b));
            FillRect(hdc, &client, brush);
            let _ = DeleteObject(brush);

            SetBkMode(hdc, TRANSPARENT);
            let text_color = if self.config.use_light_text {
                rgb(242, 242, 242)
            } else {
                rgb(10, 10, 10)
            };
            SetTextColor(hdc, text_color);

            let row_height = self.row_height();
            for (row, index) in self.visible_range().enumerate() {
                let top = PADDING + row as i32 * row_height;
                let mut rect = RECT {
                    left: client.left + PADDING,
                    top,
                    right: client.right - PADDING,
                    bottom: top + row_height,
                };
                let mut text: Vec<u16> = self.config.shortcuts[index].name.encode_utf16().collect();
                DrawTextW(
                    hdc,
                    &mut text,
                    &mut rect,
                    DT_CENTER | DT_VCENTER | DT_SINGLELINE | DT_END_ELLIPSIS,
                );
            }

            if self.shows_footer() {
                let label = format!("‹   {}   ›", self.pager.label(self.config.shortcuts.len()));
                let mut text: Vec<u16> = label.encode_utf16().collect();
                let mut rect = RECT {
                    top: client.bottom - FOOTER_HEIGHT,
                    ..client
                };
                DrawTextW(hdc, &mut text, &mut rect, DT_CENTER | DT_VCENTER | DT_SINGLELINE);
            }

            let _ = EndPaint(self.hwnd, &ps);
        }
    }

    fn invalidate(&self) {
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, true);
        }
    }

    /// 动画或自动隐藏计时进行时保持帧定时器运行
    fn sync_frame_timer(&mut self) {
        let needed = self.engine.needs_tick();
        unsafe {
            if needed && !self.frame_timer {
                SetTimer(self.hwnd, TIMER_FRAME, FRAME_MS, None);
                self.frame_timer = true;
            } else if !needed && self.frame_timer {
                let _ = KillTimer(self.hwnd, TIMER_FRAME);
                self.frame_timer = false;
            }
        }
    }
}

fn rgb(r: u8, g: u8, b: u8) -> COLORREF {
    COLORREF(r as u32 | (g as u32) << 8 | (b as u32) << 16)
}

/// 用系统关联程序打开文件、目录或 URI；失败只返回错误，不弹系统对话框
fn shell_open(target: &str) -> Result<()> {
    let file = HSTRING::from(target);
    let mut info = SHELLEXECUTEINFOW {
        cbSize: std::mem::size_of::<SHELLEXECUTEINFOW>() as u32,
        fMask: SEE_MASK_FLAG_NO_UI,
        lpVerb: w!("open"),
        lpFile: PCWSTR(file.as_ptr()),
        nShow: SW_SHOWNORMAL.0,
        ..Default::default()
    };
    unsafe { ShellExecuteExW(&mut info) }
        .with_context(|| format!("ShellExecuteExW 打开失败: {}", target))
}

fn point_from_lparam(lparam: LPARAM) -> (i32, i32) {
    let x = (lparam.0 & 0xFFFF) as u16 as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32;
    (x, y)
}

unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let handled = match msg {
        WM_MOUSEMOVE => with_app(|app| app.on_mouse_move()),
        WM_MOUSELEAVE => with_app(|app| app.on_mouse_leave()),
        WM_LBUTTONUP => {
            let (x, y) = point_from_lparam(lparam);
            with_app(|app| app.on_click(x, y))
        }
        WM_RBUTTONUP => {
            let (_, y) = point_from_lparam(lparam);
            with_app(|app| app.on_right_click(y))
        }
        WM_MOUSEWHEEL => {
            let delta = ((wparam.0 >> 16) & 0xFFFF) as u16 as i16;
            with_app(|app| app.turn_page(delta < 0))
        }
        WM_TIMER => with_app(|app| app.on_timer(wparam.0)),
        WM_FULLSCREEN_CHECK => with_app(|app| app.on_fullscreen_check()),
        WM_DROPFILES => {
            let hdrop = HDROP(wparam.0 as *mut _);
            with_app(|app| app.on_drop(hdrop)).or_else(|| {
                // 正在处理其他消息时放弃这次拖放，但要释放句柄
                DragFinish(hdrop);
                Some(())
            })
        }
        WM_DISPLAYCHANGE => with_app(|app| app.on_display_change()),
        WM_PAINT => with_app(|app| app.paint()),
        WM_ACTIVATE => {
            with_app(|app| app.engine.on_activation_changed());
            None
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            Some(())
        }
        _ => None,
    };

    match handled {
        Some(()) => LRESULT(0),
        None => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
