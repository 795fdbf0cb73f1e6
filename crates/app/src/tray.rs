use anyhow::Result;
use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use dockbar_core::config::DockConfig;

use crate::command::*;

const ICON_SIZE: u32 = 32;

/// 生成托盘图标：深色圆角底板上一条贴左的浅色竖条
fn create_tray_icon_image() -> Result<Icon> {
    let size = ICON_SIZE as i32;
    let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let corner = (x < 3 || x >= size - 3) && (y < 3 || y >= size - 3);
            let pixel = if corner {
                [0, 0, 0, 0]
            } else if (5..11).contains(&x) && (4..size - 4).contains(&y) {
                [242, 242, 242, 255]
            } else {
                [32, 32, 32, 230]
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    Ok(Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE)?)
}

fn check_label(checked: bool, text: &str) -> String {
    if checked {
        format!("✓ {}", text)
    } else {
        format!("  {}", text)
    }
}

/// 系统托盘图标和菜单；菜单事件由 Dock 窗口的定时器轮询
pub struct Tray {
    _icon: TrayIcon,
    edit_item: MenuItem,
    autostart_item: MenuItem,
}

impl Tray {
    pub fn new(config: &DockConfig) -> Result<Self> {
        let menu = Menu::new();

        let show_item = MenuItem::with_id(MENU_ID_SHOW, "显示 Dock", true, None);
        let side_item = MenuItem::with_id(MENU_ID_TOGGLE_SIDE, "切换停靠边", true, None);
        let edit_item = MenuItem::with_id(
            MENU_ID_TOGGLE_EDIT,
            check_label(false, "编辑模式"),
            true,
            None,
        );
        let settings_item = MenuItem::with_id(MENU_ID_SETTINGS, "设置...", true, None);
        let reload_item = MenuItem::with_id(MENU_ID_RELOAD, "重新加载配置", true, None);
        let folder_item = MenuItem::with_id(MENU_ID_CONFIG_FOLDER, "打开配置目录", true, None);
        let autostart_item = MenuItem::with_id(
            MENU_ID_AUTOSTART,
            check_label(config.auto_start, "开机自动启动"),
            true,
            None,
        );
        let quit_item = MenuItem::with_id(MENU_ID_QUIT, "退出", true, None);

        menu.append(&show_item).ok();
        menu.append(&side_item).ok();
        menu.append(&edit_item).ok();
        menu.append(&PredefinedMenuItem::separator()).ok();
        menu.append(&settings_item).ok();
        menu.append(&reload_item).ok();
        menu.append(&folder_item).ok();
        menu.append(&autostart_item).ok();
        menu.append(&PredefinedMenuItem::separator()).ok();
        menu.append(&quit_item).ok();

        let icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip("DockBar")
            .with_icon(create_tray_icon_image()?)
            .build()?;

        log::info!("系统托盘图标已创建");

        Ok(Self {
            _icon: icon,
            edit_item,
            autostart_item,
        })
    }

    /// 取出所有待处理的菜单点击
    pub fn poll(&self) -> Vec<DockCommand> {
        let mut commands = Vec::new();
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            match DockCommand::from_menu_id(&event.id.0) {
                Some(command) => commands.push(command),
                None => log::debug!("未知的菜单项: {}", event.id.0),
            }
        }
        commands
    }

    pub fn set_edit_mode(&self, enabled: bool) {
        self.edit_item.set_text(check_label(enabled, "编辑模式"));
    }

    pub fn set_auto_start(&self, enabled: bool) {
        self.autostart_item.set_text(check_label(enabled, "开机自动启动"));
    }
}
