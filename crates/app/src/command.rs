/// 发给 Dock 的指令（托盘菜单、窗口按键等入口统一转换成这里的值）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockCommand {
    /// 立即显示 Dock
    Show,
    /// 左右切换停靠边
    ToggleSide,
    /// 进入或退出编辑模式
    ToggleEdit,
    /// 用系统关联程序打开配置文件
    RequestSettings,
    /// 重新读取配置并应用
    ReloadConfig,
    OpenConfigFolder,
    ToggleAutoStart,
    PrevPage,
    NextPage,
    Exit,
}

pub const MENU_ID_SHOW: &str = "show";
pub const MENU_ID_TOGGLE_SIDE: &str = "toggle_side";
pub const MENU_ID_TOGGLE_EDIT: &str = "toggle_edit";
pub const MENU_ID_SETTINGS: &str = "settings";
pub const MENU_ID_RELOAD: &str = "reload";
pub const MENU_ID_CONFIG_FOLDER: &str = "config_folder";
pub const MENU_ID_AUTOSTART: &str = "autostart";
pub const MENU_ID_QUIT: &str = "quit";

impl DockCommand {
    /// 托盘菜单项 id 对应的指令
    pub fn from_menu_id(id: &str) -> Option<Self> {
        let command = match id {
            MENU_ID_SHOW => DockCommand::Show,
            MENU_ID_TOGGLE_SIDE => DockCommand::ToggleSide,
            MENU_ID_TOGGLE_EDIT => DockCommand::ToggleEdit,
            MENU_ID_SETTINGS => DockCommand::RequestSettings,
            MENU_ID_RELOAD => DockCommand::ReloadConfig,
            MENU_ID_CONFIG_FOLDER => DockCommand::OpenConfigFolder,
            MENU_ID_AUTOSTART => DockCommand::ToggleAutoStart,
            MENU_ID_QUIT => DockCommand::Exit,
            _ => return None,
        };
        Some(command)
    }
}
