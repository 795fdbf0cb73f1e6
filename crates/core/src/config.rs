use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::geometry::{DockGeometry, MIN_DOCK_WIDTH};
use crate::DockSide;

const DEFAULT_ICON_SIZE: f64 = 40.0;
const DEFAULT_ANIMATION_MS: f64 = 200.0;
const DEFAULT_OPACITY: f64 = 0.85;

/// Dock 上的一个快捷方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutItem {
    pub name: String,
    pub path: String,
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockConfig {
    /// 停靠边
    #[serde(default)]
    pub dock_side: DockSide,

    /// Dock 宽度（像素）
    #[serde(default = "default_dock_width")]
    pub dock_width: f64,

    /// 图标尺寸（像素）
    #[serde(default = "default_icon_size")]
    pub icon_size: f64,

    /// 鼠标离开后自动隐藏的延迟（秒），0 表示立即隐藏
    #[serde(default)]
    pub auto_hide_delay_seconds: f64,

    /// 滑入滑出动画时长（毫秒）
    #[serde(default = "default_animation_ms")]
    pub hide_animation_ms: f64,

    /// 是否使用半透明背景
    #[serde(default = "default_true")]
    pub use_transparency: bool,

    /// 背景不透明度 (0, 1]
    #[serde(default = "default_opacity")]
    pub background_opacity: f64,

    /// 背景颜色 RGB
    #[serde(default)]
    pub background_color: [u8; 3],

    /// 浅色文字
    #[serde(default = "default_true")]
    pub use_light_text: bool,

    /// 是否开机自动启动
    #[serde(default)]
    pub auto_start: bool,

    #[serde(default)]
    pub shortcuts: Vec<ShortcutItem>,
}

fn default_true() -> bool {
    true
}

fn default_dock_width() -> f64 {
    MIN_DOCK_WIDTH
}

fn default_icon_size() -> f64 {
    DEFAULT_ICON_SIZE
}

fn default_animation_ms() -> f64 {
    DEFAULT_ANIMATION_MS
}

fn default_opacity() -> f64 {
    DEFAULT_OPACITY
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            dock_side: DockSide::Left,
            dock_width: default_dock_width(),
            icon_size: default_icon_size(),
            auto_hide_delay_seconds: 0.0,
            hide_animation_ms: default_animation_ms(),
            use_transparency: true,
            background_opacity: default_opacity(),
            background_color: [0, 0, 0],
            use_light_text: true,
            auto_start: false,
            shortcuts: Vec::new(),
        }
    }
}

impl DockConfig {
    /// 配置目录：%APPDATA%/dockbar
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("无法获取配置目录")?
            .join("dockbar");
        Ok(dir)
    }

    /// 配置文件路径：%APPDATA%/dockbar/config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// 从默认位置加载，文件不存在时写入并返回默认配置
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            log::info!("配置文件不存在，已写入默认配置: {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {}", path.display()))?;
        config.sanitize();

        Ok(config)
    }

    /// 配置文件不存在时写入默认配置；已有文件（即使格式损坏）保持原样
    pub fn ensure_file(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        Self::default().save_to(path)?;
        log::info!("已创建默认配置文件: {}", path.display());
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("无法创建配置目录: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(self).context("配置序列化失败")?;

        fs::write(path, content)
            .with_context(|| format!("无法写入配置文件: {}", path.display()))?;

        log::debug!("配置已保存到: {}", path.display());
        Ok(())
    }

    /// 把越界的数值拉回安全下限
    pub fn sanitize(&mut self) {
        if !(self.dock_width >= MIN_DOCK_WIDTH) {
            self.dock_width = MIN_DOCK_WIDTH;
        }
        if !(self.icon_size > 0.0) {
            self.icon_size = DEFAULT_ICON_SIZE;
        }
        if !(self.hide_animation_ms > 0.0) {
            self.hide_animation_ms = DEFAULT_ANIMATION_MS;
        }
        if !(self.auto_hide_delay_seconds >= 0.0) {
            self.auto_hide_delay_seconds = 0.0;
        }
        if !(self.background_opacity > 0.0 && self.background_opacity <= 1.0) {
            self.background_opacity = DEFAULT_OPACITY;
        }
    }

    pub fn geometry(&self) -> DockGeometry {
        DockGeometry::new(self.dock_side, self.dock_width)
    }

    pub fn auto_hide_delay(&self) -> Duration {
        Duration::from_secs_f64(self.auto_hide_delay_seconds.max(0.0))
    }

    pub fn hide_animation(&self) -> Duration {
        Duration::from_secs_f64(self.hide_animation_ms.max(0.0) / 1000.0)
    }

    /// 窗口整体 alpha（0-255）
    pub fn background_alpha(&self) -> u8 {
        let opacity = if self.use_transparency {
            self.background_opacity.clamp(0.2, 1.0)
        } else {
            1.0
        };
        (opacity * 255.0).round().clamp(30.0, 255.0) as u8
    }

    /// 添加快捷方式；路径无效或已存在（不区分大小写）时返回 false
    pub fn add_shortcut(&mut self, path: &str, display_name: Option<&str>) -> bool {
        let path = path.trim();
        if path.is_empty() {
            return false;
        }

        let local = Path::new(path);
        let is_local = local.exists();
        if !is_local && !is_uri(path) {
            log::debug!("忽略无效的快捷方式路径: {}", path);
            return false;
        }

        if self
            .shortcuts
            .iter()
            .any(|s| s.path.eq_ignore_ascii_case(path))
        {
            return false;
        }

        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derive_name(path, is_local));

        self.shortcuts.push(ShortcutItem {
            name,
            path: path.to_string(),
        });
        true
    }

    pub fn remove_shortcut(&mut self, index: usize) -> Option<ShortcutItem> {
        if index < self.shortcuts.len() {
            Some(self.shortcuts.remove(index))
        } else {
            None
        }
    }
}

/// 带协议头的绝对 URI（单字母协议视为盘符）
fn is_uri(path: &str) -> bool {
    let Some((scheme, rest)) = path.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && !rest.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn derive_name(path: &str, is_local: bool) -> String {
    let name = if is_local {
        let p = Path::new(path);
        let part = if p.is_dir() { p.file_name() } else { p.file_stem() };
        part.map(|s| s.to_string_lossy().into_owned())
    } else if path.to_ascii_lowercase().starts_with("shell:") {
        Some(path.to_string())
    } else {
        path.split_once("://")
            .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
            .filter(|host| !host.is_empty())
            .map(str::to_string)
    };

    name.filter(|n| !n.is_empty())
        .unwrap_or_else(|| path.to_string())
}
