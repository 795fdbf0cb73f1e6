use crate::Rect;

/// 窗口边缘与显示器边缘的容差（像素），吸收边框和 DPI 取整带来的误差
pub const FULLSCREEN_TOLERANCE: f64 = 8.0;

/// 这些进程的窗口永远不会触发全屏隐藏（开始菜单、搜索等系统界面）
pub const IGNORED_PROCESSES: &[&str] = &[
    "shellexperiencehost",
    "startmenuexperiencehost",
    "searchui",
    "searchapp",
];

/// 桌面和壁纸宿主窗口类名
pub const IGNORED_CLASSES: &[&str] = &["progman", "workerw"];

/// 一次前台窗口采样，用完即弃
#[derive(Debug, Clone, PartialEq)]
pub struct ForegroundSample {
    pub handle: isize,
    pub process_name: Option<String>,
    pub class_name: Option<String>,
    pub bounds: Option<Rect>,
}

impl ForegroundSample {
    pub fn is_ignored(&self) -> bool {
        is_ignored_surface(self.process_name.as_deref(), self.class_name.as_deref())
    }

    /// 该前台窗口是否应当让 Dock 进入隐藏
    pub fn suppresses(&self, monitor: Option<&Rect>) -> bool {
        if self.is_ignored() {
            return false;
        }
        match (self.bounds.as_ref(), monitor) {
            (Some(window), Some(monitor)) => covers_monitor(window, monitor),
            _ => false,
        }
    }
}

/// 进程名或类名是否命中忽略名单（不区分大小写，进程名可带 .exe）
pub fn is_ignored_surface(process_name: Option<&str>, class_name: Option<&str>) -> bool {
    if let Some(process) = process_name {
        let process = process.to_lowercase();
        let process = process.strip_suffix(".exe").unwrap_or(&process);
        if IGNORED_PROCESSES.contains(&process) {
            return true;
        }
    }

    if let Some(class) = class_name {
        let class = class.to_lowercase();
        if IGNORED_CLASSES.contains(&class.as_str()) {
            return true;
        }
    }

    false
}

/// 窗口四条边是否都在容差范围内贴合显示器四条边
pub fn covers_monitor(window: &Rect, monitor: &Rect) -> bool {
    let within = |a: f64, b: f64| (a - b).abs() <= FULLSCREEN_TOLERANCE;
    within(window.min_x(), monitor.min_x())
        && within(window.min_y(), monitor.min_y())
        && within(window.max_x(), monitor.max_x())
        && within(window.max_y(), monitor.max_y())
}

/// 判断前台窗口是否全屏；没有前台窗口时返回 false
pub fn is_fullscreen(sample: Option<&ForegroundSample>, monitor: Option<&Rect>) -> bool {
    sample.is_some_and(|s| s.suppresses(monitor))
}
