use crate::{DockSide, Rect};

/// 隐藏时保留在屏幕内的像素宽度，作为鼠标唤出的热区
pub const EDGE_REVEAL_PX: f64 = 2.0;

/// Dock 最小宽度
pub const MIN_DOCK_WIDTH: f64 = 175.0;

/// 编辑模式下的最小宽度
pub const EDIT_MODE_MIN_WIDTH: f64 = 350.0;

/// 显示状态下 Dock 左边缘的 x 坐标
///
/// 宽度超过显示器时右侧停靠会越过显示器左边界，这里不做裁剪。
pub fn shown_left(side: DockSide, bounds: &Rect, width: f64) -> f64 {
    match side {
        DockSide::Left => bounds.min_x(),
        DockSide::Right => bounds.min_x() + bounds.width - width,
    }
}

/// 隐藏状态下 Dock 左边缘的 x 坐标，屏幕内只留下 `edge_reveal` 像素
pub fn hidden_left(side: DockSide, bounds: &Rect, width: f64, edge_reveal: f64) -> f64 {
    match side {
        DockSide::Left => bounds.min_x() - (width - edge_reveal),
        DockSide::Right => bounds.min_x() + bounds.width - edge_reveal,
    }
}

/// Dock 几何参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockGeometry {
    pub side: DockSide,
    pub width: f64,
    pub edge_reveal: f64,
}

impl DockGeometry {
    pub fn new(side: DockSide, width: f64) -> Self {
        Self {
            side,
            width: width.max(MIN_DOCK_WIDTH),
            edge_reveal: EDGE_REVEAL_PX,
        }
    }

    pub fn shown_left(&self, bounds: &Rect) -> f64 {
        shown_left(self.side, bounds, self.width)
    }

    pub fn hidden_left(&self, bounds: &Rect) -> f64 {
        hidden_left(self.side, bounds, self.width, self.edge_reveal)
    }

    /// 按显示/隐藏状态计算整块窗口区域（高度铺满显示器）
    pub fn frame(&self, bounds: &Rect, shown: bool) -> Rect {
        let left = if shown {
            self.shown_left(bounds)
        } else {
            self.hidden_left(bounds)
        };
        Rect::new(left, bounds.min_y(), self.width, bounds.height)
    }
}
