use std::ops::Range;

/// 每个条目占用的额外高度（图标之外的文字和间距）
pub const ITEM_CHROME_HEIGHT: f64 = 84.0;

/// 根据显示器高度和图标尺寸计算每页条目数，至少 1
pub fn items_per_page(monitor_height: f64, icon_size: f64) -> usize {
    let per_item = icon_size + ITEM_CHROME_HEIGHT;
    if per_item <= 0.0 || monitor_height <= 0.0 {
        return 1;
    }
    ((monitor_height / per_item).floor() as usize).max(1)
}

/// 条目分页状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    per_page: usize,
    current: usize,
}

impl Pager {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
            current: 0,
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn set_per_page(&mut self, per_page: usize, count: usize) {
        self.per_page = per_page.max(1);
        self.clamp(count);
    }

    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.per_page).max(1)
    }

    pub fn has_multiple_pages(&self, count: usize) -> bool {
        count > self.per_page
    }

    /// 列表缩短后把当前页拉回有效范围
    pub fn clamp(&mut self, count: usize) {
        let last = self.total_pages(count) - 1;
        if self.current > last {
            self.current = last;
        }
    }

    /// 上一页，首页时回到末页；只有一页时返回 false
    pub fn prev(&mut self, count: usize) -> bool {
        let total = self.total_pages(count);
        if total <= 1 {
            return false;
        }
        self.current = if self.current == 0 {
            total - 1
        } else {
            self.current - 1
        };
        true
    }

    /// 下一页，末页时回到首页；只有一页时返回 false
    pub fn next(&mut self, count: usize) -> bool {
        let total = self.total_pages(count);
        if total <= 1 {
            return false;
        }
        self.current = if self.current + 1 >= total {
            0
        } else {
            self.current + 1
        };
        true
    }

    /// 当前页可见条目的下标范围
    pub fn visible_range(&self, count: usize) -> Range<usize> {
        let start = (self.current * self.per_page).min(count);
        let end = (start + self.per_page).min(count);
        start..end
    }

    pub fn label(&self, count: usize) -> String {
        format!("{}/{}", self.current + 1, self.total_pages(count))
    }
}
