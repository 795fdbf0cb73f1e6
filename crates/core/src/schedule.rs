use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 合并突发通知：一批通知只调度一次延迟检查
///
/// 通知线程调用 [`CheckScheduler::try_schedule`]，返回 true 时由调用方把一次检查投递到
/// UI 线程；检查开始前 UI 线程调用 [`CheckScheduler::take`] 清除挂起标记。
/// 挂起期间到达的通知直接丢弃。
#[derive(Debug, Clone, Default)]
pub struct CheckScheduler {
    pending: Arc<AtomicBool>,
}

impl CheckScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记挂起；已挂起时返回 false
    pub fn try_schedule(&self) -> bool {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 清除挂起标记，返回清除前是否挂起
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
