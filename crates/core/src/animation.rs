use std::time::{Duration, Instant};

/// 一次位移动画的标识，用于区分被替换的旧动画和当前动画
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTicket(u64);

/// 单帧推进结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// 本帧窗口左边缘位置
    pub x: f64,
    /// 动画在本帧结束时返回其标识
    pub completed: Option<AnimationTicket>,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: f64,
    to: f64,
    duration: Duration,
    started: Instant,
    ticket: AnimationTicket,
}

impl Transition {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn position(&self, now: Instant) -> f64 {
        let t = ease_out_cubic(self.progress(now));
        self.from + (self.to - self.from) * t
    }
}

/// 三次缓出曲线
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// 水平位移动画控制器
///
/// 同一时刻最多只有一个动画。新动画以旧动画当前插值位置为起点直接替换旧动画，
/// 旧动画不会再产生完成事件。动画按时间插值，由调用方按帧调用 [`Animator::advance`]。
#[derive(Debug, Default)]
pub struct Animator {
    active: Option<Transition>,
    next_ticket: u64,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启动一个从 `from` 到 `to` 的动画
    ///
    /// 若已有动画在进行，起点取旧动画在 `now` 时刻的位置，`from` 被忽略。
    /// `duration` 为 0 时下一次 `advance` 立即完成。
    pub fn animate_to(
        &mut self,
        from: f64,
        to: f64,
        duration: Duration,
        now: Instant,
    ) -> AnimationTicket {
        let origin = self.position_at(now).unwrap_or(from);
        let ticket = AnimationTicket(self.next_ticket);
        self.next_ticket += 1;

        if let Some(old) = self.active.take() {
            log::debug!(
                "动画被替换: {:?} 目标 {:.0} → 新目标 {:.0}（起点 {:.0}）",
                old.ticket,
                old.to,
                to,
                origin
            );
        }

        self.active = Some(Transition {
            from: origin,
            to,
            duration,
            started: now,
            ticket,
        });
        ticket
    }

    /// 推进到 `now`，空闲时返回 None
    pub fn advance(&mut self, now: Instant) -> Option<Frame> {
        let transition = self.active?;
        if transition.progress(now) >= 1.0 {
            self.active = None;
            return Some(Frame {
                x: transition.to,
                completed: Some(transition.ticket),
            });
        }
        Some(Frame {
            x: transition.position(now),
            completed: None,
        })
    }

    /// 丢弃正在进行的动画，不产生完成事件
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// 当前动画在 `now` 时刻的插值位置
    pub fn position_at(&self, now: Instant) -> Option<f64> {
        self.active.map(|t| t.position(now))
    }

    /// 当前动画的目标位置
    pub fn target(&self) -> Option<f64> {
        self.active.map(|t| t.to)
    }

    /// 已启动过的动画数量
    pub fn started(&self) -> u64 {
        self.next_ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_ease_out_cubic() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(0.5), 0.875);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn test_runs_to_completion_once() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        let ticket = animator.animate_to(0.0, -173.0, 200 * MS, t0);
        assert!(animator.is_animating());

        let mid = animator.advance(t0 + 100 * MS).unwrap();
        assert!(mid.completed.is_none());
        assert!(mid.x < 0.0 && mid.x > -173.0);

        let end = animator.advance(t0 + 250 * MS).unwrap();
        assert_eq!(end.x, -173.0);
        assert_eq!(end.completed, Some(ticket));
        assert!(!animator.is_animating());
        assert!(animator.advance(t0 + 300 * MS).is_none());
    }

    #[test]
    fn test_zero_duration_completes_on_first_advance() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        let ticket = animator.animate_to(10.0, 50.0, Duration::ZERO, t0);
        let frame = animator.advance(t0).unwrap();
        assert_eq!(frame.x, 50.0);
        assert_eq!(frame.completed, Some(ticket));
    }

    #[test]
    fn test_supersede_snapshots_current_position() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.animate_to(-173.0, 0.0, 200 * MS, t0);
        let at = t0 + 100 * MS;
        let snapshot = animator.position_at(at).unwrap();

        animator.animate_to(999.0, -173.0, 200 * MS, at);
        // 起点是旧动画的插值位置，而不是调用方传入的 999
        assert_eq!(animator.position_at(at), Some(snapshot));
        assert_eq!(animator.target(), Some(-173.0));
    }

    #[test]
    fn test_superseded_animation_never_completes() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        let first = animator.animate_to(-173.0, 0.0, 200 * MS, t0);
        let second = animator.animate_to(-173.0, -173.0, 200 * MS, t0 + 50 * MS);
        assert_ne!(first, second);

        let mut completions = Vec::new();
        let mut now = t0;
        while now < t0 + 500 * MS {
            now += 16 * MS;
            if let Some(frame) = animator.advance(now) {
                if let Some(ticket) = frame.completed {
                    completions.push((ticket, frame.x));
                }
            }
        }
        assert_eq!(completions, vec![(second, -173.0)]);
        assert_eq!(animator.started(), 2);
    }

    #[test]
    fn test_cancel_drops_completion() {
        let t0 = Instant::now();
        let mut animator = Animator::new();
        animator.animate_to(0.0, 100.0, 200 * MS, t0);
        animator.cancel();
        assert!(!animator.is_animating());
        assert!(animator.advance(t0 + 300 * MS).is_none());
    }
}
