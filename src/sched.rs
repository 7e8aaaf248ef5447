//! Frame scheduling and resize debouncing.

use tracing::debug;

/// Cooperative single-frame scheduler. `schedule` requests one tick at the
/// next refresh point; a pending flag prevents double-scheduling and
/// `cancel` turns an already requested tick into a no-op.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self) {
        self.pending = true;
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// Consume the pending frame, if any. Called once per refresh point.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending
    }
}

/// Absorbs bursts of resize signals: the first signal arms a deadline,
/// later signals update the target size without re-arming, and `poll`
/// yields the settled size once the deadline passes.
#[derive(Debug, Default)]
pub struct ResizeDebouncer {
    deadline: Option<f64>,
    size: Option<(u16, u16)>,
}

const DEBOUNCE_MS: f64 = 250.0;

impl ResizeDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&mut self, now: f64, cols: u16, rows: u16) {
        self.size = Some((cols, rows));
        if self.deadline.is_none() {
            self.deadline = Some(now + DEBOUNCE_MS);
            debug!(cols, rows, "resize debounce armed");
        }
    }

    pub fn poll(&mut self, now: f64) -> Option<(u16, u16)> {
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            self.deadline = None;
            return self.size.take();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_idempotent_and_take_consumes() {
        let mut sched = FrameScheduler::new();
        assert!(!sched.take());
        sched.schedule();
        sched.schedule();
        assert!(sched.is_scheduled());
        assert!(sched.take());
        assert!(!sched.take());
    }

    #[test]
    fn cancel_discards_pending_frame() {
        let mut sched = FrameScheduler::new();
        sched.schedule();
        sched.cancel();
        assert!(!sched.is_scheduled());
        assert!(!sched.take());
    }

    #[test]
    fn debounce_fires_once_with_latest_size() {
        let mut debounce = ResizeDebouncer::new();
        debounce.signal(0.0, 100, 30);
        debounce.signal(50.0, 110, 32);
        debounce.signal(200.0, 120, 34);
        assert_eq!(debounce.poll(100.0), None);
        assert_eq!(debounce.poll(249.0), None);
        assert_eq!(debounce.poll(250.0), Some((120, 34)));
        assert_eq!(debounce.poll(300.0), None);
    }

    #[test]
    fn debounce_rearms_after_settling() {
        let mut debounce = ResizeDebouncer::new();
        debounce.signal(0.0, 90, 28);
        assert_eq!(debounce.poll(260.0), Some((90, 28)));
        debounce.signal(1000.0, 95, 29);
        assert_eq!(debounce.poll(1100.0), None);
        assert_eq!(debounce.poll(1250.0), Some((95, 29)));
    }
}
