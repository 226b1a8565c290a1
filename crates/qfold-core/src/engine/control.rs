use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptReason {
    Cancelled,
    DeadlineExceeded,
}

/// Cooperative cancellation for a single attempt.
///
/// The engine polls this between evolution iterations and between replicate runs. Clones share
/// the same cancellation flag, so a scheduler can keep one clone and hand another to the worker.
#[derive(Debug, Clone, Default)]
pub struct AttemptControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl AttemptControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, budget: Duration) -> Self {
        self.with_deadline(Instant::now() + budget)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn interruption(&self) -> Option<InterruptReason> {
        if self.is_cancelled() {
            return Some(InterruptReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(InterruptReason::DeadlineExceeded),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_control_is_not_interrupted() {
        assert_eq!(AttemptControl::new().interruption(), None);
    }

    #[test]
    fn cancellation_is_visible_through_clones() {
        let control = AttemptControl::new();
        let worker_view = control.clone();
        control.cancel();
        assert_eq!(worker_view.interruption(), Some(InterruptReason::Cancelled));
    }

    #[test]
    fn elapsed_deadline_interrupts() {
        let control = AttemptControl::new().with_timeout(Duration::ZERO);
        assert_eq!(
            control.interruption(),
            Some(InterruptReason::DeadlineExceeded)
        );
    }
}
