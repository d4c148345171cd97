//! CPU-time alarm
//!
//! The evaluator never preempts itself. Instead it polls an alarm that is
//! raised either by an external party (a Ctrl-C handler, a watchdog thread)
//! through the shared flag, or by the per-command deadline expiring.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct Alarm {
    raised: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Alarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared flag for raising the alarm from another thread or a signal handler
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.raised)
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Start a new budget. A zero budget leaves only the external flag.
    pub fn arm(&mut self, budget_ms: u64) {
        self.raised.store(false, Ordering::SeqCst);
        self.deadline = (budget_ms > 0).then(|| Instant::now() + Duration::from_millis(budget_ms));
    }

    /// Clear the budget and the flag, reporting whether the alarm fired
    pub fn disarm(&mut self) -> bool {
        let fired = self.is_raised();
        self.deadline = None;
        self.raised.swap(false, Ordering::SeqCst) || fired
    }

    /// Poll the alarm. Expiry of the deadline latches the flag.
    pub fn is_raised(&self) -> bool {
        if self.raised.load(Ordering::SeqCst) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.raised.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_raise_is_seen_and_cleared() {
        let mut alarm = Alarm::new();
        assert!(!alarm.is_raised());
        alarm.handle().store(true, Ordering::SeqCst);
        assert!(alarm.is_raised());
        assert!(alarm.disarm());
        assert!(!alarm.is_raised());
    }

    #[test]
    fn zero_budget_never_expires() {
        let mut alarm = Alarm::new();
        alarm.arm(0);
        assert!(!alarm.is_raised());
        assert!(!alarm.disarm());
    }

    #[test]
    fn deadline_latches() {
        let mut alarm = Alarm::new();
        alarm.arm(1);
        std::thread::sleep(Duration::from_millis(5));
        assert!(alarm.is_raised());
        assert!(alarm.disarm());
    }
}
