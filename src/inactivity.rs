//! Inactivity countdown.
//!
//! Runs on its own clock (one tick per `INACTIVITY_TICK_MS`). Every
//! debounced input change restarts it; running out fires once and the
//! device goes to sleep.

pub struct InactivityMonitor {
    timeout: u32,
    remaining: u32,
    fired: bool,
}

impl InactivityMonitor {
    /// Start a countdown of `timeout` clock ticks.
    pub const fn new(timeout: u32) -> Self {
        Self {
            timeout,
            remaining: timeout,
            fired: false,
        }
    }

    /// Restart the countdown at its full duration. No-op once fired.
    pub fn reset(&mut self) {
        if !self.fired {
            self.remaining = self.timeout;
        }
    }

    /// Clock ticks left before expiry.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Advance one clock tick. Returns `true` on the tick the countdown
    /// expires, and never again.
    pub fn tick(&mut self) -> bool {
        if self.fired {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.fired = true;
        }
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_exactly_timeout_ticks() {
        let mut monitor = InactivityMonitor::new(5);
        for _ in 0..4 {
            assert!(!monitor.tick());
        }
        assert!(monitor.tick());
        assert!(monitor.has_fired());
    }

    #[test]
    fn fires_only_once() {
        let mut monitor = InactivityMonitor::new(2);
        let fired = (0..10).filter(|_| monitor.tick()).count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn reset_restores_full_duration() {
        let mut monitor = InactivityMonitor::new(5);
        monitor.tick();
        monitor.tick();
        monitor.tick();
        assert_eq!(monitor.remaining(), 2);

        monitor.reset();
        assert_eq!(monitor.remaining(), 5);
        for _ in 0..4 {
            assert!(!monitor.tick());
        }
        assert!(monitor.tick());
    }

    #[test]
    fn reset_after_firing_is_ignored() {
        let mut monitor = InactivityMonitor::new(1);
        assert!(monitor.tick());
        monitor.reset();
        assert_eq!(monitor.remaining(), 0);
        assert!(!monitor.tick());
    }
}
