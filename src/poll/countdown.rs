//! Pure countdown clock. Knows nothing about fetching; the scheduler
//! watches the events it emits.

/// Default seconds between normal fetch attempts
pub const DEFAULT_PERIOD_SECS: u32 = 60;

/// What a single one-second tick did to the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// Still counting, with this many seconds left
    Counting(u32),
    /// Just reached zero
    Elapsed,
    /// Was at zero and reset to the full period
    Wrapped,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    period: u32,
    remaining: u32,
}

impl Countdown {
    pub fn new(period: u32) -> Self {
        let period = period.max(1);
        Self { period, remaining: period }
    }

    pub fn tick(&mut self) -> ClockEvent {
        if self.remaining == 0 {
            self.remaining = self.period;
            return ClockEvent::Wrapped;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            ClockEvent::Elapsed
        } else {
            ClockEvent::Counting(self.remaining)
        }
    }

    /// Server-directed wait, taken as-is even when it exceeds the period.
    /// Landing on zero from a running clock counts as reaching it.
    pub fn override_remaining(&mut self, secs: u32) -> Option<ClockEvent> {
        let was_running = self.remaining != 0;
        self.remaining = secs;
        (was_running && secs == 0).then_some(ClockEvent::Elapsed)
    }

    /// Start a fresh full period
    pub fn restart(&mut self) {
        self.remaining = self.period;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn period(&self) -> u32 {
        self.period
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_period() {
        let clock = Countdown::default();
        assert_eq!(clock.remaining(), 60);
        assert_eq!(clock.period(), 60);
    }

    #[test]
    fn test_full_cycle() {
        let mut clock = Countdown::new(3);
        assert_eq!(clock.tick(), ClockEvent::Counting(2));
        assert_eq!(clock.tick(), ClockEvent::Counting(1));
        assert_eq!(clock.tick(), ClockEvent::Elapsed);
        assert_eq!(clock.remaining(), 0);
        assert_eq!(clock.tick(), ClockEvent::Wrapped);
        assert_eq!(clock.remaining(), 3);
    }

    #[test]
    fn test_never_goes_negative() {
        let mut clock = Countdown::new(2);
        for _ in 0..50 {
            clock.tick();
            assert!(clock.remaining() <= 2);
        }
    }

    #[test]
    fn test_override_then_count_down() {
        let mut clock = Countdown::default();
        assert_eq!(clock.override_remaining(2), None);
        assert_eq!(clock.tick(), ClockEvent::Counting(1));
        assert_eq!(clock.tick(), ClockEvent::Elapsed);
        assert_eq!(clock.tick(), ClockEvent::Wrapped);
        assert_eq!(clock.remaining(), 60);
    }

    #[test]
    fn test_override_larger_than_period_is_kept() {
        let mut clock = Countdown::new(10);
        clock.override_remaining(90);
        assert_eq!(clock.remaining(), 90);
        assert_eq!(clock.tick(), ClockEvent::Counting(89));
    }

    #[test]
    fn test_override_to_zero_elapses() {
        let mut clock = Countdown::new(10);
        clock.tick();
        assert_eq!(clock.override_remaining(0), Some(ClockEvent::Elapsed));
        assert_eq!(clock.remaining(), 0);
        // Already at zero: nothing new reached
        assert_eq!(clock.override_remaining(0), None);
        assert_eq!(clock.tick(), ClockEvent::Wrapped);
        assert_eq!(clock.remaining(), 10);
    }

    #[test]
    fn test_zero_period_clamped() {
        let mut clock = Countdown::new(0);
        assert_eq!(clock.period(), 1);
        assert_eq!(clock.tick(), ClockEvent::Elapsed);
        assert_eq!(clock.tick(), ClockEvent::Wrapped);
    }
}
