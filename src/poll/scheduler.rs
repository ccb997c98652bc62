//! Decides when a fetch should start by watching the countdown

use super::countdown::ClockEvent;

/// Why a fetch was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Activation,   // view came up
    ClockElapsed, // countdown reached zero
    Manual,       // user asked for one
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Activation => "activation",
            Trigger::ClockElapsed => "timer",
            Trigger::Manual => "manual",
        }
    }
}

/// Serializes fetches: at most one is in flight, extra triggers are dropped
#[derive(Debug, Default)]
pub struct FetchScheduler {
    activated: bool,
    in_flight: bool,
    dropped: u64,
}

impl FetchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires once, the first time the view is activated
    pub fn activate(&mut self) -> Option<Trigger> {
        if self.activated {
            return None;
        }
        self.activated = true;
        self.request(Trigger::Activation)
    }

    pub fn observe(&mut self, event: ClockEvent) -> Option<Trigger> {
        match event {
            ClockEvent::Elapsed => self.request(Trigger::ClockElapsed),
            ClockEvent::Counting(_) | ClockEvent::Wrapped => None,
        }
    }

    pub fn request_manual(&mut self) -> Option<Trigger> {
        self.request(Trigger::Manual)
    }

    /// The in-flight fetch finished, whatever its outcome
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Triggers dropped because a fetch was already running
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn request(&mut self, trigger: Trigger) -> Option<Trigger> {
        if self.in_flight {
            self.dropped += 1;
            tracing::debug!("Fetch already in flight, dropping {} trigger", trigger.as_str());
            return None;
        }
        self.in_flight = true;
        Some(trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_fires_once() {
        let mut scheduler = FetchScheduler::new();
        assert_eq!(scheduler.activate(), Some(Trigger::Activation));
        scheduler.complete();
        assert_eq!(scheduler.activate(), None);
    }

    #[test]
    fn test_only_elapsed_triggers() {
        let mut scheduler = FetchScheduler::new();
        assert_eq!(scheduler.observe(ClockEvent::Counting(5)), None);
        assert_eq!(scheduler.observe(ClockEvent::Wrapped), None);
        assert_eq!(scheduler.observe(ClockEvent::Elapsed), Some(Trigger::ClockElapsed));
    }

    #[test]
    fn test_trigger_dropped_while_in_flight() {
        let mut scheduler = FetchScheduler::new();
        assert!(scheduler.activate().is_some());
        assert!(scheduler.in_flight());

        assert_eq!(scheduler.observe(ClockEvent::Elapsed), None);
        assert_eq!(scheduler.request_manual(), None);
        assert_eq!(scheduler.dropped(), 2);

        scheduler.complete();
        assert!(!scheduler.in_flight());
        assert_eq!(scheduler.request_manual(), Some(Trigger::Manual));
    }
}
