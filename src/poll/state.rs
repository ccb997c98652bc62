//! Poll state and the reducer that applies events to it

use super::countdown::{ClockEvent, Countdown};
use crate::feed::{Category, CategoryFeed, DisplayImage};

/// Everything the view renders
#[derive(Debug, Clone)]
pub struct PollState {
    pub countdown: Countdown,
    pub cats: CategoryFeed,
    pub dogs: CategoryFeed,
    pub total_retrieved: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// One second passed
    Tick,
    /// A successful retrieval
    Retrieved { category: Category, image: DisplayImage },
    /// Server asked us to wait before the next attempt
    RateLimited { wait_seconds: u32 },
    /// Network, status or parse failure. Leaves state alone.
    Failed,
}

impl PollState {
    pub fn new(period_secs: u32, feed_capacity: usize) -> Self {
        Self {
            countdown: Countdown::new(period_secs),
            cats: CategoryFeed::new(feed_capacity),
            dogs: CategoryFeed::new(feed_capacity),
            total_retrieved: 0,
        }
    }

    /// Apply one event. Returns the clock event it caused, if any: every
    /// `Tick`, and a rate limit that drops the countdown onto zero.
    pub fn apply(&mut self, event: PollEvent) -> Option<ClockEvent> {
        match event {
            PollEvent::Tick => Some(self.countdown.tick()),
            PollEvent::Retrieved { category, image } => {
                self.feed_mut(category).push(image);
                self.total_retrieved += 1;
                None
            }
            PollEvent::RateLimited { wait_seconds } => self.countdown.override_remaining(wait_seconds),
            PollEvent::Failed => None,
        }
    }

    pub fn feed(&self, category: Category) -> &CategoryFeed {
        match category {
            Category::Cat => &self.cats,
            Category::Dog => &self.dogs,
        }
    }

    fn feed_mut(&mut self, category: Category) -> &mut CategoryFeed {
        match category {
            Category::Cat => &mut self.cats,
            Category::Dog => &mut self.dogs,
        }
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.countdown.remaining()
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new(
            super::countdown::DEFAULT_PERIOD_SECS,
            crate::feed::DEFAULT_FEED_CAPACITY,
        )
    }
}
