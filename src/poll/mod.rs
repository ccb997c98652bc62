//! Poller runtime: drives the countdown, starts fetches and folds their
//! outcomes back into the poll state.
//!
//! Fetches run on their own tasks and report over a channel; every state
//! change happens on whichever loop owns the `Poller`.

pub mod countdown;
pub mod scheduler;
pub mod state;

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::client::{FetchError, ImageClient, NextImage};
use crate::config::AppConfig;
use crate::feed::DisplayImage;
use scheduler::{FetchScheduler, Trigger};
use state::{PollEvent, PollState};

const TICK: Duration = Duration::from_secs(1);

pub type FetchOutcome = std::result::Result<NextImage, FetchError>;

pub struct Poller {
    state: PollState,
    scheduler: FetchScheduler,
    client: Arc<ImageClient>,
    timestamp_format: String,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    active: bool,
    last_tick: Instant,
}

impl Poller {
    pub fn new(config: &AppConfig, client: ImageClient) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            state: PollState::new(config.period_secs, config.feed_capacity),
            scheduler: FetchScheduler::new(),
            client: Arc::new(client),
            timestamp_format: config.timestamp_format.clone(),
            outcome_tx,
            outcome_rx,
            active: true,
            last_tick: Instant::now(),
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn in_flight(&self) -> bool {
        self.scheduler.in_flight()
    }

    pub fn endpoint(&self) -> &str {
        self.client.url()
    }

    /// Bring the view up: starts the clock and fetches right away
    pub fn activate(&mut self) {
        self.last_tick = Instant::now();
        if let Some(trigger) = self.scheduler.activate() {
            self.spawn_fetch(trigger);
        }
    }

    /// Advance the countdown by exactly one second
    pub fn tick(&mut self) {
        if !self.active {
            return;
        }
        let trigger = self
            .state
            .apply(PollEvent::Tick)
            .and_then(|event| self.scheduler.observe(event));
        if let Some(trigger) = trigger {
            self.spawn_fetch(trigger);
        }
    }

    /// Run one tick for every whole second since the last one
    pub fn advance_clock(&mut self) {
        while self.active && self.last_tick.elapsed() >= TICK {
            self.last_tick += TICK;
            self.tick();
        }
    }

    /// Fetch immediately and restart the countdown. False if one is already running.
    pub fn fetch_now(&mut self) -> bool {
        if !self.active {
            return false;
        }
        match self.scheduler.request_manual() {
            Some(trigger) => {
                self.state.countdown.restart();
                self.spawn_fetch(trigger);
                true
            }
            None => false,
        }
    }

    /// Apply every outcome that has already arrived
    pub fn drain_outcomes(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.handle_outcome(outcome);
            handled += 1;
        }
        handled
    }

    /// Wait for the next fetch to finish. `None` once shut down.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcome_rx.recv().await
    }

    pub fn handle_outcome(&mut self, outcome: FetchOutcome) {
        self.scheduler.complete();

        if !self.active {
            tracing::debug!("Poller shut down, ignoring late fetch outcome");
            return;
        }

        let event = match outcome {
            Ok(next) => {
                tracing::info!(
                    "Retrieved {} image ({} base64 chars)",
                    next.category,
                    next.image_base64.len()
                );
                PollEvent::Retrieved {
                    category: next.category,
                    image: DisplayImage::captured_now(next.image_base64, &self.timestamp_format),
                }
            }
            Err(FetchError::RateLimited { wait_seconds }) => {
                tracing::warn!("Rate limited by backend, next attempt in {}s", wait_seconds);
                PollEvent::RateLimited { wait_seconds }
            }
            Err(e) => {
                tracing::error!("Error fetching image: {}", e);
                PollEvent::Failed
            }
        };

        // A rate limit of zero elapses the clock
        let trigger = self
            .state
            .apply(event)
            .and_then(|clock| self.scheduler.observe(clock));
        if let Some(trigger) = trigger {
            self.spawn_fetch(trigger);
        }
    }

    /// Stop the clock and refuse any outcome that arrives later
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.outcome_rx.close();
        tracing::info!(
            "Poller stopped after {} images ({} triggers dropped while busy)",
            self.state.total_retrieved,
            self.scheduler.dropped()
        );
    }

    fn spawn_fetch(&self, trigger: Trigger) {
        let client = Arc::clone(&self.client);
        let tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            tracing::debug!("Fetching next image ({})", trigger.as_str());
            let outcome = client.retrieve_next().await;
            if tx.send(outcome).is_err() {
                tracing::debug!("Poller gone, discarding fetch outcome");
            }
        });
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run the poller without a UI until Ctrl-C, logging every retrieval
pub async fn run_headless(poller: Poller) -> Result<()> {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_headless_until(poller, ctrl_c).await?;
    Ok(())
}

/// Headless loop that stops when `shutdown` resolves. Returns the final state.
pub async fn run_headless_until(mut poller: Poller, shutdown: impl Future<Output = ()>) -> Result<PollState> {
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    tracing::info!("Polling {} every {}s", poller.endpoint(), poller.state().countdown.period());
    poller.activate();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => poller.tick(),
            Some(outcome) = poller.next_outcome() => {
                poller.handle_outcome(outcome);
                let state = poller.state();
                tracing::info!(
                    "cats: {}  dogs: {}  total: {}  next in {}s",
                    state.cats.len(),
                    state.dogs.len(),
                    state.total_retrieved,
                    state.seconds_remaining()
                );
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted, stopping poller");
                break;
            }
        }
    }

    poller.shutdown();
    Ok(poller.state().clone())
}
