//! Cursor-based polling loop.
//!
//! One loop task repeatedly fetches events past the cursor, advances the cursor
//! event by event and hands each event to the router:
//! - events are processed in ascending id order regardless of arrival order
//! - ids at or below the cursor are skipped (duplicates)
//! - a failed fetch leaves the cursor untouched and backs off before retrying
//! - stopping takes effect at the end of the current cycle

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::Mutex as AsyncMutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::EventId, messaging::port::TransportClient, router::Router, run_state::RunState,
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct PollConfig {
    /// Pause after a successful cycle.
    pub interval: Duration,
    /// Pause after a failed fetch.
    pub backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            backoff: Duration::from_secs(5),
        }
    }
}

/// Sleep source for the loop, swappable in tests.
#[async_trait]
pub trait Ticker: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioTicker;

#[async_trait]
impl Ticker for TokioTicker {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Highest event id handed to the router. Written only by the loop task.
#[derive(Debug, Default)]
pub struct Cursor(AtomicI64);

impl Cursor {
    pub fn get(&self) -> EventId {
        EventId(self.0.load(Ordering::SeqCst))
    }

    /// Move forward to `id`. Returns false (and leaves the cursor alone) if `id`
    /// is not past the current position.
    fn advance_to(&self, id: EventId) -> bool {
        self.0.fetch_max(id.0, Ordering::SeqCst) < id.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PollerStatus {
    pub running: bool,
    pub cursor: i64,
    pub timestamp: DateTime<Utc>,
}

pub struct Poller {
    transport: Arc<dyn TransportClient>,
    router: Router,
    cfg: PollConfig,
    ticker: Arc<dyn Ticker>,
    cursor: Cursor,
    state: Arc<RunState>,
    // Held for the lifetime of a loop so a restart waits for the previous loop's last cycle.
    loop_lock: AsyncMutex<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(transport: Arc<dyn TransportClient>, router: Router, cfg: PollConfig) -> Self {
        Self {
            transport,
            router,
            cfg,
            ticker: Arc::new(TokioTicker),
            cursor: Cursor::default(),
            state: Arc::new(RunState::new()),
            loop_lock: AsyncMutex::new(()),
            task: Mutex::new(None),
        }
    }

    pub fn with_ticker(mut self, ticker: Arc<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn cursor(&self) -> EventId {
        self.cursor.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn run_state(&self) -> Arc<RunState> {
        self.state.clone()
    }

    pub fn status(&self) -> PollerStatus {
        PollerStatus {
            running: self.is_running(),
            cursor: self.cursor().0,
            timestamp: Utc::now(),
        }
    }

    /// Spawn the loop if it is not running. Returns false when it already was.
    pub fn start(self: &Arc<Self>) -> bool {
        let Some(token) = self.state.try_start() else {
            tracing::debug!("start requested while already running");
            return false;
        };
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run(token).await });
        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        true
    }

    /// Ask the loop to stop after its current cycle. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        let changed = self.state.stop();
        if changed {
            tracing::info!(cursor = self.cursor().0, "polling loop stop requested");
        }
        changed
    }

    /// Wait for the most recently started loop task to exit.
    pub async fn join(&self) {
        let handle = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "polling task panicked");
            }
        }
    }

    /// Stop and wait for the loop to finish its current cycle.
    pub async fn shutdown(&self) {
        self.stop();
        self.join().await;
    }

    /// Drive fetch cycles until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let _exclusive = self.loop_lock.lock().await;
        tracing::info!(cursor = self.cursor().0, "polling loop started");

        while !cancel.is_cancelled() {
            let delay = match self.poll_once().await {
                Ok(_) => self.cfg.interval,
                Err(e) => {
                    tracing::warn!(
                        offset = self.cursor().next().0,
                        error = %e,
                        backoff_ms = self.cfg.backoff.as_millis() as u64,
                        "fetch failed, backing off"
                    );
                    self.cfg.backoff
                }
            };

            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.ticker.sleep(delay) => {}
            }
        }

        tracing::info!(cursor = self.cursor().0, "polling loop stopped");
    }

    /// One fetch/dispatch cycle. Returns how many events were dispatched.
    ///
    /// Only the loop task may call this while the loop is running.
    pub async fn poll_once(&self) -> Result<usize> {
        let offset = self.cursor().next();
        let mut events = self.transport.fetch_events(offset).await?;
        events.sort_by_key(|e| e.id);

        let mut dispatched = 0usize;
        for event in events {
            if !self.cursor.advance_to(event.id) {
                tracing::debug!(
                    event_id = event.id.0,
                    cursor = self.cursor().0,
                    "skipping already consumed event"
                );
                continue;
            }
            self.router.dispatch(&event).await;
            dispatched += 1;
        }
        Ok(dispatched)
    }
}
