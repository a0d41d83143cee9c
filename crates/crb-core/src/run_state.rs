use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use tokio_util::sync::CancellationToken;

/// Whether the polling loop should be running, plus the token that stops it.
///
/// Shared by the loop task and the control surface. Transitions are serialized by
/// an internal lock; `is_running` is a lock-free read.
#[derive(Debug)]
pub struct RunState {
    running: AtomicBool,
    cancel: Mutex<CancellationToken>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Stopped -> Running. Returns the token for the new loop, or `None` if a loop
    /// is already running.
    pub fn try_start(&self) -> Option<CancellationToken> {
        let mut current = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        if self.running.load(Ordering::SeqCst) {
            return None;
        }
        let token = CancellationToken::new();
        *current = token.clone();
        self.running.store(true, Ordering::SeqCst);
        Some(token)
    }

    /// Running -> Stopped. Returns whether the state actually changed.
    ///
    /// The loop notices at the end of its current cycle; in-flight requests are not
    /// interrupted.
    pub fn stop(&self) -> bool {
        let current = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        current.cancel();
        self.running.swap(false, Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
