//! Tokio task that drives a shared [`TimerEngine`].
//!
//! The loop ticks the engine with the runtime's monotonic clock, then sleeps
//! until the next phase or session boundary (bounded by the refresh cadence).
//! It exits on its own once the engine is idle, and a [`Ticker`] aborts it
//! when dropped so a stopped timer never leaves a stray wake-up behind.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::engine::TimerEngine;

/// Engine shared between the driver task and its owner.
pub type SharedEngine = Arc<Mutex<TimerEngine>>;

/// Ticks `engine` until it stops running.
pub async fn run_ticker(engine: SharedEngine) {
    loop {
        let delay = {
            let mut engine = engine.lock().await;
            let now = Instant::now();
            engine.tick(now);
            engine.next_tick_delay(now)
        };

        match delay {
            Some(delay) => sleep(delay).await,
            None => break,
        }
    }
    debug!("Ticker exited: engine idle");
}

/// Handle to a spawned [`run_ticker`] task.
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the tick loop on the current runtime.
    pub fn spawn(engine: SharedEngine) -> Self {
        Self {
            handle: tokio::spawn(run_ticker(engine)),
        }
    }

    /// True once the loop has exited or been aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
