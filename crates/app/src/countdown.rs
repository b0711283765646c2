//! Countdown ticker — 1 Hz recomputation of the cadence countdown.
//!
//! The countdown itself is the pure
//! [`next_update_in`](moistlink_domain::cadence::next_update_in); this
//! module only owns the timer that re-evaluates it once per second and
//! publishes the result on a `watch` channel. The timer is the only
//! spontaneous wake-up of the session and must be stopped on teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use moistlink_domain::cadence::next_update_in;
use moistlink_domain::connection::SessionStatus;
use moistlink_domain::time::now;

const TICK: Duration = Duration::from_secs(1);

/// Owns the background countdown task.
pub struct CountdownTicker {
    countdown: Arc<watch::Sender<u64>>,
    handle: Option<JoinHandle<()>>,
}

impl Default for CountdownTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTicker {
    #[must_use]
    pub fn new() -> Self {
        let (countdown, _) = watch::channel(0);
        Self {
            countdown: Arc::new(countdown),
            handle: None,
        }
    }

    /// Receiver of the seconds remaining until the next expected update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.countdown.subscribe()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start ticking against the given session status, replacing any
    /// previous task. Must be called from within a tokio runtime.
    pub fn start(&mut self, status: watch::Receiver<SessionStatus>) {
        self.stop();

        let countdown = Arc::clone(&self.countdown);
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let secs = {
                    let status = status.borrow();
                    next_update_in(status.last_seen_at, status.mode, now())
                };
                countdown.send_replace(secs);
            }
        }));
        tracing::debug!("countdown ticker started");
    }

    /// Abort the task and reset the countdown to zero.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("countdown ticker stopped");
        }
        self.countdown.send_replace(0);
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
