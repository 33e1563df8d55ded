//! Humanized delays and the stop signal
//!
//! Every pause in the harvester is drawn uniformly from a configured range and
//! can be cut short by a [`StopSignal`].

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// An inclusive range of pause durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Creates a range; bounds given in the wrong order are swapped
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn from_millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws a duration uniformly from the range, at millisecond resolution
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

/// Creates a connected stop handle and signal
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Requests the harvest loop to stop
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        // Ignore the error: no receiver left means nothing is running
        let _ = self.tx.send(true);
    }
}

/// Observed by the harvest loop between forums and between runs
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, signal) = stop_channel();
        signal
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleeps for `duration` unless stopped first
    ///
    /// Returns `true` if the full duration elapsed and `false` if the sleep
    /// was cut short (or never started) because stop was requested. A
    /// dropped [`StopHandle`] does not count as a stop.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_stopped() {
            return false;
        }

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        let stopped = tokio::select! {
            _ = &mut sleep => return true,
            changed = self.rx.wait_for(|stopped| *stopped) => changed.is_ok(),
        };
        if stopped {
            return false;
        }

        sleep.await;
        true
    }
}

/// Turns interrupts into a graceful stop, then a forced exit
///
/// The first interrupt stops the loop after the current forum. A second one
/// calls `force_exit`, since a navigation may keep the loop busy for a while.
/// An error from `interrupt` (no signal handler) ends the watch.
pub async fn handle_interrupts<F, Fut, X>(handle: StopHandle, mut interrupt: F, force_exit: X)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
    X: FnOnce(),
{
    if interrupt().await.is_err() {
        return;
    }
    info!("Interrupt received; stopping after the current forum (Ctrl-C again to quit now)");
    handle.stop();

    if interrupt().await.is_err() {
        return;
    }
    warn!("Second interrupt received; exiting immediately");
    force_exit();
}
