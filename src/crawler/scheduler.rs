//! The harvest loop
//!
//! Each run picks a random batch of forums in random order, opens one browser
//! session, visits the forums one at a time with a cooldown after each, then
//! closes the session and idles before the next run. A [`StopSignal`] is
//! checked between forums and between runs, and interrupts any pause.

use crate::browser::{BrowserSession, SessionLauncher};
use crate::config::ScheduleConfig;
use crate::crawler::forum::{ForumOutcome, ForumScraper};
use crate::crawler::pacing::{DelayRange, StopSignal};
use crate::state::RunPhase;
use crate::storage::PostStore;
use futures_util::FutureExt;
use rand::seq::SliceRandom;
use rand::Rng;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, warn};

/// Batch size and pause ranges
#[derive(Debug, Clone)]
pub struct Schedule {
    pub batch_min: usize,
    pub batch_max: usize,
    pub cooldown: DelayRange,
    pub idle: DelayRange,
    pub empty_backoff: DelayRange,
}

impl Schedule {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            batch_min: config.batch_min,
            batch_max: config.batch_max,
            cooldown: DelayRange::from_secs(config.cooldown_min_secs, config.cooldown_max_secs),
            idle: DelayRange::from_secs(config.idle_min_secs, config.idle_max_secs),
            empty_backoff: DelayRange::from_secs(
                config.empty_backoff_min_secs,
                config.empty_backoff_max_secs,
            ),
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Forums chosen for this run, in visiting order
    pub selected: Vec<String>,

    /// Forums actually visited (fewer than selected if stopped early)
    pub visited: usize,

    pub failed: usize,
    pub considered: usize,
    pub saved: usize,
    pub inserted: usize,

    /// The browser session could not be opened, so nothing was visited
    pub session_failed: bool,
}

impl RunReport {
    fn record(&mut self, outcome: &ForumOutcome) {
        self.visited += 1;
        match outcome {
            ForumOutcome::Scraped(report) => {
                self.considered += report.considered;
                self.saved += report.saved;
                self.inserted += report.inserted;
            }
            ForumOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Picks a random batch of distinct forums in random order
///
/// The batch size is drawn uniformly from `[min, max]` and then clamped to the
/// number of forums, so a range reaching past the list often takes all of it.
pub fn select_batch<R: Rng + ?Sized>(
    forums: &[String],
    min: usize,
    max: usize,
    rng: &mut R,
) -> Vec<String> {
    if forums.is_empty() {
        return Vec::new();
    }

    let size = rng.gen_range(min..=max.max(min)).min(forums.len());

    let mut batch: Vec<String> = forums.choose_multiple(rng, size).cloned().collect();
    batch.shuffle(rng);
    batch
}

/// Drives forum visits run after run
pub struct RunScheduler<L, S, R> {
    forums: Vec<String>,
    schedule: Schedule,
    scraper: ForumScraper,
    launcher: L,
    store: S,
    rng: R,
    stop: StopSignal,
    phase: RunPhase,
}

impl<L, S, R> RunScheduler<L, S, R>
where
    L: SessionLauncher,
    S: PostStore,
    R: Rng,
{
    pub fn new(
        forums: Vec<String>,
        schedule: Schedule,
        scraper: ForumScraper,
        launcher: L,
        store: S,
        rng: R,
        stop: StopSignal,
    ) -> Self {
        Self {
            forums,
            schedule,
            scraper,
            launcher,
            store,
            rng,
            stop,
            phase: RunPhase::Idle,
        }
    }

    /// Current phase; a scheduler that has not started yet is idle
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn enter(&mut self, next: RunPhase) {
        if !self.phase.can_transition_to(next) {
            warn!("Unexpected phase change {} -> {}", self.phase, next);
        }
        debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Runs until the stop signal fires; returns the number of runs started
    pub async fn run_forever(&mut self) -> usize {
        info!("Harvest loop started with {} forums", self.forums.len());
        let mut runs = 0;

        while !self.stop.is_stopped() {
            let report = self.run_once().await;
            runs += 1;

            let pause = if report.selected.is_empty() {
                self.schedule.empty_backoff.sample(&mut self.rng)
            } else {
                info!(
                    "Run {} finished: {} forums visited ({} failed), {} posts saved ({} new)",
                    runs, report.visited, report.failed, report.saved, report.inserted
                );
                self.schedule.idle.sample(&mut self.rng)
            };

            debug_assert!(self.phase.is_pause());
            info!("Idling for {:.1} minutes", pause.as_secs_f64() / 60.0);
            if !self.stop.sleep(pause).await {
                break;
            }
        }

        info!("Harvest loop stopped after {} runs", runs);
        runs
    }

    /// One pass: select a batch, visit each forum with a cooldown after it
    ///
    /// Always ends in [`RunPhase::Idle`]; the idle pause itself is left to the
    /// caller.
    pub async fn run_once(&mut self) -> RunReport {
        self.enter(RunPhase::Selecting);

        let batch = select_batch(
            &self.forums,
            self.schedule.batch_min,
            self.schedule.batch_max,
            &mut self.rng,
        );
        let mut report = RunReport {
            selected: batch.clone(),
            ..RunReport::default()
        };

        if batch.is_empty() {
            warn!("No forums configured; backing off");
            self.enter(RunPhase::Idle);
            return report;
        }

        info!("Starting run with {} forums: {}", batch.len(), batch.join(", "));

        let mut session = match self.launcher.open().await {
            Ok(session) => session,
            Err(e) => {
                error!("Could not open browser session: {}", e);
                report.session_failed = true;
                self.enter(RunPhase::Idle);
                return report;
            }
        };

        for forum in &batch {
            if self.stop.is_stopped() {
                info!("Stop requested; ending run early");
                break;
            }

            self.enter(RunPhase::Scraping);
            let outcome = AssertUnwindSafe(self.scraper.scrape(
                &mut self.store,
                session.page(),
                forum,
                &mut self.rng,
            ))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic_message(panic.as_ref());
                error!("r/{}: unexpected error: {}", forum, message);
                ForumOutcome::Failed(message)
            });
            report.record(&outcome);

            self.enter(RunPhase::Cooling);
            let pause = self.schedule.cooldown.sample(&mut self.rng);
            info!("Cooling down for {}s", pause.as_secs());
            if !self.stop.sleep(pause).await {
                info!("Stop requested; ending run early");
                break;
            }
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        self.enter(RunPhase::Idle);
        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
