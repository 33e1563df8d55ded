//! Harvesting logic
//!
//! This module contains the core harvest loop, including:
//! - Humanized delays and the stop signal
//! - Single-forum visits with failure isolation
//! - Batch selection and the run scheduler

mod forum;
mod pacing;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use forum::{
    listing_url, screenshot_path, ForumOutcome, ForumReport, ForumScraper, ScrapeConfig,
};
pub use pacing::{handle_interrupts, stop_channel, DelayRange, StopHandle, StopSignal};
pub use scheduler::{select_batch, RunReport, RunScheduler, Schedule};

use crate::browser::ChromeLauncher;
use crate::config::Config;
use crate::storage::PostStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use url::Url;

/// Builds a scheduler that drives Chromium with the given configuration
///
/// Reads the session-state file (if configured) so that a missing or
/// malformed file fails startup instead of the first run.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `store` - Where harvested posts go
/// * `stop` - Signal that ends the loop
///
/// # Returns
///
/// * `Ok(RunScheduler)` - Ready to run
/// * `Err(HarvestError)` - Invalid origin, selectors or session state
pub fn build_scheduler<S: PostStore>(
    config: &Config,
    store: S,
    stop: StopSignal,
) -> crate::Result<RunScheduler<ChromeLauncher, S, StdRng>> {
    let origin = Url::parse(&config.extraction.origin)?;
    let launcher = ChromeLauncher::new(config.browser.clone(), origin)?;
    let scraper = ForumScraper::from_config(config)?;

    Ok(RunScheduler::new(
        config.forums.clone(),
        Schedule::from_config(&config.schedule),
        scraper,
        launcher,
        store,
        StdRng::from_entropy(),
        stop,
    ))
}
