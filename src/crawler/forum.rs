//! One visit to one forum
//!
//! A visit loads the forum's listing, waits for posts to render, scrolls a few
//! times to trigger lazy loading, extracts posts from the rendered HTML and
//! stores them. Any failure is contained here: it is logged, a screenshot of
//! the page is saved, and the visit reports [`ForumOutcome::Failed`].

use crate::browser::BrowserPage;
use crate::config::Config;
use crate::crawler::pacing::DelayRange;
use crate::extract::{ExtractorConfig, PostExtractor, Selectors};
use crate::storage::PostStore;
use crate::{ConfigError, ConfigResult};
use anyhow::Context;
use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

/// Page interaction settings for a forum visit
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub navigation_timeout: Duration,
    pub element_timeout: Duration,
    pub scroll_steps: u32,
    pub scroll_distance: u32,
    pub scroll_pause: DelayRange,
    pub screenshot_dir: PathBuf,
}

impl ScrapeConfig {
    pub fn from_config(config: &Config) -> Self {
        let browser = &config.browser;
        Self {
            navigation_timeout: browser.navigation_timeout(),
            element_timeout: browser.element_timeout(),
            scroll_steps: browser.scroll_steps,
            scroll_distance: browser.scroll_distance,
            scroll_pause: DelayRange::from_millis(
                browser.scroll_pause_min_ms,
                browser.scroll_pause_max_ms,
            ),
            screenshot_dir: config.output.screenshot_dir.clone(),
        }
    }
}

/// Counters for a successful visit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForumReport {
    /// Candidate post elements on the page
    pub considered: usize,

    /// Posts handed to the store
    pub saved: usize,

    /// Posts the store had not seen before
    pub inserted: usize,
}

/// Result of a forum visit; failures never propagate past the scraper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForumOutcome {
    Scraped(ForumReport),
    Failed(String),
}

impl ForumOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn report(&self) -> Option<&ForumReport> {
        match self {
            Self::Scraped(report) => Some(report),
            Self::Failed(_) => None,
        }
    }
}

/// Visits forums on an open page
pub struct ForumScraper {
    config: ScrapeConfig,
    extractor: PostExtractor,
}

impl ForumScraper {
    pub fn new(config: ScrapeConfig, extractor: PostExtractor) -> Self {
        Self { config, extractor }
    }

    /// Builds a scraper from the validated configuration
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let origin = Url::parse(&config.extraction.origin)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.extraction.origin, e)))?;
        let selectors = Selectors::parse(&config.selectors).map_err(ConfigError::Validation)?;

        let extractor = PostExtractor::new(
            ExtractorConfig {
                max_post_age: config.extraction.max_post_age(),
                origin,
            },
            selectors,
        );

        Ok(Self::new(ScrapeConfig::from_config(config), extractor))
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn extractor(&self) -> &PostExtractor {
        &self.extractor
    }

    /// Visits `forum` and stores its fresh posts
    ///
    /// Never returns an error: on failure the page is screenshotted to
    /// `debug_error_{forum}.png` in the screenshot directory and the outcome
    /// is [`ForumOutcome::Failed`].
    pub async fn scrape<P, S, R>(
        &self,
        store: &mut S,
        page: &P,
        forum: &str,
        rng: &mut R,
    ) -> ForumOutcome
    where
        P: BrowserPage + ?Sized,
        S: PostStore + ?Sized,
        R: Rng + ?Sized,
    {
        info!("--- Scraping r/{} ---", forum);

        match self.try_scrape(store, page, forum, rng).await {
            Ok(report) => {
                info!(
                    "r/{}: saved {} of {} posts ({} new)",
                    forum, report.saved, report.considered, report.inserted
                );
                ForumOutcome::Scraped(report)
            }
            Err(e) => {
                error!("r/{}: scrape failed: {:#}", forum, e);

                let path = screenshot_path(&self.config.screenshot_dir, forum);
                match page.screenshot(&path).await {
                    Ok(()) => info!("r/{}: saved debug screenshot to {}", forum, path.display()),
                    Err(shot_err) => warn!("r/{}: could not save screenshot: {}", forum, shot_err),
                }

                ForumOutcome::Failed(format!("{:#}", e))
            }
        }
    }

    async fn try_scrape<P, S, R>(
        &self,
        store: &mut S,
        page: &P,
        forum: &str,
        rng: &mut R,
    ) -> anyhow::Result<ForumReport>
    where
        P: BrowserPage + ?Sized,
        S: PostStore + ?Sized,
        R: Rng + ?Sized,
    {
        let url = listing_url(&self.extractor.config().origin, forum)?;

        page.goto(url.as_str(), self.config.navigation_timeout)
            .await
            .with_context(|| format!("loading {}", url))?;

        page.wait_for_selector(
            self.extractor.selectors().container_css(),
            self.config.element_timeout,
        )
        .await
        .context("waiting for posts to render")?;

        for _ in 0..self.config.scroll_steps {
            page.scroll_by(self.config.scroll_distance)
                .await
                .context("scrolling")?;
            tokio::time::sleep(self.config.scroll_pause.sample(rng)).await;
        }

        let html = page.content().await.context("reading page content")?;
        let extraction = self
            .extractor
            .extract_html(&html, forum, Utc::now().naive_utc());

        let mut report = ForumReport {
            considered: extraction.considered,
            ..ForumReport::default()
        };

        for post in extraction.posts {
            let inserted = store
                .upsert_post(
                    &post.forum_name,
                    &post.post_id,
                    &post.post_url,
                    post.score,
                    post.created_at,
                )
                .with_context(|| format!("storing post {}", post.post_id))?;

            report.saved += 1;
            if inserted {
                report.inserted += 1;
            }
            info!(
                "r/{}: {} [{} pts] {}",
                forum,
                if inserted { "saved" } else { "seen" },
                post.score,
                post.title
            );
        }

        if report.saved == 0 && report.considered > 0 {
            warn!("r/{}: no suitable posts found", forum);
        }

        Ok(report)
    }
}

/// Listing URL for a forum's "hot" page
pub fn listing_url(origin: &Url, forum: &str) -> Result<Url, url::ParseError> {
    origin.join(&format!("/r/{}/hot/", forum))
}

/// Diagnostic screenshot location; the forum name is reduced to a safe file name
pub fn screenshot_path(dir: &Path, forum: &str) -> PathBuf {
    let safe: String = forum
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("debug_error_{}.png", safe))
}
