use crate::extract::{DEFAULT_MAX_POST_AGE_HOURS, DEFAULT_ORIGIN};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Forum Harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Forums to rotate through
    #[serde(default)]
    pub forums: Vec<String>,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub browser: BrowserSettings,

    #[serde(default)]
    pub selectors: SelectorConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Batch sizes and humanized delays
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScheduleConfig {
    /// Minimum number of forums visited per run
    pub batch_min: usize,

    /// Maximum number of forums visited per run
    pub batch_max: usize,

    /// Pause between forums within a run (seconds)
    pub cooldown_min_secs: u64,
    pub cooldown_max_secs: u64,

    /// Pause between runs (seconds)
    pub idle_min_secs: u64,
    pub idle_max_secs: u64,

    /// Pause before retrying when no forums are configured (seconds)
    pub empty_backoff_min_secs: u64,
    pub empty_backoff_max_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            batch_min: 13,
            batch_max: 31,
            cooldown_min_secs: 13,
            cooldown_max_secs: 31,
            idle_min_secs: 6 * 60,
            idle_max_secs: 18 * 60,
            empty_backoff_min_secs: 120,
            empty_backoff_max_secs: 240,
        }
    }
}

/// Post extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractionConfig {
    /// Staleness window; older posts are not stored
    pub max_post_age_hours: f64,

    /// Site origin for listing URLs and root-relative permalinks
    pub origin: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_post_age_hours: DEFAULT_MAX_POST_AGE_HOURS,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl ExtractionConfig {
    pub fn max_post_age(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.max_post_age_hours * 3_600_000.0) as i64)
    }
}

/// Headless browser settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BrowserSettings {
    pub headless: bool,

    /// Chrome/Chromium executable (auto-detected when unset)
    pub chrome_path: Option<PathBuf>,

    /// Pre-authenticated session state (Playwright storage-state JSON)
    pub session_state: Option<PathBuf>,

    pub user_agent: Option<String>,

    pub navigation_timeout_secs: u64,
    pub element_timeout_secs: u64,

    /// Lazy-load scrolling
    pub scroll_steps: u32,
    pub scroll_distance: u32,
    pub scroll_pause_min_ms: u64,
    pub scroll_pause_max_ms: u64,

    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            session_state: None,
            user_agent: None,
            navigation_timeout_secs: 60,
            element_timeout_secs: 20,
            scroll_steps: 3,
            scroll_distance: 2000,
            scroll_pause_min_ms: 800,
            scroll_pause_max_ms: 1400,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }
}

/// CSS selectors for the parts of a post element
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    pub container: String,
    pub title: String,
    pub timestamp_anchor: String,
    pub timestamp_time: String,
    pub permalink: String,
    pub score: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: "div[data-testid='post-container'], article[data-testid='post-container']"
                .to_string(),
            title: "h3".to_string(),
            timestamp_anchor: "a[data-click-id='timestamp']".to_string(),
            timestamp_time: "a[data-click-id='timestamp'] time".to_string(),
            permalink: "a[data-click-id='comments'], a[data-click-id='body']".to_string(),
            score: "[data-click-id='score'], div[data-test-id='post-content'] span".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Directory for failure screenshots
    pub screenshot_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "harvest.db".to_string(),
            screenshot_dir: PathBuf::from("."),
        }
    }
}
