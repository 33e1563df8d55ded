//! Browser automation boundary
//!
//! The harvester only needs a handful of capabilities from a browser: load a
//! page, wait for an element, scroll, read the rendered HTML and capture a
//! screenshot. They are expressed as traits so the scraper can be driven by
//! a real Chromium instance or by in-memory fakes.

mod chrome;
mod session;

pub use chrome::{ChromeLauncher, ChromePage, ChromeSession};
pub use session::{load_session_state, parse_session_state, SessionCookie, SessionState};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the browser collaborator
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {}s waiting for {what}", after.as_secs())]
    Timeout { what: String, after: Duration },

    #[error("Browser protocol error: {0}")]
    Cdp(String),

    #[error("Invalid session state: {0}")]
    SessionState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// One open page (tab) in a browser session
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigates to `url`, failing with [`BrowserError::Timeout`] if the load
    /// does not settle within `timeout`
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Waits until at least one element matches `css`
    async fn wait_for_selector(&self, css: &str, timeout: Duration) -> BrowserResult<()>;

    /// Scrolls the viewport down by `distance` pixels
    async fn scroll_by(&self, distance: u32) -> BrowserResult<()>;

    /// Returns the current rendered document as HTML
    async fn content(&self) -> BrowserResult<String>;

    /// Writes a full-page PNG screenshot to `path`
    async fn screenshot(&self, path: &Path) -> BrowserResult<()>;
}

/// A browser session holding the page used for a whole run
#[async_trait]
pub trait BrowserSession: Send {
    type Page: BrowserPage;

    fn page(&self) -> &Self::Page;

    /// Shuts the session down; the session must not be used afterwards
    async fn close(&mut self) -> BrowserResult<()>;
}

/// Opens browser sessions, one per run
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self) -> BrowserResult<Self::Session>;
}
