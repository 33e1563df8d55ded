//! Chromium implementation of the browser traits over the DevTools protocol

use crate::browser::{
    load_session_state, BrowserError, BrowserPage, BrowserResult, BrowserSession,
    SessionLauncher, SessionState,
};
use crate::config::BrowserSettings;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, SetUserAgentOverrideParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::EventLifecycleEvent;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures_util::{Stream, StreamExt};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// How often `wait_for_selector` re-queries the DOM
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches a fresh Chromium process per session
pub struct ChromeLauncher {
    settings: BrowserSettings,
    origin: Url,
    session_state: Option<SessionState>,
}

impl ChromeLauncher {
    /// Creates a launcher, reading the session-state file up front so a bad
    /// file is reported at startup rather than on the first run
    pub fn new(settings: BrowserSettings, origin: Url) -> BrowserResult<Self> {
        let session_state = match &settings.session_state {
            Some(path) => {
                let state = load_session_state(path)?;
                info!(
                    "Loaded {} session cookies from {}",
                    state.cookies.len(),
                    path.display()
                );
                Some(state)
            }
            None => None,
        };

        Ok(Self {
            settings,
            origin,
            session_state,
        })
    }

    fn browser_config(&self) -> BrowserResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.settings.viewport_width, self.settings.viewport_height)
            .request_timeout(self.settings.navigation_timeout())
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio");

        builder = if self.settings.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };

        if let Some(ref chrome_path) = self.settings.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        builder.build().map_err(BrowserError::Launch)
    }

    fn user_agent_override(&self) -> Option<SetUserAgentOverrideParams> {
        self.settings
            .user_agent
            .as_ref()
            .map(|ua| SetUserAgentOverrideParams::new(ua.clone()))
    }

    fn cookie_params(&self) -> BrowserResult<Vec<CookieParam>> {
        let Some(state) = &self.session_state else {
            return Ok(Vec::new());
        };

        state
            .cookies
            .iter()
            .map(|cookie| {
                let mut builder = CookieParam::builder()
                    .name(cookie.name.clone())
                    .value(cookie.value.clone());

                builder = match &cookie.domain {
                    Some(domain) => builder.domain(domain.clone()),
                    None => builder.url(self.origin.as_str()),
                };
                if let Some(path) = &cookie.path {
                    builder = builder.path(path.clone());
                }
                if let Some(secure) = cookie.secure {
                    builder = builder.secure(secure);
                }
                if let Some(http_only) = cookie.http_only {
                    builder = builder.http_only(http_only);
                }
                if let Some(expires) = cookie.expires_at() {
                    builder = builder.expires(TimeSinceEpoch::new(expires));
                }

                builder.build().map_err(BrowserError::SessionState)
            })
            .collect()
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn open(&self) -> BrowserResult<ChromeSession> {
        let config = self.browser_config()?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = match open_page(&browser, self).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!("Failed to close browser after setup error: {}", close_err);
                }
                handler.abort();
                return Err(e);
            }
        };

        info!("Browser session opened");

        Ok(ChromeSession {
            browser,
            handler,
            page: ChromePage { page },
            closed: false,
        })
    }
}

async fn open_page(browser: &Browser, launcher: &ChromeLauncher) -> BrowserResult<Page> {
    let page = browser.new_page("about:blank").await.map_err(cdp)?;

    if let Some(user_agent) = launcher.user_agent_override() {
        page.set_user_agent(user_agent).await.map_err(cdp)?;
    }

    let cookies = launcher.cookie_params()?;
    if !cookies.is_empty() {
        page.set_cookies(cookies).await.map_err(cdp)?;
    }

    Ok(page)
}

fn cdp(err: chromiumoxide::error::CdpError) -> BrowserError {
    BrowserError::Cdp(err.to_string())
}

/// A running Chromium process and its single page
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: ChromePage,
    closed: bool,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Page = ChromePage;

    fn page(&self) -> &ChromePage {
        &self.page
    }

    async fn close(&mut self) -> BrowserResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await.map(|_| ()).map_err(cdp);
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler.abort();

        info!("Browser session closed");
        result
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Waits for `networkIdle` following the `init` of a new document
///
/// Returns false if the event stream ends first.
async fn network_settled<S>(names: S) -> bool
where
    S: Stream<Item = String>,
{
    futures_util::pin_mut!(names);
    let mut new_document = false;

    while let Some(name) = names.next().await {
        match name.as_str() {
            "init" => new_document = true,
            "networkIdle" if new_document => return true,
            _ => {}
        }
    }
    false
}

/// A Chromium tab
pub struct ChromePage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        debug!("Navigating to {}", url);
        let deadline = Instant::now() + timeout;

        // Subscribe first so the lifecycle events of this navigation are queued
        let lifecycle = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(cdp)?;

        match tokio::time::timeout_at(deadline, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(BrowserError::Timeout {
                    what: format!("navigation to {}", url),
                    after: timeout,
                })
            }
        }

        let names = lifecycle.map(|event| event.name.clone());
        match tokio::time::timeout_at(deadline, network_settled(names)).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(BrowserError::Cdp(format!(
                "lifecycle events ended before {} went idle",
                url
            ))),
            Err(_) => Err(BrowserError::Timeout {
                what: format!("network idle on {}", url),
                after: timeout,
            }),
        }
    }

    async fn wait_for_selector(&self, css: &str, timeout: Duration) -> BrowserResult<()> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.page.find_element(css).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: css.to_string(),
                    after: timeout,
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn scroll_by(&self, distance: u32) -> BrowserResult<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", distance))
            .await
            .map_err(cdp)?;
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        self.page.content().await.map_err(cdp)
    }

    async fn screenshot(&self, path: &Path) -> BrowserResult<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        let png = self.page.screenshot(params).await.map_err(cdp)?;
        tokio::fs::write(path, &png).await?;
        Ok(())
    }
}
