//! In-memory browser fakes for crawler tests

use crate::browser::{
    BrowserError, BrowserPage, BrowserResult, BrowserSession, SessionLauncher,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One post in a generated listing
pub struct PostFixture {
    pub id: &'static str,
    pub title: &'static str,
    pub score: &'static str,
    pub age_minutes: i64,
}

impl PostFixture {
    pub fn fresh(id: &'static str, title: &'static str, score: &'static str, age_minutes: i64) -> Self {
        Self {
            id,
            title,
            score,
            age_minutes,
        }
    }
}

/// Renders posts the way the default selectors expect them
pub fn listing_html(posts: &[PostFixture]) -> String {
    let now = Utc::now();
    let mut html = String::from("<html><body><div id=\"listing\">");

    for post in posts {
        let created = now - ChronoDuration::minutes(post.age_minutes);
        let slug = post.title.to_lowercase().replace(' ', "_");
        html.push_str(&format!(
            r#"<div data-testid="post-container">
                 <h3>{title}</h3>
                 <a data-click-id="timestamp" href="/r/rust/comments/{id}/{slug}/">
                   <time datetime="{datetime}">{age} minutes ago</time>
                 </a>
                 <a data-click-id="comments" href="/r/rust/comments/{id}/{slug}/">comments</a>
                 <div data-click-id="score">{score}</div>
               </div>"#,
            title = post.title,
            id = post.id,
            slug = slug,
            datetime = created.to_rfc3339(),
            age = post.age_minutes,
            score = post.score,
        ));
    }

    html.push_str("</div></body></html>");
    html
}

/// A page that serves fixed HTML per forum
pub struct FakePage {
    pages: HashMap<String, String>,
    fallback: String,
    current: Mutex<Option<String>>,
    fail_navigation: bool,
    visited: Mutex<Vec<String>>,
    scrolls: AtomicUsize,
}

impl FakePage {
    /// Serves `html` for every URL
    pub fn new(html: String) -> Self {
        Self {
            pages: HashMap::new(),
            fallback: html,
            current: Mutex::new(None),
            fail_navigation: false,
            visited: Mutex::new(Vec::new()),
            scrolls: AtomicUsize::new(0),
        }
    }

    /// Serves `html` for the listing of `forum` only
    pub fn with_forum(mut self, forum: &str, html: String) -> Self {
        self.pages.insert(format!("/r/{}/hot/", forum), html);
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    fn current_html(&self) -> String {
        self.current
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        self.visited.lock().unwrap().push(url.to_string());
        if self.fail_navigation {
            return Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            });
        }

        let html = self
            .pages
            .iter()
            .find(|(suffix, _)| url.ends_with(suffix.as_str()))
            .map(|(_, html)| html.clone());
        *self.current.lock().unwrap() = html;
        Ok(())
    }

    async fn wait_for_selector(&self, css: &str, timeout: Duration) -> BrowserResult<()> {
        let selector = Selector::parse(css).map_err(|e| BrowserError::Cdp(format!("{:?}", e)))?;
        let found = Html::parse_document(&self.current_html())
            .select(&selector)
            .next()
            .is_some();

        if found {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                what: css.to_string(),
                after: timeout,
            })
        }
    }

    async fn scroll_by(&self, _distance: u32) -> BrowserResult<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        Ok(self.current_html())
    }

    async fn screenshot(&self, path: &Path) -> BrowserResult<()> {
        std::fs::write(path, b"\x89PNG fake")?;
        Ok(())
    }
}

/// Counts sessions opened and closed by a [`FakeLauncher`]
#[derive(Debug, Default)]
pub struct SessionLog {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

/// Hands out sessions that share one [`FakePage`]
pub struct FakeLauncher {
    page: Arc<FakePage>,
    fail_open: bool,
    pub log: Arc<SessionLog>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: Arc::new(page),
            fail_open: false,
            log: Arc::new(SessionLog::default()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(FakePage::new(String::new()))
        }
    }
}

pub struct FakeSession {
    page: Arc<FakePage>,
    log: Arc<SessionLog>,
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn open(&self) -> BrowserResult<FakeSession> {
        if self.fail_open {
            return Err(BrowserError::Launch("no chrome here".to_string()));
        }
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            page: Arc::clone(&self.page),
            log: Arc::clone(&self.log),
        })
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Page = FakePage;

    fn page(&self) -> &FakePage {
        &self.page
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
