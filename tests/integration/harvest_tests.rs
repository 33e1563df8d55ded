//! Integration tests for the harvester
//!
//! These tests drive full runs through an in-memory browser that serves
//! fixed listing HTML, storing posts in an on-disk SQLite database.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use forum_harvest::browser::{
    BrowserError, BrowserPage, BrowserResult, BrowserSession, SessionLauncher,
};
use forum_harvest::config::{parse_config, Config};
use forum_harvest::crawler::{stop_channel, ForumScraper, RunScheduler, Schedule, StopSignal};
use forum_harvest::output::load_statistics;
use forum_harvest::storage::{PostStore, SqliteStorage};
use forum_harvest::PostExtractor;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves one listing per forum; unknown forums get an empty page
struct ListingPage {
    listings: HashMap<String, String>,
    current: Mutex<String>,
}

#[async_trait]
impl BrowserPage for ListingPage {
    async fn goto(&self, url: &str, _timeout: Duration) -> BrowserResult<()> {
        let html = self
            .listings
            .iter()
            .find(|(forum, _)| url.ends_with(&format!("/r/{}/hot/", forum)))
            .map(|(_, html)| html.clone())
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        *self.current.lock().unwrap() = html;
        Ok(())
    }

    async fn wait_for_selector(&self, css: &str, timeout: Duration) -> BrowserResult<()> {
        if self.current.lock().unwrap().contains("post-container") {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                what: css.to_string(),
                after: timeout,
            })
        }
    }

    async fn scroll_by(&self, _distance: u32) -> BrowserResult<()> {
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn screenshot(&self, path: &Path) -> BrowserResult<()> {
        std::fs::write(path, b"png")?;
        Ok(())
    }
}

struct ListingSession {
    page: Arc<ListingPage>,
}

#[async_trait]
impl BrowserSession for ListingSession {
    type Page = ListingPage;

    fn page(&self) -> &ListingPage {
        &self.page
    }

    async fn close(&mut self) -> BrowserResult<()> {
        Ok(())
    }
}

struct ListingLauncher {
    page: Arc<ListingPage>,
    sessions: Arc<Mutex<usize>>,
}

#[async_trait]
impl SessionLauncher for ListingLauncher {
    type Session = ListingSession;

    async fn open(&self) -> BrowserResult<ListingSession> {
        *self.sessions.lock().unwrap() += 1;
        Ok(ListingSession {
            page: Arc::clone(&self.page),
        })
    }
}

/// (id, title, score text, minutes old)
fn listing(forum: &str, posts: &[(&str, &str, &str, i64)]) -> String {
    let now = Utc::now();
    let mut html = String::from("<html><body>");
    for (id, title, score, minutes) in posts {
        let created = (now - ChronoDuration::minutes(*minutes)).to_rfc3339();
        html.push_str(&format!(
            r#"<div data-testid="post-container">
                 <h3>{title}</h3>
                 <a data-click-id="timestamp"><time datetime="{created}">{minutes} min ago</time></a>
                 <a data-click-id="comments" href="/r/{forum}/comments/{id}/post/">comments</a>
                 <div data-click-id="score">{score}</div>
               </div>"#
        ));
    }
    html.push_str("</body></html>");
    html
}

fn test_config(db_path: &Path, screenshot_dir: &Path) -> Config {
    let toml = format!(
        r#"
forums = ["rust", "golang", "missing"]

[schedule]
batch-min = 3
batch-max = 3
cooldown-min-secs = 1
cooldown-max-secs = 2
idle-min-secs = 60
idle-max-secs = 60

[browser]
scroll-steps = 2
scroll-pause-min-ms = 10
scroll-pause-max-ms = 20

[output]
database-path = "{}"
screenshot-dir = "{}"
"#,
        db_path.display(),
        screenshot_dir.display()
    );
    parse_config(&toml).expect("test config is valid")
}

fn launcher() -> (ListingLauncher, Arc<Mutex<usize>>) {
    let mut listings = HashMap::new();
    listings.insert(
        "rust".to_string(),
        listing(
            "rust",
            &[
                ("r1", "Borrow checker tips", "2.3k", 10),
                ("r2", "Async question", "4 points", 90),
                ("r3", "Yesterday's news", "999", 6 * 60),
            ],
        ),
    );
    listings.insert(
        "golang".to_string(),
        listing("golang", &[("g1", "Generics", "•", 30)]),
    );

    let sessions = Arc::new(Mutex::new(0));
    let launcher = ListingLauncher {
        page: Arc::new(ListingPage {
            listings,
            current: Mutex::new(String::new()),
        }),
        sessions: Arc::clone(&sessions),
    };
    (launcher, sessions)
}

fn scheduler(
    config: &Config,
    launcher: ListingLauncher,
    stop: StopSignal,
) -> RunScheduler<ListingLauncher, SqliteStorage, StdRng> {
    let store = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    RunScheduler::new(
        config.forums.clone(),
        Schedule::from_config(&config.schedule),
        ForumScraper::from_config(config).unwrap(),
        launcher,
        store,
        StdRng::seed_from_u64(42),
        stop,
    )
}

#[tokio::test(start_paused = true)]
async fn test_single_run_stores_fresh_posts() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("harvest.db");
    let config = test_config(&db_path, dir.path());
    let (launcher, sessions) = launcher();

    let mut scheduler = scheduler(&config, launcher, StopSignal::never());
    let report = scheduler.run_once().await;

    assert_eq!(report.visited, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.considered, 4);
    assert_eq!(report.inserted, 3);
    assert_eq!(*sessions.lock().unwrap(), 1);
    drop(scheduler);

    // Reopen from disk
    let store = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(store.count_posts().unwrap(), 3);

    let top = store.get_post("r1").unwrap().unwrap();
    assert_eq!(top.forum_name, "rust");
    assert_eq!(top.score, 2300);
    assert_eq!(top.post_url, "https://www.reddit.com/r/rust/comments/r1/post/");
    assert!(!top.commented);

    assert_eq!(store.get_post("r2").unwrap().unwrap().score, 4);
    assert_eq!(store.get_post("g1").unwrap().unwrap().score, 0);
    assert!(store.get_post("r3").unwrap().is_none());

    assert!(dir.path().join("debug_error_missing.png").exists());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_runs_do_not_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("harvest.db");
    let config = test_config(&db_path, dir.path());
    let (launcher, sessions) = launcher();
    let (handle, stop) = stop_channel();

    let mut scheduler = scheduler(&config, launcher, stop);

    // Each run takes a few seconds plus a 60s idle
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(200)).await;
        handle.stop();
    });
    let runs = scheduler.run_forever().await;

    assert!(runs >= 2, "expected several runs, got {}", runs);
    assert_eq!(*sessions.lock().unwrap(), runs);

    let stats = load_statistics(scheduler.store()).unwrap();
    assert_eq!(stats.total_posts, 3);
    assert_eq!(
        stats.posts_by_forum,
        vec![("rust".to_string(), 2), ("golang".to_string(), 1)]
    );
}

#[test]
fn test_extractor_scenario_from_fixture() {
    let now = Utc::now().naive_utc();
    let fresh = (now - ChronoDuration::minutes(10)).format("%Y-%m-%dT%H:%M:%SZ");
    let stale = (now - ChronoDuration::hours(6)).format("%Y-%m-%dT%H:%M:%SZ");

    let html = format!(
        r#"<html><body>
        <div data-testid="post-container">
            <a data-click-id="timestamp"><time datetime="{fresh}">10 min</time></a>
            <a data-click-id="comments" href="/r/x/comments/untitled/t/">c</a>
        </div>
        <div data-testid="post-container">
            <h3>Stale</h3>
            <a data-click-id="timestamp"><time datetime="{stale}">6 hours</time></a>
            <a data-click-id="comments" href="/r/x/comments/stale/t/">c</a>
        </div>
        <div data-testid="post-container">
            <h3>Valid</h3>
            <a data-click-id="timestamp"><time datetime="{fresh}">10 min</time></a>
            <a data-click-id="comments" href="/r/x/comments/abc123/title/">c</a>
            <div data-click-id="score">2.3k</div>
        </div>
        </body></html>"#
    );

    let extraction = PostExtractor::default().extract_html(&html, "x", now);
    assert_eq!(extraction.considered, 3);
    assert_eq!(extraction.posts.len(), 1);

    let post = &extraction.posts[0];
    assert_eq!(post.post_id, "abc123");
    assert_eq!(post.score, 2300);
    assert_eq!(post.post_url, "https://www.reddit.com/r/x/comments/abc123/title/");
}
