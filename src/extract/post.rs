//! Per-post extraction rules
//!
//! Each candidate node is checked in a fixed order (title, creation time,
//! staleness, permalink, score). The first missing piece skips the post with a
//! [`SkipReason`]; nothing here aborts the rest of the page.

use crate::extract::dom::{Field, HtmlPage, PostNode, RenderedPage, Selectors};
use crate::extract::permalink::{post_id_from_url, resolve_permalink};
use crate::fields::{parse_age, parse_score};
use chrono::{DateTime, Duration, NaiveDateTime};
use thiserror::Error;
use url::Url;

/// Default staleness window in hours
pub const DEFAULT_MAX_POST_AGE_HOURS: f64 = 4.0;

/// Fixed origin that root-relative permalinks resolve against
pub const DEFAULT_ORIGIN: &str = "https://www.reddit.com";

/// A normalized post ready for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// Forum the post was listed in
    pub forum_name: String,

    /// Natural key taken from the permalink
    pub post_id: String,

    /// Absolute permalink
    pub post_url: String,

    /// Post title (logged, not persisted)
    pub title: String,

    /// Parsed score, 0 when missing or unreadable
    pub score: u64,

    /// Creation time in UTC without offset
    pub created_at: NaiveDateTime,
}

/// Why a candidate element did not become a [`PostRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no title")]
    MissingTitle,

    #[error("no timestamp")]
    MissingTimestamp,

    #[error("too old ({}h)", .age.num_hours())]
    TooOld { age: Duration },

    #[error("no permalink")]
    MissingPermalink,

    #[error("empty permalink")]
    EmptyPermalink,
}

/// Extraction settings
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Posts older than this are dropped; a post exactly this old is kept
    pub max_post_age: Duration,

    /// Origin used to resolve root-relative permalinks
    pub origin: Url,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_post_age: Duration::hours(DEFAULT_MAX_POST_AGE_HOURS as i64),
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
        }
    }
}

/// Result of extracting a whole page snapshot
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Number of candidate post elements on the page
    pub considered: usize,

    /// Records that passed every check, in document order
    pub posts: Vec<PostRecord>,
}

/// Maps rendered post elements to [`PostRecord`]s
#[derive(Debug, Clone, Default)]
pub struct PostExtractor {
    config: ExtractorConfig,
    selectors: Selectors,
}

impl PostExtractor {
    pub fn new(config: ExtractorConfig, selectors: Selectors) -> Self {
        Self { config, selectors }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    /// Lazily extracts records from every candidate node on `page`
    ///
    /// `now` is the reference time for relative ages and the staleness check.
    /// Nodes are visited in the order the page returns them.
    pub fn extract<'p, P>(
        &'p self,
        page: &'p P,
        forum: &'p str,
        now: NaiveDateTime,
    ) -> Posts<'p, P::Node<'p>>
    where
        P: RenderedPage + 'p,
    {
        let nodes = page.find_all();
        Posts {
            extractor: self,
            considered: nodes.len(),
            skipped: 0,
            nodes: nodes.into_iter(),
            forum,
            now,
        }
    }

    /// Parses an HTML snapshot and collects all records
    ///
    /// The parsed document is dropped before returning, so callers can hold the
    /// result across await points.
    pub fn extract_html(&self, html: &str, forum: &str, now: NaiveDateTime) -> Extraction {
        let page = HtmlPage::parse(html, &self.selectors);
        let posts = self.extract(&page, forum, now);
        let considered = posts.considered();
        Extraction {
            considered,
            posts: posts.collect(),
        }
    }

    /// Applies the extraction rules to a single node
    pub fn extract_one<N: PostNode>(
        &self,
        node: &N,
        forum: &str,
        now: NaiveDateTime,
    ) -> Result<PostRecord, SkipReason> {
        let title = node
            .text_of(Field::Title)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SkipReason::MissingTitle)?;

        let created_at = creation_time(node, now).ok_or(SkipReason::MissingTimestamp)?;

        let age = now - created_at;
        if age > self.config.max_post_age {
            return Err(SkipReason::TooOld { age });
        }

        let href = node
            .attribute_of(Field::Permalink, "href")
            .ok_or(SkipReason::MissingPermalink)?;
        let href = href.trim();
        if href.is_empty() {
            return Err(SkipReason::EmptyPermalink);
        }

        let post_url = resolve_permalink(href, &self.config.origin);
        let post_id = post_id_from_url(&post_url);

        let score = node
            .text_of(Field::Score)
            .map(|text| parse_score(&text))
            .unwrap_or(0);

        Ok(PostRecord {
            forum_name: forum.to_string(),
            post_id,
            post_url,
            title,
            score,
            created_at,
        })
    }
}

/// Prefers the machine-readable `datetime` attribute, then the rendered relative age
fn creation_time<N: PostNode>(node: &N, now: NaiveDateTime) -> Option<NaiveDateTime> {
    node.attribute_of(Field::TimestampTime, "datetime")
        .and_then(|value| parse_timestamp(&value))
        .or_else(|| {
            node.text_of(Field::TimestampAnchor)
                .and_then(|text| parse_age(&text, now))
        })
}

/// Strict ISO-8601 parsing; offsets are converted to UTC and then dropped
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Lazy sequence of records produced by [`PostExtractor::extract`]
pub struct Posts<'p, N> {
    extractor: &'p PostExtractor,
    nodes: std::vec::IntoIter<N>,
    forum: &'p str,
    now: NaiveDateTime,
    considered: usize,
    skipped: usize,
}

impl<'p, N> Posts<'p, N> {
    /// Number of candidate post elements found on the page
    pub fn considered(&self) -> usize {
        self.considered
    }

    /// Number of candidates skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'p, N: PostNode> Iterator for Posts<'p, N> {
    type Item = PostRecord;

    fn next(&mut self) -> Option<PostRecord> {
        for node in self.nodes.by_ref() {
            match self.extractor.extract_one(&node, self.forum, self.now) {
                Ok(record) => return Some(record),
                Err(reason) => {
                    self.skipped += 1;
                    tracing::debug!("r/{}: skipping post ({})", self.forum, reason);
                }
            }
        }
        None
    }
}
