//! Post extraction from rendered forum listings
//!
//! This module turns a rendered listing page into normalized [`PostRecord`]s:
//! - `dom`: the narrow element-query capability the extractor runs against
//! - `permalink`: permalink resolution and post id derivation
//! - `post`: the per-post extraction rules and staleness filtering

pub mod dom;
mod permalink;
mod post;

pub use dom::{Field, HtmlPage, PostNode, RenderedPage, Selectors};
pub use permalink::{post_id_from_url, resolve_permalink, COMMENTS_MARKER};
pub use post::{
    Extraction, ExtractorConfig, PostExtractor, PostRecord, Posts, SkipReason,
    DEFAULT_MAX_POST_AGE_HOURS, DEFAULT_ORIGIN,
};
