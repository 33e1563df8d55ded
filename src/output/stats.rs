//! Statistics generation from the post database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{PostStore, StorageResult};
use chrono::NaiveDateTime;

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestStatistics {
    /// Total number of stored posts
    pub total_posts: u64,

    /// Stored posts per forum, most first
    pub posts_by_forum: Vec<(String, u64)>,

    /// When the most recent post was stored
    pub last_seen_at: Option<NaiveDateTime>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S: PostStore + ?Sized>(store: &S) -> StorageResult<HarvestStatistics> {
    let total_posts = store.count_posts()?;

    let mut posts_by_forum = store.count_by_forum()?;
    // Stable sort keeps the store's alphabetical order for ties
    posts_by_forum.sort_by(|a, b| b.1.cmp(&a.1));

    let last_seen_at = store.latest_seen_at()?;

    Ok(HarvestStatistics {
        total_posts,
        posts_by_forum,
        last_seen_at,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total posts stored: {}", stats.total_posts);
    println!("  Forums with posts: {}", stats.posts_by_forum.len());
    match stats.last_seen_at {
        Some(at) => println!("  Last post stored: {} UTC", at.format("%Y-%m-%d %H:%M:%S")),
        None => println!("  Last post stored: never"),
    }
    println!();

    if stats.posts_by_forum.is_empty() {
        return;
    }

    println!("Posts by Forum:");
    for (forum, count) in &stats.posts_by_forum {
        let percentage = if stats.total_posts > 0 {
            (*count as f64 / stats.total_posts as f64) * 100.0
        } else {
            0.0
        };
        println!("  r/{}: {} ({:.1}%)", forum, count, percentage);
    }
}
