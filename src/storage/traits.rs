//! Storage traits and error types
//!
//! This module defines the trait interface for post persistence and
//! associated error types.

use crate::storage::StoredPost;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored timestamp '{0}'")]
    Timestamp(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for post storage backends
///
/// The harvester only ever calls [`PostStore::upsert_post`]; the read methods
/// back the statistics output and tests.
pub trait PostStore {
    /// Inserts a post unless one with the same `post_id` already exists
    ///
    /// On first insert `seen_at` is set from the store's clock and `commented`
    /// to false. A duplicate is a silent no-op: nothing is updated.
    ///
    /// # Returns
    ///
    /// `true` if a new row was written, `false` for a duplicate
    fn upsert_post(
        &mut self,
        forum_name: &str,
        post_id: &str,
        post_url: &str,
        score: u64,
        created_at: NaiveDateTime,
    ) -> StorageResult<bool>;

    /// Gets a post by its natural key
    fn get_post(&self, post_id: &str) -> StorageResult<Option<StoredPost>>;

    /// Counts all stored posts
    fn count_posts(&self) -> StorageResult<u64>;

    /// Counts stored posts per forum, sorted by forum name
    fn count_by_forum(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Gets the `seen_at` of the most recently stored post
    fn latest_seen_at(&self) -> StorageResult<Option<NaiveDateTime>>;
}
