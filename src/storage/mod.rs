//! Storage module for persisting harvested posts
//!
//! This module handles all database operations for the harvester:
//! - SQLite database initialization and schema management
//! - Idempotent post insertion keyed by post id
//! - Read access for statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PostStore, StorageError, StorageResult};

use chrono::NaiveDateTime;
use std::path::Path;

/// Text format for timestamps stored in SQLite (UTC, no offset)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Opens (or creates) the post database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A post as stored in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPost {
    pub id: i64,
    pub forum_name: String,
    pub post_id: String,
    pub post_url: String,
    pub score: u64,
    pub created_at: NaiveDateTime,
    pub seen_at: NaiveDateTime,
    pub commented: bool,
}

pub(crate) fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(text: &str) -> StorageResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|_| StorageError::Timestamp(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_format_keeps_subseconds() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 15, 250)
            .unwrap();

        let text = format_timestamp(at);
        assert_eq!(text, "2024-05-01 12:30:15.250");
        assert_eq!(parse_timestamp(&text).unwrap(), at);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(StorageError::Timestamp(_))
        ));
    }
}
