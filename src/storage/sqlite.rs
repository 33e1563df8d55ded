//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PostStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PostStore, StorageResult};
use crate::storage::{format_timestamp, parse_timestamp, StoredPost};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and initializes the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl PostStore for SqliteStorage {
    fn upsert_post(
        &mut self,
        forum_name: &str,
        post_id: &str,
        post_url: &str,
        score: u64,
        created_at: NaiveDateTime,
    ) -> StorageResult<bool> {
        let seen_at = format_timestamp(Utc::now().naive_utc());
        let score = i64::try_from(score).unwrap_or(i64::MAX);

        let inserted = self.conn.execute(
            "INSERT INTO posts (forum_name, post_id, post_url, score, created_at, seen_at, commented)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
             ON CONFLICT(post_id) DO NOTHING",
            params![
                forum_name,
                post_id,
                post_url,
                score,
                format_timestamp(created_at),
                seen_at
            ],
        )?;

        Ok(inserted > 0)
    }

    fn get_post(&self, post_id: &str) -> StorageResult<Option<StoredPost>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, forum_name, post_id, post_url, score, created_at, seen_at, commented
                 FROM posts WHERE post_id = ?1",
                params![post_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, forum_name, post_id, post_url, score, created_at, seen_at, commented)) = row
        else {
            return Ok(None);
        };

        Ok(Some(StoredPost {
            id,
            forum_name,
            post_id,
            post_url,
            score: u64::try_from(score).unwrap_or(0),
            created_at: parse_timestamp(&created_at)?,
            seen_at: parse_timestamp(&seen_at)?,
            commented: commented != 0,
        }))
    }

    fn count_posts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_forum(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT forum_name, COUNT(*) FROM posts GROUP BY forum_name ORDER BY forum_name",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn latest_seen_at(&self) -> StorageResult<Option<NaiveDateTime>> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(seen_at) FROM posts", [], |row| row.get(0))?;

        latest.as_deref().map(parse_timestamp).transpose()
    }
}
