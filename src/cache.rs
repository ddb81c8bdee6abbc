use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{DictError, Result};
use crate::result::LookupResult;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS word (
    keyword         TEXT PRIMARY KEY NOT NULL,
    json_data       TEXT NOT NULL,
    count           INTEGER NOT NULL DEFAULT 1,
    last_queried_at TEXT NOT NULL
)";

/// How `list_all` orders the word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Insertion,
    CountDesc,
    KeywordAsc,
}

impl ListOrder {
    fn order_by(self) -> &'static str {
        match self {
            ListOrder::Insertion => "rowid ASC",
            ListOrder::CountDesc => "count DESC, keyword ASC",
            ListOrder::KeywordAsc => "keyword ASC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub keyword: String,
    pub serialized_result: String,
    pub lookup_count: i64,
    pub last_queried_at: DateTime<Utc>,
}

impl CacheEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CacheEntry {
            keyword: row.get(0)?,
            serialized_result: row.get(1)?,
            lookup_count: row.get(2)?,
            last_queried_at: row.get(3)?,
        })
    }

    /// Decodes the stored result. A bad row is `CacheCorrupt`, never a panic.
    pub fn result(&self) -> Result<LookupResult> {
        LookupResult::from_json(&self.serialized_result).map_err(|source| DictError::CacheCorrupt {
            keyword: self.keyword.clone(),
            source,
        })
    }
}

/// Word cache on top of a single SQLite file. Keys are used verbatim;
/// normalizing them is the caller's job.
pub struct CacheStore {
    conn: Connection,
}

impl CacheStore {
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "opening word cache");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(CacheStore { conn })
    }

    pub fn get(&self, keyword: &str) -> Result<Option<CacheEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT keyword, json_data, count, last_queried_at FROM word WHERE keyword = ?1",
                params![keyword],
                CacheEntry::from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Insert, or overwrite the stored result and bump the counter.
    pub fn put(&self, keyword: &str, result: &LookupResult) -> Result<()> {
        let json = result.to_json()?;
        self.conn.execute(
            "INSERT INTO word (keyword, json_data, count, last_queried_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(keyword) DO UPDATE SET
                json_data = excluded.json_data,
                count = count + 1,
                last_queried_at = excluded.last_queried_at",
            params![keyword, json, Utc::now()],
        )?;
        Ok(())
    }

    pub fn delete(&self, keyword: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM word WHERE keyword = ?1", params![keyword])?)
    }

    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM word", [])?)
    }

    pub fn list_all(&self, order: ListOrder) -> Result<Vec<CacheEntry>> {
        let sql = format!(
            "SELECT keyword, json_data, count, last_queried_at FROM word ORDER BY {}",
            order.order_by()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], CacheEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    #[cfg(test)]
    pub(crate) fn put_raw(&self, keyword: &str, json: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO word (keyword, json_data, count, last_queried_at) VALUES (?1, ?2, 1, ?3)",
            params![keyword, json, Utc::now()],
        )?;
        Ok(())
    }
}
