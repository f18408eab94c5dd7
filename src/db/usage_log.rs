//! Append-only usage log, written after the response body is assembled.
//! Failures here are swallowed by the caller; the log is observability,
//! not state.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Debug, Clone)]
pub struct UsageEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Value,
    pub summary: Value,
    pub latency_ms: i64,
    pub cache_hits: Value,
}

pub fn insert_usage(conn: &Connection, entry: &UsageEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO usage_log (id, created_at, items, summary, latency_ms, cache_hits)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id.to_string(),
            entry.created_at.to_rfc3339(),
            entry.items.to_string(),
            entry.summary.to_string(),
            entry.latency_ms,
            entry.cache_hits.to_string(),
        ],
    )?;
    Ok(())
}

pub fn entry_count(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM usage_log", [], |row| row.get(0))?;
    Ok(count)
}
