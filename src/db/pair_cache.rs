//! Pair result store, keyed by `(pair_key, calc_version)`. Entries written
//! under a different calc version are invisible to reads, which is what
//! makes a version bump a full invalidation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::report::PairReport;

pub fn get_pair_report(
    conn: &Connection,
    pair_key: &str,
    calc_version: &str,
) -> Result<Option<PairReport>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT report FROM pair_results WHERE pair_key = ?1 AND calc_version = ?2",
    )?;
    let report_json: Option<String> = stmt
        .query_row(params![pair_key, calc_version], |row| row.get(0))
        .optional()?;
    match report_json {
        Some(json) => {
            let report =
                serde_json::from_str(&json).map_err(|e| DatabaseError::CorruptEntry {
                    key: pair_key.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Some(report))
        }
        None => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn upsert_pair_report(
    conn: &Connection,
    pair_key: &str,
    calc_version: &str,
    a_value: &str,
    b_value: &str,
    report: &PairReport,
    sources_hash: &str,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let report_json = serde_json::to_string(report).map_err(|e| DatabaseError::CorruptEntry {
        key: pair_key.to_string(),
        reason: e.to_string(),
    })?;
    conn.execute(
        "INSERT INTO pair_results (pair_key, calc_version, a_value, b_value, report, sources_hash, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(pair_key, calc_version) DO UPDATE SET
           a_value = excluded.a_value,
           b_value = excluded.b_value,
           report = excluded.report,
           sources_hash = excluded.sources_hash,
           updated_at = excluded.updated_at",
        params![
            pair_key,
            calc_version,
            a_value,
            b_value,
            report_json,
            sources_hash,
            updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::evidence::Severity;

    fn report(summary: &str) -> PairReport {
        PairReport {
            a_original: "Warfarin".into(),
            b_original: "Ibuprofen".into(),
            severity: Severity::Severe,
            confidence: 0.85,
            sources: vec![],
            summary: summary.into(),
            key_notes: vec![],
        }
    }

    #[test]
    fn round_trips_a_report() {
        let conn = open_memory_database().unwrap();
        let original = report("Increased risk of bleeding.");
        upsert_pair_report(
            &conn,
            "ibuprofen::warfarin",
            "v7",
            "ibuprofen",
            "warfarin",
            &original,
            "hash",
            Utc::now(),
        )
        .unwrap();

        let loaded = get_pair_report(&conn, "ibuprofen::warfarin", "v7")
            .unwrap()
            .unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn calc_version_mismatch_is_a_miss() {
        let conn = open_memory_database().unwrap();
        upsert_pair_report(
            &conn,
            "a::b",
            "v6",
            "a",
            "b",
            &report("old"),
            "hash",
            Utc::now(),
        )
        .unwrap();
        assert!(get_pair_report(&conn, "a::b", "v7").unwrap().is_none());
        assert!(get_pair_report(&conn, "a::b", "v6").unwrap().is_some());
    }

    #[test]
    fn upsert_replaces_the_same_version() {
        let conn = open_memory_database().unwrap();
        upsert_pair_report(&conn, "a::b", "v7", "a", "b", &report("one"), "h1", Utc::now())
            .unwrap();
        upsert_pair_report(&conn, "a::b", "v7", "a", "b", &report("two"), "h2", Utc::now())
            .unwrap();
        let loaded = get_pair_report(&conn, "a::b", "v7").unwrap().unwrap();
        assert_eq!(loaded.summary, "two");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pair_results", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn versions_coexist_per_key() {
        let conn = open_memory_database().unwrap();
        upsert_pair_report(&conn, "a::b", "v6", "a", "b", &report("old"), "h", Utc::now())
            .unwrap();
        upsert_pair_report(&conn, "a::b", "v7", "a", "b", &report("new"), "h", Utc::now())
            .unwrap();
        assert_eq!(
            get_pair_report(&conn, "a::b", "v6").unwrap().unwrap().summary,
            "old"
        );
        assert_eq!(
            get_pair_report(&conn, "a::b", "v7").unwrap().unwrap().summary,
            "new"
        );
    }

    #[test]
    fn corrupt_report_surfaces_as_corrupt_entry() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO pair_results (pair_key, calc_version, a_value, b_value, report, sources_hash, updated_at)
             VALUES ('a::b', 'v7', 'a', 'b', 'not json', 'h', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let err = get_pair_report(&conn, "a::b", "v7").unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptEntry { .. }));
    }
}
