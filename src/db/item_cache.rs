//! Item lookup store: identifiers from each upstream authority plus the
//! label payload, keyed by canonical value.
//!
//! Positive fields never expire. A negative field (absent identifier) goes
//! stale after [`crate::config::NEGATIVE_CACHE_TTL_HOURS`]; a stale read is
//! a partial miss that re-fetches exactly that field.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::NEGATIVE_CACHE_TTL_HOURS;
use crate::db::DatabaseError;
use crate::providers::LabelData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    pub normalized: String,
    pub rxcui: Option<String>,
    pub supplement_cui: Option<String>,
    pub label: Option<LabelData>,
    pub updated_at: DateTime<Utc>,
}

/// Which negative fields of an entry have gone stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaleFields {
    pub rxcui: bool,
    pub supplement_cui: bool,
    pub label: bool,
}

impl StaleFields {
    pub fn any(&self) -> bool {
        self.rxcui || self.supplement_cui || self.label
    }
}

impl ItemEntry {
    /// Negative fields older than the TTL. Positive fields never expire.
    pub fn stale_negative_fields(&self, now: DateTime<Utc>) -> StaleFields {
        let stale = now - self.updated_at > Duration::hours(NEGATIVE_CACHE_TTL_HOURS);
        if !stale {
            return StaleFields::default();
        }
        StaleFields {
            rxcui: self.rxcui.is_none(),
            supplement_cui: self.supplement_cui.is_none(),
            label: self.label.is_none(),
        }
    }
}

pub fn get_item(conn: &Connection, normalized: &str) -> Result<Option<ItemEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT normalized, rxcui, supplement_cui, label_warnings, updated_at
         FROM item_lookup WHERE normalized = ?1",
    )?;
    let entry = stmt
        .query_row(params![normalized], row_to_item)
        .optional()?;
    Ok(entry)
}

pub fn upsert_item(conn: &Connection, entry: &ItemEntry) -> Result<(), DatabaseError> {
    let label_json = entry
        .label
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::CorruptEntry {
            key: entry.normalized.clone(),
            reason: e.to_string(),
        })?;
    conn.execute(
        "INSERT INTO item_lookup (normalized, rxcui, supplement_cui, label_warnings, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(normalized) DO UPDATE SET
           rxcui = excluded.rxcui,
           supplement_cui = excluded.supplement_cui,
           label_warnings = excluded.label_warnings,
           updated_at = excluded.updated_at",
        params![
            entry.normalized,
            entry.rxcui,
            entry.supplement_cui,
            label_json,
            entry.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn row_to_item(row: &rusqlite::Row) -> Result<ItemEntry, rusqlite::Error> {
    let label_json: Option<String> = row.get(3)?;
    let updated_str: String = row.get(4)?;
    Ok(ItemEntry {
        normalized: row.get(0)?,
        rxcui: row.get(1)?,
        supplement_cui: row.get(2)?,
        label: label_json.and_then(|json| serde_json::from_str(&json).ok()),
        updated_at: parse_timestamp(&updated_str),
    })
}

/// A corrupt timestamp reads as the epoch, which makes the entry maximally
/// stale rather than silently fresh.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn entry(normalized: &str, rxcui: Option<&str>) -> ItemEntry {
        ItemEntry {
            normalized: normalized.to_string(),
            rxcui: rxcui.map(str::to_string),
            supplement_cui: Some("C0016157".to_string()),
            label: Some(LabelData {
                product_name: Some("Advil".to_string()),
                identifier: Some("set-001".to_string()),
                warnings: vec!["GI bleeding risk.".to_string()],
            }),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_retrieve_round_trips() {
        let conn = open_memory_database().unwrap();
        let original = entry("ibuprofen", Some("5640"));
        upsert_item(&conn, &original).unwrap();

        let loaded = get_item(&conn, "ibuprofen").unwrap().unwrap();
        assert_eq!(loaded.rxcui.as_deref(), Some("5640"));
        assert_eq!(loaded.supplement_cui, original.supplement_cui);
        assert_eq!(loaded.label, original.label);
    }

    #[test]
    fn missing_item_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_item(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_existing() {
        let conn = open_memory_database().unwrap();
        upsert_item(&conn, &entry("ibuprofen", None)).unwrap();
        upsert_item(&conn, &entry("ibuprofen", Some("5640"))).unwrap();

        let loaded = get_item(&conn, "ibuprofen").unwrap().unwrap();
        assert_eq!(loaded.rxcui.as_deref(), Some("5640"));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM item_lookup", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn fresh_negative_fields_are_not_stale() {
        let item = ItemEntry {
            rxcui: None,
            supplement_cui: None,
            ..entry("x", None)
        };
        assert!(!item.stale_negative_fields(Utc::now()).any());
    }

    #[test]
    fn old_negative_fields_go_stale() {
        let mut item = entry("x", None);
        item.supplement_cui = None;
        item.label = None;
        item.updated_at = Utc::now() - Duration::hours(25);
        let stale = item.stale_negative_fields(Utc::now());
        assert!(stale.rxcui);
        assert!(stale.supplement_cui);
        assert!(stale.label);
    }

    #[test]
    fn positive_fields_never_go_stale() {
        let mut item = entry("x", Some("5640"));
        item.updated_at = Utc::now() - Duration::hours(48);
        // Every field is set in the fixture, so nothing is negative.
        assert!(!item.stale_negative_fields(Utc::now()).any());
    }

    #[test]
    fn staleness_is_per_field() {
        let mut item = entry("x", None);
        item.updated_at = Utc::now() - Duration::hours(25);
        let stale = item.stale_negative_fields(Utc::now());
        // Only the absent identifier is a stale negative.
        assert!(stale.rxcui);
        assert!(!stale.supplement_cui);
        assert!(!stale.label);
    }

    #[test]
    fn corrupt_timestamp_reads_as_epoch() {
        let parsed = parse_timestamp("not a timestamp");
        assert_eq!(parsed.timestamp(), 0);
    }

    #[test]
    fn entry_without_label_round_trips() {
        let conn = open_memory_database().unwrap();
        let mut original = entry("metformin", Some("6809"));
        original.label = None;
        upsert_item(&conn, &original).unwrap();
        let loaded = get_item(&conn, "metformin").unwrap().unwrap();
        assert!(loaded.label.is_none());
    }
}
