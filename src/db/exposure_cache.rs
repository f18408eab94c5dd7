//! Exposure store: beneficiary counts keyed by canonical value.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::providers::ExposureData;

pub fn get_exposure(
    conn: &Connection,
    normalized: &str,
) -> Result<Option<ExposureData>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT beneficiaries, year, source_meta FROM exposure WHERE normalized = ?1",
    )?;
    let row = stmt
        .query_row(params![normalized], |row| {
            let beneficiaries: i64 = row.get(0)?;
            let year: i32 = row.get(1)?;
            let source_meta: Option<String> = row.get(2)?;
            Ok((beneficiaries, year, source_meta))
        })
        .optional()?;
    Ok(row.map(|(beneficiaries, year, source_meta)| {
        let source = source_meta
            .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
            .and_then(|meta| meta.get("source").and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        ExposureData {
            beneficiaries: beneficiaries.max(0) as u64,
            year,
            source,
        }
    }))
}

pub fn upsert_exposure(
    conn: &Connection,
    normalized: &str,
    exposure: &ExposureData,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let source_meta = serde_json::json!({ "source": exposure.source }).to_string();
    conn.execute(
        "INSERT INTO exposure (normalized, beneficiaries, year, source_meta, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(normalized) DO UPDATE SET
           beneficiaries = excluded.beneficiaries,
           year = excluded.year,
           source_meta = excluded.source_meta,
           updated_at = excluded.updated_at",
        params![
            normalized,
            exposure.beneficiaries as i64,
            exposure.year,
            source_meta,
            updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn round_trips_exposure() {
        let conn = open_memory_database().unwrap();
        let exposure = ExposureData {
            beneficiaries: 1_250_000,
            year: 2022,
            source: "cms_part_d".into(),
        };
        upsert_exposure(&conn, "warfarin", &exposure, Utc::now()).unwrap();
        let loaded = get_exposure(&conn, "warfarin").unwrap().unwrap();
        assert_eq!(loaded, exposure);
    }

    #[test]
    fn missing_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_exposure(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn upsert_refreshes_counts() {
        let conn = open_memory_database().unwrap();
        let mut exposure = ExposureData {
            beneficiaries: 100,
            year: 2021,
            source: "cms_part_d".into(),
        };
        upsert_exposure(&conn, "warfarin", &exposure, Utc::now()).unwrap();
        exposure.beneficiaries = 200;
        exposure.year = 2022;
        upsert_exposure(&conn, "warfarin", &exposure, Utc::now()).unwrap();
        let loaded = get_exposure(&conn, "warfarin").unwrap().unwrap();
        assert_eq!(loaded.beneficiaries, 200);
        assert_eq!(loaded.year, 2022);
    }
}
