pub mod exposure_cache;
pub mod item_cache;
pub mod pair_cache;
pub mod sqlite;
pub mod usage_log;

pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt cache entry for {key}: {reason}")]
    CorruptEntry { key: String, reason: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Connection lock poisoned")]
    LockPoisoned,
}
