//! SQLite persistence for JD configs, access tokens, pickup orders and
//! tracking rows.
//!
//! Each table has a `*_repo` module of free functions taking a
//! [`Database`]; [`crate::store`] exposes them as traits for the workflows.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::{Connection, Row};

pub mod config_repo;
pub mod error;
pub mod logistics_detail_repo;
pub mod migrations;
pub mod pickup_order_repo;
pub mod token_repo;

pub use error::DatabaseError;

use crate::entity::Audit;
use crate::error::ValidationError;
use crate::time;

/// Shared handle to the LDOP database.
///
/// Clones share one connection. Orders reference configs by foreign key,
/// so `foreign_keys` is switched on for every connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database file, creating its directory, and brings the
    /// schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self::prepare(conn)?;

        log::info!("LDOP database ready at {}", path.display());
        Ok(db)
    }

    /// Fresh in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` while holding the connection lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the canonical database path: `~/.jdl-ldop/data/jdl-ldop.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".jdl-ldop").join("data").join("jdl-ldop.db"))
}

fn conversion_error(row: &Row<'_>, column: &str, err: ValidationError) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}

/// Reads a nullable timestamp column stored as `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn get_datetime_opt(
    row: &Row<'_>,
    column: &str,
) -> Result<Option<NaiveDateTime>, rusqlite::Error> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        None => Ok(None),
        Some(text) => time::parse_datetime(&text).map(Some).ok_or_else(|| {
            conversion_error(
                row,
                column,
                ValidationError::new(column, format!("invalid timestamp '{}'", text)),
            )
        }),
    }
}

pub(crate) fn get_datetime(row: &Row<'_>, column: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    get_datetime_opt(row, column)?.ok_or_else(|| {
        conversion_error(row, column, ValidationError::new(column, "missing timestamp"))
    })
}

/// Reads a text column and parses it into an enum.
pub(crate) fn get_parsed<T>(row: &Row<'_>, column: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e| conversion_error(row, column, e))
}

pub(crate) fn datetime_to_sql(value: Option<NaiveDateTime>) -> Option<String> {
    value.as_ref().map(time::format_datetime)
}

pub(crate) fn audit_from_row(row: &Row<'_>) -> Result<Audit, rusqlite::Error> {
    Ok(Audit {
        created_by: row.get("created_by")?,
        updated_by: row.get("updated_by")?,
        created_at: get_datetime_opt(row, "created_at")?,
        updated_at: get_datetime_opt(row, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_open_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");
        let db = Database::open(&path).unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_foreign_keys_enabled_for_file_and_memory() {
        let dir = tempfile::tempdir().unwrap();
        for db in [
            Database::open(&dir.path().join("fk.db")).unwrap(),
            Database::open_in_memory().unwrap(),
        ] {
            let enabled: bool = db
                .with_conn(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?))
                .unwrap();
            assert!(enabled);
        }
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.ends_with("jdl-ldop.db"));
        assert!(path.to_string_lossy().contains(".jdl-ldop"));
    }

    #[test]
    fn test_database_is_clone() {
        let db = Database::open_in_memory().unwrap();
        let db2 = db.clone();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO jdl_access_token (access_token, refresh_token) VALUES ('a', 'r')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db2.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM jdl_access_token", [], |r| r.get(0))?;
            assert_eq!(count, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_invalid_timestamp_column_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| {
            let value = conn.query_row("SELECT 'not-a-date' AS created_at", [], |row| {
                get_datetime_opt(row, "created_at")
            })?;
            Ok(value)
        });
        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
    }
}
