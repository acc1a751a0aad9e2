//! Config repository: CRUD for the `jdl_config` table.

use rusqlite::{params, Connection, OptionalExtension, Row};
use secrecy::SecretString;

use super::{audit_from_row, datetime_to_sql, get_parsed, Database, DatabaseError};
use crate::entity::JdlConfig;
use crate::time;

fn from_row(row: &Row<'_>) -> Result<JdlConfig, rusqlite::Error> {
    let secret: String = row.get("app_secret")?;
    Ok(JdlConfig {
        id: row.get("id")?,
        active: row.get("valid")?,
        customer_code: row.get("customer_code")?,
        app_key: row.get("app_key")?,
        app_secret: SecretString::from(secret),
        api_endpoint: row.get("api_endpoint")?,
        version: row.get("version")?,
        format: get_parsed(row, "format")?,
        sign_method: get_parsed(row, "sign_method")?,
        redirect_uri: row.get("redirect_uri")?,
        remark: row.get("remark")?,
        audit: audit_from_row(row)?,
    })
}

pub(crate) fn find_with(conn: &Connection, id: i64) -> Result<Option<JdlConfig>, DatabaseError> {
    let config = conn
        .query_row(
            "SELECT * FROM jdl_config WHERE id = ?1",
            params![id],
            from_row,
        )
        .optional()?;
    Ok(config)
}

/// Inserts the config, or updates it when it already has an id.
///
/// Assigns `id` and stamps the audit timestamps.
pub fn save(db: &Database, config: &mut JdlConfig) -> Result<(), DatabaseError> {
    config.audit.touch(time::now());
    db.with_conn(|conn| {
        match config.id {
            None => {
                conn.execute(
                    "INSERT INTO jdl_config (valid, customer_code, app_key, app_secret,
                     api_endpoint, version, format, sign_method, redirect_uri, remark,
                     created_by, updated_by, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                    params![
                        config.active,
                        config.customer_code,
                        config.app_key,
                        config.app_secret(),
                        config.api_endpoint,
                        config.version,
                        config.format.as_str(),
                        config.sign_method.as_str(),
                        config.redirect_uri,
                        config.remark,
                        config.audit.created_by,
                        config.audit.updated_by,
                        datetime_to_sql(config.audit.created_at),
                        datetime_to_sql(config.audit.updated_at),
                    ],
                )?;
                config.id = Some(conn.last_insert_rowid());
            }
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE jdl_config SET valid=?2, customer_code=?3, app_key=?4, app_secret=?5,
                     api_endpoint=?6, version=?7, format=?8, sign_method=?9, redirect_uri=?10,
                     remark=?11, updated_by=?12, updated_at=?13
                     WHERE id=?1",
                    params![
                        id,
                        config.active,
                        config.customer_code,
                        config.app_key,
                        config.app_secret(),
                        config.api_endpoint,
                        config.version,
                        config.format.as_str(),
                        config.sign_method.as_str(),
                        config.redirect_uri,
                        config.remark,
                        config.audit.updated_by,
                        datetime_to_sql(config.audit.updated_at),
                    ],
                )?;
                if changed == 0 {
                    return Err(DatabaseError::NotFound {
                        table: "jdl_config",
                        id: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    })
}

/// Finds a config by id.
pub fn find(db: &Database, id: i64) -> Result<Option<JdlConfig>, DatabaseError> {
    db.with_conn(|conn| find_with(conn, id))
}

/// The lowest-id active config.
pub fn default_config(db: &Database) -> Result<Option<JdlConfig>, DatabaseError> {
    db.with_conn(|conn| {
        let config = conn
            .query_row(
                "SELECT * FROM jdl_config WHERE valid = 1 ORDER BY id ASC LIMIT 1",
                [],
                from_row,
            )
            .optional()?;
        Ok(config)
    })
}

/// All active configs, lowest id first.
pub fn find_all_active(db: &Database) -> Result<Vec<JdlConfig>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jdl_config WHERE valid = 1 ORDER BY id ASC")?;
        let rows = stmt.query_map([], from_row)?;
        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?);
        }
        Ok(configs)
    })
}

/// Deletes a config. Orders referencing it are detached, not deleted.
pub fn remove(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM jdl_config WHERE id = ?1", params![id])?;
        Ok(())
    })
}
