//! Access token repository: CRUD for the `jdl_access_token` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, datetime_to_sql, get_datetime_opt, Database, DatabaseError};
use crate::entity::AccessToken;
use crate::time;

fn from_row(row: &Row<'_>) -> Result<AccessToken, rusqlite::Error> {
    Ok(AccessToken {
        id: row.get("id")?,
        access_token: row.get("access_token")?,
        refresh_token: row.get("refresh_token")?,
        scope: row.get("scope")?,
        expire_time: get_datetime_opt(row, "expire_time")?,
        audit: audit_from_row(row)?,
    })
}

/// Inserts or updates a token. An explicit `id` is kept on insert.
pub fn save(db: &Database, token: &mut AccessToken) -> Result<(), DatabaseError> {
    token.audit.touch(time::now());
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jdl_access_token (id, access_token, refresh_token, scope, expire_time,
             created_by, updated_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
               access_token = ?2,
               refresh_token = ?3,
               scope = ?4,
               expire_time = ?5,
               updated_by = ?7,
               updated_at = ?9",
            params![
                token.id,
                token.access_token,
                token.refresh_token,
                token.scope,
                datetime_to_sql(token.expire_time),
                token.audit.created_by,
                token.audit.updated_by,
                datetime_to_sql(token.audit.created_at),
                datetime_to_sql(token.audit.updated_at),
            ],
        )?;
        if token.id.is_none() {
            token.id = Some(conn.last_insert_rowid());
        }
        Ok(())
    })
}

/// Finds a token by id.
pub fn find(db: &Database, id: i64) -> Result<Option<AccessToken>, DatabaseError> {
    db.with_conn(|conn| {
        let token = conn
            .query_row(
                "SELECT * FROM jdl_access_token WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        Ok(token)
    })
}

/// Deletes a token by id.
pub fn remove(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM jdl_access_token WHERE id = ?1", params![id])?;
        Ok(())
    })
}
