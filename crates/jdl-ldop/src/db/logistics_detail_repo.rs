//! Logistics detail repository: append-only storage of tracking scans.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, datetime_to_sql, get_datetime, get_parsed, Database, DatabaseError};
use crate::entity::{LogisticsDetail, TraceKey};
use crate::time;

fn from_row(row: &Row<'_>) -> Result<LogisticsDetail, rusqlite::Error> {
    Ok(LogisticsDetail {
        id: row.get("id")?,
        waybill_code: row.get("waybill_code")?,
        customer_code: row.get("customer_code")?,
        order_code: row.get("order_code")?,
        operate_time: get_datetime(row, "operate_time")?,
        operate_remark: row.get("operate_remark")?,
        operate_site: row.get("operate_site")?,
        operate_user: row.get("operate_user")?,
        operate_type: row.get("operate_type")?,
        waybill_status: get_parsed(row, "waybill_status")?,
        next_site: row.get("next_site")?,
        next_city: row.get("next_city")?,
        audit: audit_from_row(row)?,
    })
}

/// Inserts a new scan and assigns its id.
pub fn insert(db: &Database, detail: &mut LogisticsDetail) -> Result<(), DatabaseError> {
    detail.audit.touch(time::now());
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO logistics_detail (waybill_code, customer_code, order_code,
             operate_time, operate_remark, operate_site, operate_user, operate_type,
             waybill_status, next_site, next_city,
             created_by, updated_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                detail.waybill_code,
                detail.customer_code,
                detail.order_code,
                time::format_datetime(&detail.operate_time),
                detail.operate_remark,
                detail.operate_site,
                detail.operate_user,
                detail.operate_type,
                detail.waybill_status.as_str(),
                detail.next_site,
                detail.next_city,
                detail.audit.created_by,
                detail.audit.updated_by,
                datetime_to_sql(detail.audit.created_at),
                datetime_to_sql(detail.audit.updated_at),
            ],
        )?;
        detail.id = Some(conn.last_insert_rowid());
        Ok(())
    })
}

/// First scan matching the natural key, if any.
pub fn find_one_by(db: &Database, key: &TraceKey) -> Result<Option<LogisticsDetail>, DatabaseError> {
    db.with_conn(|conn| {
        let detail = conn
            .query_row(
                "SELECT * FROM logistics_detail
                 WHERE waybill_code = ?1 AND operate_time = ?2 AND operate_type = ?3
                 ORDER BY id ASC LIMIT 1",
                params![
                    key.waybill_code,
                    time::format_datetime(&key.operate_time),
                    key.operate_type
                ],
                from_row,
            )
            .optional()?;
        Ok(detail)
    })
}

fn find_where(
    db: &Database,
    column: &str,
    value: &str,
) -> Result<Vec<LogisticsDetail>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!(
            "SELECT * FROM logistics_detail WHERE {} = ?1 ORDER BY operate_time ASC, id ASC",
            column
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![value], from_row)?;
        let mut details = Vec::new();
        for row in rows {
            details.push(row?);
        }
        Ok(details)
    })
}

/// All scans recorded for a pickup order, oldest first.
pub fn find_by_order_code(
    db: &Database,
    order_code: &str,
) -> Result<Vec<LogisticsDetail>, DatabaseError> {
    find_where(db, "order_code", order_code)
}

/// All scans recorded for a waybill, oldest first.
pub fn find_by_waybill_code(
    db: &Database,
    waybill_code: &str,
) -> Result<Vec<LogisticsDetail>, DatabaseError> {
    find_where(db, "waybill_code", waybill_code)
}
