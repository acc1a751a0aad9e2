//! Pickup order repository: CRUD for the `pickup_order` table.
//!
//! The associated config is stored as `config_id` and loaded back on read.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{audit_from_row, config_repo, datetime_to_sql, get_datetime_opt, get_parsed};
use super::{Database, DatabaseError};
use crate::entity::{Party, PickupOrder};
use crate::time;

fn party_from_row(row: &Row<'_>, side: &str) -> Result<Party, rusqlite::Error> {
    let column = |field: &str| format!("{}_{}", side, field);
    Ok(Party {
        name: row.get(column("name").as_str())?,
        mobile: row.get(column("mobile").as_str())?,
        address: row.get(column("address").as_str())?,
        postcode: row.get(column("postcode").as_str())?,
        province: row.get(column("province").as_str())?,
        city: row.get(column("city").as_str())?,
        county: row.get(column("county").as_str())?,
    })
}

/// Maps a row, leaving `config` empty. The caller resolves `config_id`.
fn from_row(row: &Row<'_>) -> Result<(PickupOrder, Option<i64>), rusqlite::Error> {
    let order = PickupOrder {
        id: row.get("id")?,
        active: row.get("valid")?,
        config: None,
        sender: party_from_row(row, "sender")?,
        receiver: party_from_row(row, "receiver")?,
        weight: row.get("weight")?,
        length: row.get("length")?,
        width: row.get("width")?,
        height: row.get("height")?,
        package_name: row.get("package_name")?,
        package_quantity: row.get("package_quantity")?,
        pickup_start_time: get_datetime_opt(row, "pickup_start_time")?,
        pickup_end_time: get_datetime_opt(row, "pickup_end_time")?,
        remark: row.get("remark")?,
        status: get_parsed(row, "status")?,
        pick_up_code: row.get("pick_up_code")?,
        audit: audit_from_row(row)?,
    };
    Ok((order, row.get("config_id")?))
}

fn attach_config(
    conn: &Connection,
    found: Option<(PickupOrder, Option<i64>)>,
) -> Result<Option<PickupOrder>, DatabaseError> {
    let Some((mut order, config_id)) = found else {
        return Ok(None);
    };
    if let Some(config_id) = config_id {
        order.config = config_repo::find_with(conn, config_id)?;
    }
    Ok(Some(order))
}

/// Inserts or updates an order.
///
/// An order without an id gets a fresh UUID. The audit timestamps are
/// stamped on every save.
pub fn save(db: &Database, order: &mut PickupOrder) -> Result<(), DatabaseError> {
    if order.id.is_none() {
        order.id = Some(Uuid::new_v4().simple().to_string());
    }
    order.audit.touch(time::now());

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO pickup_order (id, valid, config_id,
               sender_name, sender_mobile, sender_address, sender_postcode,
               sender_province, sender_city, sender_county,
               receiver_name, receiver_mobile, receiver_address, receiver_postcode,
               receiver_province, receiver_city, receiver_county,
               weight, length, width, height, package_name, package_quantity,
               pickup_start_time, pickup_end_time, remark, status, pick_up_code,
               created_by, updated_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                     ?31, ?32)
             ON CONFLICT(id) DO UPDATE SET
               valid = ?2, config_id = ?3,
               sender_name = ?4, sender_mobile = ?5, sender_address = ?6,
               sender_postcode = ?7, sender_province = ?8, sender_city = ?9,
               sender_county = ?10,
               receiver_name = ?11, receiver_mobile = ?12, receiver_address = ?13,
               receiver_postcode = ?14, receiver_province = ?15, receiver_city = ?16,
               receiver_county = ?17,
               weight = ?18, length = ?19, width = ?20, height = ?21,
               package_name = ?22, package_quantity = ?23,
               pickup_start_time = ?24, pickup_end_time = ?25, remark = ?26,
               status = ?27, pick_up_code = ?28,
               updated_by = ?30, updated_at = ?32",
            params![
                order.id,
                order.active,
                order.config_id(),
                order.sender.name,
                order.sender.mobile,
                order.sender.address,
                order.sender.postcode,
                order.sender.province,
                order.sender.city,
                order.sender.county,
                order.receiver.name,
                order.receiver.mobile,
                order.receiver.address,
                order.receiver.postcode,
                order.receiver.province,
                order.receiver.city,
                order.receiver.county,
                order.weight,
                order.length,
                order.width,
                order.height,
                order.package_name,
                order.package_quantity,
                datetime_to_sql(order.pickup_start_time),
                datetime_to_sql(order.pickup_end_time),
                order.remark,
                order.status.as_str(),
                order.pick_up_code,
                order.audit.created_by,
                order.audit.updated_by,
                datetime_to_sql(order.audit.created_at),
                datetime_to_sql(order.audit.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Finds an order by id, with its config loaded.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<PickupOrder>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT * FROM pickup_order WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        attach_config(conn, found)
    })
}

/// Finds an order by the pickup code JD assigned to it.
pub fn find_by_pick_up_code(
    db: &Database,
    code: &str,
) -> Result<Option<PickupOrder>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT * FROM pickup_order WHERE pick_up_code = ?1
                 ORDER BY created_at DESC LIMIT 1",
                params![code],
                from_row,
            )
            .optional()?;
        attach_config(conn, found)
    })
}

/// Deletes an order by id.
pub fn remove(db: &Database, id: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM pickup_order WHERE id = ?1", params![id])?;
        Ok(())
    })
}
