//! Immutable tracking scans ingested from JD.

use chrono::NaiveDateTime;

use super::jdl_config::{check_length, require_text};
use super::{Audit, WaybillStatus};
use crate::error::ValidationError;

/// Natural key used to drop repeated ingestion of the same scan.
///
/// Not a schema constraint: the reconciler enforces it by lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceKey {
    pub waybill_code: String,
    pub operate_time: NaiveDateTime,
    pub operate_type: String,
}

/// One tracking scan of a waybill.
///
/// `order_code` is a soft reference to a pickup order (an indexed lookup key,
/// not a foreign key).
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticsDetail {
    pub id: Option<i64>,
    pub waybill_code: String,
    pub customer_code: String,
    pub order_code: String,
    pub operate_time: NaiveDateTime,
    pub operate_remark: String,
    pub operate_site: String,
    pub operate_user: Option<String>,
    pub operate_type: String,
    pub waybill_status: WaybillStatus,
    pub next_site: Option<String>,
    pub next_city: Option<String>,
    pub audit: Audit,
}

impl LogisticsDetail {
    pub fn key(&self) -> TraceKey {
        TraceKey {
            waybill_code: self.waybill_code.clone(),
            operate_time: self.operate_time,
            operate_type: self.operate_type.clone(),
        }
    }

    /// Length limits of the storage columns.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("waybill_code", &self.waybill_code, 32)?;
        require_text("customer_code", &self.customer_code, 32)?;
        require_text("order_code", &self.order_code, 32)?;
        check_length("operate_remark", &self.operate_remark, 255)?;
        check_length("operate_site", &self.operate_site, 32)?;
        check_length("operate_type", &self.operate_type, 32)?;
        for (field, value) in [
            ("operate_user", &self.operate_user),
            ("next_site", &self.next_site),
            ("next_city", &self.next_city),
        ] {
            if let Some(value) = value {
                check_length(field, value, 32)?;
            }
        }
        Ok(())
    }
}
