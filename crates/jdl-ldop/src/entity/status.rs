//! Closed status enums for pickup orders and waybills.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Lifecycle of a pickup order.
///
/// `CREATED -> SUBMITTED -> (UPDATED) -> CANCELLED`, or `CANCELLED` straight
/// from `CREATED`/`SUBMITTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PickupOrderStatus {
    Created,
    Submitted,
    Updated,
    Cancelled,
}

impl PickupOrderStatus {
    pub const ALL: [PickupOrderStatus; 4] = [
        PickupOrderStatus::Created,
        PickupOrderStatus::Submitted,
        PickupOrderStatus::Updated,
        PickupOrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupOrderStatus::Created => "CREATED",
            PickupOrderStatus::Submitted => "SUBMITTED",
            PickupOrderStatus::Updated => "UPDATED",
            PickupOrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PickupOrderStatus::Created => "已创建",
            PickupOrderStatus::Submitted => "已提交",
            PickupOrderStatus::Updated => "已修改",
            PickupOrderStatus::Cancelled => "已取消",
        }
    }

    /// Whether the workflow may move an order from `self` to `next`.
    pub fn can_transition_to(&self, next: PickupOrderStatus) -> bool {
        use PickupOrderStatus::*;
        matches!(
            (self, next),
            (Created, Submitted)
                | (Submitted, Updated)
                | (Created, Cancelled)
                | (Submitted, Cancelled)
                | (Updated, Cancelled)
        )
    }
}

impl fmt::Display for PickupOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickupOrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::new("status", format!("unknown order status '{}'", s)))
    }
}

/// Status of a waybill as recorded on a tracking event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaybillStatus {
    Created,
    Collected,
    InTransit,
    Delivering,
    Delivered,
    Rejected,
    Exception,
}

impl WaybillStatus {
    pub const ALL: [WaybillStatus; 7] = [
        WaybillStatus::Created,
        WaybillStatus::Collected,
        WaybillStatus::InTransit,
        WaybillStatus::Delivering,
        WaybillStatus::Delivered,
        WaybillStatus::Rejected,
        WaybillStatus::Exception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WaybillStatus::Created => "CREATED",
            WaybillStatus::Collected => "COLLECTED",
            WaybillStatus::InTransit => "IN_TRANSIT",
            WaybillStatus::Delivering => "DELIVERING",
            WaybillStatus::Delivered => "DELIVERED",
            WaybillStatus::Rejected => "REJECTED",
            WaybillStatus::Exception => "EXCEPTION",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WaybillStatus::Created => "已创建",
            WaybillStatus::Collected => "已揽收",
            WaybillStatus::InTransit => "运输中",
            WaybillStatus::Delivering => "派送中",
            WaybillStatus::Delivered => "已签收",
            WaybillStatus::Rejected => "已拒收",
            WaybillStatus::Exception => "异常",
        }
    }

    /// Delivered and rejected waybills receive no further scans.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WaybillStatus::Delivered | WaybillStatus::Rejected)
    }
}

impl fmt::Display for WaybillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaybillStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::new("waybill_status", format!("unknown waybill status '{}'", s))
            })
    }
}
