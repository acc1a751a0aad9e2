//! Outbound shipment awaiting courier pickup.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

use super::jdl_config::{check_length, require_text};
use super::{Audit, JdlConfig, PickupOrderStatus};
use crate::error::ValidationError;

static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1[3-9]\d{9}$").unwrap());
static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}$").unwrap());

/// Name, phone and address of one side of the shipment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Party {
    pub name: String,
    pub mobile: String,
    pub address: String,
    pub postcode: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
}

impl Party {
    pub fn new(
        name: impl Into<String>,
        mobile: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mobile: mobile.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    fn validate(&self, side: &str) -> Result<(), ValidationError> {
        require_text(&format!("{}_name", side), &self.name, 50)?;
        require_text(&format!("{}_address", side), &self.address, 255)?;
        if !MOBILE_RE.is_match(&self.mobile) {
            return Err(ValidationError::new(
                format!("{}_mobile", side),
                "手机号格式不正确",
            ));
        }
        if let Some(postcode) = &self.postcode {
            if !POSTCODE_RE.is_match(postcode) {
                return Err(ValidationError::new(
                    format!("{}_postcode", side),
                    "邮编格式不正确",
                ));
            }
        }
        for (field, value) in [
            ("province", &self.province),
            ("city", &self.city),
            ("county", &self.county),
        ] {
            if let Some(value) = value {
                check_length(&format!("{}_{}", side, field), value, 32)?;
            }
        }
        Ok(())
    }
}

/// A request for a courier to collect a package.
///
/// `pick_up_code` is only set once JD has acknowledged the order.
#[derive(Debug, Clone)]
pub struct PickupOrder {
    pub id: Option<String>,
    pub active: bool,
    /// Detached (set to `None`) when the referenced config row is deleted.
    pub config: Option<JdlConfig>,
    pub sender: Party,
    pub receiver: Party,
    /// Kilograms, must be > 0.
    pub weight: f64,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub package_name: Option<String>,
    pub package_quantity: Option<u32>,
    pub pickup_start_time: Option<NaiveDateTime>,
    pub pickup_end_time: Option<NaiveDateTime>,
    pub remark: Option<String>,
    pub status: PickupOrderStatus,
    pub pick_up_code: Option<String>,
    pub audit: Audit,
}

impl PickupOrder {
    pub fn new(sender: Party, receiver: Party, weight: f64) -> Self {
        Self {
            id: None,
            active: true,
            config: None,
            sender,
            receiver,
            weight,
            length: None,
            width: None,
            height: None,
            package_name: None,
            package_quantity: None,
            pickup_start_time: None,
            pickup_end_time: None,
            remark: None,
            status: PickupOrderStatus::Created,
            pick_up_code: None,
            audit: Audit::default(),
        }
    }

    pub fn config_id(&self) -> Option<i64> {
        self.config.as_ref().and_then(|config| config.id)
    }

    /// Checks the constraints enforced before an order may be submitted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.sender.validate("sender")?;
        self.receiver.validate("receiver")?;

        if self.weight.is_nan() || self.weight <= 0.0 {
            return Err(ValidationError::new("weight", "重量必须大于0"));
        }
        for (field, value, reason) in [
            ("length", self.length, "长度必须大于0"),
            ("width", self.width, "宽度必须大于0"),
            ("height", self.height, "高度必须大于0"),
        ] {
            if let Some(value) = value {
                if value.is_nan() || value <= 0.0 {
                    return Err(ValidationError::new(field, reason));
                }
            }
        }
        if let Some(name) = &self.package_name {
            check_length("package_name", name, 50)?;
        }
        if let (Some(start), Some(end)) = (self.pickup_start_time, self.pickup_end_time) {
            if end < start {
                return Err(ValidationError::new(
                    "pickup_end_time",
                    "must not be earlier than pickup_start_time",
                ));
            }
        }
        if let Some(code) = &self.pick_up_code {
            check_length("pick_up_code", code, 32)?;
        }
        Ok(())
    }
}
