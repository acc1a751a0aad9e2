//! Domain entities.

use chrono::NaiveDateTime;

pub mod access_token;
pub mod jdl_config;
pub mod logistics_detail;
pub mod pickup_order;
pub mod status;

pub use access_token::{AccessToken, DEFAULT_TOKEN_ID};
pub use jdl_config::{JdlConfig, ResponseFormat};
pub use logistics_detail::{LogisticsDetail, TraceKey};
pub use pickup_order::{Party, PickupOrder};
pub use status::{PickupOrderStatus, WaybillStatus};

/// Who created/updated a row, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audit {
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Audit {
    /// Stamps `updated_at`, and `created_at` on first save.
    pub fn touch(&mut self, now: NaiveDateTime) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }
}
