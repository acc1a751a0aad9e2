//! Builders for test entities.

#![allow(dead_code)]

use chrono::NaiveDateTime;
use jdl_ldop::{AccessToken, JdlConfig, Party, PickupOrder, ResponseFormat};

pub fn config(customer_code: &str, app_key: &str, app_secret: &str) -> JdlConfig {
    JdlConfig::new(
        customer_code,
        app_key,
        app_secret,
        "https://merchant.example.com/jd/callback",
    )
}

pub fn xml_config(customer_code: &str) -> JdlConfig {
    let mut config = config(customer_code, "K1", "S1");
    config.format = ResponseFormat::Xml;
    config
}

pub fn token(id: i64, access_token: &str) -> AccessToken {
    let mut token = AccessToken::new(access_token, "refresh-token");
    token.id = Some(id);
    token
}

/// Builder for `PickupOrder` with valid defaults.
pub struct PickupOrderBuilder {
    order: PickupOrder,
}

impl PickupOrderBuilder {
    pub fn new() -> Self {
        Self {
            order: PickupOrder::new(
                Party::new("张三", "13800000000", "北京市朝阳区建国路1号"),
                Party::new("李四", "13900000000", "上海市浦东新区世纪大道2号"),
                1.5,
            ),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.order.id = Some(id.to_string());
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.order.weight = weight;
        self
    }

    pub fn config(mut self, config: JdlConfig) -> Self {
        self.order.config = Some(config);
        self
    }

    pub fn pick_up_code(mut self, code: &str) -> Self {
        self.order.pick_up_code = Some(code.to_string());
        self
    }

    pub fn pickup_window(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.order.pickup_start_time = Some(start);
        self.order.pickup_end_time = Some(end);
        self
    }

    pub fn build(self) -> PickupOrder {
        self.order
    }
}

impl Default for PickupOrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
