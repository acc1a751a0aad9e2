//! Pickup order creation and cancellation against JD.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{error, info, info_span, Instrument};

use crate::entity::{JdlConfig, PickupOrder, PickupOrderStatus};
use crate::error::{JdlError, Result, ValidationError};
use crate::gateway::envelope::{code_number, code_string};
use crate::gateway::{elapsed_ms, error_response, lookup_path, ApiGateway};
use crate::store::PickupOrderStore;
use crate::time;

pub const CREATE_METHOD: &str = "jingdong.ldop.receive.pickuporder.receive";
pub const CANCEL_METHOD: &str = "jingdong.ldop.pickup.cancel";

pub const DEFAULT_CANCEL_REASON: &str = "客户取消服务单，终止取件";

const CREATE_FAILED: &str = "创建取件订单失败: ";
const CANCEL_FAILED: &str = "取消取件订单失败: ";

/// `result.code` of an accepted order.
const CREATE_SUCCESS_CODE: &str = "100";
/// JD's reason code for a customer-initiated cancellation.
const CANCEL_END_REASON: i64 = 19;
const CANCEL_SOURCE: &str = "ECLP";

const PICKUP_REMARK: &str = "上门前请先电话联系";
const PACKAGE_DESCRIPTION: &str = "使用过的咖啡胶囊";

/// Rejects a status change the order lifecycle does not allow.
fn ensure_transition(order: &PickupOrder, next: PickupOrderStatus) -> Result<()> {
    if order.status.can_transition_to(next) {
        return Ok(());
    }
    Err(ValidationError::new(
        "status",
        format!("订单状态{}不能变更为{}", order.status.label(), next.label()),
    )
    .into())
}

/// Drives a pickup order through JD: `CREATED -> SUBMITTED -> CANCELLED`.
pub struct PickupOrderWorkflow {
    gateway: Arc<ApiGateway>,
    orders: Arc<dyn PickupOrderStore>,
}

impl PickupOrderWorkflow {
    pub fn new(gateway: Arc<ApiGateway>, orders: Arc<dyn PickupOrderStore>) -> Self {
        Self { gateway, orders }
    }

    /// Submits the order to JD under the default config.
    ///
    /// Only a `CREATED` order can be submitted. The config is attached to
    /// the order before the call. On acceptance the order becomes
    /// `SUBMITTED`; it is saved when JD returns a pickup code. Returns JD's
    /// result object.
    pub async fn create_pickup_order(&self, order: &mut PickupOrder) -> Result<Value> {
        let start = Instant::now();
        ensure_transition(order, PickupOrderStatus::Submitted)?;
        let config = self
            .gateway
            .configs()
            .default_config()?
            .ok_or_else(|| JdlError::ConfigMissing("无可用京东配置".to_string()))?;
        order.config = Some(config.clone());

        let order_id = order.id.clone().unwrap_or_default();
        let span = info_span!("create_pickup_order", order_id = %order_id);

        async {
            info!(
                order_id = %order_id,
                customer_code = %config.customer_code,
                sender_name = %order.sender.name,
                receiver_name = %order.receiver.name,
                "创建京东取件订单开始"
            );

            match self.submit(order, &config).await {
                Ok(result) => {
                    info!(
                        order_id = %order_id,
                        pickup_code = order.pick_up_code.as_deref().unwrap_or_default(),
                        duration_ms = elapsed_ms(start),
                        status = %order.status,
                        "创建京东取件订单成功"
                    );
                    Ok(result)
                }
                Err(e) => {
                    error!(
                        order_id = %order_id,
                        duration_ms = elapsed_ms(start),
                        error = %e,
                        exception = e.kind(),
                        "创建京东取件订单失败"
                    );
                    Err(JdlError::wrap(CREATE_FAILED, e))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn submit(&self, order: &mut PickupOrder, config: &JdlConfig) -> Result<Value> {
        let params = create_params(order, config);
        let response = self
            .gateway
            .request_with(config, CREATE_METHOD, &params)
            .await?;
        let result = create_result(&response)?;

        order.status = PickupOrderStatus::Submitted;

        if let Some(code) = result
            .get("pickUpCode")
            .and_then(code_string)
            .filter(|code| !code.is_empty())
        {
            order.pick_up_code = Some(code);
            self.orders.save(order)?;
        }

        Ok(result)
    }

    /// Cancels the order at JD using the config the order carries.
    /// A `CANCELLED` order is rejected before any call.
    ///
    /// The order becomes `CANCELLED` and is saved when JD reports
    /// `returnType.statusCode == 0`. Returns JD's result object.
    pub async fn cancel_pickup_order(
        &self,
        order: &mut PickupOrder,
        reason: Option<&str>,
    ) -> Result<Value> {
        let start = Instant::now();
        let config = order
            .config
            .clone()
            .ok_or_else(|| JdlError::ConfigMissing("订单未关联京东配置".to_string()))?;
        ensure_transition(order, PickupOrderStatus::Cancelled)?;
        let reason = reason.unwrap_or(DEFAULT_CANCEL_REASON);

        let order_id = order.id.clone().unwrap_or_default();
        let pickup_code = order.pick_up_code.clone().unwrap_or_default();
        let span = info_span!("cancel_pickup_order", order_id = %order_id);

        async {
            info!(
                order_id = %order_id,
                pickup_code = %pickup_code,
                cancel_reason = reason,
                customer_code = %config.customer_code,
                "取消京东取件订单开始"
            );

            match self.cancel(order, &config, reason).await {
                Ok(result) => {
                    info!(
                        order_id = %order_id,
                        pickup_code = %pickup_code,
                        duration_ms = elapsed_ms(start),
                        status = %order.status,
                        "取消京东取件订单成功"
                    );
                    Ok(result)
                }
                Err(e) => {
                    error!(
                        order_id = %order_id,
                        pickup_code = %pickup_code,
                        duration_ms = elapsed_ms(start),
                        error = %e,
                        exception = e.kind(),
                        "取消京东取件订单失败"
                    );
                    Err(JdlError::wrap(CANCEL_FAILED, e))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn cancel(
        &self,
        order: &mut PickupOrder,
        config: &JdlConfig,
        reason: &str,
    ) -> Result<Value> {
        let params = cancel_params(order, config, reason);
        let response = self
            .gateway
            .request_with(config, CANCEL_METHOD, &params)
            .await?;

        if let Some(envelope) = error_response(&response) {
            let code = envelope.numeric_code(500);
            let message = envelope.zh_desc.unwrap_or_else(|| "取消取件订单失败".to_string());
            return Err(JdlError::api(message, code));
        }

        let result = response
            .get("jingdong_ldop_pickup_cancel_responce")
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| json!({}));

        let cancelled = lookup_path(&result, &["returnType", "statusCode"])
            .and_then(code_string)
            .is_some_and(|code| code == "0");
        if cancelled {
            order.status = PickupOrderStatus::Cancelled;
            self.orders.save(order)?;
        }

        Ok(result)
    }
}

fn optional_time(value: Option<chrono::NaiveDateTime>) -> String {
    value
        .as_ref()
        .map(time::format_datetime)
        .unwrap_or_default()
}

/// Business parameters of `jingdong.ldop.receive.pickuporder.receive`.
pub fn create_params(order: &PickupOrder, config: &JdlConfig) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("orderId".into(), json!(order.id));
    params.insert("pickupName".into(), json!(order.sender.name));
    params.insert("pickupTel".into(), json!(order.sender.mobile));
    params.insert("pickupAddress".into(), json!(order.sender.address));
    params.insert("customerContract".into(), json!(order.receiver.name));
    params.insert("customerTel".into(), json!(order.receiver.mobile));
    params.insert("backAddress".into(), json!(order.receiver.address));
    params.insert("customerCode".into(), json!(config.customer_code));
    params.insert("weight".into(), json!(order.weight));
    params.insert("volume".into(), json!(1));
    params.insert(
        "packageCount".into(),
        json!(order.package_quantity.unwrap_or(1)),
    );
    params.insert(
        "pickupStartTime".into(),
        json!(optional_time(order.pickup_start_time)),
    );
    params.insert(
        "pickupEndTime".into(),
        json!(optional_time(order.pickup_end_time)),
    );
    params.insert("valueAddService".into(), json!(""));
    params.insert("guaranteeValue".into(), json!(""));
    params.insert("remark".into(), json!(PICKUP_REMARK));
    params.insert("desp".into(), json!(PACKAGE_DESCRIPTION));
    params
}

/// Business parameters of `jingdong.ldop.pickup.cancel`.
pub fn cancel_params(order: &PickupOrder, config: &JdlConfig, reason: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("pickupCode".into(), json!(order.pick_up_code));
    params.insert("endReason".into(), json!(CANCEL_END_REASON));
    params.insert(
        "operateTime".into(),
        json!(time::format_datetime(&time::now())),
    );
    params.insert("endReasonName".into(), json!(reason));
    params.insert("source".into(), json!(CANCEL_SOURCE));
    params.insert("customerCode".into(), json!(config.customer_code));
    params
}

/// Interprets a create response, returning the `receivepickuporder_result`.
fn create_result(response: &Value) -> Result<Value> {
    if let Some(message) = response.get("errorMessage").filter(|v| !v.is_null()) {
        let message = match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(JdlError::api(message, code_number(response.get("code"), 500)));
    }

    let result = lookup_path(
        response,
        &[
            "jingdong_ldop_receive_pickuporder_receive_responce",
            "receivepickuporder_result",
        ],
    )
    .cloned()
    .unwrap_or_else(|| json!({}));

    if let Some(code) = result.get("code").filter(|v| !v.is_null()) {
        if code.as_str() != Some(CREATE_SUCCESS_CODE) {
            // JD spells the top-level message field "messsage".
            let message = response
                .get("messsage")
                .and_then(Value::as_str)
                .unwrap_or("京东下单失败");
            return Err(JdlError::api(message, code_number(Some(code), 500)));
        }
    }

    Ok(result)
}
