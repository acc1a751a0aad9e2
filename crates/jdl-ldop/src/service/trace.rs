//! Tracking event ingestion for a waybill.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDateTime, Timelike};
use serde_json::{json, Map, Value};
use tracing::{error, info, info_span, warn, Instrument};

use crate::entity::{Audit, LogisticsDetail, PickupOrder, WaybillStatus};
use crate::error::{JdlError, Result, ValidationError};
use crate::gateway::{elapsed_ms, error_response, lookup_path, ApiGateway};
use crate::store::LogisticsDetailStore;
use crate::time;

pub const TRACE_METHOD: &str = "jingdong.ldop.receive.trace.get";

const TRACE_FAILED: &str = "获取物流信息失败: ";
const UNKNOWN_ORDER_CODE: &str = "unknown";

/// Outcome of one trace fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSync {
    /// New, not yet stored, records.
    pub details: Vec<LogisticsDetail>,
    /// Events in JD's response.
    pub total_events: usize,
    /// Events already stored or repeated within the response.
    pub duplicates_skipped: usize,
    /// New records whose `operateTime` was missing or unparsable.
    pub time_fallbacks: usize,
}

/// A trace event mapped into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedTrace {
    pub detail: LogisticsDetail,
    /// `operate_time` was set to `now` because the event had no usable time.
    pub time_fallback: bool,
}

fn text_field(event: &Map<String, Value>, key: &str) -> String {
    match event.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn operate_time(value: Option<&Value>) -> Option<NaiveDateTime> {
    let parsed = match value? {
        Value::String(s) => time::parse_datetime_lenient(s),
        Value::Number(n) => n.as_i64().and_then(time::from_epoch_millis),
        _ => None,
    }?;
    Some(parsed.with_nanosecond(0).unwrap_or(parsed))
}

/// Maps one JD trace event into a new [`LogisticsDetail`].
///
/// A missing or unparsable `operateTime` falls back to `now` and is
/// reported through [`MappedTrace::time_fallback`].
pub fn map_trace_event(
    event: &Value,
    waybill_code: &str,
    customer_code: &str,
    order_code: &str,
    now: NaiveDateTime,
) -> std::result::Result<MappedTrace, ValidationError> {
    let event = event
        .as_object()
        .ok_or_else(|| ValidationError::new("trace_event", "跟踪事件必须是对象"))?;
    if waybill_code.trim().is_empty() {
        return Err(ValidationError::new("waybill_code", "运单号不能为空"));
    }

    let parsed = operate_time(event.get("operateTime"));
    let operator = text_field(event, "operator");

    let detail = LogisticsDetail {
        id: None,
        waybill_code: waybill_code.to_string(),
        customer_code: customer_code.to_string(),
        order_code: order_code.to_string(),
        operate_time: parsed.unwrap_or(now),
        operate_remark: text_field(event, "operateRemark"),
        operate_site: text_field(event, "operatePlace"),
        operate_user: (!operator.is_empty()).then_some(operator),
        operate_type: text_field(event, "operateType"),
        waybill_status: WaybillStatus::Created,
        next_site: None,
        next_city: None,
        audit: Audit::default(),
    };

    Ok(MappedTrace {
        detail,
        time_fallback: parsed.is_none(),
    })
}

/// Events under `traceList`. A lone object (single XML child) is one event.
fn trace_events(response: &Value) -> Vec<Value> {
    match lookup_path(
        response,
        &[
            "jingdong_ldop_receive_trace_get_response",
            "receiveTraceGetResult",
            "traceList",
        ],
    ) {
        Some(Value::Array(items)) => items.clone(),
        Some(item @ Value::Object(_)) => vec![item.clone()],
        _ => Vec::new(),
    }
}

/// Fetches JD tracking events and keeps the ones not stored yet.
pub struct TraceReconciler {
    gateway: Arc<ApiGateway>,
    details: Arc<dyn LogisticsDetailStore>,
}

impl TraceReconciler {
    pub fn new(gateway: Arc<ApiGateway>, details: Arc<dyn LogisticsDetailStore>) -> Self {
        Self { gateway, details }
    }

    /// New tracking records for `waybill_code`; storing them is up to the
    /// caller (see [`TraceReconciler::store_details`]).
    pub async fn get_logistics_trace(
        &self,
        waybill_code: &str,
        order: &PickupOrder,
    ) -> Result<Vec<LogisticsDetail>> {
        Ok(self.sync_trace(waybill_code, order).await?.details)
    }

    /// Like [`TraceReconciler::get_logistics_trace`], with counters.
    pub async fn sync_trace(&self, waybill_code: &str, order: &PickupOrder) -> Result<TraceSync> {
        let start = Instant::now();
        let config = order
            .config
            .as_ref()
            .ok_or_else(|| JdlError::ConfigMissing("订单未关联京东配置".to_string()))?;

        let order_id = order.id.as_deref().unwrap_or_default();
        let span = info_span!("get_logistics_trace", waybill_code, order_id);

        async {
            info!(
                waybill_code,
                order_id,
                customer_code = %config.customer_code,
                "获取京东物流跟踪信息开始"
            );

            let params = json!({
                "waybillCode": waybill_code,
                "customerCode": config.customer_code,
            });
            let params = params.as_object().cloned().unwrap_or_default();

            let outcome: Result<TraceSync> = async {
                let response = self
                    .gateway
                    .request_with(config, TRACE_METHOD, &params)
                    .await?;
                if let Some(envelope) = error_response(&response) {
                    let code = envelope.numeric_code(500);
                    let message = envelope.zh_desc.unwrap_or_else(|| "获取物流信息失败".to_string());
                    return Err(JdlError::api(message, code));
                }
                let events = trace_events(&response);
                if events.is_empty() {
                    warn!(waybill_code, order_id, "获取京东物流跟踪信息为空");
                    return Ok(TraceSync::default());
                }
                let sync = self.reconcile(&events, waybill_code, &config.customer_code, order)?;
                info!(
                    waybill_code,
                    order_id,
                    duration_ms = elapsed_ms(start),
                    total_traces = sync.total_events,
                    new_traces = sync.details.len(),
                    duplicates_skipped = sync.duplicates_skipped,
                    time_fallbacks = sync.time_fallbacks,
                    "获取京东物流跟踪信息成功"
                );
                Ok(sync)
            }
            .await;

            outcome.map_err(|e| {
                error!(
                    waybill_code,
                    order_id,
                    duration_ms = elapsed_ms(start),
                    error = %e,
                    exception = e.kind(),
                    "获取京东物流跟踪信息失败"
                );
                JdlError::wrap(TRACE_FAILED, e)
            })
        }
        .instrument(span)
        .await
    }

    fn reconcile(
        &self,
        events: &[Value],
        waybill_code: &str,
        customer_code: &str,
        order: &PickupOrder,
    ) -> Result<TraceSync> {
        let now = time::now();
        let order_code = order.id.as_deref().unwrap_or(UNKNOWN_ORDER_CODE);
        let mut seen = HashSet::new();
        let mut sync = TraceSync {
            total_events: events.len(),
            ..TraceSync::default()
        };

        for event in events {
            let mapped = map_trace_event(event, waybill_code, customer_code, order_code, now)?;
            let key = mapped.detail.key();

            if !seen.insert(key.clone()) || self.details.find_one_by(&key)?.is_some() {
                sync.duplicates_skipped += 1;
                continue;
            }

            if mapped.time_fallback {
                warn!(
                    waybill_code,
                    operate_time = ?event.get("operateTime"),
                    "京东物流跟踪时间无法解析，使用当前时间"
                );
                sync.time_fallbacks += 1;
            }
            sync.details.push(mapped.detail);
        }

        Ok(sync)
    }

    /// Validates and stores records returned by a sync.
    pub fn store_details(&self, details: &mut [LogisticsDetail]) -> Result<()> {
        for detail in details.iter_mut() {
            detail.validate()?;
            self.details.insert(detail)?;
        }
        Ok(())
    }
}
