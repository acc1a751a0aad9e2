//! Pickup order create/cancel against a stubbed JD router.

mod common;

use mockito::Matcher;
use serde_json::json;

use common::{PickupOrderBuilder, TestHarness, ROUTER_PATH};
use jdl_ldop::db::pickup_order_repo;
use jdl_ldop::{JdlError, PickupOrderStatus};

const CREATE: &str = "jingdong.ldop.receive.pickuporder.receive";
const CANCEL: &str = "jingdong.ldop.pickup.cancel";

fn created(code: &str, pick_up_code: &str) -> serde_json::Value {
    json!({
        "jingdong_ldop_receive_pickuporder_receive_responce": {
            "receivepickuporder_result": {"code": code, "pickUpCode": pick_up_code}
        }
    })
}

#[tokio::test]
async fn test_create_end_to_end() {
    let mut harness = TestHarness::seeded().await;
    let mock = harness
        .server
        .mock("POST", ROUTER_PATH)
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("method".into(), CREATE.into()),
            Matcher::UrlEncoded("app_key".into(), "K1".into()),
            Matcher::UrlEncoded("access_token".into(), "T1".into()),
            Matcher::UrlEncoded("v".into(), "2.0".into()),
            Matcher::UrlEncoded("sign_method".into(), "md5".into()),
            Matcher::Regex("sign=[0-9A-F]{32}".into()),
            Matcher::Regex("360buy_param_json=".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(created("100", "JDL0001").to_string())
        .expect(1)
        .create_async()
        .await;

    let mut order = PickupOrderBuilder::new().weight(1.5).build();
    pickup_order_repo::save(&harness.db, &mut order).unwrap();

    let result = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result["pickUpCode"], json!("JDL0001"));
    assert_eq!(order.status, PickupOrderStatus::Submitted);
    assert_eq!(order.pick_up_code.as_deref(), Some("JDL0001"));
    assert_eq!(order.config.as_ref().unwrap().customer_code, "C1");
    assert_eq!(harness.orders.saves(), 1);

    let stored = pickup_order_repo::find_by_id(&harness.db, order.id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, PickupOrderStatus::Submitted);
    assert_eq!(stored.pick_up_code.as_deref(), Some("JDL0001"));
    assert_eq!(stored.sender.name, "张三");
    assert_eq!(stored.receiver.name, "李四");
}

#[tokio::test]
async fn test_create_without_pickup_code_is_not_saved() {
    let mut harness = TestHarness::seeded().await;
    let _mock = harness
        .mock_method(CREATE, &created("100", ""))
        .await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap();

    assert_eq!(order.status, PickupOrderStatus::Submitted);
    assert!(order.pick_up_code.is_none());
    assert_eq!(harness.orders.saves(), 0);
}

#[tokio::test]
async fn test_create_rejected_leaves_status() {
    let mut harness = TestHarness::seeded().await;
    let mut body = created("200", "");
    body["messsage"] = json!("超出服务范围");
    let _mock = harness.mock_method(CREATE, &body).await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    assert!(matches!(err, JdlError::Api { .. }));
    assert_eq!(err.to_string(), "创建取件订单失败: 超出服务范围");
    assert_eq!(err.code(), 200);
    assert!(matches!(err.inner(), Some(JdlError::Api { .. })));
    assert_eq!(order.status, PickupOrderStatus::Created);
    assert!(order.pick_up_code.is_none());
    assert_eq!(harness.orders.saves(), 0);
}

#[tokio::test]
async fn test_create_numeric_success_code_is_rejected() {
    let mut harness = TestHarness::seeded().await;
    let body = json!({
        "jingdong_ldop_receive_pickuporder_receive_responce": {
            "receivepickuporder_result": {"code": 100, "pickUpCode": "JDL0001"}
        }
    });
    let _mock = harness.mock_method(CREATE, &body).await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    assert!(matches!(err.inner(), Some(JdlError::Api { .. })));
    assert_eq!(err.to_string(), "创建取件订单失败: 京东下单失败");
    assert_eq!(order.status, PickupOrderStatus::Created);
    assert!(order.pick_up_code.is_none());
    assert_eq!(harness.orders.saves(), 0);
}

#[tokio::test]
async fn test_create_top_level_error_message() {
    let mut harness = TestHarness::seeded().await;
    let _mock = harness
        .mock_method(CREATE, &json!({"errorMessage": "参数错误", "code": 40}))
        .await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "创建取件订单失败: 参数错误");
    assert_eq!(err.code(), 40);
    assert_eq!(order.status, PickupOrderStatus::Created);
}

#[tokio::test]
async fn test_create_without_config() {
    let mut harness = TestHarness::new().await;
    harness.seed_token(1, "T1");
    let mock = harness.mock_router_unused().await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, JdlError::ConfigMissing(ref m) if m == "无可用京东配置"));
    assert!(order.config.is_none());
}

#[tokio::test]
async fn test_create_without_token_is_wrapped() {
    let mut harness = TestHarness::new().await;
    harness.seed_config(common::config("C1", "K1", "S1"));
    let mock = harness.mock_router_unused().await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.to_string(), "创建取件订单失败: Failed to get access token");
    assert!(matches!(err.inner(), Some(JdlError::TokenMissing(_))));
}

/// The token is always looked up under id 1, whatever the config. A token
/// stored under any other id is never found.
#[tokio::test]
async fn test_token_lookup_uses_fixed_id() {
    let mut harness = TestHarness::new().await;
    harness.seed_config(common::config("C1", "K1", "S1"));
    harness.seed_token(2, "T2");
    let mock = harness.mock_router_unused().await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err.inner(), Some(JdlError::TokenMissing(_))));
}

#[tokio::test]
async fn test_create_http_failure_is_transport_error() {
    let mut harness = TestHarness::seeded().await;
    let _mock = harness
        .server
        .mock("POST", ROUTER_PATH)
        .with_status(502)
        .create_async()
        .await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("创建取件订单失败: "));
    assert!(matches!(err.inner(), Some(JdlError::ApiTransport { .. })));
    assert_eq!(err.code(), 0);
    assert_eq!(order.status, PickupOrderStatus::Created);
}

#[tokio::test]
async fn test_cancel_success() {
    let mut harness = TestHarness::seeded().await;
    let config = harness.seed_config(common::config("C2", "K2", "S2"));
    let mock = harness
        .server
        .mock("POST", ROUTER_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("method".into(), CANCEL.into()),
            Matcher::UrlEncoded("app_key".into(), "K2".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "jingdong_ldop_pickup_cancel_responce": {
                    "returnType": {"statusCode": 0, "statusMessage": "成功"}
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let mut order = PickupOrderBuilder::new()
        .config(config)
        .pick_up_code("JDL0001")
        .build();
    order.status = PickupOrderStatus::Submitted;
    pickup_order_repo::save(&harness.db, &mut order).unwrap();

    let result = harness
        .workflow()
        .cancel_pickup_order(&mut order, None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result["returnType"]["statusMessage"], json!("成功"));
    assert_eq!(order.status, PickupOrderStatus::Cancelled);
    assert_eq!(harness.orders.saves(), 1);

    let stored = pickup_order_repo::find_by_pick_up_code(&harness.db, "JDL0001")
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, PickupOrderStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_sends_reason() {
    let mut harness = TestHarness::seeded().await;
    let config = harness.seed_config(common::config("C2", "K2", "S2"));
    let mock = harness
        .server
        .mock("POST", ROUTER_PATH)
        .match_body(Matcher::Regex("ECLP".into()))
        .with_status(200)
        .with_body(r#"{"jingdong_ldop_pickup_cancel_responce": {"returnType": {"statusCode": 1}}}"#)
        .create_async()
        .await;

    let mut order = PickupOrderBuilder::new()
        .config(config)
        .pick_up_code("JDL0001")
        .build();
    order.status = PickupOrderStatus::Submitted;

    harness
        .workflow()
        .cancel_pickup_order(&mut order, Some("重复下单"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(order.status, PickupOrderStatus::Submitted);
    assert_eq!(harness.orders.saves(), 0);
}

#[tokio::test]
async fn test_cancel_error_response() {
    let mut harness = TestHarness::seeded().await;
    let config = harness.seed_config(common::config("C2", "K2", "S2"));
    let _mock = harness
        .mock_method(
            CANCEL,
            &json!({"error_response": {"code": "62", "zh_desc": "取件单不存在"}}),
        )
        .await;

    let mut order = PickupOrderBuilder::new()
        .config(config)
        .pick_up_code("JDL0001")
        .build();
    let err = harness
        .workflow()
        .cancel_pickup_order(&mut order, None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "取消取件订单失败: 取件单不存在");
    assert_eq!(err.code(), 62);
    assert_eq!(order.status, PickupOrderStatus::Created);
}

#[tokio::test]
async fn test_cancel_without_config_makes_no_call() {
    let mut harness = TestHarness::seeded().await;
    let mock = harness.mock_router_unused().await;

    let mut order = PickupOrderBuilder::new().pick_up_code("JDL0001").build();
    let err = harness
        .workflow()
        .cancel_pickup_order(&mut order, None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, JdlError::ConfigMissing(ref m) if m == "订单未关联京东配置"));
    assert_eq!(order.status, PickupOrderStatus::Created);
}

#[tokio::test]
async fn test_create_rejects_submitted_order() {
    let mut harness = TestHarness::seeded().await;
    let mock = harness.mock_router_unused().await;

    let mut order = PickupOrderBuilder::new().id("order-1").build();
    order.status = PickupOrderStatus::Submitted;
    let err = harness
        .workflow()
        .create_pickup_order(&mut order)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, JdlError::Validation(ref v) if v.field == "status"));
    assert_eq!(order.status, PickupOrderStatus::Submitted);
    assert!(order.config.is_none());
}

#[tokio::test]
async fn test_cancel_rejects_cancelled_order() {
    let mut harness = TestHarness::seeded().await;
    let config = harness.seed_config(common::config("C2", "K2", "S2"));
    let mock = harness.mock_router_unused().await;

    let mut order = PickupOrderBuilder::new()
        .config(config)
        .pick_up_code("JDL0001")
        .build();
    order.status = PickupOrderStatus::Cancelled;
    let err = harness
        .workflow()
        .cancel_pickup_order(&mut order, None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, JdlError::Validation(_)));
    assert_eq!(harness.orders.saves(), 0);
}
