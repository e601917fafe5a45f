use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use serde_json::{json, Value};
use showtime_common::Secret;
use showtime_engine::{
    db_types::BookingUpdate,
    events::EventBusError,
    traits::BookingStoreError,
    PaymentFlowApi,
};

use super::{
    helpers::send_request,
    mocks::{MockBookingManager, MockEventBus},
};
use crate::{
    config::StripeConfig,
    integrations::stripe::{signature_header, SIGNATURE_HEADER},
    routes::StripeWebhookRoute,
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

fn configure(db: MockBookingManager, bus: MockEventBus) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let config = StripeConfig {
            secret_key: Secret::new("sk_test_123".to_string()),
            webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
            tolerance: Duration::from_secs(300),
        };
        cfg.app_data(web::Data::new(config))
            .app_data(web::Data::new(PaymentFlowApi::new(db, bus)))
            .service(StripeWebhookRoute::<MockBookingManager, MockEventBus>::new());
    }
}

fn event_body(event_type: &str, metadata: Value) -> String {
    json!({
        "id": "evt_test_1",
        "type": event_type,
        "created": 1729080000,
        "livemode": false,
        "data": {"object": {"id": "cs_test_1", "object": "checkout.session", "metadata": metadata, "payment_status": "paid"}}
    })
    .to_string()
}

fn webhook_request(body: &str, signature: Option<String>) -> TestRequest {
    let mut req = TestRequest::post()
        .uri("/api/stripe")
        .insert_header(("content-type", "application/json"))
        .set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((SIGNATURE_HEADER, sig));
    }
    req
}

fn signed_request(body: &str) -> TestRequest {
    let header = signature_header(body.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp());
    webhook_request(body, Some(header))
}

fn untouched_store() -> MockBookingManager {
    let mut db = MockBookingManager::new();
    db.expect_update_booking().never();
    db
}

fn silent_bus() -> MockEventBus {
    let mut bus = MockEventBus::new();
    bus.expect_publish().never();
    bus
}

fn expect_mark_paid(db: &mut MockBookingManager, result: Result<u64, BookingStoreError>) {
    db.expect_update_booking()
        .withf(|id, update| id.as_str() == "B1" && *update == BookingUpdate::mark_paid())
        .times(1)
        .returning(move |_, _| result.clone());
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let _ = env_logger::try_init();
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let (status, body) = send_request(webhook_request(&body, None), configure(untouched_store(), silent_bus())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Webhook Error: No stripe-signature header value was provided.");
}

#[actix_web::test]
async fn forged_signature_is_rejected() {
    let _ = env_logger::try_init();
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let forged = signature_header(body.as_bytes(), "whsec_someone_else", Utc::now().timestamp());
    let req = webhook_request(&body, Some(forged));
    let (status, body) = send_request(req, configure(untouched_store(), silent_bus())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Webhook Error: No signatures found matching the expected signature for payload");
}

#[actix_web::test]
async fn malformed_signature_header_is_rejected() {
    let _ = env_logger::try_init();
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let req = webhook_request(&body, Some("this is not a signature".into()));
    let (status, body) = send_request(req, configure(untouched_store(), silent_bus())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Webhook Error: "), "{body}");
}

#[actix_web::test]
async fn replayed_webhook_is_rejected() {
    let _ = env_logger::try_init();
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let stale = signature_header(body.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp() - 3600);
    let req = webhook_request(&body, Some(stale));
    let (status, body) = send_request(req, configure(untouched_store(), silent_bus())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Webhook Error: Timestamp outside the tolerance zone");
}

#[actix_web::test]
async fn completed_checkout_marks_booking_paid() {
    let _ = env_logger::try_init();
    let mut db = MockBookingManager::new();
    expect_mark_paid(&mut db, Ok(1));
    let mut bus = MockEventBus::new();
    bus.expect_publish()
        .withf(|event| event.name == "app/show.booked" && event.data == json!({"bookingId": "B1"}))
        .times(1)
        .returning(|_| Ok(()));
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let (status, body) = send_request(signed_request(&body), configure(db, bus)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"received": true}));
}

#[actix_web::test]
async fn unknown_booking_still_publishes() {
    let _ = env_logger::try_init();
    let mut db = MockBookingManager::new();
    expect_mark_paid(&mut db, Ok(0));
    let mut bus = MockEventBus::new();
    bus.expect_publish().times(1).returning(|_| Ok(()));
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let (status, _) = send_request(signed_request(&body), configure(db, bus)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn other_event_types_are_acknowledged() {
    let _ = env_logger::try_init();
    for event_type in ["payment_intent.succeeded", "checkout.session.expired", "charge.refunded"] {
        let body = event_body(event_type, json!({"bookingId": "B1"}));
        let (status, body) = send_request(signed_request(&body), configure(untouched_store(), silent_bus())).await;
        assert_eq!(status, StatusCode::OK, "{event_type}");
        assert_eq!(body, r#"{"received":true}"#);
    }
}

#[actix_web::test]
async fn store_failure_is_a_server_error() {
    let _ = env_logger::try_init();
    let mut db = MockBookingManager::new();
    expect_mark_paid(&mut db, Err(BookingStoreError::QueryError("disk I/O error".into())));
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let (status, body) = send_request(signed_request(&body), configure(db, silent_bus())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Webhook handler failed");
}

#[actix_web::test]
async fn publish_failure_is_a_server_error() {
    let _ = env_logger::try_init();
    let mut db = MockBookingManager::new();
    expect_mark_paid(&mut db, Ok(1));
    let mut bus = MockEventBus::new();
    bus.expect_publish()
        .times(1)
        .returning(|_| Err(EventBusError::Rejected { status: 401, message: "Event key not found".into() }));
    let body = event_body("checkout.session.completed", json!({"bookingId": "B1"}));
    let (status, body) = send_request(signed_request(&body), configure(db, bus)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Webhook handler failed");
}

#[actix_web::test]
async fn missing_booking_id_is_a_server_error() {
    let _ = env_logger::try_init();
    let body = event_body("checkout.session.completed", json!({"orderId": "B1"}));
    let (status, body) = send_request(signed_request(&body), configure(untouched_store(), silent_bus())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Webhook handler failed");
}
