use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use serde_json::{json, Value};
use showtime_common::Secret;
use showtime_engine::{
    events::DomainEvent,
    jobs::{JobDefinition, JobError, JobRegistry},
    traits::BookingStoreError,
};

use super::{helpers::send_request, mocks::MockStore};
use crate::{
    middleware::{sign_job_request, JobSigningKey, JOB_SIGNATURE_HEADER},
    routes::JobsRoute,
};

const SIGNING_KEY: &str = "signkey-test-8ee2262a15e8d3c8f6e3c7c2d4b9a1f0";

fn registry(calls: Arc<AtomicUsize>) -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry
        .register(JobDefinition::new("echo", "Echo", "app/echo"), move |event: DomainEvent| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({ "echoed": event.data }))
            }
        })
        .register(JobDefinition::new("explode", "Always fails", "app/explode"), |_| async {
            Err(JobError::Failed("kaboom".into()))
        });
    registry
}

fn connected_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_ensure_connected().returning(|| Ok(()));
    store
}

fn unavailable_store() -> MockStore {
    let mut store = MockStore::new();
    store
        .expect_ensure_connected()
        .times(1)
        .returning(|| Err(BookingStoreError::ConnectionError("unable to open database file".into())));
    store
}

fn configure(store: MockStore, key: Option<&str>, calls: Arc<AtomicUsize>) -> impl FnOnce(&mut ServiceConfig) {
    let key = JobSigningKey(key.map(|k| Secret::new(k.to_string())));
    move |cfg| {
        cfg.app_data(web::Data::new(store))
            .app_data(web::Data::new(registry(calls)))
            .app_data(web::Data::new(key))
            .service(JobsRoute::<MockStore>::new());
    }
}

fn invoke_request(fn_id: &str, body: &str) -> TestRequest {
    TestRequest::post()
        .uri(&format!("/api/inngest?fnId={fn_id}"))
        .insert_header(("content-type", "application/json"))
        .set_payload(body.to_string())
}

fn signed_invoke_request(fn_id: &str, body: &str) -> TestRequest {
    let signature = sign_job_request(SIGNING_KEY, body.as_bytes(), Utc::now().timestamp());
    invoke_request(fn_id, body).insert_header((JOB_SIGNATURE_HEADER, signature))
}

fn echo_body() -> String {
    json!({"event": {"name": "app/echo", "data": {"bookingId": "B1"}}}).to_string()
}

#[actix_web::test]
async fn introspection_lists_registered_jobs() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let req = TestRequest::get().uri("/api/inngest");
    let (status, body) = send_request(req, configure(connected_store(), Some(SIGNING_KEY), calls)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({
            "functionCount": 2,
            "functions": [
                {"id": "echo", "name": "Echo", "triggers": [{"event": "app/echo"}]},
                {"id": "explode", "name": "Always fails", "triggers": [{"event": "app/explode"}]},
            ]
        })
    );
}

#[actix_web::test]
async fn sync_acknowledges_registration() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let req = TestRequest::put().uri("/api/inngest");
    let (status, body) = send_request(req, configure(connected_store(), Some(SIGNING_KEY), calls)).await;
    assert_eq!(status, StatusCode::OK);
    let body = serde_json::from_str::<Value>(&body).unwrap();
    assert_eq!(body["message"], "Successfully registered");
    assert_eq!(body["functions"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn signed_invocation_runs_the_job() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let req = signed_invoke_request("echo", &echo_body());
    let (status, body) = send_request(req, configure(connected_store(), Some(SIGNING_KEY), Arc::clone(&calls))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"echoed": {"bookingId": "B1"}}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn unsigned_invocation_is_rejected() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let req = invoke_request("echo", &echo_body());
    let (status, body) = send_request(req, configure(connected_store(), Some(SIGNING_KEY), Arc::clone(&calls))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"error": "Request signature invalid or not provided. X-Inngest-Signature is missing"})
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn tampered_invocation_is_rejected() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let signature = sign_job_request(SIGNING_KEY, echo_body().as_bytes(), Utc::now().timestamp());
    let tampered = json!({"event": {"name": "app/echo", "data": {"bookingId": "B2"}}}).to_string();
    let req = invoke_request("echo", &tampered).insert_header((JOB_SIGNATURE_HEADER, signature));
    let (status, _) = send_request(req, configure(connected_store(), Some(SIGNING_KEY), Arc::clone(&calls))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn without_a_key_invocations_are_not_checked() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let req = invoke_request("echo", &echo_body());
    let (status, _) = send_request(req, configure(connected_store(), None, Arc::clone(&calls))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn unknown_job_is_not_found() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let body = json!({"event": {"name": "app/nothing", "data": {}}}).to_string();
    let req = signed_invoke_request("missing", &body);
    let (status, body) = send_request(req, configure(connected_store(), Some(SIGNING_KEY), calls)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"error": "The data was not found. No job with id missing is registered"})
    );
}

#[actix_web::test]
async fn failing_job_is_a_server_error() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let body = json!({"event": {"name": "app/explode", "data": {}}}).to_string();
    let req = signed_invoke_request("explode", &body);
    let (status, body) = send_request(req, configure(connected_store(), Some(SIGNING_KEY), calls)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"error": "Job failed. kaboom"}));
}

#[actix_web::test]
async fn every_method_connects_the_store_first() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut store = MockStore::new();
    store.expect_ensure_connected().times(1).returning(|| Ok(()));
    let req = TestRequest::delete().uri("/api/inngest");
    let (status, _) = send_request(req, configure(store, Some(SIGNING_KEY), calls)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn unavailable_store_fails_before_the_signature_check() {
    let _ = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let req = invoke_request("echo", &echo_body());
    let (status, body) = send_request(req, configure(unavailable_store(), Some(SIGNING_KEY), Arc::clone(&calls))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"error": "The booking store is not available. unable to open database file"})
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
