use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Duration;
use serde_json::{json, Value};
use showtime_engine::{traits::BookingStoreError, AccessApi, BookingsApi, IdentityError};

use super::{
    helpers::{booking, issue_token, send_request},
    mocks::{MockBookingManager, MockIdentity},
};
use crate::{
    middleware::AdminGuardFactory,
    routes::{is_admin, AllBookingsRoute},
};

fn configure(identity: MockIdentity, db: MockBookingManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let admin_scope = web::scope("/api/admin")
            .wrap(AdminGuardFactory::<MockIdentity>::new())
            .service(is_admin)
            .service(AllBookingsRoute::<MockBookingManager>::new());
        cfg.app_data(web::Data::new(AccessApi::new(identity)))
            .app_data(web::Data::new(BookingsApi::new(db)))
            .service(admin_scope);
    }
}

fn identity_with_role(role: Option<&'static str>) -> MockIdentity {
    let mut identity = MockIdentity::new();
    identity
        .expect_fetch_user_role()
        .withf(|user_id| user_id == "user_alice")
        .times(1)
        .returning(move |_| Ok(role.map(String::from)));
    identity
}

fn unused_identity() -> MockIdentity {
    let mut identity = MockIdentity::new();
    identity.expect_fetch_user_role().never();
    identity
}

fn unused_store() -> MockBookingManager {
    let mut db = MockBookingManager::new();
    db.expect_fetch_bookings().never();
    db
}

fn get(path: &str, token: Option<String>) -> TestRequest {
    let req = TestRequest::get().uri(path);
    match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {token}"))),
        None => req,
    }
}

fn alice_token() -> Option<String> {
    Some(issue_token("user_alice", Duration::hours(1)))
}

fn assert_not_authorized(status: StatusCode, body: &str) {
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(body).unwrap(), json!({"success": false, "message": "Not Authorized"}));
}

#[actix_web::test]
async fn admin_is_admin() {
    let _ = env_logger::try_init();
    let (status, body) =
        send_request(get("/api/admin/is-admin", alice_token()), configure(identity_with_role(Some("admin")), unused_store()))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"success": true, "isAdmin": true}));
}

#[actix_web::test]
async fn admin_lists_all_bookings() {
    let _ = env_logger::try_init();
    let mut db = MockBookingManager::new();
    db.expect_fetch_bookings().times(1).returning(|| Ok(vec![booking("B2", false), booking("B1", true)]));
    let (status, body) =
        send_request(get("/api/admin/all-bookings", alice_token()), configure(identity_with_role(Some("admin")), db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = serde_json::from_str::<Value>(&body).unwrap();
    assert_eq!(body["success"], json!(true));
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0]["id"], json!("B2"));
    assert_eq!(bookings[0]["isPaid"], json!(false));
    assert_eq!(bookings[0]["bookedSeats"], json!(["A1", "A2"]));
    assert_eq!(bookings[1]["paymentLink"], json!(""));
}

#[actix_web::test]
async fn store_errors_are_reported_in_the_envelope() {
    let _ = env_logger::try_init();
    let mut db = MockBookingManager::new();
    db.expect_fetch_bookings().times(1).returning(|| Err(BookingStoreError::QueryError("database is locked".into())));
    let (status, body) =
        send_request(get("/api/admin/all-bookings", alice_token()), configure(identity_with_role(Some("admin")), db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"success": false, "message": "Booking store query failed. database is locked"})
    );
}

#[actix_web::test]
async fn other_roles_are_not_authorized() {
    let _ = env_logger::try_init();
    for role in [Some("user"), Some("Admin"), None] {
        let (status, body) =
            send_request(get("/api/admin/all-bookings", alice_token()), configure(identity_with_role(role), unused_store()))
                .await;
        assert_not_authorized(status, &body);
    }
}

#[actix_web::test]
async fn anonymous_requests_are_not_authorized() {
    let _ = env_logger::try_init();
    let (status, body) = send_request(get("/api/admin/is-admin", None), configure(unused_identity(), unused_store())).await;
    assert_not_authorized(status, &body);
}

#[actix_web::test]
async fn expired_sessions_are_not_authorized() {
    let _ = env_logger::try_init();
    let token = Some(issue_token("user_alice", Duration::hours(-1)));
    let (status, body) = send_request(get("/api/admin/all-bookings", token), configure(unused_identity(), unused_store())).await;
    assert_not_authorized(status, &body);
}

#[actix_web::test]
async fn identity_failures_are_not_authorized() {
    let _ = env_logger::try_init();
    let mut identity = MockIdentity::new();
    identity
        .expect_fetch_user_role()
        .times(1)
        .returning(|_| Err(IdentityError::RequestFailed("connection reset".into())));
    let (status, body) = send_request(get("/api/admin/all-bookings", alice_token()), configure(identity, unused_store())).await;
    assert_not_authorized(status, &body);
}
