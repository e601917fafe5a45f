use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use futures::{future::join_all, FutureExt};
use showtime_engine::{jobs::JobRegistry, traits::BookingStoreError, ConnectionState, Connector, LazyBookingStore};

use super::helpers::send_request;
use crate::routes::{health, HomeRoute, JobsRoute, LIVENESS_MESSAGE};

type TestStore = LazyBookingStore<()>;

fn counting_connector(count: Arc<AtomicUsize>) -> Connector<()> {
    Arc::new(move || {
        let count = Arc::clone(&count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(())
        }
        .boxed()
    })
}

fn failing_connector(count: Arc<AtomicUsize>) -> Connector<()> {
    Arc::new(move || {
        let count = Arc::clone(&count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            Err(BookingStoreError::ConnectionError("unable to open database file".into()))
        }
        .boxed()
    })
}

fn configure(store: TestStore) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(store))
            .app_data(web::Data::new(JobRegistry::new()))
            .service(health)
            .service(HomeRoute::<TestStore>::new())
            .service(JobsRoute::<TestStore>::new());
    }
}

#[actix_web::test]
async fn health_does_not_connect() {
    let _ = env_logger::try_init();
    let count = Arc::new(AtomicUsize::new(0));
    let store = TestStore::new(counting_connector(Arc::clone(&count)));
    let (status, body) = send_request(TestRequest::get().uri("/health"), configure(store.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(store.state(), ConnectionState::Uninitialized);
}

#[actix_web::test]
async fn connects_once_across_requests() {
    let _ = env_logger::try_init();
    let count = Arc::new(AtomicUsize::new(0));
    let store = TestStore::new(counting_connector(Arc::clone(&count)));
    let app = test::init_service(App::new().configure(configure(store.clone()))).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
    for path in ["/", "/api/inngest", "/", "/api/inngest", "/"] {
        let res = test::call_service(&app, TestRequest::get().uri(path).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "{path}");
    }
    let res = test::call_service(&app, TestRequest::put().uri("/api/inngest").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(store.state(), ConnectionState::Ready);
}

#[actix_web::test]
async fn concurrent_first_requests_share_one_attempt() {
    let _ = env_logger::try_init();
    let count = Arc::new(AtomicUsize::new(0));
    let store = TestStore::new(counting_connector(Arc::clone(&count)));
    let app = test::init_service(App::new().configure(configure(store))).await;
    let requests = (0..8).map(|_| test::call_service(&app, TestRequest::get().uri("/").to_request()));
    let responses = join_all(requests).await;
    for res in responses {
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, LIVENESS_MESSAGE);
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn failed_connection_is_retried() {
    let _ = env_logger::try_init();
    let count = Arc::new(AtomicUsize::new(0));
    let store = TestStore::new(failing_connector(Arc::clone(&count)));
    let app = test::init_service(App::new().configure(configure(store.clone()))).await;
    for (i, path) in ["/", "/api/inngest"].into_iter().enumerate() {
        let res = test::call_service(&app, TestRequest::get().uri(path).to_request()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(
            body["error"],
            "The booking store is not available. unable to open database file"
        );
        assert_eq!(count.load(Ordering::SeqCst), i + 1);
    }
    assert_eq!(store.state(), ConnectionState::Uninitialized);
}
