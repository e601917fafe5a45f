use std::{future::Future, pin::Pin, time::Duration};

use actix_cors::Cors;
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use showtime_engine::{
    events::{BookingConfirmedEvent, EventHandlers, EventHooks, EventProducers},
    jobs::{register_booking_confirmation, JobRegistry},
    sqlite_connector,
    AccessApi,
    BookingsApi,
    EventBusClient,
    IdentityClient,
    LazyBookingStore,
    PaymentFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::{AdminGuardFactory, JobSigningKey, SessionMiddlewareFactory, SessionVerifier},
    routes::{
        health,
        is_admin,
        AllBookingsRoute,
        HomeRoute,
        JobsRoute,
        StripeWebhookRoute,
    },
};

const HOOK_BUFFER_SIZE: usize = 25;

pub type BookingStore = LazyBookingStore<SqliteDatabase>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = LazyBookingStore::new(sqlite_connector(config.database_url.clone(), config.db_max_connections));
    let handlers = EventHandlers::new(HOOK_BUFFER_SIZE, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, store, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks run in-process once a booking has been confirmed by the booking-confirmation job.
pub fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_show_booked(|ev: BookingConfirmedEvent| {
        Box::pin(async move {
            info!("🎟️ {} confirmed", ev.booking);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}

/// Builds the HTTP server. The store is not connected here; the first request that needs it opens the connection.
pub fn create_server_instance(
    config: ServerConfig,
    store: BookingStore,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let publisher = EventBusClient::new(config.event_bus.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let identity =
        IdentityClient::new(config.identity.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let session_verifier = SessionVerifier::from_config(&config.session)?;
    let mut registry = JobRegistry::new();
    register_booking_confirmation(&mut registry, store.clone(), producers);
    let registry = web::Data::new(registry);
    let store_data = web::Data::new(store.clone());
    let stripe_config = web::Data::new(config.stripe.clone());
    let signing_key = web::Data::new(JobSigningKey(config.job_signing_key.clone()));
    let srv = HttpServer::new(move || {
        let payment_api = PaymentFlowApi::new(store.clone(), publisher.clone());
        let bookings_api = BookingsApi::new(store.clone());
        let access_api = AccessApi::new(identity.clone());
        let admin_scope = web::scope("/api/admin")
            .wrap(AdminGuardFactory::<IdentityClient>::new())
            .service(is_admin)
            .service(AllBookingsRoute::<BookingStore>::new());
        App::new()
            .wrap(SessionMiddlewareFactory::new(session_verifier.clone()))
            .wrap(Cors::permissive())
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("showtime::access_log"))
            .app_data(store_data.clone())
            .app_data(stripe_config.clone())
            .app_data(registry.clone())
            .app_data(signing_key.clone())
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(bookings_api))
            .app_data(web::Data::new(access_api))
            .service(health)
            .service(HomeRoute::<BookingStore>::new())
            .service(StripeWebhookRoute::<BookingStore, EventBusClient>::new())
            .service(JobsRoute::<BookingStore>::new())
            .service(admin_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("🚀️ Showtime server listening on {}:{}", config.host, config.port);
    Ok(srv)
}
