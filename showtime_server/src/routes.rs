//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (the booking store, the event bus, the identity provider)
//! must be awaited, never blocked on.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use showtime_engine::{
    events::EventPublisher,
    jobs::JobRegistry,
    traits::{BookingManagement, StoreConnection},
    BookingsApi,
    PaymentFlowApi,
};

use crate::{
    config::StripeConfig,
    data_objects::{
        BookingsResponse,
        InvokeJobParams,
        IsAdminResponse,
        JobIntrospection,
        JobInvocation,
        JobRegistration,
        JsonResponse,
        WebhookAck,
    },
    errors::ServerError,
    integrations::stripe::{construct_event, SIGNATURE_HEADER},
    middleware::{JobSignatureFactory, StoreConnectionFactory},
    webhook::handle_stripe_event,
};

pub const LIVENESS_MESSAGE: &str = "Server is live";
pub const WEBHOOK_FAILED_MESSAGE: &str = "Webhook handler failed";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Liveness  --------------------------------------------------
route!(home => Get "/" impl StoreConnection);
/// Liveness probe. Unlike `/health`, this makes sure the booking store is connected first, so the first probe after
/// start-up is what opens the connection.
pub async fn home<S: StoreConnection>(store: web::Data<S>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received liveness request");
    store.ensure_connected().await?;
    Ok(HttpResponse::Ok().body(LIVENESS_MESSAGE))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(stripe_webhook => Post "/api/stripe" impl BookingManagement, EventPublisher);
/// Route handler for the payment provider's webhook.
///
/// The raw body is needed for signature verification, so it is taken as bytes and only parsed once the signature has
/// been checked.
///
/// * A missing or invalid signature is answered with `400 Webhook Error: <reason>`, and nothing else happens.
/// * `checkout.session.completed` marks the booking named in the session metadata as paid and publishes
///   `app/show.booked`. Any failure here is answered with `500 Webhook handler failed`.
/// * Every other event type is acknowledged with `{"received": true}` and ignored.
pub async fn stripe_webhook<B, P>(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<StripeConfig>,
    api: web::Data<PaymentFlowApi<B, P>>,
) -> HttpResponse
where
    B: BookingManagement,
    P: EventPublisher,
{
    trace!("💳️ Received payment webhook");
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event = match construct_event(&body, signature, config.webhook_secret.reveal(), config.tolerance) {
        Ok(event) => event,
        Err(e) => {
            warn!("💳️ Rejecting payment webhook. {e}");
            return HttpResponse::BadRequest().body(format!("Webhook Error: {e}"));
        },
    };
    match handle_stripe_event(api.get_ref(), &event).await {
        Ok(()) => HttpResponse::Ok().json(WebhookAck { received: true }),
        Err(e) => {
            error!("💳️ Could not handle payment webhook {} ({}). {e}", event.id, event.event_type);
            HttpResponse::InternalServerError().body(WEBHOOK_FAILED_MESSAGE)
        },
    }
}

//----------------------------------------------   Admin  ----------------------------------------------------
// These routes are mounted under a scope that is wrapped by the admin guard.
#[get("/is-admin")]
pub async fn is_admin() -> impl Responder {
    trace!("💻️ Received is-admin request");
    HttpResponse::Ok().json(IsAdminResponse { success: true, is_admin: true })
}

route!(all_bookings => Get "/all-bookings" impl BookingManagement);
pub async fn all_bookings<B: BookingManagement>(api: web::Data<BookingsApi<B>>) -> HttpResponse {
    trace!("💻️ Received all-bookings request");
    match api.all_bookings().await {
        Ok(bookings) => {
            debug!("💻️ Returning {} bookings", bookings.len());
            HttpResponse::Ok().json(BookingsResponse { success: true, bookings })
        },
        Err(e) => {
            warn!("💻️ Could not fetch bookings. {e}");
            HttpResponse::Ok().json(JsonResponse::failure(e))
        },
    }
}

//----------------------------------------------   Jobs  ----------------------------------------------------
/// The job dispatcher at `/api/inngest`.
///
/// Every request, whatever its method, first makes sure the booking store is connected. Then:
/// * `GET` describes the registered jobs,
/// * `PUT` acknowledges a sync from the event bus,
/// * `POST ?fnId=<id>` runs a job, once the request's signature has been checked.
///
/// Any other method is answered with `405` after the store check.
pub struct JobsRoute<S>(core::marker::PhantomData<fn() -> S>);

impl<S> JobsRoute<S> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<S> actix_web::dev::HttpServiceFactory for JobsRoute<S>
where S: StoreConnection + 'static
{
    fn register(self, config: &mut actix_web::dev::AppService) {
        let res = web::resource("/api/inngest")
            .name("jobs")
            .route(web::get().to(introspect_jobs))
            .route(web::put().to(register_jobs))
            .route(web::post().to(invoke_job).wrap(JobSignatureFactory::new()))
            .wrap(StoreConnectionFactory::<S>::new());
        actix_web::dev::HttpServiceFactory::register(res, config);
    }
}

pub async fn introspect_jobs(registry: web::Data<JobRegistry>) -> HttpResponse {
    trace!("⚙️ Received job introspection request");
    HttpResponse::Ok().json(JobIntrospection::from(registry.describe()))
}

pub async fn register_jobs(registry: web::Data<JobRegistry>) -> HttpResponse {
    trace!("⚙️ Received job sync request");
    let functions = registry.describe();
    info!("⚙️ Job sync requested. {} jobs registered.", functions.len());
    HttpResponse::Ok().json(JobRegistration { message: "Successfully registered".into(), functions })
}

pub async fn invoke_job(
    registry: web::Data<JobRegistry>,
    params: web::Query<InvokeJobParams>,
    body: web::Json<JobInvocation>,
) -> Result<HttpResponse, ServerError> {
    let InvokeJobParams { fn_id } = params.into_inner();
    let JobInvocation { event } = body.into_inner();
    debug!("⚙️ Invoking job {fn_id} for {}", event.name);
    let output = registry.invoke(&fn_id, event).await.map_err(|e| {
        warn!("⚙️ Job {fn_id} failed. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(output))
}
