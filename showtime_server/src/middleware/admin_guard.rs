//! Admin guard middleware.
//!
//! Wrap any route or scope with [`AdminGuardFactory`] to restrict it to users holding the `admin` role. The principal
//! must already have been resolved by the session middleware, and an [`AccessApi`] must be registered as app data.
//!
//! Refusals do NOT use an HTTP error status. The front end expects a `200` with
//! `{"success": false, "message": "Not Authorized"}`, whether the user lacks the role, is anonymous, or the identity
//! provider could not be reached.
use std::{
    future::{ready, Ready},
    marker::PhantomData,
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    web,
    Error,
    HttpMessage,
    HttpResponse,
};
use futures::future::LocalBoxFuture;
use log::*;
use showtime_engine::{db_types::Principal, AccessApi, AccessDecision, IdentityLookup};

use crate::data_objects::JsonResponse;

pub const NOT_AUTHORIZED: &str = "Not Authorized";

pub struct AdminGuardFactory<I> {
    _identity: PhantomData<fn() -> I>,
}

impl<I> AdminGuardFactory<I> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { _identity: PhantomData }
    }
}

impl<S, B, I> Transform<S, ServiceRequest> for AdminGuardFactory<I>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    I: IdentityLookup + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = AdminGuardService<S, I>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminGuardService { service: Rc::new(service), _identity: PhantomData }))
    }
}

pub struct AdminGuardService<S, I> {
    service: Rc<S>,
    _identity: PhantomData<fn() -> I>,
}

impl<S, B, I> Service<ServiceRequest> for AdminGuardService<S, I>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    I: IdentityLookup + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let api = req.app_data::<web::Data<AccessApi<I>>>().cloned().ok_or_else(|| {
                error!("🔐️ The admin guard is installed, but no AccessApi is registered. Check the server set-up.");
                ErrorInternalServerError("Access control is not configured")
            })?;
            let principal = req.extensions().get::<Principal>().cloned();
            let decision = api.check_admin(principal.as_ref()).await;
            match decision {
                AccessDecision::Authorized => {
                    trace!("🔐️ Admin access granted to {}", req.path());
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                },
                AccessDecision::Denied(reason) => {
                    debug!("🔐️ Admin access to {} refused. {reason}", req.path());
                    Ok(not_authorized(req))
                },
                AccessDecision::LookupFailed(e) => {
                    warn!("🔐️ Admin access to {} refused. The role lookup failed. {e}", req.path());
                    Ok(not_authorized(req))
                },
            }
        })
    }
}

fn not_authorized<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
    let response = HttpResponse::Ok().json(JsonResponse::failure(NOT_AUTHORIZED));
    req.into_response(response).map_into_right_body()
}
