//! Makes sure the booking store is connected before a request reaches its handler.
//!
//! The store of type `S` must be registered as `web::Data<S>`. If the connection cannot be opened, the request is
//! answered with a `500` and a JSON error body, and the wrapped service is never called.
use std::{
    future::{ready, Ready},
    marker::PhantomData,
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;
use showtime_engine::traits::StoreConnection;

use crate::errors::ServerError;

pub struct StoreConnectionFactory<T> {
    _store: PhantomData<fn() -> T>,
}

impl<T> StoreConnectionFactory<T> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { _store: PhantomData }
    }
}

impl<S, B, T> Transform<S, ServiceRequest> for StoreConnectionFactory<T>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    T: StoreConnection + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = StoreConnectionService<S, T>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StoreConnectionService { service: Rc::new(service), _store: PhantomData }))
    }
}

pub struct StoreConnectionService<S, T> {
    service: Rc<S>,
    _store: PhantomData<fn() -> T>,
}

impl<S, B, T> Service<ServiceRequest> for StoreConnectionService<S, T>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    T: StoreConnection + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let store = req.app_data::<web::Data<T>>().cloned().ok_or_else(|| {
                error!("🗃️ The store connection check is installed, but no store is registered. Check the server set-up.");
                ServerError::ConfigurationError("The booking store is not configured".into())
            })?;
            store.ensure_connected().await.map_err(|e| {
                warn!("🗃️ Refusing {} {}. {e}", req.method(), req.path());
                ServerError::from(e)
            })?;
            service.call(req).await
        })
    }
}
