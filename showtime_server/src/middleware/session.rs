//! Session middleware.
//!
//! Resolves the user behind a request from a session token issued by the identity provider. The token is read from
//! the `Authorization: Bearer <jwt>` header, or failing that, the `__session` cookie. If it verifies, the `sub` claim
//! is stored in the request extensions as a [`Principal`].
//!
//! This middleware never rejects a request. A missing, expired or forged token just means there is no principal, and
//! it is up to guards further down the chain to decide what that means.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use showtime_engine::db_types::Principal;

use crate::{config::SessionConfig, errors::ServerError};

pub const SESSION_COOKIE: &str = "__session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn rs256(public_key_pem: &str) -> Result<Self, ServerError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid session public key. {e}")))?;
        Ok(Self { key, validation: Validation::new(Algorithm::RS256) })
    }

    pub fn hs256(secret: &str) -> Self {
        Self { key: DecodingKey::from_secret(secret.as_bytes()), validation: Validation::new(Algorithm::HS256) }
    }

    /// Builds a verifier from the configuration. Returns `None` if no keys are configured.
    pub fn from_config(config: &SessionConfig) -> Result<Option<Self>, ServerError> {
        match (&config.public_key_pem, &config.secret) {
            (Some(pem), _) => Self::rs256(pem).map(Some),
            (None, Some(secret)) => Ok(Some(Self::hs256(secret.reveal()))),
            (None, None) => Ok(None),
        }
    }

    pub fn verify(&self, token: &str) -> Option<Principal> {
        match decode::<SessionClaims>(token, &self.key, &self.validation) {
            Ok(data) => Some(Principal::new(data.claims.sub)),
            Err(e) => {
                debug!("🎟️ Ignoring session token. {e}");
                None
            },
        }
    }
}

fn session_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    bearer.or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

pub struct SessionMiddlewareFactory {
    verifier: Option<SessionVerifier>,
}

impl SessionMiddlewareFactory {
    pub fn new(verifier: Option<SessionVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SessionMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService { verifier: self.verifier.clone().map(Rc::new), service: Rc::new(service) }))
    }
}

pub struct SessionMiddlewareService<S> {
    verifier: Option<Rc<SessionVerifier>>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let principal = match (&self.verifier, session_token(&req)) {
            (Some(verifier), Some(token)) => verifier.verify(&token),
            (None, Some(_)) => {
                trace!("🎟️ A session token was supplied, but session verification is not configured");
                None
            },
            (_, None) => None,
        };
        if let Some(principal) = principal {
            trace!("🎟️ Request from {principal}");
            req.extensions_mut().insert(principal);
        }
        let service = Rc::clone(&self.service);
        Box::pin(async move { service.call(req).await })
    }
}
