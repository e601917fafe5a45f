//! Signature checks for calls from the event bus to the job dispatcher.
//!
//! The bus signs each request body with the shared signing key and sends the result in a header:
//!
//! ```text
//! X-Inngest-Signature: t=<unix seconds>&s=<hex(HMAC-SHA256(key, body ++ t))>
//! ```
//!
//! Signing keys are usually handed out as `signkey-<env>-<key>`. Only the `<key>` part is used for the HMAC.
//!
//! The key is read from the [`JobSigningKey`] app data. If it holds no key, every request is let through.
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Duration,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use log::*;
use showtime_common::Secret;

use crate::{
    errors::ServerError,
    helpers::{calculate_hmac, verify_hmac},
};

pub const JOB_SIGNATURE_HEADER: &str = "X-Inngest-Signature";
const MAX_SIGNATURE_AGE: Duration = Duration::from_secs(300);

fn signing_key(key: &str) -> &str {
    key.strip_prefix("signkey-").and_then(|rest| rest.split_once('-')).map(|(_, k)| k).unwrap_or(key)
}

/// Produce the header value the bus would send for `body` at `timestamp`.
pub fn sign_job_request(key: &str, body: &[u8], timestamp: i64) -> String {
    let t = timestamp.to_string();
    let s = calculate_hmac(signing_key(key), &[body, t.as_bytes()]).unwrap_or_default();
    format!("t={t}&s={s}")
}

fn check_signature(key: &str, body: &[u8], header: &str, now: i64) -> Result<(), String> {
    let mut timestamp = None;
    let mut signature = None;
    for pair in header.split('&') {
        match pair.split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("s", v)) => signature = Some(v),
            _ => {},
        }
    }
    let (Some(t), Some(s)) = (timestamp, signature) else {
        return Err("The signature header is malformed".into());
    };
    let ts = t.parse::<i64>().map_err(|_| "The signature timestamp is not a number".to_string())?;
    if now.abs_diff(ts) > MAX_SIGNATURE_AGE.as_secs() {
        return Err("The signature has expired".into());
    }
    if verify_hmac(signing_key(key), &[body, t.as_bytes()], s) {
        Ok(())
    } else {
        Err("The signature does not match".into())
    }
}

/// The dispatcher's signing key, registered as app data.
#[derive(Debug, Clone, Default)]
pub struct JobSigningKey(pub Option<Secret<String>>);

pub struct JobSignatureFactory;

impl JobSignatureFactory {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JobSignatureFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JobSignatureService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JobSignatureService { service: Rc::new(service) }))
    }
}

pub struct JobSignatureService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JobSignatureService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let key = req
                .app_data::<web::Data<JobSigningKey>>()
                .ok_or_else(|| {
                    error!("🔐️ The job signature check is installed, but no JobSigningKey is registered.");
                    ServerError::ConfigurationError("Job signing is not configured".into())
                })?
                .0
                .as_ref()
                .map(|k| k.reveal().clone());
            let Some(key) = key else {
                trace!("🔐️ Job signature checks are disabled. Allowing request.");
                return service.call(req).await;
            };
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract job request body: {e:?}");
                ServerError::InvalidRequestBody(e.to_string())
            })?;
            let header = req
                .headers()
                .get(JOB_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    warn!("🔐️ No job signature found in request. Denying access.");
                    ServerError::InvalidSignature(format!("{JOB_SIGNATURE_HEADER} is missing"))
                })?
                .to_string();
            match check_signature(&key, data.as_ref(), &header, Utc::now().timestamp()) {
                Ok(()) => {
                    trace!("🔐️ Job signature check ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(reason) => {
                    warn!("🔐️ Invalid job signature. {reason}. Denying access.");
                    Err(ServerError::InvalidSignature(reason).into())
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
