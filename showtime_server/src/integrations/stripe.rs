//! Stripe webhook verification and the few event shapes we care about.
//!
//! Stripe signs each webhook delivery and puts the result in the `Stripe-Signature` header:
//!
//! ```text
//! Stripe-Signature: t=1492774577,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd[,v1=...]
//! ```
//!
//! `v1` is `hex(HMAC-SHA256(webhook_secret, "{t}.{raw body}"))`. There may be several `v1` entries while a secret is
//! being rolled; any one of them matching is enough. Entries with other schemes (e.g. `v0`) are ignored.
use std::{collections::HashMap, time::Duration};

use chrono::Utc;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use showtime_engine::db_types::BookingId;
use thiserror::Error;

use crate::helpers::{calculate_hmac, verify_hmac};

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
const SIGNATURE_SCHEME: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookSignatureError {
    #[error("No stripe-signature header value was provided.")]
    MissingHeader,
    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,
    #[error("No signatures found with expected scheme")]
    NoSignatures,
    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance,
    #[error("No signatures found matching the expected signature for payload")]
    NoMatchingSignature,
    #[error("Webhook payload is not a valid event. {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutMetadataError {
    #[error("The event object is not a checkout session. {0}")]
    MalformedSession(String),
    #[error("The checkout session has no bookingId in its metadata")]
    MissingBookingId,
    #[error("The checkout session's bookingId is invalid. {0}")]
    InvalidBookingId(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

impl CheckoutSession {
    pub fn booking_id(&self) -> Result<BookingId, CheckoutMetadataError> {
        let raw = self
            .metadata
            .as_ref()
            .and_then(|m| m.get("bookingId"))
            .ok_or(CheckoutMetadataError::MissingBookingId)?;
        raw.parse::<BookingId>().map_err(|e| CheckoutMetadataError::InvalidBookingId(e.to_string()))
    }
}

/// Pull the booking id out of a `checkout.session.completed` event's `data.object`.
pub fn booking_id_from_checkout_session(object: &Value) -> Result<BookingId, CheckoutMetadataError> {
    let session = serde_json::from_value::<CheckoutSession>(object.clone())
        .map_err(|e| CheckoutMetadataError::MalformedSession(e.to_string()))?;
    trace!("💳️ Checkout session {} ({:?})", session.id, session.payment_status);
    session.booking_id()
}

/// Verify the signature of a webhook delivery and parse its body, using the current time for the tolerance check.
pub fn construct_event(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &str,
    tolerance: Duration,
) -> Result<StripeEvent, WebhookSignatureError> {
    construct_event_at(payload, signature_header, secret, tolerance, Utc::now().timestamp())
}

pub fn construct_event_at(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<StripeEvent, WebhookSignatureError> {
    let header = signature_header.map(str::trim).filter(|h| !h.is_empty()).ok_or(WebhookSignatureError::MissingHeader)?;
    verify_signature(payload, header, secret, tolerance, now)?;
    serde_json::from_slice::<StripeEvent>(payload).map_err(|e| WebhookSignatureError::InvalidPayload(e.to_string()))
}

struct SignatureHeader<'a> {
    raw_timestamp: &'a str,
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader<'_>, WebhookSignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for item in header.split(',') {
        let Some((key, value)) = item.split_once('=') else {
            continue;
        };
        match key.trim() {
            "t" => timestamp = Some(value.trim()),
            SIGNATURE_SCHEME => signatures.push(value.trim()),
            _ => {},
        }
    }
    let raw_timestamp = timestamp.ok_or(WebhookSignatureError::MalformedHeader)?;
    let timestamp = raw_timestamp.parse::<i64>().map_err(|_| WebhookSignatureError::MalformedHeader)?;
    Ok(SignatureHeader { raw_timestamp, timestamp, signatures })
}

fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<(), WebhookSignatureError> {
    let header = parse_signature_header(header)?;
    if header.signatures.is_empty() {
        return Err(WebhookSignatureError::NoSignatures);
    }
    let signed: [&[u8]; 3] = [header.raw_timestamp.as_bytes(), b".", payload];
    if !header.signatures.iter().any(|sig| verify_hmac(secret, &signed, sig)) {
        return Err(WebhookSignatureError::NoMatchingSignature);
    }
    if tolerance.is_zero() {
        return Ok(());
    }
    let max_age = i64::try_from(tolerance.as_secs()).unwrap_or(i64::MAX);
    // Only signatures from the past can be too old. An age that overflows is either far past or far future.
    let too_old = now.checked_sub(header.timestamp).map(|age| age > max_age).unwrap_or(header.timestamp < now);
    if too_old {
        debug!("💳️ Webhook signature at {} is older than {max_age}s", header.timestamp);
        return Err(WebhookSignatureError::TimestampOutsideTolerance);
    }
    Ok(())
}

/// Build a valid `Stripe-Signature` header value for `payload`. Useful for tests and local tooling.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let t = timestamp.to_string();
    let signature = calculate_hmac(secret, &[t.as_bytes(), b".", payload]).unwrap_or_default();
    format!("t={t},{SIGNATURE_SCHEME}={signature}")
}
