use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use showtime_common::Secret;
use thiserror::Error;

use crate::events::DomainEvent;

const DEFAULT_EVENT_BUS_URL: &str = "https://inn.gs";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Error)]
pub enum EventBusError {
    #[error("Could not initialize the event bus client: {0}")]
    Initialization(String),
    #[error("Could not reach the event bus: {0}")]
    RequestFailed(String),
    #[error("The event bus rejected the event. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

/// Fire-and-forget emission of domain events. Delivery and retries are the bus's responsibility; an `Ok` result only
/// means the bus accepted the event.
#[allow(async_fn_in_trait)]
pub trait EventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
}

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    pub url: String,
    pub event_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EVENT_BUS_URL.to_string(),
            event_key: Secret::default(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl EventBusConfig {
    pub fn from_env_or_default() -> Self {
        let url = std::env::var("SHOWTIME_EVENT_BUS_URL").unwrap_or_else(|_| {
            info!("📬️ SHOWTIME_EVENT_BUS_URL is not set. Using {DEFAULT_EVENT_BUS_URL}");
            DEFAULT_EVENT_BUS_URL.to_string()
        });
        let event_key = Secret::new(std::env::var("SHOWTIME_EVENT_KEY").unwrap_or_default());
        if event_key.is_unset() {
            warn!("📬️ SHOWTIME_EVENT_KEY is not set. The event bus will reject every event we send it.");
        }
        let timeout = http_timeout_from_env();
        Self { url, event_key, timeout }
    }
}

/// Reads `SHOWTIME_HTTP_TIMEOUT` (seconds), which applies to every outbound HTTP client.
pub fn http_timeout_from_env() -> Duration {
    std::env::var("SHOWTIME_HTTP_TIMEOUT")
        .ok()
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| warn!("🪛️ Invalid SHOWTIME_HTTP_TIMEOUT, {s}: {e}. Using the default."))
                .ok()
        })
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT)
}

/// Sends events to the bus's HTTP ingestion endpoint, `POST {url}/e/{event_key}`.
#[derive(Clone)]
pub struct EventBusClient {
    config: EventBusConfig,
    client: Arc<Client>,
}

impl EventBusClient {
    pub fn new(config: EventBusConfig) -> Result<Self, EventBusError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EventBusError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self) -> String {
        format!("{}/e/{}", self.config.url.trim_end_matches('/'), self.config.event_key.reveal())
    }
}

impl EventPublisher for EventBusClient {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        trace!("📬️ Publishing {event}");
        let response = self
            .client
            .post(self.url())
            .json(&event)
            .send()
            .await
            .map_err(|e| EventBusError::RequestFailed(e.to_string()))?;
        if response.status().is_success() {
            debug!("📬️ Event {} accepted by the bus", event.name);
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(EventBusError::Rejected { status, message })
        }
    }
}
