//! Role lookups against the external identity provider.
//!
//! The provider keeps a private metadata blob on each user record. The user's role lives at
//! `private_metadata.role`; any user without one is treated as having no role at all.
use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use showtime_common::Secret;
use thiserror::Error;

use crate::events::http_timeout_from_env;

const DEFAULT_IDENTITY_API_URL: &str = "https://api.clerk.com";

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Could not initialize the identity client: {0}")]
    Initialization(String),
    #[error("Could not reach the identity provider: {0}")]
    RequestFailed(String),
    #[error("User {0} does not exist")]
    UnknownUser(String),
    #[error("The identity provider returned an error. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Malformed user record: {0}")]
    MalformedRecord(String),
}

#[allow(async_fn_in_trait)]
pub trait IdentityLookup {
    /// Fetch the role recorded for `user_id`. `Ok(None)` means the user exists but has no role.
    async fn fetch_user_role(&self, user_id: &str) -> Result<Option<String>, IdentityError>;
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_IDENTITY_API_URL.to_string(),
            secret_key: Secret::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl IdentityConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = std::env::var("SHOWTIME_IDENTITY_API_URL").unwrap_or_else(|_| {
            info!("🪪️ SHOWTIME_IDENTITY_API_URL is not set. Using {DEFAULT_IDENTITY_API_URL}");
            DEFAULT_IDENTITY_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("SHOWTIME_IDENTITY_SECRET_KEY").unwrap_or_default());
        if secret_key.is_unset() {
            error!(
                "🪪️ SHOWTIME_IDENTITY_SECRET_KEY is not set. Role lookups will fail, so nobody will be able to use the \
                 admin routes."
            );
        }
        let timeout = http_timeout_from_env();
        Self { api_url, secret_key, timeout }
    }
}

#[derive(Deserialize)]
struct UserRecord {
    #[serde(default)]
    private_metadata: Value,
}

/// HTTP client for the identity provider's user API.
#[derive(Clone)]
pub struct IdentityClient {
    config: IdentityConfig,
    client: Arc<Client>,
}

impl IdentityClient {
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdentityError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// `{api_url}/v1/users/{user_id}`, with the id percent-encoded as a single path segment.
    pub fn user_url(&self, user_id: &str) -> Result<Url, IdentityError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| IdentityError::Initialization(format!("{} is not a valid URL. {e}", self.config.api_url)))?;
        url.path_segments_mut()
            .map_err(|_| IdentityError::Initialization(format!("{} cannot be a base URL", self.config.api_url)))?
            .pop_if_empty()
            .extend(["v1", "users", user_id]);
        Ok(url)
    }
}

impl IdentityLookup for IdentityClient {
    async fn fetch_user_role(&self, user_id: &str) -> Result<Option<String>, IdentityError> {
        let url = self.user_url(user_id)?;
        trace!("🪪️ Fetching user record: {url}");
        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.secret_key.reveal())
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;
        match response.status() {
            s if s.is_success() => {},
            StatusCode::NOT_FOUND => return Err(IdentityError::UnknownUser(user_id.to_string())),
            s => {
                let message = response.text().await.unwrap_or_default();
                return Err(IdentityError::QueryError { status: s.as_u16(), message });
            },
        }
        let record =
            response.json::<UserRecord>().await.map_err(|e| IdentityError::MalformedRecord(e.to_string()))?;
        match &record.private_metadata["role"] {
            Value::Null => Ok(None),
            Value::String(role) => Ok(Some(role.clone())),
            other => Err(IdentityError::MalformedRecord(format!("role is not a string: {other}"))),
        }
    }
}
