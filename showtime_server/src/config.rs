use std::{env, time::Duration};

use log::*;
use showtime_common::Secret;
use showtime_engine::{EventBusConfig, IdentityConfig};

const DEFAULT_SHOWTIME_HOST: &str = "127.0.0.1";
const DEFAULT_SHOWTIME_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/showtime.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub stripe: StripeConfig,
    pub event_bus: EventBusConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    /// Key used to verify requests from the event bus to the job dispatcher. When `None`, requests are not checked.
    pub job_signing_key: Option<Secret<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SHOWTIME_HOST.to_string(),
            port: DEFAULT_SHOWTIME_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            stripe: StripeConfig::default(),
            event_bus: EventBusConfig::default(),
            identity: IdentityConfig::default(),
            session: SessionConfig::default(),
            job_signing_key: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("SHOWTIME_HOST").ok().unwrap_or_else(|| DEFAULT_SHOWTIME_HOST.into());
        let port = env::var("SHOWTIME_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SHOWTIME_PORT. {e} Using the default, {DEFAULT_SHOWTIME_PORT}, \
                         instead."
                    );
                    DEFAULT_SHOWTIME_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SHOWTIME_PORT);
        let database_url = env::var("SHOWTIME_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ SHOWTIME_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env::var("SHOWTIME_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SHOWTIME_DB_MAX_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        let stripe = StripeConfig::from_env_or_default();
        let event_bus = EventBusConfig::from_env_or_default();
        let identity = IdentityConfig::from_env_or_default();
        let session = SessionConfig::from_env();
        let job_signing_key = env::var("SHOWTIME_JOB_SIGNING_KEY").ok().filter(|s| !s.trim().is_empty()).map(Secret::new);
        if job_signing_key.is_none() {
            warn!(
                "🚨️ SHOWTIME_JOB_SIGNING_KEY is not set. Requests to /api/inngest will NOT be verified. Do not run \
                 production like this."
            );
        }
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            stripe,
            event_bus,
            identity,
            session,
            job_signing_key,
        }
    }
}

//-------------------------------------------------  StripeConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// The payment provider API key. The webhook path does not use it. A missing key is reported at start-up.
    pub secret_key: Secret<String>,
    /// The signing secret for the webhook endpoint (`whsec_...`).
    pub webhook_secret: Secret<String>,
    /// How far a webhook's timestamp may be from our clock. Zero disables the check.
    pub tolerance: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self { secret_key: Secret::default(), webhook_secret: Secret::default(), tolerance: DEFAULT_WEBHOOK_TOLERANCE }
    }
}

impl StripeConfig {
    pub fn from_env_or_default() -> Self {
        let secret_key = Secret::new(env::var("SHOWTIME_STRIPE_SECRET_KEY").unwrap_or_default());
        let webhook_secret = Secret::new(env::var("SHOWTIME_STRIPE_WEBHOOK_SECRET").unwrap_or_default());
        let tolerance = env::var("SHOWTIME_STRIPE_WEBHOOK_TOLERANCE")
            .map_err(|_| {
                debug!(
                    "🪛️ SHOWTIME_STRIPE_WEBHOOK_TOLERANCE is not set. Using the default value of {}s.",
                    DEFAULT_WEBHOOK_TOLERANCE.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SHOWTIME_STRIPE_WEBHOOK_TOLERANCE. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE);
        if tolerance.is_zero() {
            warn!("🚨️ Webhook timestamp checks are disabled. Replayed webhooks will be accepted.");
        }
        let config = Self { secret_key, webhook_secret, tolerance };
        for var in config.unset_secrets() {
            error!("🪛️ {var} is not set. Payment webhooks cannot be processed until it is.");
        }
        config
    }

    /// The environment variables whose secrets are missing or blank.
    pub fn unset_secrets(&self) -> Vec<&'static str> {
        let mut unset = Vec::new();
        if self.secret_key.is_unset() {
            unset.push("SHOWTIME_STRIPE_SECRET_KEY");
        }
        if self.webhook_secret.is_unset() {
            unset.push("SHOWTIME_STRIPE_WEBHOOK_SECRET");
        }
        unset
    }
}

//-------------------------------------------------  SessionConfig  ----------------------------------------------------
/// Keys for verifying session tokens issued by the identity provider. If a PEM public key is given, tokens are
/// verified with RS256; otherwise, if a shared secret is given, with HS256. With neither, every request is anonymous.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    pub public_key_pem: Option<String>,
    pub secret: Option<Secret<String>>,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        // Allow single-line PEMs in .env files
        let public_key_pem =
            env::var("SHOWTIME_SESSION_PUBLIC_KEY").ok().filter(|s| !s.trim().is_empty()).map(|s| s.replace("\\n", "\n"));
        let secret = env::var("SHOWTIME_SESSION_SECRET").ok().filter(|s| !s.trim().is_empty()).map(Secret::new);
        match (&public_key_pem, &secret) {
            (Some(_), _) => info!("🪛️ Session tokens will be verified with the RS256 public key"),
            (None, Some(_)) => info!("🪛️ Session tokens will be verified with the HS256 shared secret"),
            (None, None) => warn!(
                "🪛️ Neither SHOWTIME_SESSION_PUBLIC_KEY nor SHOWTIME_SESSION_SECRET is set. All requests will be \
                 treated as anonymous, and the admin routes will refuse everyone."
            ),
        }
        Self { public_key_pem, secret }
    }
}
