//! Process configuration, read from the environment once at startup.
//!
//! Everything here is immutable for the process lifetime. The one hard
//! rule: if token auth is enabled there must be a signing secret, or the
//! process refuses to start. Running without a secret *and* without auth
//! is the explicitly-insecure development mode.

use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::consts::{
    DEFAULT_EXPIRATION_HOURS, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_BACKOFF_MS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT auth is enabled but JWT_SECRET_KEY is not set")]
    MissingSecret,

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("unsupported JWT algorithm: {0} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}

/// One backend engine endpoint taken from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEndpoint {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// HMAC signing secret. `None` only in the insecure no-auth mode.
    pub signing_secret: Option<String>,
    pub algorithm: Algorithm,
    pub expiration_hours: i64,
    pub auth_enabled: bool,
    /// Per-attempt budget for one backend call.
    pub request_timeout: Duration,
    /// Total backend attempts per request (first try included).
    pub max_retries: u32,
    /// Base delay of the exponential backoff between attempts.
    pub retry_backoff: Duration,
    /// Bearer key attached to outbound backend calls, if any.
    pub backend_api_key: Option<String>,
    pub engines: Vec<EngineEndpoint>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            algorithm: Algorithm::HS256,
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
            auth_enabled: false,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            backend_api_key: None,
            engines: Vec::new(),
        }
    }
}

/// Engine names whose `<NAME>_ENDPOINT` variable is consulted at startup.
/// An unset endpoint means the engine is simply not registered.
const KNOWN_ENGINES: &[(&str, &str)] = &[
    ("kokkoro", "KOKKORO_ENDPOINT"),
    ("chatterbox", "CHATTERBOX_ENDPOINT"),
];

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is the thin
    /// wrapper over process environment; tests pass a map instead.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let auth_enabled = match get("JWT_AUTH_ENABLED") {
            Some(raw) => parse_bool("JWT_AUTH_ENABLED", &raw)?,
            None => true,
        };

        let signing_secret = get("JWT_SECRET_KEY");
        if auth_enabled && signing_secret.is_none() {
            return Err(ConfigError::MissingSecret);
        }

        let algorithm = match get("JWT_ALGORITHM").as_deref() {
            None | Some("HS256") => Algorithm::HS256,
            Some("HS384") => Algorithm::HS384,
            Some("HS512") => Algorithm::HS512,
            Some(other) => return Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
        };

        let engines = KNOWN_ENGINES
            .iter()
            .filter_map(|(name, var)| {
                get(var).map(|url| EngineEndpoint {
                    name: name.to_string(),
                    url,
                })
            })
            .collect();

        Ok(Self {
            signing_secret,
            algorithm,
            expiration_hours: parse_num(&get, "JWT_EXPIRATION_HOURS", DEFAULT_EXPIRATION_HOURS)?,
            auth_enabled,
            request_timeout: Duration::from_secs(parse_num(
                &get,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            max_retries: parse_num(&get, "MAX_RETRIES", DEFAULT_MAX_RETRIES)?.max(1),
            retry_backoff: Duration::from_millis(parse_num(
                &get,
                "RETRY_BACKOFF_MS",
                DEFAULT_RETRY_BACKOFF_MS,
            )?),
            backend_api_key: get("BACKEND_API_KEY"),
            engines,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
        }),
    }
}

fn parse_num<T: std::str::FromStr>(
    get: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}
