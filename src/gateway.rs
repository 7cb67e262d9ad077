//! The request dispatcher: the single entry point for gateway traffic.
//!
//! [`Gateway::handle`] takes the serverless JSON envelope and always
//! returns a JSON body — failures become `{"success": false, "error"}`
//! rather than crossing the boundary as errors. Each call is independent
//! and holds no state between requests; dropping the returned future
//! (caller disconnect) aborts any in-flight backend attempt.
//!
//! Note: the `generate_token` action is deliberately unauthenticated,
//! matching the deployment this gateway fronts. Anyone who can reach the
//! endpoint can mint a token. See DESIGN.md before hardening.

use std::time::{Duration, Instant};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngExt;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::auth::{Claims, TokenService};
use crate::config::GatewayConfig;
use crate::consts::{
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_MS, MAX_BACKOFF,
    MAX_JITTER_MS,
};
use crate::engine::{EngineError, SpeechEngine, SynthesisJob, SynthesizedAudio};
use crate::error::GatewayError;
use crate::health;
use crate::registry::EngineRegistry;

/// Dispatch knobs, split out from [`GatewayConfig`] so tests can tune
/// them directly.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub auth_enabled: bool,
    /// Per-attempt budget for one backend call. A timed-out attempt
    /// counts as a transient failure.
    pub request_timeout: Duration,
    /// Total backend attempts per request (first try included).
    pub max_retries: u32,
    /// Base delay of the exponential backoff between attempts.
    pub retry_backoff: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            auth_enabled: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

pub struct Gateway {
    registry: EngineRegistry,
    tokens: Option<TokenService>,
    config: DispatchConfig,
}

impl Gateway {
    pub fn new(
        registry: EngineRegistry,
        tokens: Option<TokenService>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            tokens,
            config,
        }
    }

    /// Wire a gateway from startup configuration. `GatewayConfig` has
    /// already enforced that auth-enabled implies a secret.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let tokens = config
            .signing_secret
            .as_deref()
            .map(|secret| TokenService::new(secret, config.algorithm, config.expiration_hours));
        Self {
            registry: EngineRegistry::from_config(config),
            tokens,
            config: DispatchConfig {
                auth_enabled: config.auth_enabled,
                request_timeout: config.request_timeout,
                max_retries: config.max_retries,
                retry_backoff: config.retry_backoff,
            },
        }
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Handle one envelope. Total: never panics, never errors across the
    /// boundary.
    pub async fn handle(&self, envelope: Value) -> Value {
        let input = match envelope.get("input") {
            Some(v) if v.is_object() => v,
            _ => {
                return self.error_envelope(&GatewayError::BadRequest(
                    "missing input object".to_string(),
                ));
            }
        };

        let result = match input.get("action").and_then(Value::as_str) {
            Some("health") => self.health(),
            Some("generate_token") => self.generate_token(input),
            Some("list_engines") => self.list_engines(input),
            Some(other) => Err(GatewayError::BadRequest(format!("unknown action: {other}"))),
            None => self.synthesize(input).await,
        };

        match result {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "request failed");
                self.error_envelope(&err)
            }
        }
    }

    fn health(&self) -> Result<Value, GatewayError> {
        serde_json::to_value(health::report(self.config.auth_enabled, &self.registry))
            .map_err(|e| GatewayError::InternalError(e.to_string()))
    }

    /// Mint a token for the caller-supplied identity. Unauthenticated on
    /// purpose — see the module docs.
    fn generate_token(&self, input: &Value) -> Result<Value, GatewayError> {
        let tokens = self.tokens.as_ref().ok_or_else(|| {
            GatewayError::InternalError("signing secret not configured".to_string())
        })?;

        let user_id = input
            .get("user_id")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidInput("user_id is required".to_string()))?;

        let user_data = input.get("user_data");
        let role = user_data
            .and_then(|d| d.get("role"))
            .and_then(Value::as_str)
            .unwrap_or("user");
        let permissions = user_data
            .and_then(|d| d.get("permissions"))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let issued = tokens.issue(user_id, role, permissions, None)?;
        info!(user_id = %issued.user_id, role = %issued.role, "token issued");

        Ok(json!({
            "success": true,
            "token": issued.token,
            "user_id": issued.user_id,
            "expires_in_hours": issued.expires_in_hours,
        }))
    }

    fn list_engines(&self, input: &Value) -> Result<Value, GatewayError> {
        self.authenticate(input)?;
        let descriptors = self.registry.descriptors();
        Ok(json!({
            "success": true,
            "engines": serde_json::to_value(&descriptors)
                .map_err(|e| GatewayError::InternalError(e.to_string()))?,
            "total": descriptors.len(),
        }))
    }

    async fn synthesize(&self, input: &Value) -> Result<Value, GatewayError> {
        let started = Instant::now();

        let text = input
            .get("text")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if text.is_empty() {
            return Err(GatewayError::BadRequest("no text provided".to_string()));
        }
        let engine_name = input
            .get("engine")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::BadRequest("no engine specified".to_string()))?;

        // Auth and resolution both short-circuit before any backend call.
        let claims = self.authenticate(input)?;
        let engine = self.registry.resolve(engine_name)?;

        let job = SynthesisJob {
            text: text.to_string(),
            voice: input
                .get("voice")
                .and_then(Value::as_str)
                .map(String::from),
            speed: input.get("speed").and_then(Value::as_f64),
            language: input
                .get("language")
                .and_then(Value::as_str)
                .map(String::from),
            format: input
                .get("format")
                .and_then(Value::as_str)
                .map(String::from),
        };

        let audio = self
            .call_with_retry(engine_name, engine.backend.as_ref(), &job)
            .await?;

        let elapsed = started.elapsed();
        info!(
            engine = engine_name,
            user_id = claims.as_ref().map(|c| c.user_id.as_str()),
            bytes = audio.audio.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "synthesis complete"
        );

        Ok(json!({
            "success": true,
            "payload": BASE64.encode(&audio.audio),
            "audio_format": audio.format,
            "engine": engine_name,
            "user_id": claims.map(|c| c.user_id),
            "processing_time": elapsed.as_secs_f64(),
        }))
    }

    /// Enforce the deployment's auth mode. Returns the validated claims
    /// when auth is on, `None` when it is off.
    fn authenticate(&self, input: &Value) -> Result<Option<Claims>, GatewayError> {
        if !self.config.auth_enabled {
            return Ok(None);
        }
        let tokens = self.tokens.as_ref().ok_or_else(|| {
            GatewayError::InternalError("signing secret not configured".to_string())
        })?;
        let raw = input
            .get("jwt_token")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Unauthenticated("missing jwt_token".to_string()))?;
        tokens.validate(raw).map(Some)
    }

    /// One backend call under a per-attempt timeout, with bounded retry
    /// on transient failures. Permanent failures return immediately.
    async fn call_with_retry(
        &self,
        name: &str,
        backend: &dyn SpeechEngine,
        job: &SynthesisJob,
    ) -> Result<SynthesizedAudio, GatewayError> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.backoff_delay(attempt);
                debug!(engine = name, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(self.config.request_timeout, backend.synthesize(job)).await
            {
                Ok(Ok(audio)) => return Ok(audio),
                Ok(Err(EngineError::Permanent(msg))) => {
                    return Err(GatewayError::BackendUnavailable(msg));
                }
                Ok(Err(EngineError::Transient(msg))) => {
                    warn!(engine = name, attempt, error = %msg, "transient backend failure");
                    last_error = msg;
                }
                Err(_) => {
                    let secs = self.config.request_timeout.as_secs_f64();
                    warn!(engine = name, attempt, "backend call timed out after {secs}s");
                    last_error = format!("timed out after {secs}s");
                }
            }
        }

        Err(GatewayError::BackendUnavailable(last_error))
    }

    /// Exponential doubling from the configured base, capped, plus a
    /// little uniform jitter so synchronized clients don't stampede.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(2).min(5);
        let base = self
            .config
            .retry_backoff
            .saturating_mul(1 << doublings)
            .min(MAX_BACKOFF);
        base + Duration::from_millis(rand::rng().random_range(0..=MAX_JITTER_MS))
    }

    fn error_envelope(&self, err: &GatewayError) -> Value {
        let mut body = json!({
            "success": false,
            "error": err.to_string(),
        });
        if matches!(err, GatewayError::UnknownEngine(_)) {
            body["available_engines"] = json!(self.registry.names());
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_with_backoff(base_ms: u64) -> Gateway {
        Gateway::new(
            EngineRegistry::new(),
            None,
            DispatchConfig {
                auth_enabled: false,
                retry_backoff: Duration::from_millis(base_ms),
                ..DispatchConfig::default()
            },
        )
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let gateway = gateway_with_backoff(500);
        let jitter = Duration::from_millis(MAX_JITTER_MS);

        let second = gateway.backoff_delay(2);
        assert!(second >= Duration::from_millis(500));
        assert!(second <= Duration::from_millis(500) + jitter);

        let third = gateway.backoff_delay(3);
        assert!(third >= Duration::from_millis(1000));
        assert!(third <= Duration::from_millis(1000) + jitter);

        // Far attempts stay under the cap (plus jitter).
        let late = gateway.backoff_delay(40);
        assert!(late <= MAX_BACKOFF + jitter);
    }

    #[test]
    fn error_envelope_lists_engines_for_unknown_engine() {
        let gateway = gateway_with_backoff(1);
        let body = gateway.error_envelope(&GatewayError::UnknownEngine("nope".to_string()));
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("nope"));
        assert!(body["available_engines"].is_array());
    }

    #[test]
    fn error_envelope_plain_for_other_errors() {
        let gateway = gateway_with_backoff(1);
        let body = gateway.error_envelope(&GatewayError::BadRequest("no text".to_string()));
        assert_eq!(body["success"], false);
        assert!(body.get("available_engines").is_none());
    }
}
