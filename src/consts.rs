//! Project-wide constants.

use std::time::Duration;

/// Version reported by the health action.
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Issuer claim stamped into every token we sign.
pub const TOKEN_ISSUER: &str = "tts-gateway";

/// Default token lifetime when the caller does not ask for one.
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Default per-attempt budget for a backend synthesis call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default number of backend attempts per request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between backend attempts.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Ceiling for the exponential backoff curve.
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Upper bound of the uniform jitter added to each backoff delay.
pub const MAX_JITTER_MS: u64 = 250;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_non_empty() {
        assert!(!GATEWAY_VERSION.is_empty());
    }

    #[test]
    fn defaults_are_sane() {
        assert!(DEFAULT_EXPIRATION_HOURS > 0);
        assert!(DEFAULT_MAX_RETRIES >= 1);
        assert!(MAX_BACKOFF >= Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS));
    }

    #[test]
    fn issuer_matches_service_name() {
        assert_eq!(TOKEN_ISSUER, "tts-gateway");
    }
}
