//! The gateway-wide error taxonomy.
//!
//! Every failure a caller can observe maps to one of these variants. Auth
//! and validation failures short-circuit before any backend call; only the
//! engine seam's transient failures are ever retried, and they surface here
//! as [`GatewayError::BackendUnavailable`] once attempts are exhausted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request envelope is missing or malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A caller-supplied parameter failed validation (e.g. empty user_id).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No token was presented, or its signature did not verify.
    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    /// The token's signature verified but its lifetime is over.
    #[error("authentication failed: token expired")]
    Expired,

    /// The token string is not a parseable JWT.
    #[error("authentication failed: malformed token")]
    Malformed,

    /// The requested engine name is not registered.
    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    /// The backend failed, or all retry attempts were exhausted. Carries
    /// the last underlying error text for diagnostics.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Anything unexpected. Surfaced with a generic message, never retried.
    #[error("internal gateway error: {0}")]
    InternalError(String),
}
