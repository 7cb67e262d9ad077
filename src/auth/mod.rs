//! Bearer-token issuance and validation.
//!
//! Tokens are HMAC-signed JWTs carrying a user identity and permission
//! set. The signing secret is injected at construction and never changes
//! for the process lifetime, so a [`TokenService`] is safe to share across
//! concurrent requests without locking. There is no revocation and no
//! refresh: a token dies at its `exp` claim and that is the whole story.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::consts::TOKEN_ISSUER;
use crate::error::GatewayError;

/// The claim set we sign. `sub` duplicates `user_id` so standard JWT
/// tooling sees a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub sub: String,
}

/// What `issue` hands back: the signed string plus the fields callers
/// echo into the token-generation response.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: String,
    pub role: String,
    pub expires_in_hours: i64,
    pub expires_at: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl_hours: i64,
}

impl TokenService {
    pub fn new(secret: &str, algorithm: Algorithm, default_ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            default_ttl_hours,
        }
    }

    /// Sign a new token. `ttl_hours` falls back to the configured default.
    pub fn issue(
        &self,
        user_id: &str,
        role: &str,
        permissions: Vec<String>,
        ttl_hours: Option<i64>,
    ) -> Result<IssuedToken, GatewayError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(GatewayError::InvalidInput(
                "user_id must not be empty".to_string(),
            ));
        }

        let ttl = ttl_hours.unwrap_or(self.default_ttl_hours);
        if ttl <= 0 {
            return Err(GatewayError::InvalidInput(format!(
                "ttl_hours must be positive, got {ttl}"
            )));
        }

        let now = Utc::now();
        let expires_at = now + Duration::hours(ttl);
        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            permissions,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| GatewayError::InternalError(format!("token signing failed: {e}")))?;

        Ok(IssuedToken {
            token,
            user_id: claims.user_id,
            role: claims.role,
            expires_in_hours: ttl,
            expires_at: claims.exp,
        })
    }

    /// Verify a token string and return its claims. Accepts an optional
    /// `Bearer ` prefix. Expiry is exact: no leeway.
    pub fn validate(&self, token: &str) -> Result<Claims, GatewayError> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => Err(match e.kind() {
                ErrorKind::ExpiredSignature => GatewayError::Expired,
                ErrorKind::InvalidSignature => {
                    GatewayError::Unauthenticated("signature verification failed".to_string())
                }
                _ => GatewayError::Malformed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", Algorithm::HS256, 24)
    }

    #[test]
    fn issue_rejects_empty_user_id() {
        let err = service().issue("", "user", vec![], None).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[test]
    fn issue_rejects_whitespace_user_id() {
        let err = service().issue("   ", "user", vec![], None).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[test]
    fn issue_rejects_non_positive_ttl() {
        let err = service().issue("bob", "user", vec![], Some(0)).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
        let err = service().issue("bob", "user", vec![], Some(-3)).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[test]
    fn issued_claims_are_consistent() {
        let issued = service()
            .issue("bob", "admin", vec!["tts".into()], Some(2))
            .unwrap();
        assert_eq!(issued.user_id, "bob");
        assert_eq!(issued.role, "admin");
        assert_eq!(issued.expires_in_hours, 2);

        let claims = service().validate(&issued.token).unwrap();
        assert_eq!(claims.sub, claims.user_id);
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn validate_strips_bearer_prefix() {
        let issued = service().issue("bob", "user", vec![], None).unwrap();
        let claims = service()
            .validate(&format!("Bearer {}", issued.token))
            .unwrap();
        assert_eq!(claims.user_id, "bob");
    }

    #[test]
    fn validate_rejects_garbage() {
        let err = service().validate("not-a-jwt").unwrap_err();
        assert!(matches!(err, GatewayError::Malformed));
    }
}
