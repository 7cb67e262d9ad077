use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use tts_gateway::auth::{Claims, TokenService};
use tts_gateway::error::GatewayError;

const SECRET: &str = "integration-test-secret";

fn service() -> TokenService {
    TokenService::new(SECRET, Algorithm::HS256, 24)
}

/// Sign arbitrary claims with the service's secret, bypassing `issue` so
/// tests can build tokens the service itself would refuse to mint.
fn sign(claims: &Claims) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn claims_expiring_at(exp: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        user_id: "alice".to_string(),
        role: "user".to_string(),
        permissions: vec![],
        iat: now - 7200,
        exp,
        iss: "tts-gateway".to_string(),
        sub: "alice".to_string(),
    }
}

#[test]
fn issued_token_validates_immediately() {
    let service = service();
    let issued = service
        .issue("alice", "premium", vec!["tts".into(), "batch".into()], None)
        .unwrap();

    let claims = service.validate(&issued.token).unwrap();
    assert_eq!(claims.user_id, "alice");
    assert_eq!(claims.role, "premium");
    assert_eq!(claims.permissions, vec!["tts", "batch"]);
}

#[test]
fn default_ttl_is_24_hours() {
    let issued = service().issue("alice", "user", vec![], None).unwrap();
    assert_eq!(issued.expires_in_hours, 24);
    let claims = service().validate(&issued.token).unwrap();
    // exp - iat is exactly the TTL.
    assert_eq!(claims.exp - claims.iat, 24 * 3600);
}

#[test]
fn expired_token_fails_with_expired() {
    let token = sign(&claims_expiring_at(Utc::now().timestamp() - 3600));
    let err = service().validate(&token).unwrap_err();
    assert!(matches!(err, GatewayError::Expired), "got {err:?}");
}

#[test]
fn expiry_has_no_leeway() {
    // A token that expired seconds ago must already be dead.
    let token = sign(&claims_expiring_at(Utc::now().timestamp() - 5));
    assert!(matches!(
        service().validate(&token).unwrap_err(),
        GatewayError::Expired
    ));
}

#[test]
fn tampered_signature_fails_with_unauthenticated() {
    let issued = service().issue("alice", "user", vec![], None).unwrap();

    // Flip one byte in the signature segment.
    let mut tampered = issued.token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    assert_ne!(tampered, issued.token);

    let err = service().validate(&tampered).unwrap_err();
    assert!(matches!(err, GatewayError::Unauthenticated(_)), "got {err:?}");
}

#[test]
fn token_signed_with_other_secret_fails() {
    let other = TokenService::new("different-secret", Algorithm::HS256, 24);
    let issued = other.issue("alice", "user", vec![], None).unwrap();

    let err = service().validate(&issued.token).unwrap_err();
    assert!(matches!(err, GatewayError::Unauthenticated(_)));
}

#[test]
fn validate_never_consumes_the_token() {
    let service = service();
    let issued = service.issue("alice", "user", vec![], None).unwrap();
    for _ in 0..3 {
        assert!(service.validate(&issued.token).is_ok());
    }
}

#[test]
fn expiry_lands_where_requested() {
    let issued = service().issue("alice", "user", vec![], Some(1)).unwrap();
    let remaining = issued.expires_at - Utc::now().timestamp();
    assert!(remaining > 3500 && remaining <= 3600, "remaining {remaining}");
}

#[test]
fn hs512_round_trip() {
    let service = TokenService::new(SECRET, Algorithm::HS512, 24);
    let issued = service.issue("bob", "user", vec![], None).unwrap();
    assert_eq!(service.validate(&issued.token).unwrap().user_id, "bob");

    // An HS256 verifier must reject the HS512 token outright.
    let err = TokenService::new(SECRET, Algorithm::HS256, 24)
        .validate(&issued.token)
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Malformed | GatewayError::Unauthenticated(_)
    ));
}
