//! Integration tests for the bearer-token collaborator.

use arete::auth::{Authenticator, extract_bearer};
use arete::error::Error;
use arete::model::user::UserId;
use secrecy::SecretString;

fn test_auth() -> Authenticator {
    Authenticator::new(
        SecretString::from("test-secret-that-is-at-least-32-characters-long"),
        3600,
    )
    .unwrap()
}

#[test]
fn issue_and_verify_round_trip() {
    let auth = test_auth();
    let user_id = UserId::new();

    let token = auth.issue(user_id, "kelly@example.com").unwrap();
    assert!(!token.is_empty());

    let ctx = auth.verify(&token).unwrap();
    assert_eq!(ctx.user_id, user_id);
    assert_eq!(ctx.email, "kelly@example.com");
}

#[test]
fn garbage_token_is_unauthorized() {
    let auth = test_auth();
    let err = auth.verify("not-a-token").unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let auth1 = test_auth();
    let auth2 = Authenticator::new(
        SecretString::from("different-secret-that-is-at-least-32-chars"),
        3600,
    )
    .unwrap();

    let token = auth1.issue(UserId::new(), "kelly@example.com").unwrap();
    let err = auth2.verify(&token).unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[test]
fn short_secret_is_rejected_at_construction() {
    assert!(Authenticator::new(SecretString::from("short"), 3600).is_err());
    assert!(Authenticator::new(SecretString::from(""), 3600).is_err());
}

#[test]
fn extract_bearer_handles_header_shapes() {
    assert_eq!(extract_bearer(Some("Bearer abc123")), Some("abc123"));
    assert_eq!(extract_bearer(Some("abc123")), Some("abc123"));
    assert_eq!(extract_bearer(None), None);
    assert_eq!(extract_bearer(Some("")), None);
    assert_eq!(extract_bearer(Some("Bearer ")), None);
    assert_eq!(extract_bearer(Some("Basic abc123")), None);
}
