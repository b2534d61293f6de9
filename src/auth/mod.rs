//! Bearer-token auth collaborator.
//!
//! Issues and verifies HS256 JWTs mapping a token subject to a user id
//! and email. Constructed once at startup and passed by reference — no
//! module-level secret.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::user::UserId;

/// Payload stored in a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    pub email: String,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// Who a verified token belongs to.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
}

/// Token issuer and verifier.
pub struct Authenticator {
    secret: SecretString,
    expiry_seconds: u64,
}

impl Authenticator {
    /// Create an authenticator. The secret must be at least 32 bytes.
    pub fn new(secret: SecretString, expiry_seconds: u64) -> Result<Self> {
        if secret.expose_secret().len() < 32 {
            return Err(Error::Config(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }
        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Issue a signed token for a user.
    pub fn issue(&self, user_id: UserId, email: impl Into<String>) -> Result<String> {
        let now = unix_now()?;
        let claims = Claims {
            sub: user_id.0,
            email: email.into(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| Error::Other(format!("failed to sign token: {e}")))
    }

    /// Verify a bearer token and return who it belongs to.
    ///
    /// Expired, tampered, and malformed tokens all map to
    /// [`Error::Unauthorized`] with a stable message.
    pub fn verify(&self, token: &str) -> Result<AuthContext> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            let msg = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid signature",
                ErrorKind::InvalidToken => "invalid token",
                _ => "token validation failed",
            };
            Error::Unauthorized(msg.to_string())
        })?;

        Ok(AuthContext {
            user_id: UserId(data.claims.sub),
            email: data.claims.email,
        })
    }
}

/// Extract a token from an Authorization header value.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let header = header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    // Raw token, no scheme
    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Other(format!("system time error: {e}")))
}
