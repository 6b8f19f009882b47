//! Signed identity token codec (JWT, HS256)
//!
//! The codec verifies tokens minted by the surrounding application's issuance
//! flow. Verification is side-effect-free: given (token, now, secret) it
//! deterministically returns an [`Identity`] or a classified failure.

use crate::identity::Identity;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Token verification failures, classified so callers can produce
/// different diagnostics for each.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token's expiry timestamp is at or before now
    #[error("token expired")]
    Expired,

    /// Well-formed token whose signature does not match the shared secret
    #[error("invalid signature")]
    InvalidSignature,

    /// Wrong structure, unsupported algorithm, or undecodable payload
    #[error("malformed token")]
    Malformed,
}

/// Claims carried inside a signed token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Contact address
    pub email: String,
    /// Role name
    pub role: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Encodes and decodes signed identity tokens.
///
/// Keys are derived once from the process-wide shared secret and stay
/// constant for the codec's lifetime.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec from the shared signing secret
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact, no grace period
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token's signature and expiry, returning the encoded identity.
    ///
    /// No side effects; never mutates any persisted state.
    pub fn verify(&self, token: &str) -> std::result::Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => {
                    warn!(error = %err, "undecodable token");
                    TokenError::Malformed
                }
            }
        })?;

        debug!(subject = %data.claims.sub, "token verified");

        Ok(Identity {
            subject: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
        })
    }

    /// Mint a token for the given identity, expiring after `ttl`.
    ///
    /// The gate chain never calls this; it exists for the surrounding
    /// application's issuance flow and for tests.
    pub fn sign(
        &self,
        identity: &Identity,
        ttl: Duration,
    ) -> std::result::Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.subject.clone(),
            email: identity.email.clone(),
            role: identity.role.clone(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            subject: "user-1".to_string(),
            email: "user@example.com".to_string(),
            role: "customer".to_string(),
        }
    }

    #[test]
    fn test_round_trip_returns_encoded_identity() {
        let codec = TokenCodec::new("test-secret");
        let token = codec.sign(&identity(), Duration::from_secs(3600)).unwrap();

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified, identity());
    }

    #[test]
    fn test_expired_token() {
        let codec = TokenCodec::new("test-secret");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "user@example.com".to_string(),
            role: "customer".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = codec.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let issuer = TokenCodec::new("secret-a");
        let verifier = TokenCodec::new("secret-b");
        let token = issuer.sign(&identity(), Duration::from_secs(3600)).unwrap();

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = TokenCodec::new("test-secret");
        assert!(matches!(
            codec.verify("not-a-token").unwrap_err(),
            TokenError::Malformed
        ));
        assert!(matches!(
            codec.verify("a.b.c").unwrap_err(),
            TokenError::Malformed
        ));
        assert!(matches!(
            codec.verify("").unwrap_err(),
            TokenError::Malformed
        ));
    }

    #[test]
    fn test_unsupported_algorithm_is_malformed() {
        let codec = TokenCodec::new("test-secret");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "user@example.com".to_string(),
            role: "customer".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = codec.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Malformed));
    }

    #[test]
    fn test_verification_is_deterministic() {
        let codec = TokenCodec::new("test-secret");
        let token = codec.sign(&identity(), Duration::from_secs(3600)).unwrap();

        let first = codec.verify(&token).unwrap();
        let second = codec.verify(&token).unwrap();
        assert_eq!(first, second);
    }
}
