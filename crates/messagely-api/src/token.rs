use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use messagely_types::api::Claims;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("token has expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Issues and checks HS256 session tokens carrying the `username` claim.
///
/// Built once at start-up from the process secret and shared read-only.
/// With `ttl = None` tokens carry no `exp` and never expire.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Option<Duration>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        if ttl.is_none() {
            validation.required_spec_claims.clear();
            validation.validate_exp = false;
        }

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        self.issue_at(username, Utc::now())
    }

    pub(crate) fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: self.ttl.map(|ttl| (now + ttl).timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Resolve a token back to its username. Pure: touches nothing but the
    /// token and the key.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                TokenError::Expired
            } else {
                TokenError::Invalid(e)
            }
        })?;

        Ok(data.claims.username)
    }
}
