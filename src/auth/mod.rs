use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id of the signed-in user.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Claims for `uid` expiring `expiry_hours` from now.
    pub fn new(uid: impl Into<String>, expiry_hours: u64) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(TokenError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            sub: uid.into(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token has no subject")]
    MissingSubject,

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Token lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),

    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Verifies a bearer credential and returns the principal id it belongs to.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, TokenError>;
}

/// HS256 tokens signed with a shared secret.
pub struct JwtTokenVerifier {
    decoding_key: Option<DecodingKey>,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        let decoding_key = if secret.is_empty() {
            tracing::warn!("JWT secret not configured; every bearer token will be rejected");
            None
        } else {
            Some(DecodingKey::from_secret(secret.as_bytes()))
        };
        Self { decoding_key }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String, TokenError> {
        let key = self.decoding_key.as_ref().ok_or(TokenError::InvalidSecret)?;

        let token_data = decode::<Claims>(token, key, &Validation::default())
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        let sub = token_data.claims.sub;
        if sub.trim().is_empty() {
            return Err(TokenError::MissingSubject);
        }
        Ok(sub)
    }
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifies_tokens_it_signed() {
        let token = generate_jwt(&Claims::new("admin-1", 1).unwrap(), "s3cret").unwrap();
        let verifier = JwtTokenVerifier::new("s3cret");
        assert_eq!(verifier.verify(&token).await.unwrap(), "admin-1");
    }

    #[tokio::test]
    async fn rejects_wrong_secret_and_garbage() {
        let token = generate_jwt(&Claims::new("admin-1", 1).unwrap(), "s3cret").unwrap();
        let verifier = JwtTokenVerifier::new("other");
        assert!(matches!(verifier.verify(&token).await, Err(TokenError::Invalid(_))));
        assert!(matches!(verifier.verify("not.a.jwt").await, Err(TokenError::Invalid(_))));
    }

    #[tokio::test]
    async fn rejects_expired_tokens() {
        let mut claims = Claims::new("admin-1", 1).unwrap();
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&claims, "s3cret").unwrap();
        assert!(JwtTokenVerifier::new("s3cret").verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn unconfigured_secret_rejects_everything() {
        assert!(matches!(
            JwtTokenVerifier::new("").verify("anything").await,
            Err(TokenError::InvalidSecret)
        ));
        assert!(generate_jwt(&Claims::new("x", 1).unwrap(), "").is_err());
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        assert!(matches!(
            Claims::new("admin-1", u64::MAX),
            Err(TokenError::InvalidExpiry(u64::MAX))
        ));
        assert!(matches!(
            Claims::new("admin-1", 10_000_000_000),
            Err(TokenError::InvalidExpiry(_))
        ));
        assert!(Claims::new("admin-1", 24 * 365).is_ok());
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(Some("Bearer   ")), None);
        assert_eq!(extract_bearer_token(Some("Basic abc")), None);
        assert_eq!(extract_bearer_token(Some("bearer abc")), None);
        assert_eq!(extract_bearer_token(None), None);
    }
}
