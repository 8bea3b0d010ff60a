use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

/// Issues and verifies HS256 access tokens signed with `JWT_SECRET_KEY`
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    leeway: u64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self::from_secret(
            config.jwt_secret.as_bytes(),
            config.token_ttl,
            config.jwt_leeway.as_secs(),
        )
    }

    pub fn from_secret(secret: &[u8], ttl: Duration, leeway: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            leeway,
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken> {
        let now = Utc::now().timestamp();
        let expires_in = self.ttl.as_secs() as i64;
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now,
            exp: now + expires_in,
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken {
            access_token,
            expires_in,
        })
    }

    /// Checks signature and expiry and returns the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected access token: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::from_secret(b"test-secret", Duration::from_secs(3600), 0)
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service();
        let user_id = Uuid::now_v7();

        let issued = tokens.issue(user_id, "jane@example.com").unwrap();
        assert_eq!(issued.expires_in, 3600);

        let claims = tokens.verify(&issued.access_token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "jane@example.com");
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let other = TokenService::from_secret(b"other-secret", Duration::from_secs(3600), 0);
        let issued = other.issue(Uuid::now_v7(), "x@example.com").unwrap();

        let err = service().verify(&issued.access_token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_rejects_expired_token() {
        let claims = Claims {
            sub: Uuid::now_v7(),
            email: "old@example.com".to_string(),
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(service().verify("not-a-jwt").is_err());
    }
}
