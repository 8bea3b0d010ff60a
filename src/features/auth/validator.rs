use std::sync::Arc;

use super::model::AuthenticatedUser;
use super::services::TokenService;
use crate::core::error::AppError;
use crate::features::users::UserService;

/// Validates bearer tokens and resolves them to a live user row
pub struct JwtValidator {
    tokens: Arc<TokenService>,
    users: Arc<UserService>,
}

impl JwtValidator {
    pub fn new(tokens: Arc<TokenService>, users: Arc<UserService>) -> Self {
        Self { tokens, users }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.tokens.verify(token)?;

        // Tokens outlive deleted accounts; the row is the source of truth
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::lazy_pool;
    use std::time::Duration;

    fn validator() -> JwtValidator {
        let tokens = Arc::new(TokenService::from_secret(
            b"validator-secret",
            Duration::from_secs(60),
            0,
        ));
        let users = Arc::new(UserService::new(lazy_pool()));
        JwtValidator::new(tokens, users)
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected_before_lookup() {
        let err = validator().validate_token("not-a-jwt").await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let foreign = TokenService::from_secret(b"other-secret", Duration::from_secs(60), 0);
        let token = foreign
            .issue(uuid::Uuid::now_v7(), "a@example.com")
            .unwrap()
            .access_token;

        let err = validator().validate_token(&token).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
