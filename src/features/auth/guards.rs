//! Role guards for handlers.
//!
//! Each guard reads the `AuthenticatedUser` placed in the request extensions
//! by the auth middleware and rejects callers whose role does not match.
//! Users who have not picked a role yet are rejected by both guards.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::models::UserRole;
use axum::{extract::FromRequestParts, http::request::Parts};

fn require_role(parts: &Parts, role: UserRole) -> Result<AuthenticatedUser, AppError> {
    let user = parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    match user.role {
        None => Err(AppError::Forbidden(
            "Select a role before using this feature".to_string(),
        )),
        Some(actual) if actual != role => Err(AppError::Forbidden(match role {
            UserRole::Hr => "Access denied. HR role required.".to_string(),
            UserRole::Candidate => "Access denied. Candidate role required.".to_string(),
        })),
        Some(_) => Ok(user.clone()),
    }
}

/// Allows only users with the `hr` role.
///
/// ```ignore
/// pub async fn handler(RequireHr(user): RequireHr) { ... }
/// ```
pub struct RequireHr(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireHr
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, UserRole::Hr).map(RequireHr)
    }
}

/// Allows only users with the `candidate` role.
pub struct RequireCandidate(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireCandidate
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, UserRole::Candidate).map(RequireCandidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::test_user;
    use axum::http::Request;

    fn parts_with(user: Option<AuthenticatedUser>) -> Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(user) = user {
            parts.extensions.insert(user);
        }
        parts
    }

    #[tokio::test]
    async fn test_require_hr_accepts_hr() {
        let mut parts = parts_with(Some(test_user(Some(UserRole::Hr))));
        let guard = RequireHr::from_request_parts(&mut parts, &()).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn test_require_hr_rejects_candidate() {
        let mut parts = parts_with(Some(test_user(Some(UserRole::Candidate))));
        let err = RequireHr::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_require_candidate_rejects_user_without_role() {
        let mut parts = parts_with(Some(test_user(None)));
        let err = RequireCandidate::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = RequireCandidate::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
