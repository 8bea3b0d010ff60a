use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    AuthResponseDto, DeleteAccountResponseDto, GithubCallbackQuery, GithubLoginQuery,
    GithubLoginResponseDto, LoginRequestDto, RegisterRequestDto, UpdateRoleRequestDto, UserDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// Register a new account with email and password
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let auth_response = service.register(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(auth_response),
            Some("Registration successful".to_string()),
            None,
        )),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<AuthResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let auth_response = service.login(dto).await?;
    Ok(Json(ApiResponse::success(Some(auth_response), None, None)))
}

/// Get the current authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/user",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<UserDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<UserDto>>> {
    let user_data = service.current_user(&user).await?;
    Ok(Json(ApiResponse::success(Some(user_data), None, None)))
}

/// Select the account role after the first login
#[utoipa::path(
    post,
    path = "/api/auth/update-role",
    request_body = UpdateRoleRequestDto,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<UserDto>),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Role already selected")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<UpdateRoleRequestDto>,
) -> Result<Json<ApiResponse<UserDto>>> {
    let updated = service.update_role(&user, dto.role).await?;
    Ok(Json(ApiResponse::success(
        Some(updated),
        Some("Role updated".to_string()),
        None,
    )))
}

/// Delete the current account and everything it owns
#[utoipa::path(
    delete,
    path = "/api/auth/delete-account",
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<DeleteAccountResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn delete_account(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<DeleteAccountResponseDto>>> {
    let result = service.delete_account(user.id).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("Account deleted".to_string()),
        None,
    )))
}

/// Start a GitHub login
#[utoipa::path(
    get,
    path = "/api/auth/github/login",
    params(GithubLoginQuery),
    responses(
        (status = 200, description = "GitHub authorization URL", body = ApiResponse<GithubLoginResponseDto>),
        (status = 400, description = "GitHub login not configured")
    ),
    tag = "auth"
)]
pub async fn github_login(
    State(service): State<Arc<AuthService>>,
    Query(query): Query<GithubLoginQuery>,
) -> Result<Json<ApiResponse<GithubLoginResponseDto>>> {
    let response = service.github_login_url(query.role)?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// GitHub OAuth callback
#[utoipa::path(
    get,
    path = "/api/auth/github/authorize",
    params(GithubCallbackQuery),
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Missing code or state"),
        (status = 401, description = "Invalid state"),
        (status = 502, description = "GitHub unavailable")
    ),
    tag = "auth"
)]
pub async fn github_authorize(
    State(service): State<Arc<AuthService>>,
    Query(query): Query<GithubCallbackQuery>,
) -> Result<Json<ApiResponse<AuthResponseDto>>> {
    if let Some(error) = query.error {
        return Err(AppError::BadRequest(format!("GitHub login failed: {}", error)));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
    let state = query
        .state
        .ok_or_else(|| AppError::BadRequest("Missing state parameter".to_string()))?;

    let auth_response = service.github_authorize(&code, &state).await?;
    Ok(Json(ApiResponse::success(Some(auth_response), None, None)))
}
