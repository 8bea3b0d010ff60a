use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::clients::{GithubOAuthClient, GithubProfile};
use crate::features::auth::dtos::{
    AuthResponseDto, DeleteAccountResponseDto, GithubLoginResponseDto, LoginRequestDto,
    RegisterRequestDto, UserDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::password::{hash_password, verify_password};
use crate::features::auth::services::{OAuthStateSigner, TokenService};
use crate::features::realtime::EventHub;
use crate::features::users::models::{NewUser, User, UserRole};
use crate::features::users::UserService;
use crate::modules::storage::LocalStorage;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Service for account lifecycle: register, login, role selection, GitHub login
pub struct AuthService {
    users: Arc<UserService>,
    tokens: Arc<TokenService>,
    state_signer: OAuthStateSigner,
    github: Option<GithubOAuthClient>,
    storage: Arc<LocalStorage>,
    hub: Arc<EventHub>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        tokens: Arc<TokenService>,
        state_signer: OAuthStateSigner,
        github: Option<GithubOAuthClient>,
        storage: Arc<LocalStorage>,
        hub: Arc<EventHub>,
    ) -> Self {
        Self {
            users,
            tokens,
            state_signer,
            github,
            storage,
            hub,
        }
    }

    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        if self.users.find_by_email(&dto.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(dto.password).await?;
        let user = self
            .users
            .create(NewUser {
                email: dto.email,
                password_hash: Some(password_hash),
                name: dto.name,
                role: Some(dto.role.unwrap_or(UserRole::Candidate)),
                ..Default::default()
            })
            .await?;

        tracing::info!("Registered user {} as {:?}", user.id, user.role);
        self.auth_response(user)
    }

    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = self
            .users
            .find_by_email(&dto.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        // OAuth-only accounts have no password to check
        let Some(stored_hash) = user.password_hash.clone() else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(dto.password, stored_hash).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.auth_response(user)
    }

    pub async fn current_user(&self, user: &AuthenticatedUser) -> Result<UserDto> {
        Ok(self.users.get(user.id).await?.into())
    }

    /// Sets the role once. Repeating the current role is a no-op.
    pub async fn update_role(&self, user: &AuthenticatedUser, role: UserRole) -> Result<UserDto> {
        match user.role {
            Some(current) if current == role => Ok(self.users.get(user.id).await?.into()),
            Some(_) => Err(AppError::Conflict(
                "Role has already been selected and cannot be changed".to_string(),
            )),
            None => {
                let updated = self.users.set_role(user.id, role).await?;
                tracing::info!("User {} selected role {}", user.id, role);
                Ok(updated.into())
            }
        }
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Result<DeleteAccountResponseDto> {
        let deleted = self.users.delete(user_id).await?;
        self.storage.delete_all_best_effort(&deleted.file_paths).await;
        self.hub.publish_removed_applications(&deleted.applications);

        tracing::info!(
            "Deleted account {} with {} resume file(s) and {} application(s)",
            user_id,
            deleted.file_paths.len(),
            deleted.applications.len()
        );
        Ok(DeleteAccountResponseDto {
            user_id,
            removed_files: deleted.file_paths.len(),
        })
    }

    pub fn github_login_url(&self, preferred_role: Option<UserRole>) -> Result<GithubLoginResponseDto> {
        let github = self.github_client()?;
        let state = self.state_signer.sign(preferred_role)?;

        Ok(GithubLoginResponseDto {
            authorization_url: github.authorize_url(&state),
            state,
        })
    }

    /// Completes the OAuth dance and signs the user in
    pub async fn github_authorize(&self, code: &str, state: &str) -> Result<AuthResponseDto> {
        let github = self.github_client()?;
        let oauth_state = self.state_signer.verify(state)?;

        let access_token = github.exchange_code(code).await?;
        let profile = github.fetch_profile(&access_token).await?;

        let user = self
            .find_or_create_github_user(profile, oauth_state.preferred_role)
            .await?;
        self.auth_response(user)
    }

    async fn find_or_create_github_user(
        &self,
        profile: GithubProfile,
        preferred_role: Option<UserRole>,
    ) -> Result<User> {
        if let Some(user) = self.users.find_by_github_id(profile.id).await? {
            return Ok(user);
        }

        let email = profile.email.clone().ok_or_else(|| {
            AppError::BadRequest("GitHub account has no verified email address".to_string())
        })?;

        if let Some(existing) = self.users.find_by_email(&email).await? {
            tracing::info!("Linking GitHub account {} to user {}", profile.login, existing.id);
            return self
                .users
                .link_github(
                    existing.id,
                    profile.id,
                    &profile.login,
                    profile.avatar_url.as_deref(),
                )
                .await;
        }

        let name = profile
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| profile.login.clone());

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash: None,
                name,
                role: preferred_role,
                github_id: Some(profile.id),
                github_username: Some(profile.login),
                avatar_url: profile.avatar_url,
            })
            .await?;

        tracing::info!("Created user {} from GitHub login", user.id);
        Ok(user)
    }

    fn github_client(&self) -> Result<&GithubOAuthClient> {
        self.github
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("GitHub login is not configured".to_string()))
    }

    fn auth_response(&self, user: User) -> Result<AuthResponseDto> {
        let issued = self.tokens.issue(user.id, &user.email)?;
        Ok(AuthResponseDto {
            token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            needs_role_selection: user.role.is_none(),
            user: user.into(),
        })
    }
}
