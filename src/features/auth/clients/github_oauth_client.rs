use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::config::GithubConfig;
use crate::core::error::{AppError, Result};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_BASE_URL: &str = "https://api.github.com";
const SCOPES: &str = "read:user user:email";

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

/// GitHub answers 200 for both outcomes, so both shapes are optional
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Subset of `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubProfile {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// OAuth web-flow client for "Sign in with GitHub"
pub struct GithubOAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: Option<String>,
}

impl GithubOAuthClient {
    /// Returns `None` when no GitHub app is configured
    pub fn from_config(config: &GithubConfig) -> anyhow::Result<Option<Self>> {
        let (Some(client_id), Some(client_secret)) =
            (config.client_id.clone(), config.client_secret.clone())
        else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .user_agent("hireflow/0.1")
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build GitHub HTTP client")?;

        Ok(Some(Self {
            client,
            client_id,
            client_secret,
            redirect_uri: config.redirect_uri.clone(),
        }))
    }

    pub fn authorize_url(&self, state: &str) -> String {
        let mut url = format!(
            "{}?client_id={}&scope={}&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        );
        if let Some(redirect_uri) = &self.redirect_uri {
            url.push_str("&redirect_uri=");
            url.push_str(&urlencoding::encode(redirect_uri));
        }
        url
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let response = self
            .client
            .post(TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&TokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                code,
                redirect_uri: self.redirect_uri.as_deref(),
            })
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("GitHub token request failed: {}", e)))?;

        let body: TokenResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Invalid GitHub token response: {}", e))
        })?;

        match (body.access_token, body.error) {
            (Some(token), _) => Ok(token),
            (None, Some(error)) => Err(AppError::BadRequest(format!(
                "GitHub authorization failed: {}",
                body.error_description.unwrap_or(error)
            ))),
            (None, None) => Err(AppError::ExternalServiceError(
                "GitHub returned no access token".to_string(),
            )),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, token: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", API_BASE_URL, path))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("GitHub API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "GitHub API {} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Invalid GitHub response: {}", e)))
    }

    /// Fetches the profile, filling `email` from the verified primary address
    /// when the public profile hides it
    pub async fn fetch_profile(&self, token: &str) -> Result<GithubProfile> {
        let mut profile: GithubProfile = self.get_json("/user", token).await?;

        if profile.email.is_none() {
            let emails: Vec<GithubEmail> = self.get_json("/user/emails", token).await?;
            profile.email = emails
                .into_iter()
                .find(|e| e.primary && e.verified)
                .map(|e| e.email);
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(redirect_uri: Option<&str>) -> GithubOAuthClient {
        GithubOAuthClient::from_config(&GithubConfig {
            client_id: Some("abc123".to_string()),
            client_secret: Some("shh".to_string()),
            redirect_uri: redirect_uri.map(str::to_string),
        })
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_unconfigured_returns_none() {
        let client = GithubOAuthClient::from_config(&GithubConfig::default()).unwrap();
        assert!(client.is_none());
    }

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let url = client(Some("http://localhost:5000/api/auth/github/authorize")).authorize_url("a.b");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?client_id=abc123"));
        assert!(url.contains("scope=read%3Auser%20user%3Aemail"));
        assert!(url.contains("state=a.b"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fapi%2Fauth%2Fgithub%2Fauthorize"));
    }

    #[test]
    fn test_authorize_url_without_redirect() {
        assert!(!client(None).authorize_url("s").contains("redirect_uri"));
    }
}
