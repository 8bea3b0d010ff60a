use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::applications::models::RemovedApplication;
use crate::shared::constants::{ROLE_CANDIDATE, ROLE_HR};

/// Account role, chosen at registration or after the first OAuth login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Candidate,
    Hr,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Candidate => write!(f, "{}", ROLE_CANDIDATE),
            UserRole::Hr => write!(f, "{}", ROLE_HR),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            ROLE_CANDIDATE => Ok(UserRole::Candidate),
            ROLE_HR => Ok(UserRole::Hr),
            other => Err(format!("Invalid role '{}'. Must be 'candidate' or 'hr'", other)),
        }
    }
}

/// Database model for users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub role: Option<UserRole>,
    pub github_id: Option<i64>,
    pub github_username: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a user row
#[derive(Debug, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub role: Option<UserRole>,
    pub github_id: Option<i64>,
    pub github_username: Option<String>,
    pub avatar_url: Option<String>,
}

/// What an account deletion removed besides the user row
#[derive(Debug, Default)]
pub struct DeletedAccount {
    pub file_paths: Vec<String>,
    pub applications: Vec<RemovedApplication>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("hr".parse::<UserRole>().unwrap(), UserRole::Hr);
        assert_eq!(" Candidate ".parse::<UserRole>().unwrap(), UserRole::Candidate);
        assert!("admin".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Hr.to_string(), "hr");
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&UserRole::Candidate).unwrap(), "\"candidate\"");
        let role: UserRole = serde_json::from_str("\"hr\"").unwrap();
        assert_eq!(role, UserRole::Hr);
    }
}
