use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::users::models::{User, UserRole};

/// The caller, as loaded by the auth middleware for every protected request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// `None` until the user picks a role after their first login
    pub role: Option<UserRole>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == Some(role)
    }

    pub fn is_hr(&self) -> bool {
        self.has_role(UserRole::Hr)
    }

    pub fn is_candidate(&self) -> bool {
        self.has_role(UserRole::Candidate)
    }
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}
