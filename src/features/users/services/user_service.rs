use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::applications::models::RemovedApplication;
use crate::features::users::models::{DeletedAccount, NewUser, User, UserRole};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, github_id, github_username, \
     avatar_url, created_at, updated_at";

/// Persistence for user accounts
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch user {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by email: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn find_by_github_id(&self, github_id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE github_id = $1",
            USER_COLUMNS
        ))
        .bind(github_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by github id: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn create(&self, data: NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, github_id, github_username, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(data.email.trim().to_lowercase())
        .bind(data.password_hash)
        .bind(data.name.trim())
        .bind(data.role)
        .bind(data.github_id)
        .bind(data.github_username)
        .bind(data.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::Conflict("Email already registered".to_string());
            }
            tracing::error!("Failed to create user: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Sets the role when none is set yet. Repeating the stored role is
    /// accepted, any other role gives `Conflict`.
    pub async fn set_role(&self, id: Uuid, role: UserRole) -> Result<User> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1 AND (role IS NULL OR role = $2)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update role for user {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        match updated {
            Some(user) => Ok(user),
            None => {
                self.get(id).await?;
                Err(AppError::Conflict(
                    "Role has already been selected and cannot be changed".to_string(),
                ))
            }
        }
    }

    /// Attaches a GitHub identity to an existing account
    pub async fn link_github(
        &self,
        id: Uuid,
        github_id: i64,
        github_username: &str,
        avatar_url: Option<&str>,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET github_id = $2,
                github_username = $3,
                avatar_url = COALESCE($4, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(github_id)
        .bind(github_username)
        .bind(avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::Conflict(
                    "This GitHub account is linked to another user".to_string(),
                );
            }
            tracing::error!("Failed to link github account: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Deletes the account and everything it owns.
    ///
    /// Resumes, jobs, applications and interviews go through `ON DELETE
    /// CASCADE`. Returns the stored resume paths so the caller can remove
    /// the files, and the applications that went away with the account.
    pub async fn delete(&self, id: Uuid) -> Result<DeletedAccount> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::Database(e)
        })?;

        let file_paths: Vec<String> =
            sqlx::query_scalar("SELECT file_path FROM resumes WHERE user_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to list resumes for user {}: {:?}", id, e);
                    AppError::Database(e)
                })?;

        let applications = sqlx::query_as::<_, RemovedApplication>(
            r#"
            SELECT a.id AS application_id, j.created_by AS hr_id
            FROM applications a
            JOIN resumes r ON r.id = a.resume_id
            JOIN jobs j ON j.id = a.job_id
            WHERE r.user_id = $1 AND j.created_by <> $1
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list applications for user {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user {}: {:?}", id, e);
                AppError::Database(e)
            })?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit account deletion: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(DeletedAccount {
            file_paths,
            applications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        seed_application, seed_job, seed_resume, seed_user, test_hub,
    };

    async fn user_without_role(pool: &PgPool) -> User {
        UserService::new(pool.clone())
            .create(NewUser {
                email: format!("{}@example.com", Uuid::now_v7().simple()),
                name: "No Role".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_role_is_set_once(pool: PgPool) {
        let service = UserService::new(pool.clone());
        let user = user_without_role(&pool).await;

        let updated = service.set_role(user.id, UserRole::Hr).await.unwrap();
        assert_eq!(updated.role, Some(UserRole::Hr));

        // Same role again is accepted
        assert!(service.set_role(user.id, UserRole::Hr).await.is_ok());

        let err = service.set_role(user.id, UserRole::Candidate).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(service.get(user.id).await.unwrap().role, Some(UserRole::Hr));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_racing_role_choices_keep_the_first(pool: PgPool) {
        let service = UserService::new(pool.clone());
        let user = user_without_role(&pool).await;

        let (hr, candidate) = tokio::join!(
            service.set_role(user.id, UserRole::Hr),
            service.set_role(user.id, UserRole::Candidate)
        );

        assert!(hr.is_ok() != candidate.is_ok());
        let stored = service.get(user.id).await.unwrap().role;
        let winner = if hr.is_ok() { UserRole::Hr } else { UserRole::Candidate };
        assert_eq!(stored, Some(winner));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_role_for_missing_user_is_not_found(pool: PgPool) {
        let service = UserService::new(pool);
        let err = service
            .set_role(Uuid::now_v7(), UserRole::Hr)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_reports_cascaded_applications(pool: PgPool) {
        let service = UserService::new(pool.clone());
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;
        let application_id = seed_application(&pool, resume_id, job_id).await;

        let deleted = service.delete(candidate.id).await.unwrap();

        assert_eq!(deleted.file_paths.len(), 1);
        assert_eq!(
            deleted.applications,
            vec![RemovedApplication {
                application_id,
                hr_id: hr.id
            }]
        );
        assert!(service.find_by_id(candidate.id).await.unwrap().is_none());

        let hub = test_hub();
        let mut events = hub.subscribe();
        hub.publish_removed_applications(&deleted.applications);
        let envelope = events.recv().await.unwrap();
        assert!(envelope.audience.includes(&hr));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_deleting_hr_reports_nothing_for_own_jobs(pool: PgPool) {
        let service = UserService::new(pool.clone());
        let hr = seed_user(&pool, UserRole::Hr).await;
        let candidate = seed_user(&pool, UserRole::Candidate).await;
        let job_id = seed_job(&pool, hr.id, &["Rust"]).await;
        let resume_id = seed_resume(&pool, candidate.id, &["rust"]).await;
        seed_application(&pool, resume_id, job_id).await;

        let deleted = service.delete(hr.id).await.unwrap();
        assert!(deleted.applications.is_empty());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
