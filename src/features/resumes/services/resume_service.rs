use minijinja::context;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::applications::models::RemovedApplication;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::realtime::EventHub;
use crate::features::resumes::dtos::{
    DeleteResumeResponseDto, LinkedApplicationDto, ResumeDeletion, ResumeUpload,
};
use crate::features::resumes::models::{
    NewResume, ParsedResume, Resume, ResumeInsights, ResumeParseStatus,
};
use crate::modules::ai::ChatModel;
use crate::modules::storage::LocalStorage;
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::prompts::{render_template, RESUME_INSIGHTS};

pub(crate) const RESUME_COLUMNS: &str = "id, user_id, filename, file_path, file_size, content_type, \
     parse_status, parse_error, parsed_data, raw_text, name, email, phone, skills, experience, \
     education, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct LinkedApplicationRow {
    #[sqlx(flatten)]
    application: LinkedApplicationDto,
    hr_id: Uuid,
}

/// Service for stored resumes and their parsed fields
pub struct ResumeService {
    pool: PgPool,
    storage: Arc<LocalStorage>,
    hub: Arc<EventHub>,
    insights_model: Option<Arc<dyn ChatModel>>,
}

impl ResumeService {
    pub fn new(
        pool: PgPool,
        storage: Arc<LocalStorage>,
        hub: Arc<EventHub>,
        insights_model: Option<Arc<dyn ChatModel>>,
    ) -> Self {
        Self {
            pool,
            storage,
            hub,
            insights_model,
        }
    }

    /// Stores the file and inserts a `pending` row
    pub async fn create(&self, user_id: Uuid, upload: ResumeUpload) -> Result<Resume> {
        let key = self.storage.generate_key(&upload.filename)?;
        let file_path = self.storage.upload(&key, &upload.data).await?;

        let data = NewResume {
            user_id,
            filename: upload.filename,
            file_path: file_path.clone(),
            file_size: upload.data.len() as i64,
            content_type: upload.content_type,
        };

        let inserted = sqlx::query_as::<_, Resume>(&format!(
            r#"
            INSERT INTO resumes (id, user_id, filename, file_path, file_size, content_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            RESUME_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(data.user_id)
        .bind(&data.filename)
        .bind(&data.file_path)
        .bind(data.file_size)
        .bind(&data.content_type)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(resume) => {
                tracing::info!("Stored resume {} for user {}", resume.id, user_id);
                Ok(resume)
            }
            Err(e) => {
                tracing::error!("Failed to insert resume: {:?}", e);
                // Keep disk and database in step
                if let Err(cleanup) = self.storage.delete(&file_path).await {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", file_path, cleanup);
                }
                Err(AppError::Database(e))
            }
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Resume>> {
        sqlx::query_as::<_, Resume>(&format!(
            "SELECT {} FROM resumes WHERE id = $1",
            RESUME_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch resume {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    /// Newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Resume>> {
        sqlx::query_as::<_, Resume>(&format!(
            "SELECT {} FROM resumes WHERE user_id = $1 ORDER BY created_at DESC",
            RESUME_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list resumes for user {}: {:?}", user_id, e);
            AppError::Database(e)
        })
    }

    /// Loads a resume the caller owns
    pub async fn get_owned(&self, user_id: Uuid, id: Uuid) -> Result<Resume> {
        let resume = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

        if resume.user_id != user_id {
            return Err(AppError::Forbidden(
                "You do not have access to this resume".to_string(),
            ));
        }
        Ok(resume)
    }

    /// Returns the stored file. Open to the owner and to HR users who own a
    /// job the resume was submitted to.
    pub async fn download(&self, user: &AuthenticatedUser, id: Uuid) -> Result<(Resume, Vec<u8>)> {
        let resume = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

        if resume.user_id != user.id && !(user.is_hr() && self.applied_to_hr_job(id, user.id).await?) {
            return Err(AppError::Forbidden(
                "You do not have access to this resume".to_string(),
            ));
        }

        let data = self.storage.download(&resume.file_path).await?;
        Ok((resume, data))
    }

    async fn applied_to_hr_job(&self, resume_id: Uuid, hr_id: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM applications a
                JOIN jobs j ON j.id = a.job_id
                WHERE a.resume_id = $1 AND j.created_by = $2
            )
            "#,
        )
        .bind(resume_id)
        .bind(hr_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check resume access: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Deletes the row and the file. Refuses while applications reference
    /// the resume unless `force` is set.
    pub async fn delete(&self, user_id: Uuid, id: Uuid, force: bool) -> Result<ResumeDeletion> {
        let resume = self.get_owned(user_id, id).await?;

        let linked = sqlx::query_as::<_, LinkedApplicationRow>(
            r#"
            SELECT a.id, j.title AS job_title, a.status, j.created_by AS hr_id
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.resume_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list applications for resume {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        if !linked.is_empty() && !force {
            return Ok(ResumeDeletion::Blocked(
                linked.into_iter().map(|row| row.application).collect(),
            ));
        }

        sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete resume {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        if let Err(e) = self.storage.delete(&resume.file_path).await {
            tracing::warn!("Resume {} deleted but file removal failed: {}", id, e);
        }

        let removed: Vec<RemovedApplication> = linked
            .iter()
            .map(|row| RemovedApplication {
                application_id: row.application.id,
                hr_id: row.hr_id,
            })
            .collect();
        self.hub.publish_removed_applications(&removed);

        tracing::info!(
            "Deleted resume {} ({} application(s) removed)",
            id,
            linked.len()
        );
        Ok(ResumeDeletion::Deleted(DeleteResumeResponseDto {
            id,
            deleted_applications: linked.len(),
        }))
    }

    pub async fn mark_parsed(
        &self,
        id: Uuid,
        raw_text: &str,
        parsed: &ParsedResume,
    ) -> Result<Resume> {
        let parsed_data = serde_json::to_value(parsed)
            .map_err(|e| AppError::Internal(format!("Failed to encode parsed resume: {}", e)))?;
        let experience = serde_json::to_value(&parsed.experience).unwrap_or(Value::Array(vec![]));
        let education = serde_json::to_value(&parsed.education).unwrap_or(Value::Array(vec![]));
        let info = &parsed.personal_info;

        sqlx::query_as::<_, Resume>(&format!(
            r#"
            UPDATE resumes
            SET parse_status = $2,
                parse_error = NULL,
                parsed_data = $3,
                raw_text = $4,
                name = NULLIF($5, ''),
                email = NULLIF($6, ''),
                phone = NULLIF($7, ''),
                skills = $8,
                experience = $9,
                education = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RESUME_COLUMNS
        ))
        .bind(id)
        .bind(ResumeParseStatus::Parsed)
        .bind(Json(parsed_data))
        .bind(raw_text)
        .bind(info.name.trim())
        .bind(info.email.trim())
        .bind(info.phone.trim())
        .bind(Json(parsed.normalized_skills()))
        .bind(Json(experience))
        .bind(Json(education))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store parsed resume {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    pub async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE resumes
            SET parse_status = $2, parse_error = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(ResumeParseStatus::Failed)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to flag resume {} as failed: {:?}", id, e);
            AppError::Database(e)
        })?;
        Ok(())
    }

    /// Career insights for a parsed resume, from the hosted model
    pub async fn insights(&self, user_id: Uuid, id: Uuid) -> Result<ResumeInsights> {
        let model = self.insights_model.as_ref().ok_or_else(|| {
            AppError::ExternalServiceError("Resume insights are not configured".to_string())
        })?;

        let resume = self.get_owned(user_id, id).await?;
        if resume.parse_status != ResumeParseStatus::Parsed {
            return Err(AppError::BadRequest(
                "Resume has not been parsed yet".to_string(),
            ));
        }

        let summary = resume
            .parsed_data
            .as_ref()
            .and_then(|d| d.0.get("summary"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let prompt = render_template(
            RESUME_INSIGHTS,
            context! {
                name => resume.name,
                skills => resume.skills.0,
                summary => summary,
                experience => resume.experience.0,
                json_schema => ResumeInsights::json_schema_string(),
            },
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let reply = model.complete_json(&prompt).await?;
        Ok(parse_with_fallback(&reply))
    }
}
