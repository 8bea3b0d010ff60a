use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::applications::models::ApplicationStatus;
use crate::features::resumes::models::{Resume, ResumeParseStatus};
use crate::shared::constants::{ALLOWED_RESUME_EXTENSIONS, ALLOWED_RESUME_MIME_TYPES};
use crate::shared::validation::file_extension;

/// Multipart form accepted by the upload endpoint (documentation only)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadResumeDto {
    /// PDF or DOCX, at most 16 MB. The field may also be named `resume`.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Resume with its parse outcome
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResumeDto {
    pub id: Uuid,
    pub filename: String,
    pub file_size: i64,
    pub content_type: String,
    pub parse_status: ResumeParseStatus,
    pub parse_error: Option<String>,
    pub contact: ContactDto,
    pub skills: Vec<String>,
    #[schema(value_type = Object)]
    pub experience: serde_json::Value,
    #[schema(value_type = Object)]
    pub education: serde_json::Value,
    /// Full structured output of the parser
    #[schema(value_type = Option<Object>)]
    pub parsed_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Resume> for ResumeDto {
    fn from(resume: Resume) -> Self {
        Self {
            id: resume.id,
            filename: resume.filename,
            file_size: resume.file_size,
            content_type: resume.content_type,
            parse_status: resume.parse_status,
            parse_error: resume.parse_error,
            contact: ContactDto {
                name: resume.name,
                email: resume.email,
                phone: resume.phone,
            },
            skills: resume.skills.0,
            experience: resume.experience.0,
            education: resume.education.0,
            parsed_data: resume.parsed_data.map(|d| d.0),
            created_at: resume.created_at,
            updated_at: resume.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteResumeQuery {
    /// Delete even when applications reference the resume
    #[serde(default)]
    pub force: bool,
}

/// Application that still references a resume
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LinkedApplicationDto {
    pub id: Uuid,
    pub job_title: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResumeResponseDto {
    pub id: Uuid,
    pub deleted_applications: usize,
}

/// Outcome of a delete request
#[derive(Debug)]
pub enum ResumeDeletion {
    Deleted(DeleteResumeResponseDto),
    Blocked(Vec<LinkedApplicationDto>),
}

/// An upload that passed the type and size checks
#[derive(Debug)]
pub struct ResumeUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Canonical MIME type for an allowed extension
fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => ALLOWED_RESUME_MIME_TYPES[0],
        _ => ALLOWED_RESUME_MIME_TYPES[1],
    }
}

/// Checks name, declared type and size of an uploaded resume.
///
/// The extension decides the stored content type; a declared type is only
/// checked when the client sent something more specific than octet-stream.
pub fn check_resume_upload(
    filename: &str,
    declared_type: Option<&str>,
    data: Vec<u8>,
    max_size: usize,
) -> Result<ResumeUpload> {
    if filename.trim().is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }
    if data.len() > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Maximum size is {} MB",
            max_size / 1024 / 1024
        )));
    }

    let ext = file_extension(filename)
        .filter(|ext| ALLOWED_RESUME_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "Invalid file type. Allowed types: {}",
                ALLOWED_RESUME_EXTENSIONS.join(", ")
            ))
        })?;

    let canonical = mime_for_extension(&ext);
    if let Some(declared) = declared_type.map(|t| t.trim().to_ascii_lowercase()) {
        let generic = declared.is_empty() || declared == "application/octet-stream";
        if !generic && declared != canonical {
            return Err(AppError::UnsupportedMediaType(format!(
                "Content type '{}' does not match a .{} file",
                declared, ext
            )));
        }
    }

    Ok(ResumeUpload {
        filename: filename.to_string(),
        content_type: canonical.to_string(),
        data,
    })
}
