use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::guards::RequireCandidate;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::resumes::dtos::{
    check_resume_upload, DeleteResumeQuery, DeleteResumeResponseDto, LinkedApplicationDto,
    ResumeDeletion, ResumeDto, ResumeUpload, UploadResumeDto,
};
use crate::features::resumes::models::ResumeInsights;
use crate::features::resumes::services::ResumeService;
use crate::features::resumes::workers::ResumeParser;
use crate::shared::types::{ApiResponse, Meta};

#[derive(Clone)]
pub struct ResumeState {
    pub service: Arc<ResumeService>,
    pub parser: Arc<ResumeParser>,
    pub max_upload_size: usize,
}

async fn read_upload(multipart: &mut Multipart, max_size: usize) -> Result<ResumeUpload> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("File too large".to_string())
        } else {
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        }
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" && field_name != "resume" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge("File too large".to_string())
            } else {
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            }
        })?;

        return check_resume_upload(&file_name, content_type.as_deref(), data.to_vec(), max_size);
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

/// Upload a resume
///
/// The resume is stored right away with `parse_status = pending`; parsing
/// runs in the background and ends with a `resume_parsed` event.
#[utoipa::path(
    post,
    path = "/api/resumes/upload",
    tag = "resumes",
    request_body(content = UploadResumeDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Resume stored, parsing started", body = ApiResponse<ResumeDto>),
        (status = 400, description = "Missing or empty file"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Candidate role required"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Not a PDF or DOCX file")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_resume(
    RequireCandidate(user): RequireCandidate,
    State(state): State<ResumeState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ResumeDto>>)> {
    let upload = read_upload(&mut multipart, state.max_upload_size).await?;
    let resume = state.service.create(user.id, upload).await?;

    state.parser.spawn(resume.clone());

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(resume.into()),
            Some("Resume uploaded, parsing in progress".to_string()),
            None,
        )),
    ))
}

/// List the caller's resumes, newest first
#[utoipa::path(
    get,
    path = "/api/resumes/list",
    tag = "resumes",
    responses(
        (status = 200, description = "Resumes of the current user", body = ApiResponse<Vec<ResumeDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_resumes(
    user: AuthenticatedUser,
    State(state): State<ResumeState>,
) -> Result<Json<ApiResponse<Vec<ResumeDto>>>> {
    let resumes: Vec<ResumeDto> = state
        .service
        .list_for_user(user.id)
        .await?
        .into_iter()
        .map(ResumeDto::from)
        .collect();
    let total = resumes.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(resumes),
        None,
        Some(Meta { total }),
    )))
}

/// Get one of the caller's resumes
#[utoipa::path(
    get,
    path = "/api/resumes/{id}",
    tag = "resumes",
    params(("id" = Uuid, Path, description = "Resume ID")),
    responses(
        (status = 200, description = "Resume", body = ApiResponse<ResumeDto>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_resume(
    user: AuthenticatedUser,
    State(state): State<ResumeState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResumeDto>>> {
    let resume = state.service.get_owned(user.id, id).await?;
    Ok(Json(ApiResponse::success(Some(resume.into()), None, None)))
}

/// Download the stored resume file
#[utoipa::path(
    get,
    path = "/api/resumes/{id}/download",
    tag = "resumes",
    params(("id" = Uuid, Path, description = "Resume ID")),
    responses(
        (status = 200, description = "Resume file", content_type = "application/octet-stream"),
        (status = 403, description = "No access to this resume"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_resume(
    user: AuthenticatedUser,
    State(state): State<ResumeState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let (resume, data) = state.service.download(&user, id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        resume.filename.replace(['"', '\\', '\r', '\n'], "_")
    );
    let mut response = Response::new(Body::from(data));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&resume.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or(HeaderValue::from_static("attachment")),
    );
    Ok(response)
}

/// Delete a resume
///
/// Responds 409 with the referencing applications unless `force=true`.
#[utoipa::path(
    delete,
    path = "/api/resumes/{id}",
    tag = "resumes",
    params(("id" = Uuid, Path, description = "Resume ID"), DeleteResumeQuery),
    responses(
        (status = 200, description = "Resume deleted", body = ApiResponse<DeleteResumeResponseDto>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Resume not found"),
        (status = 409, description = "Resume is used by applications", body = ApiResponse<Vec<LinkedApplicationDto>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_resume(
    user: AuthenticatedUser,
    State(state): State<ResumeState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteResumeQuery>,
) -> Result<Response> {
    match state.service.delete(user.id, id, query.force).await? {
        ResumeDeletion::Deleted(result) => Ok(Json(ApiResponse::success(
            Some(result),
            Some("Resume deleted".to_string()),
            None,
        ))
        .into_response()),
        ResumeDeletion::Blocked(applications) => {
            let body = ApiResponse {
                success: false,
                message: Some(format!(
                    "Resume is used by {} application(s). Pass force=true to delete them too",
                    applications.len()
                )),
                meta: Some(Meta {
                    total: applications.len() as i64,
                }),
                data: Some(applications),
                errors: None,
            };
            Ok((StatusCode::CONFLICT, Json(body)).into_response())
        }
    }
}

/// AI insights for a parsed resume
#[utoipa::path(
    get,
    path = "/api/resumes/{id}/insights",
    tag = "resumes",
    params(("id" = Uuid, Path, description = "Resume ID")),
    responses(
        (status = 200, description = "Insights", body = ApiResponse<ResumeInsights>),
        (status = 400, description = "Resume not parsed yet"),
        (status = 502, description = "Insights provider unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn resume_insights(
    user: AuthenticatedUser,
    State(state): State<ResumeState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResumeInsights>>> {
    let insights = state.service.insights(user.id, id).await?;
    Ok(Json(ApiResponse::success(Some(insights), None, None)))
}
