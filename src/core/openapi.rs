use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::applications::{
    dtos as applications_dtos, handlers as applications_handlers,
    models as applications_models,
};
use crate::features::auth::{self, dtos as auth_dtos, handlers as auth_handlers};
use crate::features::candidate::{dtos as candidate_dtos, handlers as candidate_handlers};
use crate::features::health::{dto as health_dto, handler as health_handler};
use crate::features::hr::{dtos as hr_dtos, handlers as hr_handlers};
use crate::features::interviews::{
    dtos as interviews_dtos, handlers as interviews_handlers, models as interviews_models,
};
use crate::features::jobs::{dtos as jobs_dtos, handlers as jobs_handlers};
use crate::features::realtime::{events as realtime_events, handlers as realtime_handlers};
use crate::features::resumes::{
    dtos as resumes_dtos, handlers as resumes_handlers, models as resumes_models,
};
use crate::features::users::models as users_models;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth_handlers::register,
        auth_handlers::login,
        auth_handlers::get_user,
        auth_handlers::update_role,
        auth_handlers::delete_account,
        auth_handlers::github_login,
        auth_handlers::github_authorize,
        // Resumes
        resumes_handlers::upload_resume,
        resumes_handlers::list_resumes,
        resumes_handlers::get_resume,
        resumes_handlers::download_resume,
        resumes_handlers::delete_resume,
        resumes_handlers::resume_insights,
        // Jobs
        jobs_handlers::list_jobs,
        jobs_handlers::create_job,
        jobs_handlers::job_statistics,
        jobs_handlers::get_job,
        jobs_handlers::update_job,
        jobs_handlers::update_job_status,
        jobs_handlers::delete_job,
        // Applications
        applications_handlers::apply_to_job,
        applications_handlers::rank_job_candidates,
        applications_handlers::list_my_applications,
        applications_handlers::my_application_stats,
        applications_handlers::get_application,
        applications_handlers::withdraw_application,
        applications_handlers::update_application_status,
        applications_handlers::application_match_analysis,
        applications_handlers::match_job_with_resume,
        applications_handlers::best_job_matches,
        applications_handlers::application_skill_gap,
        applications_handlers::compare_job_candidates,
        // HR
        hr_handlers::list_hr_jobs,
        hr_handlers::bulk_job_action,
        hr_handlers::list_hr_applications,
        hr_handlers::bulk_application_action,
        hr_handlers::update_application_feedback,
        hr_handlers::hr_metrics,
        // Interviews
        interviews_handlers::create_interview,
        interviews_handlers::list_interviews,
        interviews_handlers::upcoming_interviews,
        interviews_handlers::get_interview,
        interviews_handlers::update_interview,
        interviews_handlers::cancel_interview,
        interviews_handlers::interview_feedback,
        // Candidate
        candidate_handlers::candidate_dashboard,
        candidate_handlers::candidate_interviews,
        candidate_handlers::candidate_upcoming_interviews,
        // Realtime
        realtime_handlers::ws_handler,
        // Health
        health_handler::health_check,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            users_models::UserRole,
            auth_dtos::RegisterRequestDto,
            auth_dtos::LoginRequestDto,
            auth_dtos::UpdateRoleRequestDto,
            auth_dtos::UserDto,
            auth_dtos::AuthResponseDto,
            auth_dtos::GithubLoginResponseDto,
            auth_dtos::DeleteAccountResponseDto,
            ApiResponse<auth_dtos::AuthResponseDto>,
            ApiResponse<auth_dtos::UserDto>,
            // Resumes
            resumes_models::ResumeParseStatus,
            resumes_models::ResumeInsights,
            resumes_dtos::UploadResumeDto,
            resumes_dtos::ContactDto,
            resumes_dtos::ResumeDto,
            resumes_dtos::LinkedApplicationDto,
            resumes_dtos::DeleteResumeResponseDto,
            ApiResponse<resumes_dtos::ResumeDto>,
            // Jobs
            jobs_dtos::RequirementsInput,
            jobs_dtos::CreateJobDto,
            jobs_dtos::UpdateJobDto,
            jobs_dtos::UpdateJobStatusDto,
            jobs_dtos::JobDto,
            jobs_dtos::JobDeletionDto,
            jobs_dtos::CountByKeyDto,
            jobs_dtos::JobStatisticsDto,
            ApiResponse<jobs_dtos::JobDto>,
            // Applications
            applications_models::ApplicationStatus,
            applications_models::MatchAnalysis,
            applications_dtos::ApplyJobDto,
            applications_dtos::UpdateApplicationStatusDto,
            applications_dtos::ApplicationDto,
            applications_dtos::ApplicationDetailDto,
            applications_dtos::ApplyResponseDto,
            applications_dtos::ApplicationStatsDto,
            applications_dtos::KeywordMatchDto,
            applications_dtos::MatchAnalysisDto,
            applications_dtos::JobMatchRequestDto,
            applications_dtos::ResumeMatchDto,
            applications_dtos::JobMatchResultsDto,
            applications_dtos::ResumeJobMatchDto,
            applications_dtos::SkillGapDto,
            applications_dtos::JobMatchSummaryDto,
            applications_dtos::ResumeBestMatchesDto,
            applications_dtos::BestMatchesDto,
            applications_dtos::CompareCandidatesDto,
            ApiResponse<applications_dtos::ApplicationDetailDto>,
            // HR
            hr_dtos::JobStatusFilter,
            hr_dtos::DateRange,
            hr_dtos::HrJobDto,
            hr_dtos::BulkJobAction,
            hr_dtos::BulkJobActionDto,
            hr_dtos::BulkJobResultDto,
            hr_dtos::ApplicationSortField,
            hr_dtos::SortOrder,
            hr_dtos::BulkApplicationAction,
            hr_dtos::BulkApplicationActionDto,
            hr_dtos::BulkApplicationResultDto,
            hr_dtos::FeedbackDto,
            hr_dtos::HrMetricsDto,
            // Interviews
            interviews_models::InterviewType,
            interviews_models::InterviewStatus,
            interviews_models::InterviewRecommendation,
            interviews_dtos::CreateInterviewDto,
            interviews_dtos::UpdateInterviewDto,
            interviews_dtos::InterviewFeedbackDto,
            interviews_dtos::InterviewDto,
            ApiResponse<interviews_dtos::InterviewDto>,
            // Candidate
            candidate_dtos::CandidateStatsDto,
            candidate_dtos::ProfileCompletionDto,
            candidate_dtos::CandidateDashboardDto,
            // Realtime
            realtime_events::RealtimeEvent,
            realtime_events::JobEvent,
            realtime_events::ApplicationEvent,
            realtime_events::ApplicationStatusEvent,
            realtime_events::BulkApplicationEvent,
            realtime_events::ResumeParsedEvent,
            realtime_events::InterviewEvent,
            realtime_events::ConnectedEvent,
            // Health
            health_dto::IntegrationFlags,
            health_dto::ComponentStatus,
            health_dto::ServiceStatus,
            health_dto::HealthDto,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and GitHub sign-in"),
        (name = "resumes", description = "Resume upload, parsing and insights"),
        (name = "jobs", description = "Job postings"),
        (name = "applications", description = "Job applications and matching"),
        (name = "hr", description = "HR dashboard and bulk operations"),
        (name = "interviews", description = "Interview scheduling and feedback"),
        (name = "candidate", description = "Candidate dashboard"),
        (name = "realtime", description = "WebSocket event stream"),
        (name = "health", description = "Service health"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Hireflow API",
        version = "0.1.0",
        description = "API documentation for Hireflow",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/jobs"));
        assert!(doc.paths.paths.contains_key("/api/jobs/applications/{id}"));
        assert!(doc.paths.paths.contains_key("/api/hr/applications/bulk"));
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/jobs/{id}/match-with-resume/{resume_id}"));
        assert!(doc.paths.paths.contains_key("/api/jobs/best-matches/user-resumes"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_swagger_info_modifier_overrides_info() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "Custom docs".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
        assert_eq!(doc.info.description.as_deref(), Some("Custom docs"));
    }
}
