//! Messages pushed to dashboards over the WebSocket channel.
//!
//! Every message is `{"kind": <event>, "payload": {...}}`. Payloads only carry
//! ids and small hints; clients re-fetch the REST view on receipt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::applications::models::ApplicationStatus;
use crate::features::resumes::models::ResumeParseStatus;
use crate::features::users::models::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobEvent {
    pub job_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationEvent {
    pub application_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationStatusEvent {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub old_status: ApplicationStatus,
    pub new_status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BulkApplicationEvent {
    pub action: String,
    pub application_ids: Vec<Uuid>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResumeParsedEvent {
    pub resume_id: Uuid,
    pub parse_status: ResumeParseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InterviewEvent {
    pub interview_id: Uuid,
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConnectedEvent {
    pub user_id: Uuid,
    pub role: Option<UserRole>,
}

/// Server to client message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum RealtimeEvent {
    JobCreated(JobEvent),
    JobUpdated(JobEvent),
    JobDeleted(JobEvent),
    NewApplication(ApplicationEvent),
    ApplicationStatusChanged(ApplicationStatusEvent),
    ApplicationWithdrawn(ApplicationEvent),
    ApplicationFeedbackAdded(ApplicationEvent),
    BulkApplicationUpdate(BulkApplicationEvent),
    ResumeParsed(ResumeParsedEvent),
    InterviewScheduled(InterviewEvent),
    InterviewUpdated(InterviewEvent),
    InterviewCancelled(InterviewEvent),
    Connected(ConnectedEvent),
    Pong,
}

impl RealtimeEvent {
    /// Wire name of the event, as sent in `kind`
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::JobCreated(_) => "job_created",
            RealtimeEvent::JobUpdated(_) => "job_updated",
            RealtimeEvent::JobDeleted(_) => "job_deleted",
            RealtimeEvent::NewApplication(_) => "new_application",
            RealtimeEvent::ApplicationStatusChanged(_) => "application_status_changed",
            RealtimeEvent::ApplicationWithdrawn(_) => "application_withdrawn",
            RealtimeEvent::ApplicationFeedbackAdded(_) => "application_feedback_added",
            RealtimeEvent::BulkApplicationUpdate(_) => "bulk_application_update",
            RealtimeEvent::ResumeParsed(_) => "resume_parsed",
            RealtimeEvent::InterviewScheduled(_) => "interview_scheduled",
            RealtimeEvent::InterviewUpdated(_) => "interview_updated",
            RealtimeEvent::InterviewCancelled(_) => "interview_cancelled",
            RealtimeEvent::Connected(_) => "connected",
            RealtimeEvent::Pong => "pong",
        }
    }
}

/// Client to server message. Anything that does not parse is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}
