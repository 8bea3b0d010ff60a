use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::{BTreeMap, HashSet};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::applications::dtos::ApplicationDetailDto;
use crate::features::applications::models::ApplicationStatus;
use crate::features::jobs::dtos::JobDto;
use crate::features::jobs::models::Job;
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_BULK_IDS};
use crate::shared::types::PaginationQuery;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Deduplicates bulk ids, keeping the first occurrence, and checks the count
pub fn check_bulk_ids(ids: &[Uuid]) -> Result<Vec<Uuid>> {
    if ids.is_empty() {
        return Err(AppError::Validation("At least one id is required".to_string()));
    }
    if ids.len() > MAX_BULK_IDS {
        return Err(AppError::Validation(format!(
            "At most {} ids can be processed at once",
            MAX_BULK_IDS
        )));
    }

    let mut seen = HashSet::new();
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatusFilter {
    Active,
    Inactive,
    #[default]
    All,
}

impl JobStatusFilter {
    /// `is_active` value to match, if any
    pub fn is_active(&self) -> Option<bool> {
        match self {
            JobStatusFilter::Active => Some(true),
            JobStatusFilter::Inactive => Some(false),
            JobStatusFilter::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DateRange {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            DateRange::Week => 7,
            DateRange::Month => 30,
            DateRange::Quarter => 90,
            DateRange::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HrJobListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit", alias = "page_size", alias = "per_page")]
    pub limit: i64,
    /// Matches title, company or location
    pub search: Option<String>,
    #[serde(default)]
    pub status: JobStatusFilter,
    #[serde(default)]
    pub date_range: DateRange,
}

impl HrJobListQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct HrJobRow {
    #[sqlx(flatten)]
    pub job: Job,
    pub application_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HrJobDto {
    #[serde(flatten)]
    pub job: JobDto,
    pub application_count: i64,
}

impl From<HrJobRow> for HrJobDto {
    fn from(row: HrJobRow) -> Self {
        Self {
            job: row.job.into(),
            application_count: row.application_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BulkJobAction {
    Activate,
    Deactivate,
    Delete,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkJobActionDto {
    pub action: BulkJobAction,
    /// 1 to 100 ids
    pub job_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkJobResultDto {
    pub action: BulkJobAction,
    pub requested_count: usize,
    pub affected_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSortField {
    #[default]
    CreatedAt,
    MatchScore,
    Status,
}

impl ApplicationSortField {
    pub fn column(&self) -> &'static str {
        match self {
            ApplicationSortField::CreatedAt => "a.created_at",
            ApplicationSortField::MatchScore => "a.match_score",
            ApplicationSortField::Status => "a.status",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HrApplicationListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit", alias = "page_size", alias = "per_page")]
    pub limit: i64,
    pub job_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
    /// Matches candidate name or email, job title or resume filename
    pub search: Option<String>,
    pub min_match_score: Option<f64>,
    /// Inclusive, YYYY-MM-DD
    pub date_from: Option<NaiveDate>,
    /// Inclusive, YYYY-MM-DD
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub sort_by: ApplicationSortField,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl HrApplicationListQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.limit)
    }

    /// Half-open `[from, to)` bounds for `created_at`
    pub fn created_bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(AppError::Validation(
                    "date_from cannot be after date_to".to_string(),
                ));
            }
        }
        if let Some(score) = self.min_match_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(AppError::Validation(
                    "min_match_score must be between 0 and 1".to_string(),
                ));
            }
        }

        let start = |d: NaiveDate| d.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
        Ok((
            self.date_from.and_then(start),
            self.date_to
                .and_then(|d| d.succ_opt())
                .and_then(start),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BulkApplicationAction {
    SetStatus,
    Delete,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkApplicationActionDto {
    pub action: BulkApplicationAction,
    /// Required for `set_status`
    pub status: Option<ApplicationStatus>,
    /// 1 to 100 ids
    pub application_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkApplicationResultDto {
    pub action: BulkApplicationAction,
    pub requested_count: usize,
    pub affected_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct FeedbackDto {
    #[validate(length(min = 1, max = 5000, message = "Feedback must be 1-5000 characters"))]
    pub feedback: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HrMetricsDto {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub total_applications: i64,
    pub pending_applications: i64,
    /// Received in the last 7 days
    pub recent_applications: i64,
    pub average_applications_per_job: f64,
    pub status_breakdown: BTreeMap<String, i64>,
    pub recent_activity: Vec<ApplicationDetailDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bulk_ids_dedupe_and_bounds() {
        let id = Uuid::now_v7();
        let other = Uuid::now_v7();
        assert_eq!(check_bulk_ids(&[id, other, id]).unwrap(), vec![id, other]);
        assert!(check_bulk_ids(&[]).is_err());

        let too_many: Vec<Uuid> = (0..=MAX_BULK_IDS).map(|_| Uuid::now_v7()).collect();
        assert!(check_bulk_ids(&too_many).is_err());
    }

    #[test]
    fn test_date_range_since() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(DateRange::All.since(now), None);
        assert_eq!(
            DateRange::Week.since(now),
            Some(Utc.with_ymd_and_hms(2025, 3, 24, 12, 0, 0).unwrap())
        );
        let parsed: DateRange = serde_json::from_str("\"90d\"").unwrap();
        assert_eq!(parsed, DateRange::Quarter);
    }

    fn application_query(value: serde_json::Value) -> HrApplicationListQuery {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_created_bounds_include_end_day() {
        let query = application_query(serde_json::json!({
            "date_from": "2025-01-01",
            "date_to": "2025-01-31"
        }));
        let (from, to) = query.created_bounds().unwrap();
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(to, Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()));
        assert_eq!(query.sort_by, ApplicationSortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_created_bounds_reject_inverted_range() {
        let query = application_query(serde_json::json!({
            "date_from": "2025-02-01",
            "date_to": "2025-01-01"
        }));
        assert!(query.created_bounds().is_err());

        let query = application_query(serde_json::json!({ "min_match_score": 1.5 }));
        assert!(query.created_bounds().is_err());
    }
}
