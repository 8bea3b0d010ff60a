use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::core::error::{AppError, Result};
use crate::features::jobs::models::Job;
use crate::shared::types::PaginationQuery;
use crate::shared::validation::CATEGORY_REGEX;

/// Requirements as sent by clients: a list, or one block of text
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RequirementsInput {
    List(Vec<String>),
    Text(String),
}

impl RequirementsInput {
    pub fn into_list(self) -> Vec<String> {
        match self {
            RequirementsInput::List(items) => clean_items(items.iter().map(String::as_str)),
            RequirementsInput::Text(text) => split_requirements(&text),
        }
    }
}

fn clean_items<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(|item| item.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// One requirement per line; a single line is split on commas instead
pub fn split_requirements(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() == 1 {
        clean_items(lines[0].split(','))
    } else {
        clean_items(lines.into_iter())
    }
}

fn validate_category(category: &str) -> std::result::Result<(), ValidationError> {
    if CATEGORY_REGEX.is_match(category) {
        Ok(())
    } else {
        let mut err = ValidationError::new("category");
        err.message = Some("Category must be a lowercase slug such as 'engineering'".into());
        Err(err)
    }
}

/// Rejects a range whose minimum exceeds its maximum
pub fn check_salary_range(salary_min: Option<i32>, salary_max: Option<i32>) -> Result<()> {
    match (salary_min, salary_max) {
        (Some(min), Some(max)) if min > max => Err(AppError::Validation(
            "salary_min cannot be greater than salary_max".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 255, message = "Title is required (max 255 characters)"))]
    pub title: String,

    #[validate(length(min = 1, max = 255, message = "Company is required (max 255 characters)"))]
    pub company: String,

    #[validate(length(min = 1, max = 255, message = "Location is required (max 255 characters)"))]
    pub location: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    /// List of requirements, or newline/comma separated text
    pub requirements: RequirementsInput,

    #[validate(length(min = 1, max = 64, message = "Employment type is required"))]
    pub employment_type: String,

    #[validate(custom(function = "validate_category"))]
    pub category: String,

    #[validate(range(min = 0, message = "Salary cannot be negative"))]
    pub salary_min: Option<i32>,

    #[validate(range(min = 0, message = "Salary cannot be negative"))]
    pub salary_max: Option<i32>,

    /// Defaults to true
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateJobDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty (max 255 characters)"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Company cannot be empty (max 255 characters)"))]
    pub company: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Location cannot be empty (max 255 characters)"))]
    pub location: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub requirements: Option<RequirementsInput>,

    #[validate(length(min = 1, max = 64, message = "Employment type cannot be empty"))]
    pub employment_type: Option<String>,

    #[validate(custom(function = "validate_category"))]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Salary cannot be negative"))]
    pub salary_min: Option<i32>,

    #[validate(range(min = 0, message = "Salary cannot be negative"))]
    pub salary_max: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateJobStatusDto {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobDto {
    pub id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub employment_type: String,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobDto {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            created_by: job.created_by,
            title: job.title,
            company: job.company,
            description: job.description,
            requirements: job.requirements.0,
            location: job.location,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            employment_type: job.employment_type,
            category: job.category,
            is_active: job.is_active,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Filters for the public job list
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct JobListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit", alias = "page_size", alias = "per_page")]
    pub limit: i64,
    pub category: Option<String>,
    pub location: Option<String>,
    /// Jobs paying at least this much at the top of their range
    pub salary_min: Option<i32>,
    /// Jobs starting at or below this amount
    pub salary_max: Option<i32>,
    /// Employment type
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub employment_type: Option<String>,
    /// Matches title, company, description or location
    pub search: Option<String>,
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_limit() -> i64 {
    crate::shared::constants::DEFAULT_PAGE_SIZE
}

impl JobListQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.limit)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteJobQuery {
    /// Soft delete (default). Ignored when applications exist.
    pub soft_delete: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobDeletionDto {
    pub id: Uuid,
    pub soft_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CountByKeyDto {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatisticsDto {
    pub total_active: i64,
    pub by_category: Vec<CountByKeyDto>,
    pub top_locations: Vec<CountByKeyDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_requirements_by_lines() {
        let items = split_requirements("- Rust\n\n* PostgreSQL, Redis\n• Docker  ");
        assert_eq!(items, vec!["Rust", "PostgreSQL, Redis", "Docker"]);
    }

    #[test]
    fn test_split_single_line_on_commas() {
        let items = split_requirements("Rust, SQL , , Kubernetes");
        assert_eq!(items, vec!["Rust", "SQL", "Kubernetes"]);
    }

    #[test]
    fn test_requirements_accept_list_or_text() {
        let list: RequirementsInput = serde_json::from_str(r#"["Go", " "]"#).unwrap();
        assert_eq!(list.into_list(), vec!["Go"]);

        let text: RequirementsInput = serde_json::from_str(r#""Go, Rust""#).unwrap();
        assert_eq!(text.into_list(), vec!["Go", "Rust"]);
    }

    #[test]
    fn test_salary_range() {
        assert!(check_salary_range(Some(10), Some(20)).is_ok());
        assert!(check_salary_range(Some(10), None).is_ok());
        assert!(check_salary_range(Some(30), Some(20)).is_err());
    }

    #[test]
    fn test_create_job_validation() {
        let dto: CreateJobDto = serde_json::from_value(serde_json::json!({
            "title": "",
            "company": "Acme",
            "location": "Remote",
            "description": "Build things",
            "requirements": "Rust",
            "employment_type": "full-time",
            "category": "Engineering",
            "salary_min": -5
        }))
        .unwrap();

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("category"));
        assert!(fields.contains_key("salary_min"));
        assert!(!fields.contains_key("company"));
    }

    #[test]
    fn test_list_query_reads_type_param() {
        let query: JobListQuery = serde_json::from_value(serde_json::json!({
            "type": "full-time",
            "page": 2,
            "limit": 5
        }))
        .unwrap();
        assert_eq!(query.employment_type.as_deref(), Some("full-time"));
        assert_eq!(query.pagination().offset(), 5);
    }
}
