use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Standard pagination query parameters for all list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size", alias = "page_size", alias = "per_page")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Page number clamped to at least 1
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Calculate SQL OFFSET from page number. Saturates so a huge page
    /// yields an empty page instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Get clamped page size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of a list endpoint.
///
/// A page past the end is not an error: `items` is empty while `total` and
/// `total_pages` still describe the full result set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, query: &PaginationQuery) -> Self {
        let limit = query.limit();
        Self {
            items,
            total,
            page: query.page(),
            limit,
            total_pages: total_pages(total, limit),
        }
    }

    pub fn meta(&self) -> Meta {
        Meta { total: self.total }
    }
}

/// `ceil(total / limit)` without going through floating point
pub fn total_pages(total: i64, limit: i64) -> i64 {
    let limit = limit.max(1);
    if total <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
        assert_eq!(total_pages(31, 10), 4);
        assert_eq!(total_pages(1, 100), 1);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn test_offset_and_limit_are_clamped() {
        let query = PaginationQuery::new(0, 500);
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let query = PaginationQuery::new(3, 10);
        assert_eq!(query.offset(), 20);

        let query = PaginationQuery::new(2, -4);
        assert_eq!(query.limit(), 1);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let query = PaginationQuery::new(i64::MAX, 10);
        assert_eq!(query.offset(), i64::MAX);
        assert!(query.offset() >= 0);

        let page: Paginated<i32> = Paginated::new(vec![], 25, &query);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_paginated_first_page_of_25() {
        let query = PaginationQuery::new(1, 10);
        let items: Vec<i32> = (0..10).collect();
        let page = Paginated::new(items, 25, &query);

        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.meta().total, 25);
    }

    #[test]
    fn test_paginated_out_of_range_page_is_empty() {
        let query = PaginationQuery::new(9, 10);
        let page: Paginated<i32> = Paginated::new(vec![], 25, &query);

        assert!(page.items.is_empty());
        assert_eq!(page.page, 9);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_pagination_query_accepts_page_size_alias() {
        let query: PaginationQuery = serde_json::from_str(r#"{"page": 2, "page_size": 5}"#).unwrap();
        assert_eq!(query.limit(), 5);
        assert_eq!(query.offset(), 5);

        let query: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::error(Some("nope".into()), None)).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert_eq!(body["message"], "nope");
    }
}
