use serde::{Deserialize, Serialize};

use crate::models::requests::Pagination;
use crate::models::user::ClientSession;

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResults<T> {
    pub results: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
}

impl<T> PaginatedResults<T> {
    /// Slice an already filtered and ordered result list down to one page
    pub fn from_rows(rows: Vec<T>, pagination: &Pagination) -> Self {
        let page_size = pagination.page_size.max(1);
        let page = pagination.page.max(1);
        let total_rows = rows.len();
        let total_pages = total_rows.div_ceil(page_size);

        let results = rows
            .into_iter()
            .skip(Self::offset(pagination))
            .take(page_size)
            .collect();

        Self {
            results,
            page,
            page_size,
            total_rows,
            total_pages,
        }
    }

    /// Wrap a page that was already limited by the database
    pub fn with_total(results: Vec<T>, pagination: &Pagination, total_rows: usize) -> Self {
        let page_size = pagination.page_size.max(1);
        Self {
            results,
            page: pagination.page.max(1),
            page_size,
            total_rows,
            total_pages: total_rows.div_ceil(page_size),
        }
    }

    /// Offset of the first row on the requested page, saturating for pages far past the end
    pub fn offset(pagination: &Pagination) -> usize {
        (pagination.page.max(1) - 1).saturating_mul(pagination.page_size.max(1))
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Sessions held in the in-process cache tier
    pub cached_sessions: u64,
    pub redis_enabled: bool,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: String,
    pub session: ClientSession,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_middle_page() {
        let rows: Vec<u32> = (1..=12).collect();
        let page = PaginatedResults::from_rows(rows, &Pagination { page: 2, page_size: 5 });
        assert_eq!(page.results, vec![6, 7, 8, 9, 10]);
        assert_eq!(page.total_rows, 12);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_from_rows_past_end() {
        let rows: Vec<u32> = (1..=3).collect();
        let page = PaginatedResults::from_rows(rows, &Pagination { page: 4, page_size: 5 });
        assert!(page.results.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_huge_page_is_empty() {
        let pagination = Pagination { page: usize::MAX / 2, page_size: 25 };
        assert_eq!(PaginatedResults::<u32>::offset(&pagination), usize::MAX);

        let page = PaginatedResults::from_rows(vec![1u32, 2, 3], &pagination);
        assert!(page.results.is_empty());
        assert_eq!(page.total_rows, 3);
    }
}
