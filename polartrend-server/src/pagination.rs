//! Pagination utilities

/// Default page size for listing endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Page size after clamping
    pub limit: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page/limit
///
/// Ensures page is within valid bounds [1, total_pages] and limit within
/// [1, MAX_PAGE_SIZE].
pub fn calculate_pagination(total_results: i64, requested_page: i64, requested_limit: i64) -> Pagination {
    let limit = requested_limit.max(1).min(MAX_PAGE_SIZE);
    let total_pages = (total_results + limit - 1) / limit;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * limit;

    Pagination {
        page,
        limit,
        total_pages,
        offset,
    }
}
