//! Pagination constants and clamping helpers for list endpoints.
//!
//! Lives in `core` (zero internal deps) so the repository layer and the
//! HTTP layer agree on the same bounds.

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum number of items per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a 1-based page number. Values below 1 (or absent) become 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Clamp a page size into `1..=MAX_PAGE_SIZE`, defaulting to [`DEFAULT_PAGE_SIZE`].
pub fn clamp_page_size(page_size: Option<i64>) -> i64 {
    page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Row offset for a clamped page / page size pair.
pub fn offset(page: i64, page_size: i64) -> i64 {
    (page - 1) * page_size
}
