//! Offset-based pagination helpers.
//!
//! List endpoints accept `page` and `per_page` query parameters and return
//! the matching rows together with a metadata block whose `total` counts
//! every matching non-tombstoned row, independent of the page size.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PER_PAGE: i64 = 15;

/// Upper bound on the page size a client may request.
pub const MAX_PER_PAGE: i64 = 100;

/// Parsed pagination parameters, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub per_page: i64,
}

impl PageParams {
    /// Builds page parameters from raw query values.
    ///
    /// `page` defaults to 1, `per_page` to [`DEFAULT_PER_PAGE`]; out-of-range
    /// values are clamped rather than rejected.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Self { page, per_page }
    }

    /// Row offset for the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    /// Row limit for the current page.
    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside a page of rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PageMeta {
    /// Computes metadata for a total row count under the given parameters.
    pub fn new(total: i64, params: PageParams) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + params.per_page - 1) / params.per_page
        };
        Self {
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages,
        }
    }
}

/// A page of rows plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        Self {
            items,
            meta: PageMeta::new(total, params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::new(None, None);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, DEFAULT_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let params = PageParams::new(Some(3), Some(20));
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams::new(Some(0), Some(10_000));
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, MAX_PER_PAGE);

        let params = PageParams::new(Some(-5), Some(0));
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 1);
    }

    #[test]
    fn test_meta_rounds_up_total_pages() {
        let meta = PageMeta::new(31, PageParams::new(Some(1), Some(15)));
        assert_eq!(meta.total_pages, 3);

        let meta = PageMeta::new(30, PageParams::new(Some(1), Some(15)));
        assert_eq!(meta.total_pages, 2);
    }

    #[test]
    fn test_meta_empty_result() {
        let meta = PageMeta::new(0, PageParams::default());
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.total, 0);
    }

    #[test]
    fn test_total_independent_of_page_size() {
        let small = PageMeta::new(57, PageParams::new(Some(1), Some(5)));
        let large = PageMeta::new(57, PageParams::new(Some(1), Some(50)));
        assert_eq!(small.total, large.total);
    }

    #[test]
    fn test_page_serialization() {
        let page = Page::new(vec![1, 2, 3], 3, PageParams::new(Some(1), Some(15)));
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["items"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["meta"]["total"], 3);
        assert_eq!(json["meta"]["total_pages"], 1);
    }
}
