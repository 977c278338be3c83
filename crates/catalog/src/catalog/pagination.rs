//! Page metadata arithmetic.

use serde::Serialize;

/// Pagination metadata attached to a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed).
    pub page: u32,

    /// Items per page.
    pub limit: u32,

    /// Total matching circles across all pages.
    pub total_docs: u64,

    /// Total number of pages; 0 when nothing matches.
    pub total_pages: u64,

    /// Whether a later page exists.
    pub has_next_page: bool,
}

impl Pagination {
    /// Compute page metadata. `limit` is caller-validated to be >= 1.
    pub fn new(total_docs: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_docs.div_ceil(u64::from(limit))
        };

        Self {
            page,
            limit,
            total_docs,
            total_pages,
            has_next_page: u64::from(page) < total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_has_zero_pages() {
        let meta = Pagination::new(0, 1, 20);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 1, 20).total_pages, 1);
        assert_eq!(Pagination::new(20, 1, 20).total_pages, 1);
        assert_eq!(Pagination::new(21, 1, 20).total_pages, 2);
        assert_eq!(Pagination::new(100, 1, 20).total_pages, 5);
    }

    #[test]
    fn has_next_page_tracks_position() {
        // totalDocs in {0, 1, limit, limit+1, 5*limit} with limit 10.
        assert!(!Pagination::new(0, 1, 10).has_next_page);
        assert!(!Pagination::new(1, 1, 10).has_next_page);
        assert!(!Pagination::new(10, 1, 10).has_next_page);
        assert!(Pagination::new(11, 1, 10).has_next_page);
        assert!(!Pagination::new(11, 2, 10).has_next_page);
        assert!(Pagination::new(50, 4, 10).has_next_page);
        assert!(!Pagination::new(50, 5, 10).has_next_page);
    }

    #[test]
    fn page_beyond_last_has_no_next() {
        let meta = Pagination::new(15, 9, 10);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next_page);
    }
}
