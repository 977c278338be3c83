//! Catalog filter specification.
//!
//! A strongly typed filter struct validated at the boundary before it
//! reaches the query builder; the HTTP layer deserializes into this rather
//! than binding request parameters dynamically.

use serde::Deserialize;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{AttendanceDay, Rating};

/// Largest allowed page size.
pub const MAX_PAGE_SIZE: u32 = 20;

/// Search filters for circle listings.
///
/// Absent fields contribute no condition: the default filter matches every
/// live circle.
#[derive(Debug, Clone, Deserialize)]
pub struct CircleFilter {
    /// Case-insensitive substring match against the circle name.
    #[serde(default)]
    pub search: Option<String>,

    /// Match any of these ratings. One value means equality.
    #[serde(default)]
    pub ratings: Vec<Rating>,

    /// Match this attendance day.
    #[serde(default)]
    pub day: Option<AttendanceDay>,

    /// Circle must be linked to at least one of these fandoms.
    #[serde(default)]
    pub fandom_ids: Vec<i64>,

    /// Circle must be linked to at least one of these work types.
    #[serde(default)]
    pub work_type_ids: Vec<i64>,

    /// Restrict to circles attending the event with this slug.
    #[serde(default)]
    pub event_slug: Option<String>,

    /// Restrict to circles the acting user has bookmarked.
    #[serde(default)]
    pub bookmarked_only: bool,

    /// 1-indexed page number.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page, 1..=MAX_PAGE_SIZE.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for CircleFilter {
    fn default() -> Self {
        Self {
            search: None,
            ratings: Vec::new(),
            day: None,
            fandom_ids: Vec::new(),
            work_type_ids: Vec::new(),
            event_slug: None,
            bookmarked_only: false,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl CircleFilter {
    /// Reject out-of-range paging before anything touches the database.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.page < 1 {
            return Err(CatalogError::InvalidFilter(format!(
                "page must be >= 1, got {}",
                self.page
            )));
        }
        if self.limit < 1 || self.limit > MAX_PAGE_SIZE {
            return Err(CatalogError::InvalidFilter(format!(
                "limit must be in 1..={MAX_PAGE_SIZE}, got {}",
                self.limit
            )));
        }
        Ok(())
    }

    /// Free-text term, if one is actually present.
    pub(crate) fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether any list-valued join condition is present. When true, the
    /// join fans out and circle counts must use DISTINCT.
    pub fn needs_distinct(&self) -> bool {
        !self.fandom_ids.is_empty() || !self.work_type_ids.is_empty()
    }

    /// Row offset of the requested page window.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_valid_and_open() {
        let filter = CircleFilter::default();
        assert!(filter.validate().is_ok());
        assert!(!filter.needs_distinct());
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn page_zero_rejected() {
        let filter = CircleFilter {
            page: 0,
            ..Default::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(CatalogError::InvalidFilter(_))
        ));
    }

    #[test]
    fn limit_bounds_enforced() {
        for limit in [0, MAX_PAGE_SIZE + 1, 100] {
            let filter = CircleFilter {
                limit,
                ..Default::default()
            };
            assert!(
                matches!(filter.validate(), Err(CatalogError::InvalidFilter(_))),
                "limit {limit} should be rejected"
            );
        }
        for limit in [1, 10, MAX_PAGE_SIZE] {
            let filter = CircleFilter {
                limit,
                ..Default::default()
            };
            assert!(filter.validate().is_ok(), "limit {limit} should pass");
        }
    }

    #[test]
    fn offset_follows_page_window() {
        let filter = CircleFilter {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn blank_search_contributes_nothing() {
        let filter = CircleFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), None);

        let filter = CircleFilter {
            search: Some("  ink ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), Some("ink"));
    }

    #[test]
    fn distinct_flag_tracks_join_filters() {
        let filter = CircleFilter {
            fandom_ids: vec![7],
            ..Default::default()
        };
        assert!(filter.needs_distinct());

        let filter = CircleFilter {
            work_type_ids: vec![1, 3],
            ..Default::default()
        };
        assert!(filter.needs_distinct());

        let filter = CircleFilter {
            ratings: vec![Rating::Ga],
            ..Default::default()
        };
        assert!(!filter.needs_distinct(), "scalar filters do not fan out");
    }

    #[test]
    fn filter_deserializes_with_defaults() {
        let filter: CircleFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_SIZE);

        let filter: CircleFilter =
            serde_json::from_str(r#"{"ratings": ["GA", "PG"], "day": "both", "page": 2}"#).unwrap();
        assert_eq!(filter.ratings, vec![Rating::Ga, Rating::Pg]);
        assert_eq!(filter.day, Some(AttendanceDay::Both));
        assert_eq!(filter.page, 2);
    }
}
