//! Pagination utilities for list endpoints.
//!
//! List endpoints accept `limit` together with either `page` (1-indexed) or
//! `offset`. When `page` is provided it takes precedence over `offset`.
//!
//! ```ignore
//! // GET /api/students?limit=20&page=3
//! let limit = params.limit();   // 20
//! let offset = params.offset(); // 40
//! let meta = PaginationMeta::new(total, &params);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Query strings arrive as text, and flattened structs lose type hints, so
/// numbers are parsed by hand. Empty strings count as absent.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata returned next to a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching items across all pages
    pub total: i64,
    /// Limit that was applied
    pub limit: i64,
    /// Number of items skipped
    pub offset: i64,
    /// Current page, when page-based pagination was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Number of pages at the applied limit
    pub total_pages: i64,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    #[must_use]
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();
        let total = total.max(0);

        Self {
            total,
            limit,
            offset,
            page: params.page(),
            total_pages: total.saturating_add(limit - 1) / limit,
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// `limit` / `offset` / `page` query parameters.
///
/// `limit` is clamped to `[1, 100]`, `offset` to `>= 0`, `page` to `>= 1`.
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default: 20)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// Number of items to skip (ignored if `page` is set)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    /// Page number, 1-indexed
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        match self.page {
            Some(page) => (page.max(1) - 1).saturating_mul(self.limit()),
            None => self.offset.unwrap_or(0).max(0),
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<i64>, offset: Option<i64>, page: Option<i64>) -> PaginationParams {
        PaginationParams {
            limit,
            offset,
            page,
        }
    }

    #[test]
    fn test_defaults() {
        let p = PaginationParams::default();
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.page(), None);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(params(Some(0), None, None).limit(), 1);
        assert_eq!(params(Some(-3), None, None).limit(), 1);
        assert_eq!(params(Some(500), None, None).limit(), MAX_LIMIT);
    }

    #[test]
    fn test_page_takes_precedence_over_offset() {
        let p = params(Some(20), Some(5), Some(3));
        assert_eq!(p.offset(), 40);
        assert_eq!(p.page(), Some(3));
    }

    #[test]
    fn test_negative_offset_and_page() {
        assert_eq!(params(Some(10), Some(-5), None).offset(), 0);
        assert_eq!(params(Some(10), None, Some(-2)).offset(), 0);
        assert_eq!(params(Some(10), None, Some(-2)).page(), Some(1));
    }

    #[test]
    fn test_meta_pages() {
        let meta = PaginationMeta::new(45, &params(Some(10), None, Some(2)));
        assert_eq!(meta.total_pages, 5);
        assert_eq!(meta.offset, 10);
        assert!(meta.has_more);

        let last = PaginationMeta::new(45, &params(Some(10), None, Some(5)));
        assert!(!last.has_more);

        let empty = PaginationMeta::new(0, &PaginationParams::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }

    #[test]
    fn test_huge_page_and_offset_saturate() {
        let p = params(Some(10), None, Some(i64::MAX));
        assert_eq!(p.offset(), i64::MAX);

        let meta = PaginationMeta::new(5, &params(None, Some(i64::MAX), None));
        assert_eq!(meta.offset, i64::MAX);
        assert!(!meta.has_more);
        assert_eq!(meta.total_pages, 1);

        let meta = PaginationMeta::new(5, &params(Some(100), None, Some(i64::MAX)));
        assert!(!meta.has_more);
    }

    #[test]
    fn test_deserialize_from_query_strings() {
        let p: PaginationParams =
            serde_json::from_str(r#"{"limit":"15","page":"","offset":"30"}"#).unwrap();
        assert_eq!(p.limit(), 15);
        assert_eq!(p.page, None);
        assert_eq!(p.offset(), 30);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let p: Result<PaginationParams, _> = serde_json::from_str(r#"{"limit":"ten"}"#);
        assert!(p.is_err());
    }
}
