//! Offset pagination for review queue listings.
//!
//! The review queue is ordered by confidence rather than by id, so the
//! cursor-by-id scheme does not apply here. Callers pass `limit`/`offset`,
//! models fetch `limit + 1` rows to detect whether another page exists.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Validated pagination arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArgs {
    pub limit: i64,
    pub offset: i64,
}

impl PageArgs {
    /// Clamp raw query parameters into a usable page window.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        Self { limit, offset }
    }

    /// Rows to request from the database (one extra to compute `has_more`).
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }

    /// Trim an over-fetched result set into a page.
    pub fn into_page<T>(self, mut rows: Vec<T>) -> Page<T> {
        let has_more = rows.len() > self.limit as usize;
        rows.truncate(self.limit as usize);
        Page {
            items: rows,
            has_more,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl Default for PageArgs {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_limit_and_offset() {
        let args = PageArgs::new(Some(10_000), Some(-5));
        assert_eq!(args.limit, MAX_PAGE_SIZE);
        assert_eq!(args.offset, 0);

        let args = PageArgs::new(Some(0), None);
        assert_eq!(args.limit, 1);
    }

    #[test]
    fn detects_additional_page() {
        let args = PageArgs::new(Some(2), None);
        let page = args.into_page(vec![1, 2, 3]);
        assert!(page.has_more);
        assert_eq!(page.items, vec![1, 2]);

        let page = args.into_page(vec![1, 2]);
        assert!(!page.has_more);
    }
}
