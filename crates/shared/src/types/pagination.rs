//! Page windows for list endpoints.

use serde::{Deserialize, Serialize};

/// Hard ceiling on page size; larger requests are cut down to this.
pub const MAX_PAGE_SIZE: u32 = 200;

/// A 1-indexed page window requested by a caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, counted from 1. Zero is treated as 1.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl PageRequest {
    /// Builds a window, clamping the size into `1..=MAX_PAGE_SIZE` and the
    /// page number to at least 1.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip before this window starts.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    /// Rows this window holds, as the store expects it.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.limit)
    }
}

/// One page of results plus the window it was cut from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// The rows in this page.
    pub items: Vec<T>,
    /// Page number of this window.
    pub page: u32,
    /// Requested rows per page.
    pub limit: u32,
    /// Matching rows across all pages.
    pub total: u64,
    /// Page count; an empty result still counts as one page.
    pub pages: u64,
}

impl<T> Paginated<T> {
    /// Wraps one page of rows with its window and the total match count.
    #[must_use]
    pub fn of(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let pages = if total == 0 {
            1
        } else {
            total.div_ceil(u64::from(request.limit.max(1)))
        };

        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_offsets() {
        assert_eq!(PageRequest::default().offset(), 0);
        assert_eq!(PageRequest { page: 4, limit: 15 }.offset(), 45);
        // Page zero behaves like page one.
        assert_eq!(PageRequest { page: 0, limit: 15 }.offset(), 0);
    }

    #[test]
    fn test_new_clamps_degenerate_windows() {
        let window = PageRequest::new(0, 0);
        assert_eq!(window.page, 1);
        assert_eq!(window.limit, 1);

        let window = PageRequest::new(2, 10_000);
        assert_eq!(window.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = Paginated::of(vec![0u8; 7], PageRequest { page: 1, limit: 7 }, 15);
        assert_eq!(page.pages, 3);

        let page = Paginated::of(vec![0u8; 7], PageRequest { page: 1, limit: 7 }, 14);
        assert_eq!(page.pages, 2);
    }

    #[test]
    fn test_empty_result_is_one_page() {
        let page: Paginated<u8> = Paginated::of(vec![], PageRequest::default(), 0);
        assert_eq!(page.pages, 1);
        assert_eq!(page.total, 0);
    }
}
