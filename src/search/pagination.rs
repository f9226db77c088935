//! Pagination arithmetic shared by every listing endpoint.

use serde::Serialize;

/// Page metadata returned alongside a result slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Compute page metadata once the total is known.
    ///
    /// `total_pages` is `ceil(total_items / limit)` when any items exist,
    /// else 0. The requested page is clamped into `[1, max(total_pages, 1)]`
    /// so an out-of-range request is silently served as the nearest valid
    /// page, never an error.
    pub fn compute(requested_page: u32, limit: u32, total_items: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = if total_items > 0 {
            total_items.div_ceil(u64::from(limit)) as u32
        } else {
            0
        };
        let current_page = requested_page.clamp(1, total_pages.max(1));

        Self {
            current_page,
            total_pages,
            total_items,
            items_per_page: limit,
        }
    }

    /// Number of items to skip before the served page.
    pub fn offset(&self) -> u64 {
        u64::from(self.current_page - 1) * u64::from(self.items_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(Pagination::compute(1, 20, 41).total_pages, 3);
        assert_eq!(Pagination::compute(1, 20, 40).total_pages, 2);
        assert_eq!(Pagination::compute(1, 20, 1).total_pages, 1);
    }

    #[test]
    fn test_zero_items_zero_pages() {
        let p = Pagination::compute(3, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_page_clamped_to_last() {
        let p = Pagination::compute(9, 20, 35);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_page_floor_is_one() {
        let p = Pagination::compute(0, 20, 35);
        assert_eq!(p.current_page, 1);
    }

    #[test]
    fn test_offset_for_valid_page() {
        let p = Pagination::compute(2, 10, 95);
        assert_eq!(p.total_pages, 10);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.offset(), 10);
    }
}
