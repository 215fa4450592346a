//! Pagination utilities for service layer
//!
//! Page indexes are zero-based. `PageRequest::normalize` clamps the page size
//! into a sane window and bounds the page so `page * size` fits a SQL `BIGINT`
//! offset before any store sees it.

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index
    pub page: u64,
    /// items per page
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self { Self { page, size }.normalize() }

    /// Clamp size to `1..=MAX_PAGE_SIZE` and page to the largest index whose offset fits `i64`
    pub fn normalize(self) -> Self {
        let size = self.size.clamp(1, MAX_PAGE_SIZE);
        let max_page = i64::MAX as u64 / size;
        Self { page: self.page.min(max_page), size }
    }

    pub fn offset(&self) -> u64 { self.page.saturating_mul(self.size) }
}

impl Default for PageRequest {
    fn default() -> Self { Self { page: 0, size: DEFAULT_PAGE_SIZE } }
}

/// One page of results plus the total across all pages.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, req: PageRequest) -> Self {
        Self { items, total_count, page: req.page, size: req.size }
    }

    /// Cut one page out of an already filtered and ordered collection.
    pub fn slice(all: Vec<T>, req: PageRequest) -> Self {
        let total_count = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(req.offset()).unwrap_or(usize::MAX))
            .take(req.size as usize)
            .collect();
        Self::new(items, total_count, req)
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 { 0 } else { self.total_count.div_ceil(self.size) }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), total_count: self.total_count, page: self.page, size: self.size }
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageRequest};

    #[test]
    fn normalize_clamps_zero_size() {
        let r = PageRequest { page: 0, size: 0 }.normalize();
        assert_eq!(r.page, 0);
        assert_eq!(r.size, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let r = PageRequest::new(5, 1000);
        assert_eq!(r.page, 5);
        assert_eq!(r.size, 100);
        assert_eq!(r.offset(), 500);
    }

    #[test]
    fn normalize_bounds_offset_to_bigint() {
        let r = PageRequest::new(u64::MAX / 2, 10);
        assert_eq!(r.page, i64::MAX as u64 / 10);
        assert!(r.offset() <= i64::MAX as u64);

        let r = PageRequest::new(1_844_674_407_370_955_161, 100);
        assert!(r.page.checked_mul(r.size).is_some_and(|o| o <= i64::MAX as u64));
    }

    #[test]
    fn default_values_are_sane() {
        let d = PageRequest::default();
        assert_eq!(d.page, 0);
        assert_eq!(d.size, 10);
    }

    #[test]
    fn slice_reports_total_and_pages() {
        let p = Page::slice((1..=25).collect::<Vec<_>>(), PageRequest::new(2, 10));
        assert_eq!(p.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(p.total_count, 25);
        assert_eq!(p.total_pages(), 3);

        let past_end = Page::slice((1..=3).collect::<Vec<_>>(), PageRequest::new(4, 10));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_count, 3);
    }
}
