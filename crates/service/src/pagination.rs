//! Offset pagination: the page envelope shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// One page of results plus the numbers clients need to navigate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub top: u64,
    pub skip: u64,
    /// 1-based page index derived from `skip / top`
    pub page: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// `top` is expected to be already clamped to at least 1.
    pub fn new(items: Vec<T>, total: u64, top: u64, skip: u64) -> Self {
        let top = top.max(1);
        let len = items.len() as u64;
        Self {
            items,
            total,
            top,
            skip,
            page: skip / top + 1,
            total_pages: total.div_ceil(top),
            has_next: skip + len < total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            top: self.top,
            skip: self.skip,
            page: self.page,
            total_pages: self.total_pages,
            has_next: self.has_next,
        }
    }

    /// `$skip` of the following page, when there is one.
    pub fn next_skip(&self) -> Option<u64> {
        self.has_next.then(|| self.skip + self.items.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::Page;

    #[test]
    fn first_page_math() {
        let p = Page::new(vec![1, 2, 3], 10, 3, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next);
        assert_eq!(p.next_skip(), Some(3));
    }

    #[test]
    fn last_partial_page() {
        let p = Page::new(vec![10], 10, 3, 9);
        assert_eq!(p.page, 4);
        assert!(!p.has_next);
        assert_eq!(p.next_skip(), None);
    }

    #[test]
    fn skip_not_aligned_to_top() {
        let p = Page::new(vec![1, 2], 5, 2, 3);
        assert_eq!(p.page, 2);
        assert!(!p.has_next);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let p: Page<u8> = Page::new(vec![], 0, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.page, 1);
        assert!(!p.has_next);
    }

    #[test]
    fn skip_past_end() {
        let p: Page<u8> = Page::new(vec![], 5, 20, 40);
        assert_eq!(p.page, 3);
        assert!(!p.has_next);
    }
}
