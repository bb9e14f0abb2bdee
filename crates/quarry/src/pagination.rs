//! In-memory pagination over a fetched result set.

use serde::{Deserialize, Serialize};

/// How page links should be presented by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkStyle {
    /// A link for every page.
    #[default]
    All,
    /// Previous / next only.
    Basic,
}

/// A fetched result plus its total count, sliced into fixed-size pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginator<T> {
    items: Vec<T>,
    total: usize,
    per_page: usize,
    style: LinkStyle,
}

impl<T> Paginator<T> {
    /// `per_page` of zero is treated as one.
    pub fn new(items: Vec<T>, per_page: usize, style: LinkStyle) -> Self {
        Self {
            total: items.len(),
            items,
            per_page: per_page.max(1),
            style,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn style(&self) -> LinkStyle {
        self.style
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    /// Items on 1-based page `n`; empty when out of range.
    pub fn page(&self, n: usize) -> &[T] {
        if n == 0 {
            return &[];
        }
        let start = (n - 1).saturating_mul(self.per_page);
        if start >= self.items.len() {
            return &[];
        }
        let end = (start + self.per_page).min(self.items.len());
        &self.items[start..end]
    }

    pub fn has_page(&self, n: usize) -> bool {
        n >= 1 && n <= self.page_count()
    }

    /// Page numbers a renderer should link from `current`.
    pub fn links(&self, current: usize) -> Vec<usize> {
        match self.style {
            LinkStyle::All => (1..=self.page_count()).collect(),
            LinkStyle::Basic => [current.checked_sub(1), Some(current + 1)]
                .into_iter()
                .flatten()
                .filter(|&n| self.has_page(n))
                .collect(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_over_partial_last_page() {
        let p = Paginator::new((1..=23).collect::<Vec<_>>(), 10, LinkStyle::All);
        assert_eq!(p.total(), 23);
        assert_eq!(p.page_count(), 3);
        assert_eq!(p.page(1).len(), 10);
        assert_eq!(p.page(3), &[21, 22, 23]);
        assert!(p.page(4).is_empty());
        assert!(p.page(0).is_empty());
    }

    #[test]
    fn empty_result_has_no_pages() {
        let p: Paginator<i32> = Paginator::new(Vec::new(), 10, LinkStyle::All);
        assert_eq!(p.page_count(), 0);
        assert!(p.links(1).is_empty());
    }

    #[test]
    fn link_styles() {
        let p = Paginator::new((1..=50).collect::<Vec<_>>(), 10, LinkStyle::All);
        assert_eq!(p.links(2), vec![1, 2, 3, 4, 5]);

        let p = Paginator::new((1..=50).collect::<Vec<_>>(), 10, LinkStyle::Basic);
        assert_eq!(p.links(1), vec![2]);
        assert_eq!(p.links(3), vec![2, 4]);
        assert_eq!(p.links(5), vec![4]);
    }
}
