//! Deterministic pagination over an in-memory collection.
//!
//! Out-of-range pages are clamped, never rejected: a listing whose source
//! shrinks while a later page is shown heals itself on the next
//! recomputation.

use crate::models::Page;

/// Number of pages for a collection; at least 1.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1)).max(1)
}

/// Clamp a requested page into `1..=total_pages`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Compute a page of `collection`.
///
/// The returned items are an independent copy of the slice.
pub fn paginate<T: Clone>(collection: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = collection.len();
    let total_pages = total_pages(total_items, page_size);
    let page_number = clamp_page(page, total_pages);

    let start_index = ((page_number - 1) * page_size).min(total_items);
    let end_index = (start_index + page_size).min(total_items);

    Page {
        page_number,
        page_size,
        total_items,
        total_pages,
        start_index,
        end_index,
        items: collection[start_index..end_index].to_vec(),
    }
}

/// Current-page state of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Pager {
    /// A pager on page 1. A page size of 0 is treated as 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Recompute the page for `collection`, clamping the stored page if the
    /// collection shrank.
    pub fn paginate<T: Clone>(&mut self, collection: &[T]) -> Page<T> {
        let page = paginate(collection, self.page, self.page_size);
        if page.page_number != self.page {
            log::debug!(
                "Page {} out of range for {} items, clamped to {}",
                self.page,
                page.total_items,
                page.page_number
            );
            self.page = page.page_number;
        }
        page
    }

    /// Jump to page `n`, clamped into range. Returns the new page.
    pub fn go_to(&mut self, n: usize, total_items: usize) -> usize {
        self.page = clamp_page(n, total_pages(total_items, self.page_size));
        self.page
    }

    pub fn next(&mut self, total_items: usize) -> usize {
        self.go_to(self.page.saturating_add(1), total_items)
    }

    pub fn previous(&mut self, total_items: usize) -> usize {
        self.go_to(self.page.saturating_sub(1), total_items)
    }

    /// Back to page 1.
    pub fn reset(&mut self) {
        self.page = 1;
    }
}
