//! A computed page of a listing.

use serde::{Deserialize, Serialize};

use crate::models::Record;

/// One page of an in-memory collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T = Record> {
    /// 1-based page number, always within `1..=total_pages`
    pub page_number: usize,

    pub page_size: usize,

    pub total_items: usize,

    /// At least 1, even for an empty collection
    pub total_pages: usize,

    /// 0-based index of the first item on this page
    pub start_index: usize,

    /// Exclusive end index
    pub end_index: usize,

    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// 1-based position of the first item, or 0 when there are no items.
    pub fn display_start(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            self.start_index + 1
        }
    }

    /// 1-based position of the last item, or 0 when there are no items.
    pub fn display_end(&self) -> usize {
        self.end_index
    }

    /// Human range such as `19–23 de 23`.
    pub fn range_label(&self) -> String {
        format!(
            "{}–{} de {}",
            self.display_start(),
            self.display_end(),
            self.total_items
        )
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
