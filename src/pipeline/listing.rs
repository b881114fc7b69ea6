//! Listing screen state: snapshot, search filter, pager.

use crate::models::{Page, Record};
use crate::pipeline::{Pager, SearchFilter};

/// A filterable, paginated view over a fetched snapshot.
#[derive(Debug, Clone)]
pub struct Listing {
    snapshot: Vec<Record>,
    search_fields: Vec<String>,
    filter: SearchFilter,
    visible: Vec<Record>,
    pager: Pager,
}

impl Listing {
    pub fn new(snapshot: Vec<Record>, search_fields: Vec<String>, page_size: usize) -> Self {
        let filter = SearchFilter::new("", search_fields.clone());
        Self {
            visible: snapshot.clone(),
            snapshot,
            search_fields,
            filter,
            pager: Pager::new(page_size),
        }
    }

    /// Replace the snapshot wholesale after a re-fetch.
    ///
    /// The current page is kept and clamped on the next recomputation.
    pub fn replace_snapshot(&mut self, snapshot: Vec<Record>) {
        self.snapshot = snapshot;
        self.refilter();
    }

    /// Change the search term. Always returns to page 1.
    pub fn set_filter(&mut self, term: &str) {
        self.filter = SearchFilter::new(term, self.search_fields.clone());
        self.pager.reset();
        self.refilter();
    }

    /// Drop records from the snapshot, e.g. after a deletion.
    pub fn retain(&mut self, keep: impl Fn(&Record) -> bool) {
        self.snapshot.retain(|r| keep(r));
        self.refilter();
    }

    fn refilter(&mut self) {
        self.visible = self.filter.apply(&self.snapshot);
    }

    pub fn current_page(&mut self) -> Page<Record> {
        self.pager.paginate(&self.visible)
    }

    pub fn next(&mut self) -> Page<Record> {
        self.pager.next(self.visible.len());
        self.current_page()
    }

    pub fn previous(&mut self) -> Page<Record> {
        self.pager.previous(self.visible.len());
        self.current_page()
    }

    pub fn go_to(&mut self, n: usize) -> Page<Record> {
        self.pager.go_to(n, self.visible.len());
        self.current_page()
    }

    pub fn filter_term(&self) -> &str {
        self.filter.term()
    }

    /// Records passing the current filter.
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn into_snapshot(self) -> Vec<Record> {
        self.snapshot
    }
}
