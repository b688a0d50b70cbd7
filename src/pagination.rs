//! Caller-side "load more" accumulation
//!
//! The upstream never reports a total, so a page shorter than the requested
//! size is taken to mean there are no more pages; a full or oversized page
//! means there may be more. The heuristic is fallible: a final page of
//! exactly `page_size` items yields one more, empty, fetch.

use crate::constants::defaults;

/// Items collected across successive page fetches of one query
#[derive(Debug, Clone, PartialEq)]
pub struct PageAccumulator<T> {
    items: Vec<T>,
    page: u32,
    page_size: u32,
    has_more: bool,
    loaded: bool,
}

impl<T> Default for PageAccumulator<T> {
    fn default() -> Self {
        Self::new(defaults::VIEW_PAGE_SIZE)
    }
}

impl<T> PageAccumulator<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            page_size,
            has_more: true,
            loaded: false,
        }
    }

    /// Forget everything, e.g. when the query or filter changes
    pub fn reset(&mut self) {
        self.items.clear();
        self.page = 0;
        self.has_more = true;
        self.loaded = false;
    }

    /// Record one fetched page: the first page replaces, later pages append
    pub fn push_page(&mut self, page: Vec<T>) {
        self.has_more = page.len() >= self.page_size as usize;
        if self.loaded {
            self.page += 1;
            self.items.extend(page);
        } else {
            self.items = page;
            self.loaded = true;
        }
    }

    /// Page index to request next
    pub fn next_page(&self) -> u32 {
        if self.loaded {
            self.page + 1
        } else {
            0
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
