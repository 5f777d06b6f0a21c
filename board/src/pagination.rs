//! Page slicing and page-window selection over an ordered event list.

use std::ops::{Range, RangeInclusive};

/// Maximum number of page links shown at once
pub const WINDOW_SIZE: usize = 5;

/// Pagination cursor over a list of `total_items`
///
/// Pages are 1-based. An empty list has zero pages and the cursor stays on
/// page 1, which renders as "no items".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current_page: usize,
    total_items: usize,
}

impl Paginator {
    /// Creates a cursor on page 1 of an empty list. A zero page size is treated as 1.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            total_items: 0,
        }
    }

    /// Creates a cursor on page 1 of a list of `total_items`
    #[must_use]
    pub fn with_total(page_size: usize, total_items: usize) -> Self {
        let mut paginator = Self::new(page_size);
        paginator.total_items = total_items;
        paginator
    }

    /// Items per page
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current page (1-based)
    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    /// Number of items being paginated
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    /// `ceil(total_items / page_size)`
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Index range of the current page within the full list
    #[must_use]
    pub fn page_range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    /// The current page of `items`
    ///
    /// `items` is expected to hold `total_items` elements; a shorter slice is
    /// cut at its own length.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.page_range();
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }

    /// Page numbers to offer as navigation links
    ///
    /// At most [`WINDOW_SIZE`] pages, centred on the current page when
    /// possible and shifted to stay in range near either end.
    #[must_use]
    pub fn window(&self) -> RangeInclusive<usize> {
        let total = self.total_pages();
        if total == 0 {
            return 1..=0;
        }
        let mut start = self.current_page.saturating_sub(2).max(1);
        let end = (start + WINDOW_SIZE - 1).min(total);
        if end + 1 - start < WINDOW_SIZE {
            start = end.saturating_sub(WINDOW_SIZE - 1).max(1);
        }
        start..=end
    }

    /// Whether a following page exists
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Whether a preceding page exists
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Moves to the next page; no-op on the last page. Returns whether the page changed.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Moves to the previous page; no-op on page 1. Returns whether the page changed.
    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Moves to `page`, clamped into range. Returns whether the page changed.
    pub fn go_to(&mut self, page: usize) -> bool {
        let target = page.clamp(1, self.total_pages().max(1));
        let changed = target != self.current_page;
        self.current_page = target;
        changed
    }

    /// Updates the list length, clamping the current page if it now points past the end
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.current_page = self.current_page.clamp(1, self.total_pages().max(1));
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(10)
    }
}
