/*
[INPUT]:  Page navigation requests and the current item count
[OUTPUT]: 1-indexed page number and the slice of items on that page
[POS]:    Presentation layer - fixed-size paging of trade lists
[UPDATE]: When paging rules change
*/

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 1-indexed pager.
///
/// The page is clamped only when navigating. A later change of the item count leaves
/// the current page untouched, so a shrinking list can leave it past the last page;
/// `slice` then returns an empty slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
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

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Navigate to `page`, clamped to `[1, page_count]` (page 1 when the list is empty)
    pub fn go_to(&mut self, page: usize, total: usize) -> usize {
        self.page = page.min(self.page_count(total)).max(1);
        self.page
    }

    pub fn next(&mut self, total: usize) -> usize {
        self.go_to(self.page.saturating_add(1), total)
    }

    pub fn previous(&mut self, total: usize) -> usize {
        self.go_to(self.page.saturating_sub(1), total)
    }

    /// Items `[(page - 1) * size, page * size)` of `items`
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}
