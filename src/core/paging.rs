//! Pagination of materialized result sets
//!
//! Page sizes are clamped to `[1, max_page_size]` and page numbers below 1
//! become 1; neither is ever reported as an error. The metadata always
//! describes the full filtered set, so a request past the last page gets an
//! empty page with a correct `totalCount`/`totalPages`.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on page size unless configured otherwise
pub const MAX_PAGE_SIZE: usize = 50;

/// Normalized page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_number: usize,
    page_size: usize,
}

impl PageRequest {
    /// Clamp raw coordinates into a valid request
    pub fn new(page_number: i64, page_size: i64, max_page_size: usize) -> Self {
        let max_page_size = max_page_size.max(1);

        let page_number = usize::try_from(page_number.max(1)).unwrap_or(usize::MAX);
        let page_size = usize::try_from(page_size.max(1))
            .unwrap_or(usize::MAX)
            .min(max_page_size);

        Self {
            page_number,
            page_size,
        }
    }

    /// Page number (starts at 1)
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of items before this page
    pub fn offset(&self) -> usize {
        (self.page_number - 1).saturating_mul(self.page_size)
    }
}

/// Paging metadata, sent out-of-band in the `X-Pagination` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingMetadata {
    /// Total number of items (after filters)
    pub total_count: usize,

    /// Number of items per page
    pub page_size: usize,

    /// Current page number (starts at 1, never clamped to `total_pages`)
    pub current_page: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_previous: bool,
}

impl PagingMetadata {
    pub fn new(request: PageRequest, total_count: usize) -> Self {
        let total_pages = total_count.div_ceil(request.page_size);

        Self {
            total_count,
            page_size: request.page_size,
            current_page: request.page_number,
            total_pages,
            has_next: request.page_number < total_pages,
            has_previous: request.page_number > 1,
        }
    }

    /// JSON form used as the header value
    pub fn to_header_value(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One page of items plus its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub metadata: PagingMetadata,
}

/// Slices sequences into pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    default_page_size: usize,
    max_page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(default_page_size: usize, max_page_size: usize) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Build a request, filling absent values with page 1 and the default size
    pub fn request(&self, page_number: Option<i64>, page_size: Option<i64>) -> PageRequest {
        let default_size = i64::try_from(self.default_page_size).unwrap_or(i64::MAX);
        PageRequest::new(
            page_number.unwrap_or(1),
            page_size.unwrap_or(default_size),
            self.max_page_size,
        )
    }

    /// Slice `items` into the requested page
    pub fn paginate<T>(&self, items: Vec<T>, page_number: i64, page_size: i64) -> Page<T> {
        Self::slice(items, PageRequest::new(page_number, page_size, self.max_page_size))
    }

    /// Slice `items` with an already normalized request
    pub fn slice<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
        let metadata = PagingMetadata::new(request, items.len());
        let items = items
            .into_iter()
            .skip(request.offset())
            .take(request.page_size())
            .collect();

        Page { items, metadata }
    }
}
