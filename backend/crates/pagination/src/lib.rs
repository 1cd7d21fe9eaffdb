//! Page request and page envelope primitives for list endpoints.
//!
//! List endpoints accept one-based `page` and `limit` query parameters and
//! answer with a [`Page`] envelope carrying the total record count so clients
//! can render pagers without a second request.
//!
//! # Example
//!
//! ```
//! use pagination::{Page, PageParams};
//!
//! let request = PageParams { page: Some(2), limit: Some(10) }
//!     .into_request()
//!     .expect("valid page parameters");
//! assert_eq!(request.offset(), 10);
//!
//! let page = Page::new(vec!["a", "b"], request, 12);
//! assert_eq!(page.total_pages, 2);
//! ```

use serde::{Deserialize, Serialize};

/// Default number of records per page.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// Errors raised while validating page parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Pages are one-based.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// The limit falls outside `1..=MAX_LIMIT`.
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Maximum accepted limit.
        max: u32,
    },
}

impl PageRequestError {
    /// Name of the offending query parameter.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::PageOutOfRange => "page",
            Self::LimitOutOfRange { .. } => "limit",
        }
    }
}

/// Raw, unvalidated page parameters as they arrive on a query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// One-based page number.
    pub page: Option<u32>,
    /// Requested page size.
    pub limit: Option<u32>,
}

impl PageParams {
    /// Validate the parameters, applying defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `page` is zero or `limit` is outside
    /// `1..=MAX_LIMIT`.
    pub fn into_request(self) -> Result<PageRequest, PageRequestError> {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}

/// Validated page request.
///
/// ## Invariants
/// - `page >= 1`
/// - `1 <= limit <= MAX_LIMIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Construct a validated page request.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when either bound is violated.
    pub const fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::PageOutOfRange);
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageRequestError::LimitOutOfRange { max: MAX_LIMIT });
        }
        Ok(Self { page, limit })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// Slice an in-memory collection down to this page.
    #[must_use]
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .iter()
            .skip(offset)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

/// Page envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// One-based page number.
    pub page: u32,
    /// Page size used for the query.
    pub limit: u32,
    /// Total matching records across all pages.
    pub total: u64,
    /// Number of pages needed to show `total` records.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Build an envelope for `items` fetched with `request`.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(u64::from(request.limit)),
        }
    }

    /// Convert every item while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}
