//! Paging model shared by every search endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Page size used by execution queries and namespace listings.
pub const SMALL_PAGE_SIZE: u32 = 10;

/// Page size used by log, asset and trigger searches.
pub const LARGE_PAGE_SIZE: u32 = 100;

/// Which part of a listing to fetch.
///
/// With `page: None` every page is walked; with `page: Some(n)` only page `n`
/// is fetched. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: Option<u32>,
    size: u32,
}

impl PageRequest {
    /// Create a request, rejecting a zero page number or size.
    pub fn new(page: Option<u32>, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidPage("page size must be at least 1".to_string()));
        }
        if page == Some(0) {
            return Err(Error::InvalidPage("page numbers start at 1".to_string()));
        }
        Ok(Self { page, size })
    }

    /// Walk every page with the given page size.
    pub fn all(size: u32) -> Result<Self> {
        Self::new(None, size)
    }

    /// Fetch a single page.
    pub fn single(page: u32, size: u32) -> Result<Self> {
        Self::new(Some(page), size)
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Whether this request walks the whole listing.
    pub fn is_unbounded(&self) -> bool {
        self.page.is_none()
    }
}

/// One page of results as returned by a search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    /// Records on this page, in server order.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Total number of matching records reported by the server.
    #[serde(default)]
    pub total: u64,
}

impl<T> PageResult<T> {
    pub fn new(results: Vec<T>, total: u64) -> Self {
        Self { results, total }
    }

    /// Convert the records while keeping the reported total.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            results: self.results.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
