//! Walks a page-based search endpoint.

use std::future::Future;

use serde::Serialize;
use vigil_types::{PageRequest, PageResult};

use crate::error::{EngineError, Result};

/// Something odd noticed while walking, reported without failing the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationWarning {
    /// The server reported a different total on a later page.
    InconsistentTotal { page: u32, expected: u64, actual: u64 },
    /// The walk stopped because the page budget ran out.
    PageBudgetExhausted { budget: u32, total: u64 },
}

/// Accumulated records of a finished walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Walk<T> {
    /// Records in page order.
    pub records: Vec<T>,
    /// Latest total reported by the server.
    pub total: u64,
    pub pages_fetched: u32,
    pub warnings: Vec<PaginationWarning>,
}

impl<T> Walk<T> {
    /// Convert the records while keeping the walk metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Walk<U> {
        Walk {
            records: self.records.into_iter().map(f).collect(),
            total: self.total,
            pages_fetched: self.pages_fetched,
            warnings: self.warnings,
        }
    }
}

/// Page iteration with a bounded number of requests.
pub struct PageWalker;

impl PageWalker {
    /// Fetch the pages named by `request`.
    ///
    /// With a fixed page exactly one call is made. Otherwise pages `1, 2, …`
    /// are fetched until `page * size` reaches the latest reported total or a
    /// page comes back empty. The number of requests is capped at
    /// `first_total / size + 1` so a server whose total keeps growing cannot
    /// keep the walk alive forever.
    ///
    /// Any fetch error aborts the walk; records gathered so far are dropped.
    pub async fn walk<T, E, F, Fut>(request: &PageRequest, mut fetch_page: F) -> Result<Walk<T>>
    where
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = std::result::Result<PageResult<T>, E>>,
        E: Into<EngineError>,
    {
        let size = request.size();

        if let Some(page) = request.page() {
            let result = fetch_page(page, size).await.map_err(Into::into)?;
            return Ok(Walk {
                records: result.results,
                total: result.total,
                pages_fetched: 1,
                warnings: Vec::new(),
            });
        }

        let first = fetch_page(1, size).await.map_err(Into::into)?;
        let budget = u32::try_from(first.total / u64::from(size) + 1).unwrap_or(u32::MAX);

        let mut total = first.total;
        let mut last_page_empty = first.results.is_empty();
        let mut records = first.results;
        let mut pages: u32 = 1;
        let mut warnings = Vec::new();

        while !last_page_empty && u64::from(pages) * u64::from(size) < total {
            if pages >= budget {
                tracing::warn!(budget, total, records = records.len(), "page budget exhausted");
                warnings.push(PaginationWarning::PageBudgetExhausted { budget, total });
                break;
            }

            let page = pages + 1;
            let result = fetch_page(page, size).await.map_err(Into::into)?;
            pages = page;

            if result.total != total {
                tracing::warn!(
                    page,
                    expected = total,
                    actual = result.total,
                    "total changed while paging"
                );
                warnings.push(PaginationWarning::InconsistentTotal {
                    page,
                    expected: total,
                    actual: result.total,
                });
                total = result.total;
            }

            last_page_empty = result.results.is_empty();
            records.extend(result.results);
        }

        tracing::debug!(pages, records = records.len(), total, "walk complete");

        Ok(Walk {
            records,
            total,
            pages_fetched: pages,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves pages from a fixed list of `(records, total)` and logs calls.
    struct FakeListing {
        pages: Vec<(Vec<u32>, u64)>,
        calls: Mutex<Vec<(u32, u32)>>,
    }

    impl FakeListing {
        fn new(pages: Vec<(Vec<u32>, u64)>) -> Self {
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// A listing of `total` sequential records split into pages of `size`.
        fn sequential(total: u32, size: u32) -> Self {
            let all: Vec<u32> = (0..total).collect();
            let pages = all
                .chunks(size as usize)
                .map(|chunk| (chunk.to_vec(), u64::from(total)))
                .collect();
            Self::new(pages)
        }

        async fn fetch(&self, page: u32, size: u32) -> Result<PageResult<u32>> {
            self.calls.lock().unwrap().push((page, size));
            let (results, total) = self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or((Vec::new(), self.pages.last().map_or(0, |p| p.1)));
            Ok(PageResult::new(results, total))
        }

        fn calls(&self) -> Vec<(u32, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_walks_until_total_reached() {
        let listing = FakeListing::sequential(101, 100);
        let request = PageRequest::all(100).unwrap();

        let walk = PageWalker::walk(&request, |p, s| listing.fetch(p, s))
            .await
            .unwrap();

        assert_eq!(walk.records.len(), 101);
        assert_eq!(walk.records, (0..101).collect::<Vec<_>>());
        assert_eq!(listing.calls(), vec![(1, 100), (2, 100)]);
        assert!(walk.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_single_record_pages_keep_call_order() {
        // Each page is served in reverse of the natural order; the walk must not re-sort
        let listing = FakeListing::new(vec![
            (vec![50], 5),
            (vec![40], 5),
            (vec![30], 5),
            (vec![20], 5),
            (vec![10], 5),
        ]);
        let walk = PageWalker::walk(&PageRequest::all(1).unwrap(), |p, s| listing.fetch(p, s))
            .await
            .unwrap();

        assert_eq!(listing.calls(), vec![(1, 1), (2, 1), (3, 1), (4, 1), (5, 1)]);
        assert_eq!(walk.records, vec![50, 40, 30, 20, 10]);
        assert_eq!(walk.pages_fetched, 5);
        assert!(walk.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_exact_multiple_stops_without_extra_call() {
        let listing = FakeListing::sequential(200, 100);
        let walk = PageWalker::walk(&PageRequest::all(100).unwrap(), |p, s| {
            listing.fetch(p, s)
        })
        .await
        .unwrap();

        assert_eq!(walk.records.len(), 200);
        assert_eq!(listing.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fixed_page_makes_one_call() {
        let listing = FakeListing::sequential(50, 10);
        let walk = PageWalker::walk(&PageRequest::single(3, 10).unwrap(), |p, s| {
            listing.fetch(p, s)
        })
        .await
        .unwrap();

        assert_eq!(listing.calls(), vec![(3, 10)]);
        assert_eq!(walk.records, (20..30).collect::<Vec<_>>());
        assert_eq!(walk.total, 50);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let listing = FakeListing::new(vec![(Vec::new(), 0)]);
        let walk = PageWalker::walk(&PageRequest::all(10).unwrap(), |p, s| {
            listing.fetch(p, s)
        })
        .await
        .unwrap();

        assert!(walk.records.is_empty());
        assert_eq!(listing.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_stops_walk() {
        // Server claims 30 records but page 2 is empty
        let listing = FakeListing::new(vec![
            (vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 30),
            (Vec::new(), 30),
            (vec![21], 30),
        ]);
        let walk = PageWalker::walk(&PageRequest::all(10).unwrap(), |p, s| {
            listing.fetch(p, s)
        })
        .await
        .unwrap();

        assert_eq!(walk.records.len(), 10);
        assert_eq!(listing.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_growing_total_hits_budget() {
        // First total allows 2 pages; the server keeps reporting more
        let listing = FakeListing::new(vec![
            (vec![1; 10], 15),
            (vec![2; 10], 25),
            (vec![3; 10], 35),
            (vec![4; 10], 45),
        ]);
        let walk = PageWalker::walk(&PageRequest::all(10).unwrap(), |p, s| {
            listing.fetch(p, s)
        })
        .await
        .unwrap();

        assert_eq!(listing.calls().len(), 2);
        assert_eq!(walk.records.len(), 20);
        assert_eq!(
            walk.warnings,
            vec![
                PaginationWarning::InconsistentTotal {
                    page: 2,
                    expected: 15,
                    actual: 25
                },
                PaginationWarning::PageBudgetExhausted {
                    budget: 2,
                    total: 25
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_error_drops_partial_results() {
        let calls = Mutex::new(0u32);
        let result: Result<Walk<u32>> = PageWalker::walk(&PageRequest::all(2).unwrap(), |page, _| {
            *calls.lock().unwrap() += 1;
            async move {
                if page == 1 {
                    Ok(PageResult::new(vec![1, 2], 10))
                } else {
                    Err(vigil_client::Error::Api {
                        status: 500,
                        message: "boom".to_string(),
                    })
                }
            }
        })
        .await;

        assert!(matches!(result, Err(EngineError::Transport(_))));
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
