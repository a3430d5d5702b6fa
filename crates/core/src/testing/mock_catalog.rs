//! Mock catalog client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogClient, CatalogError, CatalogItem, CatalogPage};
use crate::item::ItemKind;

/// A recorded page request for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPageRequest {
    pub kind: ItemKind,
    pub page: u32,
    pub per_page: u32,
}

/// Mock implementation of the CatalogClient trait.
///
/// Serves scripted pages per kind. Requests for pages that were never
/// configured fail with a 404 `ApiError`, which callers treat as the end of
/// the stream.
///
/// # Example
///
/// ```rust,ignore
/// use wpaudit_core::testing::{MockCatalogClient, fixtures};
///
/// let catalog = MockCatalogClient::new();
/// catalog.set_item_pages(ItemKind::Plugin, vec![
///     vec![fixtures::catalog_item("akismet", 5_000_000)],
///     vec![fixtures::catalog_item("tiny", 10)],
/// ]).await;
///
/// let page = catalog.fetch_page(ItemKind::Plugin, 1, 100).await?;
/// assert_eq!(page.total_pages, Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockCatalogClient {
    pages: Arc<RwLock<HashMap<ItemKind, Vec<CatalogPage>>>>,
    requests: Arc<RwLock<Vec<RecordedPageRequest>>>,
    failing_pages: Arc<RwLock<HashSet<(ItemKind, u32)>>>,
    /// If set, the next request will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure raw pages for a kind, served in order starting at page 1.
    pub async fn set_pages(&self, kind: ItemKind, pages: Vec<CatalogPage>) {
        self.pages.write().await.insert(kind, pages);
    }

    /// Configure pages from item lists; every page reports the list count as `info.pages`.
    pub async fn set_item_pages(&self, kind: ItemKind, pages: Vec<Vec<CatalogItem>>) {
        let total = pages.len() as u32;
        let pages = pages
            .into_iter()
            .map(|items| CatalogPage {
                total_pages: Some(total),
                items: Some(items),
            })
            .collect();
        self.set_pages(kind, pages).await;
    }

    /// Make requests for one page fail with a 500.
    pub async fn fail_page(&self, kind: ItemKind, page: u32) {
        self.failing_pages.write().await.insert((kind, page));
    }

    /// Configure the next request to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<RecordedPageRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of requests made for a kind.
    pub async fn request_count(&self, kind: ItemKind) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn fetch_page(
        &self,
        kind: ItemKind,
        page: u32,
        per_page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        self.requests.write().await.push(RecordedPageRequest {
            kind,
            page,
            per_page,
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if self.failing_pages.read().await.contains(&(kind, page)) {
            return Err(CatalogError::ApiError {
                status: 500,
                message: "mock failure".to_string(),
            });
        }

        let pages = self.pages.read().await;
        pages
            .get(&kind)
            .and_then(|pages| pages.get((page as usize).wrapping_sub(1)))
            .cloned()
            .ok_or_else(|| CatalogError::ApiError {
                status: 404,
                message: format!("no {} page {}", kind, page),
            })
    }
}
