//! Mock archive fetcher for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::CatalogItem;
use crate::fetcher::{item_dir, resolve_download_url, ArchiveFetcher, FetchError, FetchOutcome};
use crate::item::ItemKind;

/// A recorded fetch attempt for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub kind: ItemKind,
    pub slug: String,
    /// URL the real fetcher would have downloaded from.
    pub url: String,
}

/// Mock implementation of the ArchiveFetcher trait.
///
/// Every call is recorded. By default each item "extracts" successfully; with
/// a download directory configured, the extraction directory is actually
/// created (with a single PHP file) so that an audit can run over it.
#[derive(Debug, Clone, Default)]
pub struct MockArchiveFetcher {
    attempts: Arc<RwLock<Vec<RecordedFetch>>>,
    failing_slugs: Arc<RwLock<HashSet<String>>>,
    stale_slugs: Arc<RwLock<HashSet<String>>>,
    download_dir: Option<PathBuf>,
}

impl MockArchiveFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher that materializes extraction directories under `dir`.
    pub fn with_download_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Make fetches of `slug` fail with a 404.
    pub async fn fail_slug(&self, slug: &str) {
        self.failing_slugs.write().await.insert(slug.to_string());
    }

    /// Report `slug` as skipped for staleness.
    pub async fn mark_stale(&self, slug: &str) {
        self.stale_slugs.write().await.insert(slug.to_string());
    }

    /// Get all recorded fetch attempts.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.attempts.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[async_trait]
impl ArchiveFetcher for MockArchiveFetcher {
    async fn fetch(&self, kind: ItemKind, item: &CatalogItem) -> Result<FetchOutcome, FetchError> {
        let url = resolve_download_url(kind, &item.slug, item.stated_download_link());
        self.attempts.write().await.push(RecordedFetch {
            kind,
            slug: item.slug.clone(),
            url: url.clone(),
        });

        if self.failing_slugs.read().await.contains(&item.slug) {
            return Err(FetchError::HttpStatus { status: 404, url });
        }

        if self.stale_slugs.read().await.contains(&item.slug) {
            return Ok(FetchOutcome::SkippedStale);
        }

        let root = self.download_dir.clone().unwrap_or_default();
        let path = item_dir(&root, kind, &item.slug);
        if self.download_dir.is_some() {
            tokio::fs::create_dir_all(&path).await?;
            tokio::fs::write(path.join(format!("{}.php", item.slug)), "<?php\n").await?;
        }

        Ok(FetchOutcome::Extracted { path, entries: 1 })
    }
}
