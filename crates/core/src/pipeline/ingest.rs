//! Catalog ingestion: page through the catalog, persist popular items, fetch their archives.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::PipelineError;
use crate::catalog::{CatalogClient, CatalogItem};
use crate::fetcher::{ArchiveFetcher, FetchOutcome};
use crate::item::{ItemKind, ItemRecord, MIN_ACTIVE_INSTALLS};
use crate::store::ItemStore;

/// Counters for one kind's ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub pages_processed: u32,
    pub items_seen: usize,
    pub items_upserted: usize,
    pub archives_extracted: usize,
    pub skipped_stale: usize,
    pub failed_downloads: usize,
}

/// Walks the catalog for one kind at a time.
pub struct Ingestor {
    catalog: Arc<dyn CatalogClient>,
    fetcher: Arc<dyn ArchiveFetcher>,
    store: Arc<dyn ItemStore>,
    download_dir: PathBuf,
    per_page: u32,
}

impl Ingestor {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        fetcher: Arc<dyn ArchiveFetcher>,
        store: Arc<dyn ItemStore>,
        download_dir: impl Into<PathBuf>,
        per_page: u32,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            store,
            download_dir: download_dir.into(),
            per_page,
        }
    }

    /// Ingest every catalog page of `kind`.
    ///
    /// The first page supplies the page count. A failed or empty page ends the
    /// walk early. Only a fatal store error is returned; everything else is
    /// logged and skipped.
    pub async fn ingest(&self, kind: ItemKind) -> Result<IngestSummary, PipelineError> {
        let mut summary = IngestSummary::default();

        let first = match self.catalog.fetch_page(kind, 1, self.per_page).await {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to retrieve the {} information: {}", kind, e);
                return Ok(summary);
            }
        };
        let Some(total_pages) = first.total_pages else {
            error!("Failed to retrieve the {} information: no page count", kind);
            return Ok(summary);
        };

        let kind_dir = self.download_dir.join(kind.plural());
        tokio::fs::create_dir_all(&kind_dir)
            .await
            .map_err(|source| PipelineError::DownloadDir {
                path: kind_dir.clone(),
                source,
            })?;

        info!("Processing {} pages of {}", total_pages, kind.plural());
        let mut first = Some(first);

        for page in 1..=total_pages {
            let fetched = match first.take() {
                Some(page) => Ok(page),
                None => self.catalog.fetch_page(kind, page, self.per_page).await,
            };

            let items = match fetched {
                Ok(fetched) => match fetched.items {
                    Some(items) => items,
                    None => {
                        warn!("{} page {} has no items, stopping", kind, page);
                        break;
                    }
                },
                Err(e) => {
                    warn!("Failed to retrieve {} page {}: {}", kind, page, e);
                    break;
                }
            };

            summary.pages_processed += 1;
            summary.items_seen += items.len();

            for item in items.iter().filter(|item| is_popular(item)) {
                self.ingest_item(kind, item, &mut summary).await?;
            }

            info!(
                "Processed {} page {}/{} ({} items upserted so far)",
                kind, page, total_pages, summary.items_upserted
            );
        }

        Ok(summary)
    }

    async fn ingest_item(
        &self,
        kind: ItemKind,
        item: &CatalogItem,
        summary: &mut IngestSummary,
    ) -> Result<(), PipelineError> {
        let record = ItemRecord::from_catalog(kind, item);
        match self.store.upsert_item(kind, &record) {
            Ok(()) => {
                summary.items_upserted += 1;
                debug!("Inserted data for {} {}", kind, item.slug);
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!("Failed to store {} {}: {}", kind, item.slug, e);
                return Ok(());
            }
        }

        match self.fetcher.fetch(kind, item).await {
            Ok(FetchOutcome::Extracted { .. }) => summary.archives_extracted += 1,
            Ok(FetchOutcome::SkippedStale) => summary.skipped_stale += 1,
            Err(e) => {
                warn!("Failed to download {} {}: {}", kind, item.slug, e);
                summary.failed_downloads += 1;
            }
        }

        Ok(())
    }
}

fn is_popular(item: &CatalogItem) -> bool {
    item.active_installs() >= MIN_ACTIVE_INSTALLS
}
